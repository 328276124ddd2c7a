use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Owned value that can be bound as a parameter or read back from a column.
///
/// `Bool` and `Timestamp` are stored by the engine as integers (0/1 and whole seconds since
/// the Unix epoch); the tag only records how the host side wants to see them. Read back as a
/// `Value` they are `Value::Int`; read them as `bool` or `DateTime<Utc>` instead.
/// ```rust
/// use sqlite_typed::prelude::*;
///
/// let params = vec![
///     Value::Int(1),
///     Value::Text("alice".into()),
///     Value::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Text/string value
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Timestamp, whole seconds
    Timestamp(DateTime<Utc>),
}

/// Borrowed counterpart of [`Value`]. Text and blob payloads point at caller-owned memory,
/// which the engine copies while the bind call runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'a str),
    Blob(&'a [u8]),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Null => ValueRef::Null,
            Value::Int(i) => ValueRef::Int(*i),
            Value::Float(f) => ValueRef::Float(*f),
            Value::Bool(b) => ValueRef::Bool(*b),
            Value::Text(s) => ValueRef::Text(s),
            Value::Blob(b) => ValueRef::Blob(b),
            Value::Timestamp(ts) => ValueRef::Timestamp(*ts),
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let Value::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl ValueRef<'_> {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match *self {
            ValueRef::Null => Value::Null,
            ValueRef::Int(i) => Value::Int(i),
            ValueRef::Float(f) => Value::Float(f),
            ValueRef::Bool(b) => Value::Bool(b),
            ValueRef::Text(s) => Value::Text(s.to_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
            ValueRef::Timestamp(ts) => Value::Timestamp(ts),
        }
    }

    /// Payload length in bytes for text and blob values.
    #[must_use]
    pub fn byte_len(&self) -> Option<usize> {
        match self {
            ValueRef::Text(s) => Some(s.len()),
            ValueRef::Blob(b) => Some(b.len()),
            _ => None,
        }
    }

    /// Name of the variant, used in conversion error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueRef::Null => "null",
            ValueRef::Int(_) => "integer",
            ValueRef::Float(_) => "real",
            ValueRef::Bool(_) => "bool",
            ValueRef::Text(_) => "text",
            ValueRef::Blob(_) => "blob",
            ValueRef::Timestamp(_) => "timestamp",
        }
    }
}

impl<'a> From<&'a Value> for ValueRef<'a> {
    fn from(value: &'a Value) -> Self {
        value.as_value_ref()
    }
}

/// A single open flag. Combine with `|` into [`OpenFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenFlag {
    ReadOnly,
    ReadWrite,
    Create,
    SharedCache,
}

impl OpenFlag {
    const fn bit(self) -> u8 {
        match self {
            OpenFlag::ReadOnly => 1,
            OpenFlag::ReadWrite => 1 << 1,
            OpenFlag::Create => 1 << 2,
            OpenFlag::SharedCache => 1 << 3,
        }
    }
}

/// Set of [`OpenFlag`]s. The empty set means the engine defaults (read-write, create).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<OpenFlag>", into = "Vec<OpenFlag>")]
pub struct OpenFlags(u8);

impl OpenFlags {
    pub const ALL: [OpenFlag; 4] = [
        OpenFlag::ReadOnly,
        OpenFlag::ReadWrite,
        OpenFlag::Create,
        OpenFlag::SharedCache,
    ];

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// `ReadWrite | Create`
    #[must_use]
    pub const fn read_write_create() -> Self {
        Self(OpenFlag::ReadWrite.bit() | OpenFlag::Create.bit())
    }

    #[must_use]
    pub const fn contains(self, flag: OpenFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn with(mut self, flag: OpenFlag) -> Self {
        self.0 |= flag.bit();
        self
    }

    pub fn iter(self) -> impl Iterator<Item = OpenFlag> {
        Self::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

impl fmt::Debug for OpenFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<OpenFlag> for OpenFlags {
    fn from(flag: OpenFlag) -> Self {
        Self(flag.bit())
    }
}

impl From<Vec<OpenFlag>> for OpenFlags {
    fn from(flags: Vec<OpenFlag>) -> Self {
        flags.into_iter().collect()
    }
}

impl From<OpenFlags> for Vec<OpenFlag> {
    fn from(flags: OpenFlags) -> Self {
        flags.iter().collect()
    }
}

impl FromIterator<OpenFlag> for OpenFlags {
    fn from_iter<I: IntoIterator<Item = OpenFlag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), OpenFlags::with)
    }
}

impl BitOr for OpenFlag {
    type Output = OpenFlags;

    fn bitor(self, rhs: Self) -> OpenFlags {
        OpenFlags::from(self).with(rhs)
    }
}

impl BitOr<OpenFlag> for OpenFlags {
    type Output = OpenFlags;

    fn bitor(self, rhs: OpenFlag) -> OpenFlags {
        self.with(rhs)
    }
}

impl BitOrAssign<OpenFlag> for OpenFlags {
    fn bitor_assign(&mut self, rhs: OpenFlag) {
        self.0 |= rhs.bit();
    }
}

/// Lock-acquisition eagerness for `BEGIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Locks are taken on first access.
    #[default]
    Deferred,
    /// A write lock is taken immediately.
    Immediate,
    /// The strongest lock is taken immediately.
    Exclusive,
}

impl TransactionMode {
    #[must_use]
    pub fn begin_sql(self) -> &'static str {
        match self {
            TransactionMode::Deferred => "BEGIN DEFERRED TRANSACTION",
            TransactionMode::Immediate => "BEGIN IMMEDIATE TRANSACTION",
            TransactionMode::Exclusive => "BEGIN EXCLUSIVE TRANSACTION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_and_iterate_in_order() {
        let flags = OpenFlag::SharedCache | OpenFlag::ReadOnly;
        assert!(flags.contains(OpenFlag::ReadOnly));
        assert!(!flags.contains(OpenFlag::Create));
        let listed: Vec<OpenFlag> = flags.iter().collect();
        assert_eq!(listed, vec![OpenFlag::ReadOnly, OpenFlag::SharedCache]);
    }

    #[test]
    fn flags_serialize_as_list() {
        let flags = OpenFlags::read_write_create();
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, r#"["read_write","create"]"#);
        let back: OpenFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn begin_sql_matches_mode() {
        assert_eq!(
            TransactionMode::Immediate.begin_sql(),
            "BEGIN IMMEDIATE TRANSACTION"
        );
        assert_eq!(TransactionMode::default(), TransactionMode::Deferred);
    }
}
