use std::fmt::Debug;

use chrono::{DateTime, Utc};
use rusqlite::ffi;
use serde_json::json;
use sqlite_typed::prelude::*;

fn round_trip<T>(conn: &Connection, value: T) -> Result<(), SqliteDbError>
where
    T: ToSqlValue + FromSqlValue + PartialEq + Debug + Clone,
{
    let mut stmt = conn.prepare("SELECT ?1")?;
    stmt.bind(1, value.clone())?;
    assert!(stmt.run()?);
    let back: T = stmt.get(0)?;
    assert_eq!(back, value);
    Ok(())
}

#[test]
fn every_supported_type_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;

    round_trip(&conn, i8::MIN)?;
    round_trip(&conn, i16::MAX)?;
    round_trip(&conn, i32::MIN)?;
    round_trip(&conn, i64::MAX)?;
    round_trip(&conn, u8::MAX)?;
    round_trip(&conn, u16::MAX)?;
    round_trip(&conn, u32::MAX)?;
    round_trip(&conn, i64::MAX as u64)?;
    round_trip(&conn, 4096_usize)?;
    round_trip(&conn, 3.25_f64)?;
    round_trip(&conn, -0.5_f64)?;
    round_trip(&conn, true)?;
    round_trip(&conn, false)?;
    round_trip(&conn, String::from("héllo, wörld"))?;
    round_trip(&conn, String::new())?;
    round_trip(&conn, vec![0_u8, 1, 2, 255])?;
    round_trip(&conn, DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap())?;
    round_trip(&conn, Value::Text("tagged".into()))?;
    round_trip(&conn, Value::Blob(vec![9, 8, 7]))?;
    round_trip(&conn, Value::Null)?;
    round_trip(&conn, Value::Int(-7))?;
    round_trip(&conn, Value::Float(2.5))?;
    Ok(())
}

#[test]
fn tagged_bool_and_timestamp_read_back_as_integers() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;
    let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
    let mut stmt = conn.prepare("SELECT ?1, ?2")?;
    stmt.bind(1, Value::Bool(true))?;
    stmt.bind(2, Value::Timestamp(at))?;
    assert!(stmt.run()?);

    // the engine keeps only the storage class
    assert_eq!(stmt.get::<Value>(0)?, Value::Int(1));
    assert_eq!(stmt.get::<Value>(1)?, Value::Int(1_700_000_000));
    // the typed reads restore the tag
    assert!(stmt.get::<bool>(0)?);
    assert_eq!(stmt.get::<DateTime<Utc>>(1)?, at);
    Ok(())
}

#[test]
fn absence_round_trips_to_absence() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;

    round_trip(&conn, None::<i64>)?;
    round_trip(&conn, None::<String>)?;
    round_trip(&conn, None::<Vec<u8>>)?;
    round_trip(&conn, None::<DateTime<Utc>>)?;
    round_trip(&conn, Some(42_i32))?;
    round_trip(&conn, Some(String::from("present")))?;

    // a NULL read as a plain integer is its zero value, as an option it is absent
    let mut stmt = conn.prepare("SELECT ?1")?;
    stmt.bind(1, ())?;
    assert!(stmt.run()?);
    assert_eq!(stmt.get::<i64>(0)?, 0);
    assert_eq!(stmt.get::<Option<i64>>(0)?, None);
    assert!(stmt.get::<DateTime<Utc>>(0).is_err());
    Ok(())
}

#[test]
fn borrowed_and_owned_bindings() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;
    let mut stmt = conn.prepare("SELECT ?1, ?2, ?3")?;
    {
        let scratch = String::from("borrowed text");
        stmt.bind(1, scratch.as_str())?;
        stmt.bind(2, ValueRef::Blob(scratch.as_bytes()))?;
        // scratch is freed here; the engine already holds its own copy
    }
    stmt.bind(3, Value::Text("owned".into()))?;

    assert!(stmt.run()?);
    assert_eq!(stmt.get::<String>(0)?, "borrowed text");
    assert_eq!(stmt.get::<Vec<u8>>(1)?, b"borrowed text".to_vec());
    assert_eq!(stmt.get::<String>(2)?, "owned");
    Ok(())
}

#[test]
fn positions_outside_the_statement_fail() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;
    let mut stmt = conn.prepare("SELECT ?1, ?2")?;
    assert_eq!(stmt.parameter_count(), 2);
    assert_eq!(stmt.column_count(), 2);

    for position in [0, 3] {
        let err = stmt.bind(position, 1).unwrap_err();
        assert!(matches!(err, SqliteDbError::ExecutionError { .. }));
        assert_eq!(err.code(), ffi::SQLITE_RANGE);
    }

    stmt.bind(1, 1)?;
    stmt.bind(2, 2)?;
    // no current row yet
    let err = stmt.get::<i64>(0).unwrap_err();
    assert_eq!(err.code(), ffi::SQLITE_MISUSE);

    assert!(stmt.run()?);
    let err = stmt.get::<i64>(2).unwrap_err();
    assert_eq!(err.code(), ffi::SQLITE_RANGE);
    Ok(())
}

#[test]
fn oversized_text_fails_and_leaves_other_slots_alone() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::builder(":memory:").max_value_length(8).open()?;
    assert_eq!(conn.max_value_length(), 8);
    let mut stmt = conn.prepare("SELECT ?1, ?2")?;

    stmt.bind(1, 42)?;
    stmt.bind(2, "short")?;
    let err = stmt.bind(2, "much longer than eight bytes").unwrap_err();
    assert!(matches!(err, SqliteDbError::ValueTooLarge { .. }));
    assert_eq!(err.code(), ffi::SQLITE_TOOBIG);
    let err = stmt.bind(1, vec![0_u8; 9]).unwrap_err();
    assert!(matches!(err, SqliteDbError::ValueTooLarge { .. }));

    assert!(stmt.run()?);
    assert_eq!(stmt.get::<i64>(0)?, 42);
    assert_eq!(stmt.get::<String>(1)?, "short");
    Ok(())
}

#[test]
fn unsigned_overflow_is_refused() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;
    let mut stmt = conn.prepare("SELECT ?1")?;
    let err = stmt.bind(1, u64::MAX).unwrap_err();
    assert!(matches!(err, SqliteDbError::ValueTooLarge { .. }));

    stmt.bind(1, -1_i64)?;
    assert!(stmt.run()?);
    let err = stmt.get::<u64>(0).unwrap_err();
    assert_eq!(err.code(), ffi::SQLITE_RANGE);
    Ok(())
}

#[test]
fn type_mismatches_are_reported() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;
    let mut stmt = conn.prepare("SELECT 'abc', 1.5")?;
    assert!(stmt.run()?);
    assert_eq!(stmt.get::<i64>(0).unwrap_err().code(), ffi::SQLITE_MISMATCH);
    assert_eq!(stmt.get::<i64>(1).unwrap_err().code(), ffi::SQLITE_MISMATCH);
    assert!((stmt.get::<f64>(1)? - 1.5).abs() < f64::EPSILON);
    assert_eq!(stmt.get::<Value>(0)?, Value::Text("abc".into()));
    Ok(())
}

#[test]
fn timestamps_are_whole_seconds() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;
    conn.exec("CREATE TABLE events (at INTEGER, label TEXT DEFAULT CURRENT_TIMESTAMP)")?;

    let mut insert = conn.prepare("INSERT INTO events (at) VALUES (?1)")?;
    let fractional = DateTime::<Utc>::from_timestamp(1_600_000_000, 999_000_000).unwrap();
    let err = insert.bind(1, fractional).unwrap_err();
    assert_eq!(err.code(), ffi::SQLITE_MISMATCH);
    let err = insert.bind(1, Value::Timestamp(fractional)).unwrap_err();
    assert_eq!(err.code(), ffi::SQLITE_MISMATCH);

    let at = DateTime::<Utc>::from_timestamp(1_600_000_000, 0).unwrap();
    insert.bind(1, at)?;
    assert!(!insert.run()?);

    let mut select = conn.prepare("SELECT at, label FROM events")?;
    assert!(select.run()?);
    assert_eq!(select.get::<i64>(0)?, 1_600_000_000);
    assert_eq!(select.get::<DateTime<Utc>>(0)?, at);
    // CURRENT_TIMESTAMP text reads back as a timestamp as well
    assert!(select.get::<DateTime<Utc>>(1)?.timestamp() > 1_600_000_000);
    Ok(())
}

#[test]
fn named_and_slice_binding() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;

    let mut stmt = conn.prepare("SELECT :name, :age")?;
    stmt.bind_named(":name", "ada")?;
    stmt.bind_named(":age", 36_u8)?;
    assert!(stmt.run()?);
    assert_eq!(stmt.get::<String>(0)?, "ada");
    assert_eq!(stmt.get::<u8>(1)?, 36);
    let err = stmt.bind_named(":missing", 1).unwrap_err();
    assert_eq!(err.code(), ffi::SQLITE_RANGE);

    let mut stmt = conn.prepare("SELECT ?1 AS a, ?2 AS b, ?3 AS c")?;
    stmt.bind_values(&[Value::Int(1), Value::from("two"), Value::from(None::<i64>)])?;
    assert!(stmt.run()?);
    assert_eq!(stmt.column_names(), vec!["a", "b", "c"]);
    assert_eq!(stmt.get_named::<i64>("a")?, 1);
    assert_eq!(stmt.get_named::<String>("b")?, "two");
    assert_eq!(stmt.get_named::<Option<i64>>("c")?, None);
    assert!(stmt.get_named::<i64>("nope").is_err());

    let err = stmt
        .bind_values(&[Value::Null, Value::Null, Value::Null, Value::Null])
        .unwrap_err();
    assert_eq!(err.code(), ffi::SQLITE_RANGE);
    Ok(())
}

#[test]
fn clear_bindings_resets_slots_to_null() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;
    let mut stmt = conn.prepare("SELECT ?1, ?2")?;
    stmt.bind(1, 1)?;
    stmt.bind(2, "x")?;
    stmt.clear_bindings()?;
    assert!(stmt.run()?);
    assert_eq!(stmt.get::<Option<i64>>(0)?, None);
    assert_eq!(stmt.get::<Option<String>>(1)?, None);
    Ok(())
}

#[test]
fn json_documents_are_stored_as_text() -> Result<(), Box<dyn std::error::Error>> {
    let conn = Connection::open_in_memory()?;
    let doc = json!({"name": "ada", "tags": ["math", "engines"]});

    let mut stmt = conn.prepare("SELECT ?1, json_extract(?1, '$.tags[1]')")?;
    stmt.bind(1, &doc)?;
    assert!(stmt.run()?);
    assert_eq!(stmt.get::<serde_json::Value>(0)?, doc);
    assert_eq!(stmt.get::<String>(1)?, "engines");

    stmt.bind(1, json!({"tags": [1, 2]}))?;
    assert!(stmt.run()?);
    assert_eq!(stmt.get::<i64>(1)?, 2);

    stmt.bind(1, Value::from(doc.clone()))?;
    assert!(stmt.run()?);
    assert_eq!(stmt.get::<serde_json::Value>(0)?, doc);
    Ok(())
}
