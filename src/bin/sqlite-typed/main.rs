mod args;

use clap::Parser;
use sqlite_typed::{Connection, PreparedStatement, SqliteDbError, Value};
use tracing::Level;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    if let Err(err) = run(&args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), SqliteDbError> {
    let mut conn = Connection::open_with(args.connection_options()?)?;
    let tx = conn.transaction(args.mode)?;
    for sql in &args.sql {
        let mut stmt = tx.prepare(sql)?;
        print_rows(&mut stmt)?;
        if stmt.column_count() == 0 {
            tracing::info!(changes = stmt.changes(), "{sql}");
        }
    }
    tx.commit()
}

fn print_rows(stmt: &mut PreparedStatement<'_>) -> Result<(), SqliteDbError> {
    let columns = stmt.column_count();
    if columns > 0 {
        println!("{}", stmt.column_names().join("\t"));
    }
    while stmt.run()? {
        let cells: Vec<String> = stmt.current_row()?.iter().map(render).collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
            format!("x'{hex}'")
        }
        Value::Timestamp(ts) => ts.to_rfc3339(),
    }
}
