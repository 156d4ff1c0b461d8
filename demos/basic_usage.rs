//! Basic logging wrapper example
//!
//! This example demonstrates:
//! - Installing a tracing subscriber
//! - Wrapping a SQLite connection
//! - Running commands with parameters, sync and async
//! - Transactions through the wrapper
//! - Inspecting records with an in-memory sink
//!
//! Run with: RUST_LOG=rust_database_logger=trace cargo run --example basic_usage

use rust_database_logger::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_subscriber(&LogConfig::verbose())?;
    println!("=== Rust Database Logger - Basic Usage Example ===\n");

    // Records go to tracing; open and close show up at TRACE level
    println!("1. Opening a wrapped connection...");
    let mut conn = LoggingConnection::with_tracing(SqliteConnection::new(":memory:")?);
    conn.open()?;
    println!("   ✓ {} is {}\n", conn.data_source(), conn.state());

    println!("2. Creating table...");
    conn.execute(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            age INTEGER
        )",
        &[],
    )?;
    println!("   ✓ Table created\n");

    println!("3. Inserting rows...");
    let rows = vec![
        vec![Parameter::new("@Name", "alice"), Parameter::new("@Age", 30)],
        vec![Parameter::new("@Name", "bob"), Parameter::new("@Age", 25)],
        vec![Parameter::new("@Name", "charlie"), Parameter::new("@Age", 35)],
    ];
    let affected = conn.execute_many(
        "INSERT INTO users (username, age) VALUES (@Name, @Age)",
        &rows,
    )?;
    println!("   ✓ Inserted {} rows\n", affected);

    println!("4. Reading rows...");
    let mut cmd = conn.create_command();
    cmd.set_command_text("SELECT username, age FROM users WHERE age > @MinAge ORDER BY age");
    cmd.parameters_mut().add_with_value("@MinAge", 26);
    let mut reader = cmd.execute_reader(CommandBehavior::Default)?;
    while reader.read()? {
        let name = reader.get(0).cloned().unwrap_or_default();
        let age = reader.get(1).cloned().unwrap_or_default();
        println!("   - {} ({})", name, age);
    }
    println!();

    println!("5. Async scalar...");
    let cancel = CancellationToken::new();
    let total = conn
        .query_scalar_async("SELECT SUM(age) FROM users", &[], &cancel)
        .await?;
    println!("   ✓ Total age: {:?}\n", total);

    println!("6. Transaction rolled back...");
    let mut tx = conn.begin_transaction(IsolationLevel::Serializable)?;
    let mut delete = conn.create_command();
    delete.set_command_text("DELETE FROM users");
    delete.set_transaction(Some(tx.clone()));
    println!("   Deleted {} rows inside the transaction", delete.execute_non_query()?);
    tx.rollback()?;
    let remaining = conn.query_scalar("SELECT COUNT(*) FROM users", &[])?;
    println!("   ✓ Rows after rollback: {:?}\n", remaining);

    println!("7. Failures are logged and returned unchanged...");
    let mut bad = conn.create_command();
    bad.set_command_text("Invalid SQL");
    if let Err(e) = bad.execute_non_query() {
        println!("   ✓ Driver error: {}\n", e);
    }

    println!("8. Capturing records in memory...");
    let sink = Arc::new(MemorySink::new());
    let mut captured = LoggingConnection::new(SqliteConnection::new(":memory:")?, sink.clone());
    captured.query_scalar("SELECT 42", &[])?;
    for record in sink.records() {
        println!("   [{}] {}", record.level, record.message);
    }
    println!();

    conn.close()?;
    println!("=== Example completed successfully ===");
    Ok(())
}
