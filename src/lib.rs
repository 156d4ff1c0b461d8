//! # Rust Database Logger
//!
//! A transparent logging layer for database drivers. Wrap any connection in a
//! [`LoggingConnection`] and every command run through it is logged with its SQL
//! text, parameters and outcome, while callers keep using the ordinary driver API.
//!
//! ## Features
//!
//! - **Transparent**: wrappers implement the same [`Connection`], [`Command`] and
//!   [`Transaction`] traits as the driver and return the driver's own errors
//! - **Structured**: records carry named fields, rendered through [`tracing`] by
//!   default or captured in memory with [`MemorySink`]
//! - **Async**: every execution has a cancellable async variant
//! - **Batteries included**: a SQLite driver over `rusqlite` (feature `sqlite`, on by
//!   default) and one-call helpers in [`ConnectionExt`]
//!
//! ## What gets logged
//!
//! | Event | Level | Message |
//! |-------|-------|---------|
//! | open / close | TRACE | `Opening {kind} connection to {dataSource}` |
//! | open / close failure | ERROR | `Exception opening {kind} connection to {dataSource}` |
//! | before execution | DEBUG | `Server: {dataSource}, SQL: {sql}, Parameters: {@params}` |
//! | non-query done | DEBUG | `Affected {rows} rows` |
//! | scalar done | DEBUG | `Scalar result: {@result}` |
//! | execution failure | ERROR | `Command failed. Server: {dataSource}, SQL: {sql}` |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_database_logger::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     init_subscriber(&LogConfig::verbose())?;
//!
//!     let mut conn = LoggingConnection::with_tracing(SqliteConnection::new(":memory:")?);
//!     conn.open()?;
//!     conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
//!
//!     let mut cmd = conn.create_command();
//!     cmd.set_command_text("INSERT INTO users (name) VALUES (@Name)");
//!     cmd.parameters_mut().add_with_value("@Name", "Alice");
//!     cmd.execute_non_query_async(&CancellationToken::new()).await?;
//!
//!     conn.close()?;
//!     Ok(())
//! }
//! ```

/// Driver traits and shared types
pub mod core;

/// Log sinks and subscriber setup
pub mod logging;

/// Logging decorators
pub mod wrapper;

/// Database driver implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_database_logger::prelude::*;
///
/// let mut params = ParameterCollection::new();
/// params.add_with_value("@Id", 1);
/// assert_eq!(params.get("Id").map(Parameter::value), Some(&DatabaseValue::Int(1)));
/// ```
pub mod prelude {
    pub use crate::core::{
        Command, CommandBehavior, CommandType, Connection, ConnectionExt, ConnectionState,
        DataReader, DatabaseError, DatabaseValue, IsolationLevel, Parameter,
        ParameterCollection, Result, Transaction,
    };
    pub use crate::logging::{init_subscriber, LogConfig, LogSink, MemorySink, TracingSink};
    pub use crate::wrapper::{
        ConnectionArg, LoggingCommand, LoggingConnection, LoggingTransaction, TransactionArg,
        Unwrap,
    };
    pub use tokio_util::sync::CancellationToken;

    #[cfg(feature = "sqlite")]
    pub use crate::backends::{SqliteCommand, SqliteConnection, SqliteTransaction};
}

// Re-export at root level for convenience
pub use crate::core::{
    Command, Connection, ConnectionExt, DataReader, DatabaseError, DatabaseValue, Parameter,
    ParameterCollection, Result, Transaction,
};
pub use crate::logging::{LogSink, MemorySink, TracingSink};
pub use crate::wrapper::{LoggingCommand, LoggingConnection, LoggingTransaction, Unwrap};

#[cfg(feature = "sqlite")]
pub use crate::backends::SqliteConnection;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let state = ConnectionState::default();
        assert_eq!(state.to_str(), "closed");
        assert_eq!(IsolationLevel::default(), IsolationLevel::Unspecified);
    }

    #[test]
    fn test_value_conversions() {
        use prelude::*;

        let val: DatabaseValue = 42.into();
        assert_eq!(val.as_int(), Some(42));

        let val: DatabaseValue = "test".into();
        assert_eq!(val.as_str(), Some("test"));

        let val: DatabaseValue = true.into();
        assert_eq!(val.as_bool(), Some(true));
    }
}
