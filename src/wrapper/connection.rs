//! Logging decorator for connections

use super::command::LoggingCommand;
use super::transaction::LoggingTransaction;
use super::unwrap::Unwrap;
use crate::core::database_types::{ConnectionState, IsolationLevel};
use crate::core::driver::Connection;
use crate::logging::{Field, LogSink, TracingSink};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A connection that logs opening, closing and every command run through it
///
/// Wraps exactly one native connection and forwards the whole [`Connection`]
/// contract to it. Opening and closing emit a trace record before the native call
/// and an error record if it fails; the error itself is returned untouched.
/// Commands and transactions created here are wrapped as well.
///
/// # Example
///
/// ```rust,no_run
/// use rust_database_logger::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
/// let sink = Arc::new(MemorySink::new());
/// let mut conn = LoggingConnection::new(SqliteConnection::new(":memory:")?, sink.clone());
///
/// conn.open()?;
/// let mut cmd = conn.create_command();
/// cmd.set_command_text("SELECT 1");
/// assert_eq!(cmd.execute_scalar()?, Some(DatabaseValue::Long(1)));
/// conn.close()?;
/// # Ok(())
/// # }
/// ```
pub struct LoggingConnection<C: Connection> {
    connection: C,
    sink: Arc<dyn LogSink>,
}

impl<C: Connection> LoggingConnection<C> {
    /// Wrap `connection`, sending records to `sink`
    pub fn new(connection: C, sink: Arc<dyn LogSink>) -> Self {
        Self { connection, sink }
    }

    /// Wrap `connection`, sending records to the `tracing` ecosystem
    pub fn with_tracing(connection: C) -> Self {
        Self::new(connection, Arc::new(TracingSink::new()))
    }

    /// The native connection
    pub fn wrapped_connection(&self) -> &C {
        &self.connection
    }

    /// The sink records are written to
    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Release the wrapper together with its native connection
    ///
    /// The native session is closed through [`Connection::close`], so the close is
    /// logged and every command or transaction still sharing the session sees it
    /// closed. The wrapper is consumed either way; a close error is returned after
    /// being logged.
    pub fn dispose(mut self) -> Result<(), C::Error> {
        if self.connection.state() == ConnectionState::Closed {
            return Ok(());
        }
        self.close()
    }

    fn kind() -> &'static str {
        std::any::type_name::<C>()
    }

    fn lifecycle_fields(&self) -> [Field; 2] {
        [
            ("kind", Value::from(Self::kind())),
            ("dataSource", Value::from(self.connection.data_source())),
        ]
    }
}

impl<C: Connection> Clone for LoggingConnection<C> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<C: Connection> fmt::Debug for LoggingConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConnection")
            .field("kind", &Self::kind())
            .field("data_source", &self.connection.data_source())
            .field("state", &self.connection.state())
            .finish()
    }
}

impl<C: Connection> Unwrap for LoggingConnection<C> {
    type Native = C;

    fn unwrap_native(&self) -> &C {
        &self.connection
    }

    fn into_native(self) -> C {
        self.connection
    }
}

#[async_trait]
impl<C: Connection> Connection for LoggingConnection<C> {
    type Error = C::Error;
    type Transaction = LoggingTransaction<C>;
    type Command = LoggingCommand<C>;

    fn connection_string(&self) -> String {
        self.connection.connection_string()
    }

    fn set_connection_string(&mut self, connection_string: &str) -> Result<(), C::Error> {
        self.connection.set_connection_string(connection_string)
    }

    fn connection_timeout(&self) -> Duration {
        self.connection.connection_timeout()
    }

    fn database(&self) -> String {
        self.connection.database()
    }

    fn data_source(&self) -> String {
        self.connection.data_source()
    }

    fn server_version(&self) -> String {
        self.connection.server_version()
    }

    fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    fn open(&mut self) -> Result<(), C::Error> {
        let fields = self.lifecycle_fields();
        self.sink
            .trace("Opening {kind} connection to {dataSource}", &fields);
        self.connection.open().map_err(|e| {
            self.sink.error(
                "Exception opening {kind} connection to {dataSource}",
                &e,
                &fields,
            );
            e
        })
    }

    async fn open_async(&mut self, cancel: &CancellationToken) -> Result<(), C::Error> {
        let fields = self.lifecycle_fields();
        self.sink
            .trace("Opening {kind} connection to {dataSource}", &fields);
        match self.connection.open_async(cancel).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.sink.error(
                    "Exception opening {kind} connection to {dataSource}",
                    &e,
                    &fields,
                );
                Err(e)
            }
        }
    }

    fn close(&mut self) -> Result<(), C::Error> {
        let fields = self.lifecycle_fields();
        self.sink
            .trace("Closing {kind} connection to {dataSource}", &fields);
        self.connection.close().map_err(|e| {
            self.sink.error(
                "Exception closing {kind} connection to {dataSource}",
                &e,
                &fields,
            );
            e
        })
    }

    fn change_database(&mut self, database: &str) -> Result<(), C::Error> {
        self.connection.change_database(database)
    }

    fn begin_transaction(&mut self, level: IsolationLevel) -> Result<LoggingTransaction<C>, C::Error> {
        let transaction = self.connection.begin_transaction(level)?;
        Ok(LoggingTransaction::new(transaction, self.clone()))
    }

    fn create_command(&self) -> LoggingCommand<C> {
        LoggingCommand::attached(self.connection.create_command(), self.clone())
    }
}
