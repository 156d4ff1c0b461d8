//! Native driver capability set
//!
//! These traits describe what a relational database driver exposes: connections,
//! commands, transactions and data readers. Drivers implement them, and the logging
//! wrappers in [`crate::wrapper`] implement them again on top of a driver so that a
//! wrapped object can stand in anywhere a native one is expected.
//!
//! Connections and transactions are session handles: cloning one yields another
//! handle to the same underlying session. Commands are exclusively owned.

use super::database_types::{CommandBehavior, CommandType, ConnectionState, IsolationLevel};
use super::parameter::{Parameter, ParameterCollection};
use super::value::DatabaseValue;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A connection to a database session
#[async_trait]
pub trait Connection: Clone + Send {
    /// Error type of the driver
    type Error: std::error::Error + Send + Sync + 'static;

    /// Transaction handle created by [`Connection::begin_transaction`]
    type Transaction: Transaction<Error = Self::Error>;

    /// Command created by [`Connection::create_command`]
    type Command: Command<Connection = Self, Transaction = Self::Transaction, Error = Self::Error>;

    /// Connection string used to open the session
    fn connection_string(&self) -> String;

    /// Replace the connection string
    ///
    /// Drivers may refuse this while the connection is open.
    fn set_connection_string(&mut self, connection_string: &str) -> Result<(), Self::Error>;

    /// Time to wait while establishing a connection
    fn connection_timeout(&self) -> Duration;

    /// Name of the current database
    fn database(&self) -> String;

    /// Name of the server or file the connection targets
    fn data_source(&self) -> String;

    /// Version string reported by the server
    fn server_version(&self) -> String;

    /// Current state, always read live from the session
    fn state(&self) -> ConnectionState;

    /// Open the session
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Open the session without blocking the caller's task
    ///
    /// The default implementation opens synchronously.
    async fn open_async(&mut self, cancel: &CancellationToken) -> Result<(), Self::Error> {
        let _ = cancel;
        self.open()
    }

    /// Close the session
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Switch the current database of an open session
    fn change_database(&mut self, database: &str) -> Result<(), Self::Error>;

    /// Start a transaction on the session
    fn begin_transaction(&mut self, level: IsolationLevel) -> Result<Self::Transaction, Self::Error>;

    /// Create a command bound to this connection
    fn create_command(&self) -> Self::Command;
}

/// A transaction on a connection's session
pub trait Transaction: Clone + Send {
    /// Error type of the driver
    type Error: std::error::Error + Send + Sync + 'static;

    /// Isolation level the transaction was started with
    fn isolation_level(&self) -> IsolationLevel;

    /// Commit the transaction
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Roll the transaction back
    fn rollback(&mut self) -> Result<(), Self::Error>;
}

/// A SQL statement together with its bound parameters
#[async_trait]
pub trait Command: Send {
    /// Error type of the driver
    type Error: std::error::Error + Send + Sync + 'static;

    /// Connection type this command runs on
    type Connection: Send;

    /// Transaction type this command can be enlisted in
    type Transaction: Send;

    /// Reader returned by [`Command::execute_reader`]
    type Reader: DataReader<Error = Self::Error>;

    /// SQL text
    fn command_text(&self) -> &str;

    /// Replace the SQL text
    fn set_command_text(&mut self, text: &str);

    /// Time to wait for the command to execute
    fn command_timeout(&self) -> Duration;

    /// Replace the command timeout
    fn set_command_timeout(&mut self, timeout: Duration);

    /// How the command text is interpreted
    fn command_type(&self) -> CommandType;

    /// Replace the command type
    fn set_command_type(&mut self, command_type: CommandType);

    /// Connection the command runs on
    fn connection(&self) -> Option<&Self::Connection>;

    /// Attach the command to a connection, or detach it with `None`
    fn set_connection(&mut self, connection: Option<Self::Connection>);

    /// Transaction the command is enlisted in
    fn transaction(&self) -> Option<&Self::Transaction>;

    /// Enlist the command in a transaction, or clear it with `None`
    fn set_transaction(&mut self, transaction: Option<Self::Transaction>);

    /// Bound parameters
    fn parameters(&self) -> &ParameterCollection;

    /// Bound parameters, mutably
    fn parameters_mut(&mut self) -> &mut ParameterCollection;

    /// Create a new, unattached parameter
    fn create_parameter(&self) -> Parameter;

    /// Prepare the statement on the data source
    fn prepare(&mut self) -> Result<(), Self::Error>;

    /// Attempt to cancel a running execution
    fn cancel(&self);

    /// Execute and return a reader over the results
    fn execute_reader(&mut self, behavior: CommandBehavior) -> Result<Self::Reader, Self::Error>;

    /// Execute and return the number of affected rows
    fn execute_non_query(&mut self) -> Result<u64, Self::Error>;

    /// Execute and return the first column of the first row, `None` when there are no rows
    fn execute_scalar(&mut self) -> Result<Option<DatabaseValue>, Self::Error>;

    /// Asynchronous [`Command::execute_reader`]
    async fn execute_reader_async(
        &mut self,
        behavior: CommandBehavior,
        cancel: &CancellationToken,
    ) -> Result<Self::Reader, Self::Error>;

    /// Asynchronous [`Command::execute_non_query`]
    async fn execute_non_query_async(&mut self, cancel: &CancellationToken) -> Result<u64, Self::Error>;

    /// Asynchronous [`Command::execute_scalar`]
    async fn execute_scalar_async(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<DatabaseValue>, Self::Error>;
}

/// Forward-only cursor over a command's results
pub trait DataReader: Send {
    /// Error type of the driver
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of columns in the current result
    fn field_count(&self) -> usize;

    /// Name of the column at `ordinal`
    fn column_name(&self, ordinal: usize) -> Option<&str>;

    /// Position of the column named `name`
    fn ordinal(&self, name: &str) -> Option<usize> {
        (0..self.field_count()).find(|&i| self.column_name(i) == Some(name))
    }

    /// Advance to the next row, returning `false` when exhausted
    fn read(&mut self) -> Result<bool, Self::Error>;

    /// Value of the column at `ordinal` in the current row
    fn get(&self, ordinal: usize) -> Option<&DatabaseValue>;

    /// Rows changed by the statement, `None` for read-only statements
    fn records_affected(&self) -> Option<u64>;
}
