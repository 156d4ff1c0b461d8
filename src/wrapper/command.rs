//! Logging decorator for commands
//!
//! Every execution variant follows the same bracket:
//!
//! 1. snapshot the bound parameters;
//! 2. debug record with the data source, SQL text and snapshot;
//! 3. the native call;
//! 4. on success, a second debug record with the row count or scalar value
//!    (readers stop after step 2, their results are still unread);
//! 5. on failure, one error record, then the native error is returned as is.
//!
//! The async variants differ only in awaiting the native future between
//! steps 2 and 4. Records are written synchronously, never across an `.await`.

use super::connection::LoggingConnection;
use super::snapshot::ParameterSnapshot;
use super::transaction::LoggingTransaction;
use super::unwrap::{ConnectionArg, TransactionArg, Unwrap};
use crate::core::database_types::{CommandBehavior, CommandType};
use crate::core::driver::{Command, Connection};
use crate::core::parameter::{Parameter, ParameterCollection};
use crate::core::value::DatabaseValue;
use crate::logging::{field_value, LogSink};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const QUERY_TEMPLATE: &str = "Server: {dataSource}, SQL: {sql}, Parameters: {@params}";
const FAILURE_TEMPLATE: &str = "Command failed. Server: {dataSource}, SQL: {sql}";

/// A command that logs each execution and forwards it to a native command
pub struct LoggingCommand<C: Connection> {
    command: C::Command,
    connection: Option<ConnectionArg<C>>,
    transaction: Option<TransactionArg<C>>,
    sink: Arc<dyn LogSink>,
}

impl<C: Connection> LoggingCommand<C> {
    /// Wrap a native command that is not attached to a logging connection
    pub fn new(command: C::Command, sink: Arc<dyn LogSink>) -> Self {
        Self {
            command,
            connection: None,
            transaction: None,
            sink,
        }
    }

    /// Wrap a command the native connection inside `connection` just created
    pub(crate) fn attached(command: C::Command, connection: LoggingConnection<C>) -> Self {
        Self {
            command,
            sink: Arc::clone(connection.sink()),
            connection: Some(ConnectionArg::Logging(connection)),
            transaction: None,
        }
    }

    /// The native command
    pub fn inner(&self) -> &C::Command {
        &self.command
    }

    /// The native command, mutably
    pub fn inner_mut(&mut self) -> &mut C::Command {
        &mut self.command
    }

    /// The connection as it was last assigned, wrapped or native
    pub fn connection_arg(&self) -> Option<&ConnectionArg<C>> {
        self.connection.as_ref()
    }

    /// The transaction as it was last assigned, wrapped or native
    pub fn transaction_arg(&self) -> Option<&TransactionArg<C>> {
        self.transaction.as_ref()
    }

    /// Attach the command to a connection
    ///
    /// A [`LoggingConnection`] is unwrapped first: the native command is always
    /// given the native connection.
    pub fn assign_connection(&mut self, connection: impl Into<ConnectionArg<C>>) {
        let connection = connection.into();
        self.command.set_connection(Some(connection.native().clone()));
        self.connection = Some(connection);
    }

    /// Detach the command from its connection
    pub fn detach_connection(&mut self) {
        self.command.set_connection(None);
        self.connection = None;
    }

    /// Enlist the command in a transaction
    ///
    /// A [`LoggingTransaction`] is unwrapped first: the native command is always
    /// given the native transaction.
    pub fn assign_transaction(&mut self, transaction: impl Into<TransactionArg<C>>) {
        let transaction = transaction.into();
        self.command
            .set_transaction(Some(transaction.native().clone()));
        self.transaction = Some(transaction);
    }

    /// Remove the command from its transaction
    pub fn detach_transaction(&mut self) {
        self.command.set_transaction(None);
        self.transaction = None;
    }

    /// Release the native command
    pub fn dispose(self) {
        drop(self.command);
    }

    /// Data source of the native command's own connection
    fn data_source(&self) -> Value {
        self.command
            .connection()
            .map(|connection| Value::from(connection.data_source()))
            .unwrap_or(Value::Null)
    }

    fn log_query(&self) {
        let snapshot = ParameterSnapshot::capture(self.command.parameters());
        self.sink.debug(
            QUERY_TEMPLATE,
            &[
                ("dataSource", self.data_source()),
                ("sql", Value::from(self.command.command_text())),
                ("params", field_value(&snapshot)),
            ],
        );
    }

    fn log_affected(&self, rows: u64) {
        self.sink
            .debug("Affected {rows} rows", &[("rows", Value::from(rows))]);
    }

    fn log_scalar(&self, result: &Option<DatabaseValue>) {
        self.sink
            .debug("Scalar result: {@result}", &[("result", field_value(result))]);
    }

    fn log_failure(&self, error: &C::Error) {
        self.sink.error(
            FAILURE_TEMPLATE,
            error,
            &[
                ("dataSource", self.data_source()),
                ("sql", Value::from(self.command.command_text())),
            ],
        );
    }
}

impl<C: Connection> fmt::Debug for LoggingCommand<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingCommand")
            .field("command_text", &self.command.command_text())
            .field("parameters", &self.command.parameters().len())
            .field("connection", &self.connection.as_ref().map(ConnectionArg::is_wrapped))
            .field("transaction", &self.transaction.as_ref().map(TransactionArg::is_wrapped))
            .finish()
    }
}

impl<C: Connection> Unwrap for LoggingCommand<C> {
    type Native = C::Command;

    fn unwrap_native(&self) -> &C::Command {
        &self.command
    }

    fn into_native(self) -> C::Command {
        self.command
    }
}

#[async_trait]
impl<C: Connection> Command for LoggingCommand<C> {
    type Error = C::Error;
    type Connection = LoggingConnection<C>;
    type Transaction = LoggingTransaction<C>;
    type Reader = <C::Command as Command>::Reader;

    fn command_text(&self) -> &str {
        self.command.command_text()
    }

    fn set_command_text(&mut self, text: &str) {
        self.command.set_command_text(text);
    }

    fn command_timeout(&self) -> Duration {
        self.command.command_timeout()
    }

    fn set_command_timeout(&mut self, timeout: Duration) {
        self.command.set_command_timeout(timeout);
    }

    fn command_type(&self) -> CommandType {
        self.command.command_type()
    }

    fn set_command_type(&mut self, command_type: CommandType) {
        self.command.set_command_type(command_type);
    }

    /// The logging connection last assigned; `None` if a native one was assigned
    fn connection(&self) -> Option<&LoggingConnection<C>> {
        self.connection.as_ref().and_then(ConnectionArg::as_logging)
    }

    fn set_connection(&mut self, connection: Option<LoggingConnection<C>>) {
        match connection {
            Some(connection) => self.assign_connection(connection),
            None => self.detach_connection(),
        }
    }

    /// The logging transaction last assigned; `None` if a native one was assigned
    fn transaction(&self) -> Option<&LoggingTransaction<C>> {
        self.transaction.as_ref().and_then(TransactionArg::as_logging)
    }

    fn set_transaction(&mut self, transaction: Option<LoggingTransaction<C>>) {
        match transaction {
            Some(transaction) => self.assign_transaction(transaction),
            None => self.detach_transaction(),
        }
    }

    fn parameters(&self) -> &ParameterCollection {
        self.command.parameters()
    }

    fn parameters_mut(&mut self) -> &mut ParameterCollection {
        self.command.parameters_mut()
    }

    fn create_parameter(&self) -> Parameter {
        self.command.create_parameter()
    }

    fn prepare(&mut self) -> Result<(), C::Error> {
        self.command.prepare()
    }

    fn cancel(&self) {
        self.command.cancel();
    }

    fn execute_reader(&mut self, behavior: CommandBehavior) -> Result<Self::Reader, C::Error> {
        self.log_query();
        self.command.execute_reader(behavior).map_err(|e| {
            self.log_failure(&e);
            e
        })
    }

    fn execute_non_query(&mut self) -> Result<u64, C::Error> {
        self.log_query();
        match self.command.execute_non_query() {
            Ok(rows) => {
                self.log_affected(rows);
                Ok(rows)
            }
            Err(e) => {
                self.log_failure(&e);
                Err(e)
            }
        }
    }

    fn execute_scalar(&mut self) -> Result<Option<DatabaseValue>, C::Error> {
        self.log_query();
        match self.command.execute_scalar() {
            Ok(result) => {
                self.log_scalar(&result);
                Ok(result)
            }
            Err(e) => {
                self.log_failure(&e);
                Err(e)
            }
        }
    }

    async fn execute_reader_async(
        &mut self,
        behavior: CommandBehavior,
        cancel: &CancellationToken,
    ) -> Result<Self::Reader, C::Error> {
        self.log_query();
        match self.command.execute_reader_async(behavior, cancel).await {
            Ok(reader) => Ok(reader),
            Err(e) => {
                self.log_failure(&e);
                Err(e)
            }
        }
    }

    async fn execute_non_query_async(&mut self, cancel: &CancellationToken) -> Result<u64, C::Error> {
        self.log_query();
        match self.command.execute_non_query_async(cancel).await {
            Ok(rows) => {
                self.log_affected(rows);
                Ok(rows)
            }
            Err(e) => {
                self.log_failure(&e);
                Err(e)
            }
        }
    }

    async fn execute_scalar_async(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<DatabaseValue>, C::Error> {
        self.log_query();
        match self.command.execute_scalar_async(cancel).await {
            Ok(result) => {
                self.log_scalar(&result);
                Ok(result)
            }
            Err(e) => {
                self.log_failure(&e);
                Err(e)
            }
        }
    }
}
