//! In-memory driver used by the wrapper unit tests

use crate::core::database_types::{
    CommandBehavior, CommandType, ConnectionState, IsolationLevel,
};
use crate::core::driver::{Command, Connection, DataReader, Transaction};
use crate::core::parameter::{Parameter, ParameterCollection};
use crate::core::value::DatabaseValue;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MockError {
    #[error("server {0} refused the connection")]
    OpenRefused(String),

    #[error("syntax error near '{0}'")]
    Syntax(String),

    #[error("close failed")]
    CloseFailed,

    #[error("operation cancelled")]
    Cancelled,

    #[error("transaction already completed")]
    TransactionCompleted,
}

#[derive(Debug)]
struct MockState {
    data_source: String,
    connection_string: String,
    database: String,
    open: bool,
    refuse_open: bool,
    fail_close: bool,
    affected: u64,
    committed: usize,
    rolled_back: usize,
    next_transaction: u32,
}

/// Session handle; clones share the same session
#[derive(Debug, Clone)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
    dropped_commands: Arc<AtomicUsize>,
}

impl MockConnection {
    pub fn new(data_source: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                data_source: data_source.to_string(),
                connection_string: format!("Data Source={}", data_source),
                database: "main".to_string(),
                open: false,
                refuse_open: false,
                fail_close: false,
                affected: 1,
                committed: 0,
                rolled_back: 0,
                next_transaction: 1,
            })),
            dropped_commands: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn refusing_open(self) -> Self {
        self.state.lock().refuse_open = true;
        self
    }

    pub fn failing_close(self) -> Self {
        self.state.lock().fail_close = true;
        self
    }

    pub fn set_affected(&self, rows: u64) {
        self.state.lock().affected = rows;
    }

    pub fn same_session(&self, other: &MockConnection) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn committed(&self) -> usize {
        self.state.lock().committed
    }

    pub fn rolled_back(&self) -> usize {
        self.state.lock().rolled_back
    }

    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.state)
    }

    pub fn commands_dropped(&self) -> usize {
        self.dropped_commands.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    type Error = MockError;
    type Transaction = MockTransaction;
    type Command = MockCommand;

    fn connection_string(&self) -> String {
        self.state.lock().connection_string.clone()
    }

    fn set_connection_string(&mut self, connection_string: &str) -> Result<(), MockError> {
        self.state.lock().connection_string = connection_string.to_string();
        Ok(())
    }

    fn connection_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    fn database(&self) -> String {
        self.state.lock().database.clone()
    }

    fn data_source(&self) -> String {
        self.state.lock().data_source.clone()
    }

    fn server_version(&self) -> String {
        "mock 1.0".to_string()
    }

    fn state(&self) -> ConnectionState {
        if self.state.lock().open {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    fn open(&mut self) -> Result<(), MockError> {
        let mut state = self.state.lock();
        if state.refuse_open {
            return Err(MockError::OpenRefused(state.data_source.clone()));
        }
        state.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), MockError> {
        let mut state = self.state.lock();
        if state.fail_close {
            return Err(MockError::CloseFailed);
        }
        state.open = false;
        Ok(())
    }

    fn change_database(&mut self, database: &str) -> Result<(), MockError> {
        self.state.lock().database = database.to_string();
        Ok(())
    }

    fn begin_transaction(&mut self, level: IsolationLevel) -> Result<MockTransaction, MockError> {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_transaction;
            state.next_transaction += 1;
            id
        };
        Ok(MockTransaction {
            id,
            level,
            state: Arc::clone(&self.state),
            completed: Arc::new(AtomicBool::new(false)),
        })
    }

    fn create_command(&self) -> MockCommand {
        MockCommand {
            text: String::new(),
            timeout: Duration::from_secs(30),
            command_type: CommandType::Text,
            connection: Some(self.clone()),
            transaction: None,
            parameters: ParameterCollection::new(),
            prepared: false,
            cancelled: AtomicBool::new(false),
            dropped: Arc::clone(&self.dropped_commands),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockTransaction {
    id: u32,
    level: IsolationLevel,
    state: Arc<Mutex<MockState>>,
    completed: Arc<AtomicBool>,
}

impl MockTransaction {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Transaction for MockTransaction {
    type Error = MockError;

    fn isolation_level(&self) -> IsolationLevel {
        self.level
    }

    fn commit(&mut self) -> Result<(), MockError> {
        if self.completed.swap(true, Ordering::SeqCst) {
            return Err(MockError::TransactionCompleted);
        }
        self.state.lock().committed += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), MockError> {
        if self.completed.swap(true, Ordering::SeqCst) {
            return Err(MockError::TransactionCompleted);
        }
        self.state.lock().rolled_back += 1;
        Ok(())
    }
}

/// Command that fails on text starting with `Invalid`
#[derive(Debug)]
pub struct MockCommand {
    text: String,
    timeout: Duration,
    command_type: CommandType,
    connection: Option<MockConnection>,
    transaction: Option<MockTransaction>,
    parameters: ParameterCollection,
    prepared: bool,
    cancelled: AtomicBool,
    dropped: Arc<AtomicUsize>,
}

impl MockCommand {
    pub fn was_prepared(&self) -> bool {
        self.prepared
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), MockError> {
        if self.text.starts_with("Invalid") {
            return Err(MockError::Syntax(self.text.clone()));
        }
        Ok(())
    }

    fn affected(&self) -> u64 {
        self.connection
            .as_ref()
            .map(|connection| connection.state.lock().affected)
            .unwrap_or(1)
    }

    fn scalar(&self) -> Option<DatabaseValue> {
        if self.text.contains("EMPTY") {
            None
        } else {
            Some(DatabaseValue::Long(42))
        }
    }
}

impl Drop for MockCommand {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Command for MockCommand {
    type Error = MockError;
    type Connection = MockConnection;
    type Transaction = MockTransaction;
    type Reader = MockReader;

    fn command_text(&self) -> &str {
        &self.text
    }

    fn set_command_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn command_timeout(&self) -> Duration {
        self.timeout
    }

    fn set_command_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn command_type(&self) -> CommandType {
        self.command_type
    }

    fn set_command_type(&mut self, command_type: CommandType) {
        self.command_type = command_type;
    }

    fn connection(&self) -> Option<&MockConnection> {
        self.connection.as_ref()
    }

    fn set_connection(&mut self, connection: Option<MockConnection>) {
        self.connection = connection;
    }

    fn transaction(&self) -> Option<&MockTransaction> {
        self.transaction.as_ref()
    }

    fn set_transaction(&mut self, transaction: Option<MockTransaction>) {
        self.transaction = transaction;
    }

    fn parameters(&self) -> &ParameterCollection {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut ParameterCollection {
        &mut self.parameters
    }

    fn create_parameter(&self) -> Parameter {
        Parameter::default()
    }

    fn prepare(&mut self) -> Result<(), MockError> {
        self.prepared = true;
        Ok(())
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn execute_reader(&mut self, behavior: CommandBehavior) -> Result<MockReader, MockError> {
        self.check()?;
        let rows = match behavior {
            CommandBehavior::SchemaOnly => Vec::new(),
            CommandBehavior::SingleRow => vec![DatabaseValue::Int(1)],
            _ => (1..=3).map(DatabaseValue::Int).collect(),
        };
        Ok(MockReader {
            rows,
            position: None,
        })
    }

    fn execute_non_query(&mut self) -> Result<u64, MockError> {
        self.check()?;
        Ok(self.affected())
    }

    fn execute_scalar(&mut self) -> Result<Option<DatabaseValue>, MockError> {
        self.check()?;
        Ok(self.scalar())
    }

    async fn execute_reader_async(
        &mut self,
        behavior: CommandBehavior,
        cancel: &CancellationToken,
    ) -> Result<MockReader, MockError> {
        if cancel.is_cancelled() {
            return Err(MockError::Cancelled);
        }
        tokio::task::yield_now().await;
        self.execute_reader(behavior)
    }

    async fn execute_non_query_async(&mut self, cancel: &CancellationToken) -> Result<u64, MockError> {
        if cancel.is_cancelled() {
            return Err(MockError::Cancelled);
        }
        tokio::task::yield_now().await;
        self.execute_non_query()
    }

    async fn execute_scalar_async(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<DatabaseValue>, MockError> {
        if cancel.is_cancelled() {
            return Err(MockError::Cancelled);
        }
        tokio::task::yield_now().await;
        self.execute_scalar()
    }
}

/// Single-column reader over `value`
#[derive(Debug)]
pub struct MockReader {
    rows: Vec<DatabaseValue>,
    position: Option<usize>,
}

impl DataReader for MockReader {
    type Error = MockError;

    fn field_count(&self) -> usize {
        1
    }

    fn column_name(&self, ordinal: usize) -> Option<&str> {
        (ordinal == 0).then_some("value")
    }

    fn read(&mut self) -> Result<bool, MockError> {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next);
        Ok(next < self.rows.len())
    }

    fn get(&self, ordinal: usize) -> Option<&DatabaseValue> {
        if ordinal != 0 {
            return None;
        }
        self.position.and_then(|p| self.rows.get(p))
    }

    fn records_affected(&self) -> Option<u64> {
        None
    }
}
