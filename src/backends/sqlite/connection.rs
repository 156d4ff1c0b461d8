use super::command::SqliteCommand;
use super::options::SqliteConnectOptions;
use super::transaction::SqliteTransaction;
use crate::core::database_types::{ConnectionState, IsolationLevel};
use crate::core::driver::Connection;
use crate::core::error::{DatabaseError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::InterruptHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// State shared by every handle to one SQLite session
pub(crate) struct Session {
    options: Mutex<SqliteConnectOptions>,
    connection: Mutex<Option<rusqlite::Connection>>,
    interrupt: Mutex<Option<InterruptHandle>>,
    open: AtomicBool,
    pending_transaction: Mutex<Option<u64>>,
    next_transaction: AtomicU64,
}

impl Session {
    /// Run `f` against the open native connection
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> Result<T>,
    ) -> Result<T> {
        let connection = self.connection.lock();
        let conn = connection
            .as_ref()
            .ok_or_else(|| DatabaseError::connection("Connection is not open"))?;
        f(conn)
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub(crate) fn pending_transaction(&self) -> Option<u64> {
        *self.pending_transaction.lock()
    }

    /// Finish the pending transaction `id` with `sql` (`COMMIT` or `ROLLBACK`)
    pub(crate) fn complete_transaction(&self, id: u64, sql: &str) -> Result<()> {
        let mut pending = self.pending_transaction.lock();
        if *pending != Some(id) {
            return Err(DatabaseError::transaction(
                "Transaction is no longer active on its connection",
            ));
        }
        self.with_connection(|conn| Ok(conn.execute_batch(sql)?))?;
        *pending = None;
        Ok(())
    }

    /// Abort any statement currently running on the session
    pub(crate) fn interrupt(&self) {
        if let Some(handle) = self.interrupt.lock().as_ref() {
            handle.interrupt();
        }
    }
}

/// Connection to a SQLite database
///
/// A cheap handle: clones share the same session, so a command or transaction
/// holding a clone sees the connection open and close.
///
/// # Example
///
/// ```rust,no_run
/// use rust_database_logger::prelude::*;
///
/// # fn main() -> rust_database_logger::Result<()> {
/// let mut conn = SqliteConnection::new("Data Source=:memory:")?;
/// conn.open()?;
/// conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[])?;
/// conn.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqliteConnection {
    session: Arc<Session>,
}

impl SqliteConnection {
    /// Create a closed connection from a connection string
    ///
    /// A bare path or `:memory:` is accepted as the data source.
    pub fn new(connection_string: &str) -> Result<Self> {
        let options = if connection_string.contains('=') {
            SqliteConnectOptions::parse(connection_string)?
        } else {
            SqliteConnectOptions::new().data_source(connection_string.trim())
        };
        Ok(Self::with_options(options))
    }

    /// Create a closed connection from parsed options
    pub fn with_options(options: SqliteConnectOptions) -> Self {
        Self {
            session: Arc::new(Session {
                options: Mutex::new(options),
                connection: Mutex::new(None),
                interrupt: Mutex::new(None),
                open: AtomicBool::new(false),
                pending_transaction: Mutex::new(None),
                next_transaction: AtomicU64::new(1),
            }),
        }
    }

    /// Copy of the options the connection opens with
    pub fn options(&self) -> SqliteConnectOptions {
        self.session.options.lock().clone()
    }

    /// Whether `other` is a handle to the same session
    pub fn same_session(&self, other: &SqliteConnection) -> bool {
        Arc::ptr_eq(&self.session, &other.session)
    }

    /// Abort any statement currently running on this connection
    pub fn interrupt(&self) {
        self.session.interrupt();
    }

    /// Whether a transaction started on this connection is still pending
    pub fn in_transaction(&self) -> bool {
        self.session.pending_transaction().is_some()
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn open_native(options: &SqliteConnectOptions) -> Result<rusqlite::Connection> {
        let conn =
            rusqlite::Connection::open_with_flags(options.open_path(), options.open_flags())?;
        conn.busy_timeout(options.timeout())?;
        conn.pragma_update(None, "foreign_keys", options.foreign_keys_enabled())?;
        Ok(conn)
    }
}

impl Default for SqliteConnection {
    fn default() -> Self {
        Self::with_options(SqliteConnectOptions::default())
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("options", &*self.session.options.lock())
            .field("open", &self.session.is_open())
            .finish()
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    type Error = DatabaseError;
    type Transaction = SqliteTransaction;
    type Command = SqliteCommand;

    fn connection_string(&self) -> String {
        self.session.options.lock().to_connection_string()
    }

    fn set_connection_string(&mut self, connection_string: &str) -> Result<()> {
        if self.session.is_open() {
            return Err(DatabaseError::connection(
                "Cannot change the connection string of an open connection",
            ));
        }
        let options = SqliteConnectOptions::parse(connection_string)?;
        *self.session.options.lock() = options;
        Ok(())
    }

    fn connection_timeout(&self) -> Duration {
        self.session.options.lock().timeout()
    }

    fn database(&self) -> String {
        "main".to_string()
    }

    fn data_source(&self) -> String {
        self.session.options.lock().source().to_string()
    }

    fn server_version(&self) -> String {
        rusqlite::version().to_string()
    }

    fn state(&self) -> ConnectionState {
        if self.session.is_open() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    fn open(&mut self) -> Result<()> {
        let mut connection = self.session.connection.lock();
        if connection.is_some() {
            return Err(DatabaseError::connection("Connection is already open"));
        }

        let options = self.session.options.lock().clone();
        let conn = Self::open_native(&options)?;
        *self.session.interrupt.lock() = Some(conn.get_interrupt_handle());
        *connection = Some(conn);
        self.session.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn open_async(&mut self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        let mut this = self.clone();
        let mut task = tokio::task::spawn_blocking(move || this.open());

        let finished = tokio::select! {
            result = &mut task => Some(result),
            _ = cancel.cancelled() => None,
        };
        match finished {
            Some(result) => {
                result.map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))?
            }
            None => {
                // opening cannot be interrupted; wait for it and undo it
                if let Ok(Ok(())) = task.await {
                    let _ = self.close();
                }
                Err(DatabaseError::Cancelled)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        let Some(conn) = self.session.connection.lock().take() else {
            return Ok(());
        };

        self.session.open.store(false, Ordering::SeqCst);
        *self.session.interrupt.lock() = None;
        // closing the native connection rolls back whatever is still pending
        *self.session.pending_transaction.lock() = None;
        conn.close().map_err(|(_, e)| DatabaseError::from(e))
    }

    fn change_database(&mut self, database: &str) -> Result<()> {
        Err(DatabaseError::unsupported(format!(
            "SQLite cannot switch to database '{}'; attach it instead",
            database
        )))
    }

    fn begin_transaction(&mut self, level: IsolationLevel) -> Result<SqliteTransaction> {
        let mut pending = self.session.pending_transaction.lock();
        if pending.is_some() {
            return Err(DatabaseError::transaction(
                "SQLite does not support nested transactions",
            ));
        }

        self.session.with_connection(|conn| {
            let read_uncommitted = level == IsolationLevel::ReadUncommitted;
            conn.pragma_update(None, "read_uncommitted", read_uncommitted)?;
            conn.execute_batch(if read_uncommitted {
                "BEGIN"
            } else {
                "BEGIN IMMEDIATE"
            })?;
            Ok(())
        })?;

        let id = self.session.next_transaction.fetch_add(1, Ordering::SeqCst);
        *pending = Some(id);
        Ok(SqliteTransaction::new(id, level, Arc::clone(&self.session)))
    }

    fn create_command(&self) -> SqliteCommand {
        SqliteCommand::for_connection(self.clone())
    }
}
