use super::connection::{Session, SqliteConnection};
use super::reader::SqliteDataReader;
use super::transaction::SqliteTransaction;
use crate::core::database_types::{CommandBehavior, CommandType};
use crate::core::driver::{Command, Connection};
use crate::core::error::{DatabaseError, Result};
use crate::core::parameter::{Parameter, ParameterCollection};
use crate::core::value::DatabaseValue;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::options::DEFAULT_TIMEOUT;

/// Everything a worker thread needs to run one statement
struct Request {
    sql: String,
    parameters: ParameterCollection,
    timeout: Duration,
}

/// A SQL statement bound to a [`SqliteConnection`]
///
/// Parameters are matched to the statement by name (`@Id`, `:Id` and `$Id` all match
/// a parameter called `Id`) or, for `?` placeholders, by position.
#[derive(Debug, Clone)]
pub struct SqliteCommand {
    text: String,
    timeout: Duration,
    command_type: CommandType,
    connection: Option<SqliteConnection>,
    transaction: Option<SqliteTransaction>,
    parameters: ParameterCollection,
}

impl SqliteCommand {
    /// Create a command with no connection
    pub fn new() -> Self {
        Self {
            text: String::new(),
            timeout: DEFAULT_TIMEOUT,
            command_type: CommandType::Text,
            connection: None,
            transaction: None,
            parameters: ParameterCollection::new(),
        }
    }

    pub(crate) fn for_connection(connection: SqliteConnection) -> Self {
        Self {
            timeout: connection.connection_timeout(),
            connection: Some(connection),
            ..Self::new()
        }
    }

    fn session(&self) -> Result<&Arc<Session>> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| DatabaseError::connection("Command has no connection"))?;
        let session = connection.session();
        if !session.is_open() {
            return Err(DatabaseError::connection("Connection is not open"));
        }
        Ok(session)
    }

    fn statement_text(&self) -> Result<String> {
        if self.text.trim().is_empty() {
            return Err(DatabaseError::query("Command text has not been set"));
        }
        match self.command_type {
            CommandType::Text => Ok(self.text.clone()),
            CommandType::TableDirect => {
                Ok(format!("SELECT * FROM \"{}\"", self.text.replace('"', "\"\"")))
            }
            CommandType::StoredProcedure => Err(DatabaseError::unsupported(
                "SQLite does not support stored procedures",
            )),
        }
    }

    /// Validate the command and capture what a worker needs to run it
    fn request(&self) -> Result<(Arc<Session>, Request)> {
        let session = self.session()?;

        match (&self.transaction, session.pending_transaction()) {
            (Some(transaction), _) if transaction.is_pending_on(session) => {}
            (Some(_), _) => {
                return Err(DatabaseError::transaction(
                    "The command's transaction has completed or belongs to another connection",
                ))
            }
            (None, Some(_)) => {
                return Err(DatabaseError::transaction(
                    "The connection has a pending transaction; set the command's transaction first",
                ))
            }
            (None, None) => {}
        }

        let request = Request {
            sql: self.statement_text()?,
            parameters: self.parameters.clone(),
            timeout: self.timeout,
        };
        Ok((Arc::clone(session), request))
    }
}

impl Default for SqliteCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind every statement parameter, failing on the first one with no value
fn bind(stmt: &mut rusqlite::Statement<'_>, parameters: &ParameterCollection) -> Result<()> {
    for index in 1..=stmt.parameter_count() {
        let name = stmt.parameter_name(index).map(str::to_owned);
        let parameter = match name.as_deref() {
            Some(name) if !name.starts_with('?') => parameters.get(name),
            _ => parameters.at(index - 1),
        };
        let parameter = parameter.ok_or_else(|| {
            DatabaseError::missing_parameter(name.unwrap_or_else(|| format!("?{}", index)))
        })?;
        stmt.raw_bind_parameter(index, parameter.value())?;
    }
    Ok(())
}

fn run_non_query(conn: &rusqlite::Connection, request: &Request) -> Result<u64> {
    conn.busy_timeout(request.timeout)?;
    let mut stmt = conn.prepare_cached(&request.sql)?;
    bind(&mut stmt, &request.parameters)?;

    let readonly = stmt.readonly();
    let mut rows = stmt.raw_query();
    while rows.next()?.is_some() {}
    drop(rows);

    Ok(if readonly { 0 } else { conn.changes() as u64 })
}

fn run_scalar(conn: &rusqlite::Connection, request: &Request) -> Result<Option<DatabaseValue>> {
    conn.busy_timeout(request.timeout)?;
    let mut stmt = conn.prepare_cached(&request.sql)?;
    bind(&mut stmt, &request.parameters)?;

    let mut rows = stmt.raw_query();
    match rows.next()? {
        Some(row) => Ok(Some(DatabaseValue::from(row.get_ref(0)?))),
        None => Ok(None),
    }
}

fn run_reader(
    conn: &rusqlite::Connection,
    request: &Request,
    behavior: CommandBehavior,
) -> Result<SqliteDataReader> {
    conn.busy_timeout(request.timeout)?;
    let mut stmt = conn.prepare_cached(&request.sql)?;
    bind(&mut stmt, &request.parameters)?;

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let readonly = stmt.readonly();
    let mut data = Vec::new();

    if behavior != CommandBehavior::SchemaOnly {
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|i| row.get_ref(i).map(DatabaseValue::from))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            data.push(values);
            if behavior == CommandBehavior::SingleRow {
                break;
            }
        }
    }

    let affected = if readonly {
        None
    } else {
        Some(conn.changes() as u64)
    };
    Ok(SqliteDataReader::new(columns, data, affected))
}

/// Virtual machine steps between two checks of a request's abort flag
const PROGRESS_STEPS: i32 = 1_000;

/// Run `job` on the blocking pool, aborting it if `cancel` fires first
///
/// The abort flag belongs to this request alone. The worker checks it once it
/// holds the session and through a progress handler while its statement runs,
/// so cancelling never touches another command's statement.
async fn dispatch<T, F>(
    session: Arc<Session>,
    request: Request,
    cancel: &CancellationToken,
    job: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection, &Request) -> Result<T> + Send + 'static,
{
    let aborted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&aborted);
    let mut task = tokio::task::spawn_blocking(move || {
        session.with_connection(|conn| {
            if flag.load(Ordering::SeqCst) {
                return Err(DatabaseError::Cancelled);
            }
            let handler_flag = Arc::clone(&flag);
            conn.progress_handler(
                PROGRESS_STEPS,
                Some(move || handler_flag.load(Ordering::SeqCst)),
            );
            let result = job(conn, &request);
            conn.progress_handler(0, None::<fn() -> bool>);
            result
        })
    });

    let finished = tokio::select! {
        result = &mut task => Some(result),
        _ = cancel.cancelled() => None,
    };
    match finished {
        Some(result) => {
            result.map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))?
        }
        None => {
            aborted.store(true, Ordering::SeqCst);
            // the worker stops at its next check; wait so the session is free again
            let _ = task.await;
            Err(DatabaseError::Cancelled)
        }
    }
}

#[async_trait]
impl Command for SqliteCommand {
    type Error = DatabaseError;
    type Connection = SqliteConnection;
    type Transaction = SqliteTransaction;
    type Reader = SqliteDataReader;

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

    fn connection(&self) -> Option<&SqliteConnection> {
        self.connection.as_ref()
    }

    fn set_connection(&mut self, connection: Option<SqliteConnection>) {
        self.connection = connection;
    }

    fn transaction(&self) -> Option<&SqliteTransaction> {
        self.transaction.as_ref()
    }

    fn set_transaction(&mut self, transaction: Option<SqliteTransaction>) {
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

    fn prepare(&mut self) -> Result<()> {
        let sql = self.statement_text()?;
        self.session()?.with_connection(|conn| {
            conn.prepare_cached(&sql)?;
            Ok(())
        })
    }

    fn cancel(&self) {
        if let Some(connection) = &self.connection {
            connection.interrupt();
        }
    }

    fn execute_reader(&mut self, behavior: CommandBehavior) -> Result<SqliteDataReader> {
        let (session, request) = self.request()?;
        session.with_connection(|conn| run_reader(conn, &request, behavior))
    }

    fn execute_non_query(&mut self) -> Result<u64> {
        let (session, request) = self.request()?;
        session.with_connection(|conn| run_non_query(conn, &request))
    }

    fn execute_scalar(&mut self) -> Result<Option<DatabaseValue>> {
        let (session, request) = self.request()?;
        session.with_connection(|conn| run_scalar(conn, &request))
    }

    async fn execute_reader_async(
        &mut self,
        behavior: CommandBehavior,
        cancel: &CancellationToken,
    ) -> Result<SqliteDataReader> {
        if cancel.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        let (session, request) = self.request()?;
        dispatch(session, request, cancel, move |conn, request| {
            run_reader(conn, request, behavior)
        })
        .await
    }

    async fn execute_non_query_async(&mut self, cancel: &CancellationToken) -> Result<u64> {
        if cancel.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        let (session, request) = self.request()?;
        dispatch(session, request, cancel, run_non_query).await
    }

    async fn execute_scalar_async(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<DatabaseValue>> {
        if cancel.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        let (session, request) = self.request()?;
        dispatch(session, request, cancel, run_scalar).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database_types::IsolationLevel;
    use crate::core::driver::{DataReader, Transaction};

    fn setup() -> Result<SqliteConnection> {
        let mut conn = SqliteConnection::new(":memory:")?;
        conn.open()?;
        let mut cmd = conn.create_command();
        cmd.set_command_text("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)");
        cmd.execute_non_query()?;
        Ok(conn)
    }

    fn command(conn: &SqliteConnection, sql: &str) -> SqliteCommand {
        let mut cmd = conn.create_command();
        cmd.set_command_text(sql);
        cmd
    }

    #[test]
    fn test_named_parameters_ignore_prefix() -> Result<()> {
        let conn = setup()?;
        for (i, sql) in [
            "INSERT INTO t (id, name) VALUES (@Id, @Name)",
            "INSERT INTO t (id, name) VALUES (:Id, :Name)",
            "INSERT INTO t (id, name) VALUES ($Id, $Name)",
        ]
        .into_iter()
        .enumerate()
        {
            let mut cmd = command(&conn, sql);
            cmd.parameters_mut().add_with_value("Id", i as i64 + 1);
            cmd.parameters_mut().add_with_value("@Name", "n");
            assert_eq!(cmd.execute_non_query()?, 1);
        }

        let mut cmd = command(&conn, "SELECT COUNT(*) FROM t WHERE name = @Name");
        cmd.parameters_mut().add_with_value("Name", "n");
        assert_eq!(cmd.execute_scalar()?, Some(DatabaseValue::Long(3)));
        Ok(())
    }

    #[test]
    fn test_positional_parameters() -> Result<()> {
        let conn = setup()?;
        let mut cmd = command(&conn, "INSERT INTO t (id, name) VALUES (?, ?)");
        cmd.parameters_mut().add_with_value("", 10);
        cmd.parameters_mut().add_with_value("", "ten");
        assert_eq!(cmd.execute_non_query()?, 1);

        let mut cmd = command(&conn, "SELECT name FROM t WHERE id = ?1");
        cmd.parameters_mut().add_with_value("", 10);
        assert_eq!(cmd.execute_scalar()?, Some(DatabaseValue::from("ten")));
        Ok(())
    }

    #[test]
    fn test_missing_parameter() -> Result<()> {
        let conn = setup()?;
        let mut cmd = command(&conn, "INSERT INTO t (id) VALUES (@Id)");
        let err = cmd.execute_non_query().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Must add values for the following parameters: @Id"
        );
        Ok(())
    }

    #[test]
    fn test_non_query_counts() -> Result<()> {
        let conn = setup()?;
        let mut cmd = command(&conn, "INSERT INTO t (id) VALUES (1), (2), (3)");
        assert_eq!(cmd.execute_non_query()?, 3);

        let mut cmd = command(&conn, "UPDATE t SET name = 'x' WHERE id > 1");
        assert_eq!(cmd.execute_non_query()?, 2);

        let mut cmd = command(&conn, "SELECT * FROM t");
        assert_eq!(cmd.execute_non_query()?, 0);
        Ok(())
    }

    #[test]
    fn test_scalar_distinguishes_no_rows_from_null() -> Result<()> {
        let conn = setup()?;
        let mut cmd = command(&conn, "SELECT name FROM t");
        assert_eq!(cmd.execute_scalar()?, None);

        let mut cmd = command(&conn, "SELECT NULL");
        assert_eq!(cmd.execute_scalar()?, Some(DatabaseValue::Null));
        Ok(())
    }

    #[test]
    fn test_reader_behaviors() -> Result<()> {
        let conn = setup()?;
        command(&conn, "INSERT INTO t (id, name) VALUES (1, 'a'), (2, 'b')").execute_non_query()?;

        let mut reader =
            command(&conn, "SELECT id, name FROM t ORDER BY id").execute_reader(CommandBehavior::Default)?;
        assert_eq!(reader.field_count(), 2);
        assert_eq!(reader.column_name(1), Some("name"));
        assert_eq!(reader.records_affected(), None);
        let mut ids = Vec::new();
        while reader.read()? {
            ids.push(reader.get(0).cloned());
        }
        assert_eq!(ids, vec![Some(DatabaseValue::Long(1)), Some(DatabaseValue::Long(2))]);

        let mut reader = command(&conn, "SELECT id FROM t").execute_reader(CommandBehavior::SingleRow)?;
        assert!(reader.read()?);
        assert!(!reader.read()?);

        let mut reader = command(&conn, "SELECT id FROM t").execute_reader(CommandBehavior::SchemaOnly)?;
        assert_eq!(reader.field_count(), 1);
        assert!(!reader.read()?);

        let reader = command(&conn, "DELETE FROM t").execute_reader(CommandBehavior::Default)?;
        assert_eq!(reader.records_affected(), Some(2));
        Ok(())
    }

    #[test]
    fn test_command_types() -> Result<()> {
        let conn = setup()?;
        let mut cmd = command(&conn, "t");
        cmd.set_command_type(CommandType::TableDirect);
        assert_eq!(cmd.execute_reader(CommandBehavior::Default)?.field_count(), 2);

        cmd.set_command_type(CommandType::StoredProcedure);
        assert!(matches!(
            cmd.execute_non_query(),
            Err(DatabaseError::UnsupportedOperation(_))
        ));

        let mut empty = command(&conn, "  ");
        assert!(matches!(empty.execute_non_query(), Err(DatabaseError::QueryError(_))));
        Ok(())
    }

    #[test]
    fn test_requires_open_connection() -> Result<()> {
        let mut detached = SqliteCommand::new();
        detached.set_command_text("SELECT 1");
        assert!(matches!(
            detached.execute_scalar(),
            Err(DatabaseError::ConnectionError(_))
        ));

        let closed = SqliteConnection::new(":memory:")?;
        assert!(matches!(
            command(&closed, "SELECT 1").execute_scalar(),
            Err(DatabaseError::ConnectionError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_pending_transaction_must_be_assigned() -> Result<()> {
        let mut conn = setup()?;
        let mut tx = conn.begin_transaction(IsolationLevel::Serializable)?;

        let mut cmd = command(&conn, "INSERT INTO t (id) VALUES (1)");
        assert!(matches!(
            cmd.execute_non_query(),
            Err(DatabaseError::TransactionError(_))
        ));

        cmd.set_transaction(Some(tx.clone()));
        assert_eq!(cmd.execute_non_query()?, 1);
        tx.commit()?;

        // a completed transaction can no longer be used
        cmd.set_command_text("INSERT INTO t (id) VALUES (2)");
        assert!(matches!(
            cmd.execute_non_query(),
            Err(DatabaseError::TransactionError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_sql_errors_surface_as_sqlite_errors() -> Result<()> {
        let conn = setup()?;
        let err = command(&conn, "Invalid SQL").execute_non_query().unwrap_err();
        assert!(matches!(err, DatabaseError::SqliteError(_)));
        Ok(())
    }

    #[test]
    fn test_prepare() -> Result<()> {
        let conn = setup()?;
        command(&conn, "SELECT id FROM t").prepare()?;
        assert!(command(&conn, "SELECT nope FROM t").prepare().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_async_execution() -> Result<()> {
        let conn = setup()?;
        let cancel = CancellationToken::new();

        let mut cmd = command(&conn, "INSERT INTO t (id) VALUES (@Id)");
        cmd.parameters_mut().add_with_value("@Id", 7);
        assert_eq!(cmd.execute_non_query_async(&cancel).await?, 1);

        let mut cmd = command(&conn, "SELECT id FROM t");
        assert_eq!(
            cmd.execute_scalar_async(&cancel).await?,
            Some(DatabaseValue::Long(7))
        );
        let mut reader = cmd
            .execute_reader_async(CommandBehavior::Default, &cancel)
            .await?;
        assert!(reader.read()?);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_token_fails_before_dispatch() -> Result<()> {
        let conn = setup()?;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut cmd = command(&conn, "INSERT INTO t (id) VALUES (1)");
        let err = cmd.execute_non_query_async(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());

        let mut check = command(&conn, "SELECT COUNT(*) FROM t");
        assert_eq!(check.execute_scalar()?, Some(DatabaseValue::Long(0)));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_running_statement() -> Result<()> {
        let conn = setup()?;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let mut cmd = command(
            &conn,
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT COUNT(*) FROM c",
        );
        let err = cmd.execute_scalar_async(&cancel).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Cancelled));

        // the session is usable again afterwards
        let mut next = command(&conn, "SELECT 1");
        assert_eq!(next.execute_scalar()?, Some(DatabaseValue::Long(1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelling_a_queued_command_spares_the_running_one() -> Result<()> {
        let conn = setup()?;

        let mut running = command(
            &conn,
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 2000000) \
             SELECT COUNT(*) FROM c",
        );
        let first = tokio::spawn(async move {
            running.execute_scalar_async(&CancellationToken::new()).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let mut queued = command(&conn, "INSERT INTO t (id) VALUES (99)");
        let err = queued.execute_non_query_async(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());

        let total = first.await.expect("task panicked")?;
        assert_eq!(total, Some(DatabaseValue::Long(2_000_000)));

        // the cancelled insert never ran
        let mut check = command(&conn, "SELECT COUNT(*) FROM t WHERE id = 99");
        assert_eq!(check.execute_scalar()?, Some(DatabaseValue::Long(0)));
        Ok(())
    }
}
