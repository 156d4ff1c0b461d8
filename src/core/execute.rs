//! One-call execution helpers for any connection
//!
//! [`ConnectionExt`] is implemented for every [`Connection`], native or wrapped, and
//! runs a statement through a freshly created command. A closed connection is opened
//! for the duration of the call and closed again afterwards.
//!
//! ```rust,no_run
//! use rust_database_logger::prelude::*;
//!
//! # fn run(conn: &mut impl Connection) -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let rows = vec![
//!     vec![Parameter::new("Id", 1)],
//!     vec![Parameter::new("Id", 2)],
//! ];
//! let affected = conn.execute_many("INSERT INTO t VALUES (@Id)", &rows)?;
//! assert_eq!(affected, 2);
//! # Ok(())
//! # }
//! ```

use super::database_types::ConnectionState;
use super::driver::{Command, Connection};
use super::parameter::Parameter;
use super::value::DatabaseValue;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Execution shortcuts layered over [`Connection`]
#[async_trait]
pub trait ConnectionExt: Connection {
    /// Execute a statement and return the number of affected rows
    fn execute(&mut self, sql: &str, params: &[Parameter]) -> Result<u64, Self::Error> {
        let was_closed = self.state() == ConnectionState::Closed;
        if was_closed {
            self.open()?;
        }
        let result = build_command(self, sql, params).execute_non_query();
        finish(self, was_closed, result)
    }

    /// Execute a statement once per parameter set and return the total affected rows
    fn execute_many(&mut self, sql: &str, rows: &[Vec<Parameter>]) -> Result<u64, Self::Error> {
        let was_closed = self.state() == ConnectionState::Closed;
        if was_closed {
            self.open()?;
        }
        let mut command = build_command(self, sql, &[]);
        let mut result = Ok(0);
        for row in rows {
            command.parameters_mut().clear();
            command.parameters_mut().extend(row.iter().cloned());
            match command.execute_non_query() {
                Ok(affected) => {
                    result = result.map(|total| total + affected);
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        drop(command);
        finish(self, was_closed, result)
    }

    /// Execute a query and return the first column of its first row
    fn query_scalar(
        &mut self,
        sql: &str,
        params: &[Parameter],
    ) -> Result<Option<DatabaseValue>, Self::Error> {
        let was_closed = self.state() == ConnectionState::Closed;
        if was_closed {
            self.open()?;
        }
        let result = build_command(self, sql, params).execute_scalar();
        finish(self, was_closed, result)
    }

    /// Asynchronous [`ConnectionExt::execute`]
    async fn execute_async(
        &mut self,
        sql: &str,
        params: &[Parameter],
        cancel: &CancellationToken,
    ) -> Result<u64, Self::Error> {
        let was_closed = self.state() == ConnectionState::Closed;
        if was_closed {
            self.open_async(cancel).await?;
        }
        let mut command = build_command(self, sql, params);
        let result = command.execute_non_query_async(cancel).await;
        drop(command);
        finish(self, was_closed, result)
    }

    /// Asynchronous [`ConnectionExt::execute_many`]
    async fn execute_many_async(
        &mut self,
        sql: &str,
        rows: &[Vec<Parameter>],
        cancel: &CancellationToken,
    ) -> Result<u64, Self::Error> {
        let was_closed = self.state() == ConnectionState::Closed;
        if was_closed {
            self.open_async(cancel).await?;
        }
        let mut command = build_command(self, sql, &[]);
        let mut total = 0;
        let mut failure = None;
        for row in rows {
            command.parameters_mut().clear();
            command.parameters_mut().extend(row.iter().cloned());
            match command.execute_non_query_async(cancel).await {
                Ok(affected) => total += affected,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(command);
        let result = match failure {
            Some(e) => Err(e),
            None => Ok(total),
        };
        finish(self, was_closed, result)
    }

    /// Asynchronous [`ConnectionExt::query_scalar`]
    async fn query_scalar_async(
        &mut self,
        sql: &str,
        params: &[Parameter],
        cancel: &CancellationToken,
    ) -> Result<Option<DatabaseValue>, Self::Error> {
        let was_closed = self.state() == ConnectionState::Closed;
        if was_closed {
            self.open_async(cancel).await?;
        }
        let mut command = build_command(self, sql, params);
        let result = command.execute_scalar_async(cancel).await;
        drop(command);
        finish(self, was_closed, result)
    }
}

impl<C: Connection> ConnectionExt for C {}

fn build_command<C: Connection>(connection: &C, sql: &str, params: &[Parameter]) -> C::Command {
    let mut command = connection.create_command();
    command.set_command_text(sql);
    command.parameters_mut().extend(params.iter().cloned());
    command
}

/// Close a connection that was opened for a single call
///
/// On failure the close is best-effort so the original error reaches the caller.
fn finish<C: Connection, T>(
    connection: &mut C,
    was_closed: bool,
    result: Result<T, C::Error>,
) -> Result<T, C::Error> {
    if !was_closed {
        return result;
    }
    match result {
        Ok(value) => {
            connection.close()?;
            Ok(value)
        }
        Err(e) => {
            let _ = connection.close();
            Err(e)
        }
    }
}
