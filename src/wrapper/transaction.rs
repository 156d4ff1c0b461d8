//! Logging decorator for transactions

use super::connection::LoggingConnection;
use super::unwrap::Unwrap;
use crate::core::database_types::IsolationLevel;
use crate::core::driver::{Connection, Transaction};
use std::fmt;

/// A transaction started through a [`LoggingConnection`]
///
/// Purely structural: commits and rollbacks are forwarded without logging, since
/// the commands run under the transaction already log themselves. It exists so a
/// command can recognise the wrapper and enlist the native transaction instead.
pub struct LoggingTransaction<C: Connection> {
    transaction: C::Transaction,
    connection: LoggingConnection<C>,
}

impl<C: Connection> LoggingTransaction<C> {
    /// Wrap a native transaction started on `connection`'s session
    pub fn new(transaction: C::Transaction, connection: LoggingConnection<C>) -> Self {
        Self {
            transaction,
            connection,
        }
    }

    /// The native transaction
    pub fn wrapped_transaction(&self) -> &C::Transaction {
        &self.transaction
    }

    /// The connection the transaction was started on
    pub fn connection(&self) -> &LoggingConnection<C> {
        &self.connection
    }
}

impl<C: Connection> Clone for LoggingTransaction<C> {
    fn clone(&self) -> Self {
        Self {
            transaction: self.transaction.clone(),
            connection: self.connection.clone(),
        }
    }
}

impl<C: Connection> fmt::Debug for LoggingTransaction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingTransaction")
            .field("isolation_level", &self.transaction.isolation_level())
            .field("connection", &self.connection)
            .finish()
    }
}

impl<C: Connection> Unwrap for LoggingTransaction<C> {
    type Native = C::Transaction;

    fn unwrap_native(&self) -> &C::Transaction {
        &self.transaction
    }

    fn into_native(self) -> C::Transaction {
        self.transaction
    }
}

impl<C: Connection> Transaction for LoggingTransaction<C> {
    type Error = C::Error;

    fn isolation_level(&self) -> IsolationLevel {
        self.transaction.isolation_level()
    }

    fn commit(&mut self) -> Result<(), C::Error> {
        self.transaction.commit()
    }

    fn rollback(&mut self) -> Result<(), C::Error> {
        self.transaction.rollback()
    }
}
