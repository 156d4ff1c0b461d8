//! Unwrapping logging wrappers back to driver objects
//!
//! Driver slots (a command's connection or transaction) only ever hold native
//! objects. Values handed to a [`super::LoggingCommand`] are tagged as either
//! native or wrapped, and wrapped ones are unwrapped before reaching the driver.

use super::connection::LoggingConnection;
use super::transaction::LoggingTransaction;
use crate::core::driver::Connection;

/// Access to the native object inside a logging wrapper
pub trait Unwrap {
    /// The driver type being wrapped
    type Native;

    /// Borrow the native object
    fn unwrap_native(&self) -> &Self::Native;

    /// Consume the wrapper and return the native object
    fn into_native(self) -> Self::Native;
}

/// A connection as supplied to a command: native or wrapped
#[derive(Clone)]
pub enum ConnectionArg<C: Connection> {
    /// A driver connection, used as is
    Native(C),
    /// A logging wrapper, unwrapped before use
    Logging(LoggingConnection<C>),
}

impl<C: Connection> ConnectionArg<C> {
    /// The driver connection this value refers to
    pub fn native(&self) -> &C {
        match self {
            ConnectionArg::Native(connection) => connection,
            ConnectionArg::Logging(wrapper) => wrapper.unwrap_native(),
        }
    }

    /// Whether the value is a logging wrapper
    pub fn is_wrapped(&self) -> bool {
        matches!(self, ConnectionArg::Logging(_))
    }

    /// The logging wrapper, if this value is one
    pub fn as_logging(&self) -> Option<&LoggingConnection<C>> {
        match self {
            ConnectionArg::Logging(wrapper) => Some(wrapper),
            ConnectionArg::Native(_) => None,
        }
    }
}

impl<C: Connection> From<C> for ConnectionArg<C> {
    fn from(connection: C) -> Self {
        ConnectionArg::Native(connection)
    }
}

impl<C: Connection> From<LoggingConnection<C>> for ConnectionArg<C> {
    fn from(wrapper: LoggingConnection<C>) -> Self {
        ConnectionArg::Logging(wrapper)
    }
}

/// A transaction as supplied to a command: native or wrapped
#[derive(Clone)]
pub enum TransactionArg<C: Connection> {
    /// A driver transaction, used as is
    Native(C::Transaction),
    /// A logging wrapper, unwrapped before use
    Logging(LoggingTransaction<C>),
}

impl<C: Connection> TransactionArg<C> {
    /// The driver transaction this value refers to
    pub fn native(&self) -> &C::Transaction {
        match self {
            TransactionArg::Native(transaction) => transaction,
            TransactionArg::Logging(wrapper) => wrapper.unwrap_native(),
        }
    }

    /// Whether the value is a logging wrapper
    pub fn is_wrapped(&self) -> bool {
        matches!(self, TransactionArg::Logging(_))
    }

    /// The logging wrapper, if this value is one
    pub fn as_logging(&self) -> Option<&LoggingTransaction<C>> {
        match self {
            TransactionArg::Logging(wrapper) => Some(wrapper),
            TransactionArg::Native(_) => None,
        }
    }
}

impl<C: Connection> From<LoggingTransaction<C>> for TransactionArg<C> {
    fn from(wrapper: LoggingTransaction<C>) -> Self {
        TransactionArg::Logging(wrapper)
    }
}
