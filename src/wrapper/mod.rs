//! Logging decorators over any [`Connection`](crate::core::driver::Connection)
//!
//! [`LoggingConnection`], [`LoggingCommand`] and [`LoggingTransaction`] implement the
//! same driver traits as the objects they wrap, so they can replace them anywhere.
//! Every call is forwarded unchanged; the wrappers only add log records around
//! connection lifecycle events and command executions. Errors are the driver's own
//! type and are never translated.

mod command;
mod connection;
mod snapshot;
mod transaction;
mod unwrap;

#[cfg(test)]
pub(crate) mod testing;

pub use command::LoggingCommand;
pub use connection::LoggingConnection;
pub use snapshot::ParameterSnapshot;
pub use transaction::LoggingTransaction;
pub use unwrap::{ConnectionArg, TransactionArg, Unwrap};
