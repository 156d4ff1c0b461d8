//! Database driver implementations
//!
//! This module contains concrete implementations of the driver traits in
//! [`crate::core::driver`]. Any of them can be wrapped in a
//! [`LoggingConnection`](crate::wrapper::LoggingConnection).

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{
    SqliteCommand, SqliteConnectOptions, SqliteConnection, SqliteDataReader, SqliteTransaction,
};
