//! SQLite driver
//!
//! Implements the native driver traits over `rusqlite`. Blocking work for the async
//! variants runs on the blocking thread pool, and a cancelled token interrupts the
//! statement in flight.

mod command;
mod connection;
mod options;
mod reader;
mod transaction;
mod value;

pub use command::SqliteCommand;
pub use connection::SqliteConnection;
pub use options::{CacheMode, OpenMode, SqliteConnectOptions, DEFAULT_TIMEOUT};
pub use reader::SqliteDataReader;
pub use transaction::SqliteTransaction;
