//! Core driver abstractions
//!
//! This module provides the building blocks shared by drivers and wrappers:
//! the driver traits, parameters, values, state enums and the error type used by
//! the bundled backends.

pub mod database_types;
pub mod driver;
pub mod error;
pub mod execute;
pub mod parameter;
pub mod value;

// Re-export commonly used types
pub use database_types::{CommandBehavior, CommandType, ConnectionState, IsolationLevel};
pub use driver::{Command, Connection, DataReader, Transaction};
pub use error::{DatabaseError, Result};
pub use execute::ConnectionExt;
pub use parameter::{Parameter, ParameterCollection};
pub use value::DatabaseValue;
