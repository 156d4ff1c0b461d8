//! Logging sinks consumed by the wrappers
//!
//! A [`LogSink`] receives structured records: a level, a message template with
//! `{name}` placeholders, and the named field values that fill them. Sinks are
//! injected into each wrapper as an `Arc<dyn LogSink>`; there is no global logger.
//!
//! - [`TracingSink`] forwards records to the `tracing` ecosystem.
//! - [`MemorySink`] keeps records in memory for inspection.

mod memory;
mod subscriber;
mod template;
mod tracing_sink;

pub use memory::{LogRecord, MemorySink};
pub use subscriber::{init_subscriber, InitError, LogConfig};
pub use template::render_template;
pub use tracing_sink::TracingSink;

use serde_json::Value;

/// A named field value attached to a record
pub type Field = (&'static str, Value);

/// Destination for the wrappers' log records
///
/// Implementations must not fail or block for long: records are written inline,
/// directly before and after the driver call they describe.
pub trait LogSink: Send + Sync {
    /// Record a trace-level event
    fn trace(&self, template: &str, fields: &[Field]);

    /// Record a debug-level event
    fn debug(&self, template: &str, fields: &[Field]);

    /// Record a failure together with the error that caused it
    fn error(&self, template: &str, error: &(dyn std::error::Error + 'static), fields: &[Field]);
}

/// Convert any serializable value into a field value
///
/// Values that cannot be represented as JSON become `null`.
pub fn field_value<T: serde::Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
