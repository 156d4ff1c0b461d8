use super::{render_template, Field, LogSink};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::Level;

/// A record captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Severity of the record
    pub level: Level,
    /// Message template as passed by the caller
    pub template: String,
    /// Template with the fields substituted
    pub message: String,
    /// Field values in the order they were given
    pub fields: Vec<(String, Value)>,
    /// Display text of the attached error, for error records
    pub error: Option<String>,
}

impl LogRecord {
    /// Value of the field called `name`
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// Sink that keeps every record in memory
///
/// Useful for asserting exactly what a wrapper logged, and for applications that
/// want to surface recent database activity themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record captured so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Records at the given level
    pub fn records_at(&self, level: Level) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .cloned()
            .collect()
    }

    /// Number of records captured at the given level
    pub fn count(&self, level: Level) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .count()
    }

    /// Total number of records captured
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop every captured record
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn push(&self, level: Level, template: &str, fields: &[Field], error: Option<String>) {
        let record = LogRecord {
            level,
            template: template.to_string(),
            message: render_template(template, fields),
            fields: fields
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
            error,
        };
        self.records.lock().push(record);
    }
}

impl LogSink for MemorySink {
    fn trace(&self, template: &str, fields: &[Field]) {
        self.push(Level::TRACE, template, fields, None);
    }

    fn debug(&self, template: &str, fields: &[Field]) {
        self.push(Level::DEBUG, template, fields, None);
    }

    fn error(&self, template: &str, error: &(dyn std::error::Error + 'static), fields: &[Field]) {
        self.push(Level::ERROR, template, fields, Some(error.to_string()));
    }
}
