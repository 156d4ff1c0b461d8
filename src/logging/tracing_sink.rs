use super::{render_template, Field, LogSink};
use serde_json::{Map, Value};
use tracing::Level;

/// Sink that emits every record as a `tracing` event
///
/// The rendered template becomes the event message and the fields are attached
/// as a single JSON `fields` attribute, so nested values such as parameter
/// snapshots survive intact. Rendering is skipped when the level is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Create a new tracing sink
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn trace(&self, template: &str, fields: &[Field]) {
        if tracing::enabled!(Level::TRACE) {
            let message = render_template(template, fields);
            tracing::trace!(fields = %fields_json(fields), "{}", message);
        }
    }

    fn debug(&self, template: &str, fields: &[Field]) {
        if tracing::enabled!(Level::DEBUG) {
            let message = render_template(template, fields);
            tracing::debug!(fields = %fields_json(fields), "{}", message);
        }
    }

    fn error(&self, template: &str, error: &(dyn std::error::Error + 'static), fields: &[Field]) {
        if tracing::enabled!(Level::ERROR) {
            let message = render_template(template, fields);
            tracing::error!(error = %error, fields = %fields_json(fields), "{}", message);
        }
    }
}

fn fields_json(fields: &[Field]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect();
    Value::Object(map)
}
