use tracing_subscriber::EnvFilter;

/// Errors raised while installing the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The filter directive could not be parsed
    #[error("Invalid log filter '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },

    /// A global subscriber was already installed
    #[error("Logger already initialized or failed to set global default subscriber: {0}")]
    AlreadyInitialized(String),
}

/// Settings for the process-wide `tracing` subscriber
///
/// The wrappers never require this: any subscriber works with [`super::TracingSink`].
/// It exists for binaries and demos that want sensible output with one call.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set (e.g. `"rust_database_logger=debug"`)
    pub filter: String,
    /// Emit ANSI colour codes
    pub ansi: bool,
    /// Include the event target in each line
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// Configuration that shows every record the wrappers emit
    pub fn verbose() -> Self {
        Self {
            filter: "rust_database_logger=trace".to_string(),
            ..Self::default()
        }
    }

    /// Set the fallback filter directive
    pub fn filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.filter = filter.into();
        self
    }

    /// Enable or disable ANSI colours
    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Build the effective filter; `RUST_LOG` takes precedence
    pub fn env_filter(&self) -> Result<EnvFilter, InitError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.filter).map_err(|e| InitError::InvalidFilter {
                directive: self.filter.clone(),
                message: e.to_string(),
            }),
        }
    }
}

/// Install a global fmt subscriber built from `config`
pub fn init_subscriber(config: &LogConfig) -> Result<(), InitError> {
    let filter = config.env_filter()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| InitError::AlreadyInitialized(e.to_string()))
}
