//! Connection string parsing for the SQLite driver
//!
//! Connection strings are `key=value` pairs separated by `;`, for example
//! `Data Source=app.db;Mode=ReadWrite;Default Timeout=5`. Keys are matched
//! case-insensitively and spaces inside them are ignored, so `DataSource` and
//! `data source` name the same setting.

use crate::core::error::{DatabaseError, Result};
use rusqlite::OpenFlags;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default busy timeout (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MEMORY: &str = ":memory:";

/// How the database file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Open for reading and writing, creating the file if needed
    #[default]
    ReadWriteCreate,
    /// Open for reading and writing; the file must exist
    ReadWrite,
    /// Open read-only
    ReadOnly,
    /// Keep the database purely in memory
    Memory,
}

impl OpenMode {
    fn to_str(self) -> &'static str {
        match self {
            OpenMode::ReadWriteCreate => "ReadWriteCreate",
            OpenMode::ReadWrite => "ReadWrite",
            OpenMode::ReadOnly => "ReadOnly",
            OpenMode::Memory => "Memory",
        }
    }
}

impl FromStr for OpenMode {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "readwritecreate" => Ok(OpenMode::ReadWriteCreate),
            "readwrite" => Ok(OpenMode::ReadWrite),
            "readonly" => Ok(OpenMode::ReadOnly),
            "memory" => Ok(OpenMode::Memory),
            _ => Err(DatabaseError::invalid_connection_string(format!(
                "Invalid Mode value '{}'",
                s
            ))),
        }
    }
}

/// Page cache sharing between connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Whatever the SQLite library defaults to
    #[default]
    Default,
    /// A cache private to the connection
    Private,
    /// A cache shared with other connections to the same database
    Shared,
}

impl CacheMode {
    fn to_str(self) -> &'static str {
        match self {
            CacheMode::Default => "Default",
            CacheMode::Private => "Private",
            CacheMode::Shared => "Shared",
        }
    }
}

impl FromStr for CacheMode {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(CacheMode::Default),
            "private" => Ok(CacheMode::Private),
            "shared" => Ok(CacheMode::Shared),
            _ => Err(DatabaseError::invalid_connection_string(format!(
                "Invalid Cache value '{}'",
                s
            ))),
        }
    }
}

/// Settings for opening a SQLite connection
///
/// # Example
///
/// ```rust
/// use rust_database_logger::backends::sqlite::{CacheMode, SqliteConnectOptions};
///
/// let options = SqliteConnectOptions::new()
///     .data_source(":memory:")
///     .cache(CacheMode::Shared);
/// assert_eq!(
///     SqliteConnectOptions::parse(&options.to_connection_string()).unwrap(),
///     options
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConnectOptions {
    data_source: String,
    mode: OpenMode,
    cache: CacheMode,
    default_timeout: Duration,
    foreign_keys: bool,
}

impl Default for SqliteConnectOptions {
    fn default() -> Self {
        Self {
            data_source: String::new(),
            mode: OpenMode::default(),
            cache: CacheMode::default(),
            default_timeout: DEFAULT_TIMEOUT,
            foreign_keys: true,
        }
    }
}

impl SqliteConnectOptions {
    /// Create options with every setting at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a connection string
    pub fn parse(connection_string: &str) -> Result<Self> {
        let mut options = Self::default();

        for pair in connection_string.split(';') {
            if pair.trim().is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                DatabaseError::invalid_connection_string(format!(
                    "Expected key=value, found '{}'",
                    pair.trim()
                ))
            })?;
            let value = value.trim();

            let key: String = key
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();

            match key.as_str() {
                "datasource" | "filename" => options.data_source = value.to_string(),
                "mode" => options.mode = value.parse()?,
                "cache" => options.cache = value.parse()?,
                "defaulttimeout" => {
                    let seconds: u64 = value.parse().map_err(|_| {
                        DatabaseError::invalid_connection_string(format!(
                            "Invalid Default Timeout value '{}'",
                            value
                        ))
                    })?;
                    options.default_timeout = Duration::from_secs(seconds);
                }
                "foreignkeys" => options.foreign_keys = parse_bool(value)?,
                _ => {
                    return Err(DatabaseError::invalid_connection_string(format!(
                        "Unknown keyword '{}'",
                        key
                    )))
                }
            }
        }

        Ok(options)
    }

    /// Set the database file, or `:memory:`
    pub fn data_source<S: Into<String>>(mut self, data_source: S) -> Self {
        self.data_source = data_source.into();
        self
    }

    /// Set the open mode
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the cache mode
    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    /// Set the busy timeout, truncated to whole seconds in connection strings
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Enable or disable foreign key enforcement
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn source(&self) -> &str {
        &self.data_source
    }

    pub fn open_mode(&self) -> OpenMode {
        self.mode
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache
    }

    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn foreign_keys_enabled(&self) -> bool {
        self.foreign_keys
    }

    /// Render the options as a connection string
    pub fn to_connection_string(&self) -> String {
        format!(
            "Data Source={};Mode={};Cache={};Default Timeout={};Foreign Keys={}",
            self.data_source,
            self.mode.to_str(),
            self.cache.to_str(),
            self.default_timeout.as_secs(),
            if self.foreign_keys { "True" } else { "False" }
        )
    }

    /// Whether the database lives in memory only
    pub fn is_memory(&self) -> bool {
        self.mode == OpenMode::Memory || self.data_source == MEMORY
    }

    /// Path handed to SQLite together with [`Self::open_flags`]
    pub(crate) fn open_path(&self) -> String {
        if self.data_source == MEMORY && self.cache == CacheMode::Shared {
            "file::memory:?cache=shared".to_string()
        } else {
            self.data_source.clone()
        }
    }

    pub(crate) fn open_flags(&self) -> OpenFlags {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        flags |= match self.mode {
            OpenMode::ReadWriteCreate => {
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            OpenMode::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
            OpenMode::Memory => {
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_MEMORY
            }
        };
        match self.cache {
            CacheMode::Default => {}
            CacheMode::Private => flags |= OpenFlags::SQLITE_OPEN_PRIVATE_CACHE,
            CacheMode::Shared => flags |= OpenFlags::SQLITE_OPEN_SHARED_CACHE,
        }
        flags
    }
}

impl FromStr for SqliteConnectOptions {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SqliteConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_connection_string())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(DatabaseError::invalid_connection_string(format!(
            "Invalid Foreign Keys value '{}'",
            value
        ))),
    }
}
