//! Error types for the bundled database driver
//!
//! The logging wrappers never construct errors of their own: they are generic over the
//! driver's `Connection::Error` and hand back whatever the driver returned. This enum is
//! the error type of the SQLite driver shipped with the crate.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Connection error (not open, already open, ...)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Invalid connection string
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Query execution error raised by the driver itself
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// A statement parameter had no bound value
    #[error("Must add values for the following parameters: {0}")]
    MissingParameter(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Unsupported operation
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The operation was cancelled through its cancellation token
    #[error("Operation was cancelled")]
    Cancelled,

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConnectionError(msg.into())
    }

    /// Create an invalid connection string error
    pub fn invalid_connection_string<S: Into<String>>(msg: S) -> Self {
        DatabaseError::InvalidConnectionString(msg.into())
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        DatabaseError::QueryError(msg.into())
    }

    /// Create a missing parameter error
    pub fn missing_parameter<S: Into<String>>(name: S) -> Self {
        DatabaseError::MissingParameter(name.into())
    }

    /// Create a new transaction error
    pub fn transaction<S: Into<String>>(msg: S) -> Self {
        DatabaseError::TransactionError(msg.into())
    }

    /// Create a new unsupported operation error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        DatabaseError::UnsupportedOperation(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Other(msg.into())
    }

    /// Whether this error came from a cancellation request
    pub fn is_cancelled(&self) -> bool {
        match self {
            DatabaseError::Cancelled => true,
            #[cfg(feature = "sqlite")]
            DatabaseError::SqliteError(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::OperationInterrupted
            }
            _ => false,
        }
    }
}
