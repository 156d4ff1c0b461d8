//! Enumerations shared by every driver
//!
//! Connection state, transaction isolation levels, command kinds and reader
//! behaviours, mirroring the vocabulary of a standard relational client API.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Current state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    /// The connection is closed
    #[default]
    Closed,
    /// The connection is open
    Open,
    /// The connection is being established
    Connecting,
    /// The connection is executing a command
    Executing,
    /// The connection is retrieving data
    Fetching,
    /// The connection was lost and must be closed before reopening
    Broken,
}

impl ConnectionState {
    /// Convert the state to its string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            ConnectionState::Closed => "closed",
            ConnectionState::Open => "open",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Executing => "executing",
            ConnectionState::Fetching => "fetching",
            ConnectionState::Broken => "broken",
        }
    }

    /// Whether commands can run on the connection
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ConnectionState::Open | ConnectionState::Executing | ConnectionState::Fetching
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum IsolationLevel {
    /// Let the driver pick its default
    #[default]
    Unspecified,
    /// Dirty reads are possible
    ReadUncommitted,
    /// Only committed data is read
    ReadCommitted,
    /// Reads are repeatable within the transaction
    RepeatableRead,
    /// Full serializability
    Serializable,
    /// Snapshot isolation
    Snapshot,
}

impl IsolationLevel {
    /// Convert the isolation level to its string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            IsolationLevel::Unspecified => "unspecified",
            IsolationLevel::ReadUncommitted => "read_uncommitted",
            IsolationLevel::ReadCommitted => "read_committed",
            IsolationLevel::RepeatableRead => "repeatable_read",
            IsolationLevel::Serializable => "serializable",
            IsolationLevel::Snapshot => "snapshot",
        }
    }
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for IsolationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "unspecified" => Ok(IsolationLevel::Unspecified),
            "read_uncommitted" | "readuncommitted" => Ok(IsolationLevel::ReadUncommitted),
            "read_committed" | "readcommitted" => Ok(IsolationLevel::ReadCommitted),
            "repeatable_read" | "repeatableread" => Ok(IsolationLevel::RepeatableRead),
            "serializable" => Ok(IsolationLevel::Serializable),
            "snapshot" => Ok(IsolationLevel::Snapshot),
            _ => Err(format!("Invalid isolation level: '{}'", s)),
        }
    }
}

/// How the command text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandType {
    /// Plain SQL text
    #[default]
    Text,
    /// Name of a stored procedure
    StoredProcedure,
    /// Name of a table
    TableDirect,
}

impl FromStr for CommandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(CommandType::Text),
            "storedprocedure" | "stored_procedure" => Ok(CommandType::StoredProcedure),
            "tabledirect" | "table_direct" => Ok(CommandType::TableDirect),
            _ => Err(format!("Invalid command type: '{}'", s)),
        }
    }
}

/// Hints for how a reader should retrieve its results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandBehavior {
    /// No special behaviour
    #[default]
    Default,
    /// Only the first result set is needed
    SingleResult,
    /// Only column information is needed
    SchemaOnly,
    /// At most one row is needed
    SingleRow,
    /// Columns are read in order
    SequentialAccess,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state() {
        assert_eq!(ConnectionState::default(), ConnectionState::Closed);
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Broken.is_open());
        assert_eq!(ConnectionState::Open.to_string(), "open");
    }

    #[test]
    fn test_isolation_level_from_str() {
        assert_eq!(
            "Serializable".parse::<IsolationLevel>().ok(),
            Some(IsolationLevel::Serializable)
        );
        assert_eq!(
            "read committed".parse::<IsolationLevel>().ok(),
            Some(IsolationLevel::ReadCommitted)
        );
        assert_eq!(
            "ReadUncommitted".parse::<IsolationLevel>().ok(),
            Some(IsolationLevel::ReadUncommitted)
        );
        assert_eq!("chaos".parse::<IsolationLevel>().ok(), None);
    }

    #[test]
    fn test_command_type_from_str() {
        assert_eq!("text".parse::<CommandType>().ok(), Some(CommandType::Text));
        assert_eq!(
            "StoredProcedure".parse::<CommandType>().ok(),
            Some(CommandType::StoredProcedure)
        );
        assert!("query".parse::<CommandType>().is_err());
    }
}
