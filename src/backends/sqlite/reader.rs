use crate::core::driver::DataReader;
use crate::core::error::{DatabaseError, Result};
use crate::core::value::DatabaseValue;

/// Forward-only reader over the rows a [`SqliteCommand`](super::SqliteCommand) returned
///
/// Rows are materialised while the statement runs, so the reader does not keep the
/// connection busy.
#[derive(Debug, Clone)]
pub struct SqliteDataReader {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<DatabaseValue>>,
    current: Option<Vec<DatabaseValue>>,
    records_affected: Option<u64>,
}

impl SqliteDataReader {
    pub(crate) fn new(
        columns: Vec<String>,
        rows: Vec<Vec<DatabaseValue>>,
        records_affected: Option<u64>,
    ) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
            current: None,
            records_affected,
        }
    }

    /// Whether rows remain after the current one
    pub fn has_more(&self) -> bool {
        self.rows.len() > 0
    }

    /// Value of the column named `name` in the current row
    pub fn get_by_name(&self, name: &str) -> Result<&DatabaseValue> {
        let ordinal = self
            .ordinal(name)
            .ok_or_else(|| DatabaseError::query(format!("No column named '{}'", name)))?;
        self.get(ordinal)
            .ok_or_else(|| DatabaseError::query("No current row"))
    }
}

impl DataReader for SqliteDataReader {
    type Error = DatabaseError;

    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, ordinal: usize) -> Option<&str> {
        self.columns.get(ordinal).map(String::as_str)
    }

    fn read(&mut self) -> Result<bool> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn get(&self, ordinal: usize) -> Option<&DatabaseValue> {
        self.current.as_ref().and_then(|row| row.get(ordinal))
    }

    fn records_affected(&self) -> Option<u64> {
        self.records_affected
    }
}
