//! Table and column statistics used to seed plan estimates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Row count assumed for tables missing from the catalog.
pub const DEFAULT_ROW_COUNT: u64 = 1000;

/// A column and whether an index covers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// Declared type, kept as written (e.g. `VARCHAR(100)`).
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub has_index: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            has_index: false,
        }
    }

    /// Mark the column as indexed.
    pub fn indexed(mut self) -> Self {
        self.has_index = true;
        self
    }

    /// Name of the index on this column of `table`.
    pub fn index_name(&self, table: &str) -> String {
        format!("idx_{}_{}", table, self.name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        if self.has_index {
            write!(f, " (indexed)")?;
        }
        Ok(())
    }
}

/// Statistics for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub name: String,
    pub row_count: u64,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, row_count: u64) -> Self {
        Self {
            name: name.into(),
            row_count,
            columns: Vec::new(),
        }
    }

    /// Seed used for a table the catalog does not know.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_ROW_COUNT)
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Indexed columns in declaration order.
    pub fn indexed_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.has_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_has_default_rows_and_no_columns() {
        let t = TableSchema::placeholder("ghost");
        assert_eq!(t.row_count, DEFAULT_ROW_COUNT);
        assert!(t.columns.is_empty());
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let t = TableSchema::new("users", 10).with_column(Column::new("Email", "TEXT").indexed());
        assert!(t.column("email").is_some());
        assert_eq!(t.indexed_columns().count(), 1);
    }

    #[test]
    fn test_json_field_names() {
        let json = r#"{"name": "users", "rowCount": 42,
            "columns": [{"name": "id", "type": "INTEGER", "hasIndex": true}]}"#;
        let t: TableSchema = serde_json::from_str(json).unwrap();
        assert_eq!(t.row_count, 42);
        assert_eq!(t.columns[0].data_type, "INTEGER");
        assert!(t.columns[0].has_index);
    }

    #[test]
    fn test_index_name() {
        let c = Column::new("country", "VARCHAR(50)").indexed();
        assert_eq!(c.index_name("customers"), "idx_customers_country");
    }
}
