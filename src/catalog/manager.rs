//! The read-only schema catalog.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use super::error::{CatalogError, CatalogResult};
use super::schema::{Column, TableSchema};

/// Ordered table statistics, looked up case-insensitively.
///
/// The planner only ever reads from a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    tables: Vec<TableSchema>,
}

impl Catalog {
    /// Create a catalog, rejecting duplicate table names.
    pub fn new(tables: Vec<TableSchema>) -> CatalogResult<Self> {
        let mut seen = HashSet::new();
        for table in &tables {
            if !seen.insert(table.name.to_lowercase()) {
                return Err(CatalogError::DuplicateTable(table.name.clone()));
            }
        }
        Ok(Self { tables })
    }

    /// Parse a catalog from its JSON array form.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let tables: Vec<TableSchema> = serde_json::from_str(json)?;
        Self::new(tables)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        log::debug!("loaded {} tables from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// The demo schema: customers, orders, order items and products.
    pub fn sample() -> Self {
        let tables = vec![
            TableSchema::new("customers", 5_000)
                .with_column(Column::new("id", "INTEGER").indexed())
                .with_column(Column::new("name", "VARCHAR(100)"))
                .with_column(Column::new("email", "VARCHAR(100)").indexed())
                .with_column(Column::new("country", "VARCHAR(50)").indexed())
                .with_column(Column::new("created_at", "TIMESTAMP")),
            TableSchema::new("orders", 50_000)
                .with_column(Column::new("id", "INTEGER").indexed())
                .with_column(Column::new("customer_id", "INTEGER").indexed())
                .with_column(Column::new("order_date", "DATE").indexed())
                .with_column(Column::new("total", "DECIMAL(10,2)"))
                .with_column(Column::new("status", "VARCHAR(20)").indexed()),
            TableSchema::new("order_items", 200_000)
                .with_column(Column::new("id", "INTEGER").indexed())
                .with_column(Column::new("order_id", "INTEGER").indexed())
                .with_column(Column::new("product_id", "INTEGER").indexed())
                .with_column(Column::new("quantity", "INTEGER"))
                .with_column(Column::new("price", "DECIMAL(10,2)")),
            TableSchema::new("products", 1_000)
                .with_column(Column::new("id", "INTEGER").indexed())
                .with_column(Column::new("name", "VARCHAR(100)"))
                .with_column(Column::new("category", "VARCHAR(50)").indexed())
                .with_column(Column::new("price", "DECIMAL(10,2)"))
                .with_column(Column::new("in_stock", "BOOLEAN").indexed()),
        ];
        Self { tables }
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Get a table by name.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Get a table, or a placeholder seed when it is unknown.
    pub fn resolve(&self, name: &str) -> Cow<'_, TableSchema> {
        match self.table(name) {
            Some(table) => Cow::Borrowed(table),
            None => {
                log::warn!("table '{}' not in catalog, using default statistics", name);
                Cow::Owned(TableSchema::placeholder(name))
            }
        }
    }
}
