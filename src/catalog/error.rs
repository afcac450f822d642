//! Catalog errors.

use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate table: {0}")]
    DuplicateTable(String),
}
