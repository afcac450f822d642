//! Schema catalog: table row counts and indexed columns.
//!
//! The catalog seeds scan cardinalities and tells index selection which
//! columns are indexed. It is supplied once and never mutated by planning.

mod error;
mod manager;
mod schema;

pub use error::{CatalogError, CatalogResult};
pub use manager::Catalog;
pub use schema::{Column, TableSchema, DEFAULT_ROW_COUNT};
