//! Lexical SQL handling: table/condition extraction and pre-validation.
//!
//! Uses the `sqlparser` tokenizer only. Nothing here builds an AST; table and
//! column references are matched by token shape.

mod error;
mod extract;
mod lexer;
mod validate;

pub use error::{ValidationError, ValidationResult};
pub use extract::{extract, ColumnRef, Extraction, Predicate};
pub use validate::validate;
