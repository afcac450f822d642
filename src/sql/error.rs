//! Query validation errors.

use thiserror::Error;

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reasons a query is rejected before planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty query")]
    Empty,

    #[error("query must start with SELECT")]
    NotSelect,

    #[error("query must include a FROM clause")]
    MissingFrom,

    #[error("mismatched parentheses: {open} opening, {close} closing")]
    UnbalancedParentheses { open: usize, close: usize },

    #[error("lexical error: {0}")]
    Lexical(String),
}

impl From<sqlparser::tokenizer::TokenizerError> for ValidationError {
    fn from(e: sqlparser::tokenizer::TokenizerError) -> Self {
        ValidationError::Lexical(e.to_string())
    }
}
