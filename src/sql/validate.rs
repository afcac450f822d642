//! Best-effort pre-validation of query text.
//!
//! Only three things are checked: the query starts with SELECT, has a FROM
//! keyword somewhere, and its parentheses balance. Anything that passes is
//! handed to the planner, which extracts what it can.

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::Token;

use super::error::{ValidationError, ValidationResult};
use super::lexer::lex;

/// Check that `sql` looks like a plannable SELECT.
pub fn validate(sql: &str) -> ValidationResult<()> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(ValidationError::Empty);
    }

    let lexemes = lex(sql)?;

    if !lexemes.first().is_some_and(|l| l.is_keyword(Keyword::SELECT)) {
        return Err(ValidationError::NotSelect);
    }

    if !lexemes.iter().any(|l| l.is_keyword(Keyword::FROM)) {
        return Err(ValidationError::MissingFrom);
    }

    let open = lexemes.iter().filter(|l| l.token == Token::LParen).count();
    let close = lexemes.iter().filter(|l| l.token == Token::RParen).count();
    if open != close {
        return Err(ValidationError::UnbalancedParentheses { open, close });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_queries() {
        assert!(validate("SELECT * FROM customers;").is_ok());
        assert!(validate("  select name from t where id in (select x from y)").is_ok());
    }

    #[test]
    fn test_empty() {
        assert_eq!(validate("   "), Err(ValidationError::Empty));
    }

    #[test]
    fn test_must_start_with_select() {
        assert_eq!(validate("DELETE FROM customers"), Err(ValidationError::NotSelect));
    }

    #[test]
    fn test_requires_from() {
        assert_eq!(validate("SELECT 1 + 1"), Err(ValidationError::MissingFrom));
    }

    #[test]
    fn test_from_must_be_a_keyword() {
        assert_eq!(validate("SELECT fromage"), Err(ValidationError::MissingFrom));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(
            validate("SELECT COUNT(* FROM t"),
            Err(ValidationError::UnbalancedParentheses { open: 1, close: 0 })
        );
    }

    #[test]
    fn test_lexical_error() {
        assert!(matches!(
            validate("SELECT * FROM t WHERE a = 'open"),
            Err(ValidationError::Lexical(_))
        ));
    }
}
