//! Lexical extraction of tables and WHERE conjuncts.
//!
//! This is deliberately not a parser. Table names come from the FROM list and
//! from JOIN clauses; conditions are the WHERE clause split on top-level
//! `AND`. Column references inside a condition are found by token shape
//! (`qualifier.column` or a bare identifier), never by binding.

use std::fmt;

use serde::{Serialize, Serializer};
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::Token;

use super::lexer::{lex, render, split_top_level, Lexeme};

/// Keywords that end the FROM list.
const FROM_TERMINATORS: &[Keyword] = &[
    Keyword::WHERE,
    Keyword::JOIN,
    Keyword::GROUP,
    Keyword::ORDER,
    Keyword::LIMIT,
    Keyword::HAVING,
];

/// Keywords that end the WHERE clause.
const WHERE_TERMINATORS: &[Keyword] = &[
    Keyword::GROUP,
    Keyword::ORDER,
    Keyword::LIMIT,
    Keyword::HAVING,
];

/// Keywords that may appear inside a predicate but never name a column.
const PREDICATE_KEYWORDS: &[Keyword] = &[
    Keyword::AND,
    Keyword::OR,
    Keyword::NOT,
    Keyword::IN,
    Keyword::IS,
    Keyword::NULL,
    Keyword::LIKE,
    Keyword::ILIKE,
    Keyword::BETWEEN,
    Keyword::TRUE,
    Keyword::FALSE,
    Keyword::SELECT,
    Keyword::FROM,
    Keyword::WHERE,
    Keyword::EXISTS,
    Keyword::DISTINCT,
    Keyword::ANY,
    Keyword::ALL,
    Keyword::SOME,
    Keyword::CASE,
    Keyword::WHEN,
    Keyword::THEN,
    Keyword::ELSE,
    Keyword::END,
    Keyword::INTERVAL,
];

/// A column reference found in a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Table name or alias before the dot, if any.
    pub qualifier: Option<String>,
    pub column: String,
    /// The reference is directly followed by a comparison operator.
    pub compared: bool,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            column: column.into(),
            compared: false,
        }
    }

    pub fn qualified(qualifier: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            column: column.into(),
            compared: false,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref qualifier) = self.qualifier {
            write!(f, "{}.{}", qualifier, self.column)
        } else {
            write!(f, "{}", self.column)
        }
    }
}

/// One atomic WHERE conjunct: its text plus the column references in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    text: String,
    columns: Vec<ColumnRef>,
}

impl Predicate {
    /// Build a predicate from free text.
    ///
    /// Text that cannot be tokenized keeps its wording but carries no column
    /// references.
    pub fn parse(text: &str) -> Self {
        match lex(text) {
            Ok(lexemes) => Self::from_lexemes(&lexemes),
            Err(e) => {
                log::warn!("could not tokenize condition {:?}: {}", text, e);
                Self {
                    text: text.trim().to_string(),
                    columns: Vec::new(),
                }
            }
        }
    }

    fn from_lexemes(lexemes: &[Lexeme]) -> Self {
        Self {
            text: render(lexemes),
            columns: column_refs(lexemes),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// Whether this conjunct names `table`, either as a column qualifier or
    /// as a bare identifier.
    pub fn mentions(&self, table: &str) -> bool {
        self.columns.iter().any(|c| match &c.qualifier {
            Some(q) => q.eq_ignore_ascii_case(table),
            None => c.column.eq_ignore_ascii_case(table),
        })
    }

    /// Whether the conjunct contains `table.column <op>`.
    pub fn compares(&self, table: &str, column: &str) -> bool {
        self.columns.iter().any(|c| {
            c.compared
                && c.column.eq_ignore_ascii_case(column)
                && c.qualifier.as_deref().is_some_and(|q| q.eq_ignore_ascii_case(table))
        })
    }

    /// Whether any reference names `column`, whatever its qualifier.
    pub fn references_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.column.eq_ignore_ascii_case(column))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Tables and conditions extracted from one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Lowercased table names in first-occurrence order.
    pub tables: Vec<String>,
    pub conditions: Vec<Predicate>,
}

impl Extraction {
    pub fn is_join(&self) -> bool {
        self.tables.len() > 1
    }
}

/// Extract tables and WHERE conjuncts from `sql`.
///
/// Never fails: text the tokenizer rejects yields an empty extraction.
pub fn extract(sql: &str) -> Extraction {
    let lexemes = match lex(sql) {
        Ok(lexemes) => lexemes,
        Err(e) => {
            log::warn!("could not tokenize query, extracting nothing: {}", e);
            return Extraction::default();
        }
    };

    Extraction {
        tables: table_names(&lexemes),
        conditions: conditions(&lexemes),
    }
}

fn table_names(lexemes: &[Lexeme]) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();

    if let Some(from) = lexemes.iter().position(|l| l.is_top_level_keyword(&[Keyword::FROM])) {
        let rest = &lexemes[from + 1..];
        let end = rest
            .iter()
            .position(|l| l.is_top_level_keyword(FROM_TERMINATORS) || is_statement_end(l))
            .unwrap_or(rest.len());

        for entry in split_top_level(&rest[..end], |l| l.token == Token::Comma) {
            if let Some(name) = entry.first().and_then(Lexeme::word) {
                tables.push(name.to_lowercase());
            }
        }
    }

    for pair in lexemes.windows(2) {
        if pair[0].is_keyword(Keyword::JOIN) {
            if let Some(name) = pair[1].word() {
                tables.push(name.to_lowercase());
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    tables.retain(|t| seen.insert(t.clone()));
    tables
}

fn conditions(lexemes: &[Lexeme]) -> Vec<Predicate> {
    let Some(start) = lexemes.iter().position(|l| l.is_top_level_keyword(&[Keyword::WHERE])) else {
        return Vec::new();
    };

    let rest = &lexemes[start + 1..];
    let end = rest
        .iter()
        .position(|l| l.is_top_level_keyword(WHERE_TERMINATORS) || is_statement_end(l))
        .unwrap_or(rest.len());

    split_top_level(&rest[..end], |l| l.is_keyword(Keyword::AND))
        .into_iter()
        .filter(|fragment| !fragment.is_empty())
        .map(Predicate::from_lexemes)
        .collect()
}

fn is_statement_end(lexeme: &Lexeme) -> bool {
    lexeme.depth == 0 && lexeme.token == Token::SemiColon
}

/// A word that can name a table or column inside a predicate.
fn identifier(lexeme: &Lexeme) -> Option<&str> {
    let word = lexeme.word()?;
    match lexeme.keyword() {
        Some(k) if PREDICATE_KEYWORDS.contains(&k) => None,
        _ => Some(word),
    }
}

fn column_refs(lexemes: &[Lexeme]) -> Vec<ColumnRef> {
    let mut refs = Vec::new();
    let mut i = 0;

    while i < lexemes.len() {
        let Some(first) = identifier(&lexemes[i]) else {
            i += 1;
            continue;
        };
        // The column half of `x.y` was consumed with its qualifier.
        if i > 0 && lexemes[i - 1].token == Token::Period {
            i += 1;
            continue;
        }

        let next = lexemes.get(i + 1);
        let qualified_column = match next {
            Some(l) if l.token == Token::Period => lexemes.get(i + 2).and_then(Lexeme::word),
            _ => None,
        };

        if let Some(column) = qualified_column {
            let mut column_ref = ColumnRef::qualified(first.to_lowercase(), column.to_lowercase());
            column_ref.compared = lexemes.get(i + 3).is_some_and(Lexeme::is_comparison);
            refs.push(column_ref);
            i += 3;
            continue;
        }

        let is_call = next.is_some_and(|l| l.token == Token::LParen);
        let is_dangling_qualifier = next.is_some_and(|l| l.token == Token::Period);
        if !is_call && !is_dangling_qualifier {
            let mut column_ref = ColumnRef::new(first.to_lowercase());
            column_ref.compared = next.is_some_and(Lexeme::is_comparison);
            refs.push(column_ref);
        }
        i += 1;
    }

    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(extraction: &Extraction) -> Vec<&str> {
        extraction.conditions.iter().map(Predicate::text).collect()
    }

    #[test]
    fn test_single_table_with_where() {
        let e = extract("SELECT * FROM customers WHERE country = \"USA\";");
        assert_eq!(e.tables, vec!["customers"]);
        assert_eq!(texts(&e), vec!["country = \"USA\""]);
        assert!(!e.is_join());
    }

    #[test]
    fn test_join_tables_in_order() {
        let e = extract(
            "SELECT c.name FROM customers c\nJOIN orders o ON c.id = o.customer_id\n\
             JOIN order_items oi ON o.id = oi.order_id WHERE c.country = 'Canada' ORDER BY o.order_date",
        );
        assert_eq!(e.tables, vec!["customers", "orders", "order_items"]);
        assert_eq!(texts(&e), vec!["c.country = 'Canada'"]);
        assert!(e.is_join());
    }

    #[test]
    fn test_comma_separated_from_list() {
        let e = extract("select * from Orders o, customers c, orders where o.x = 1");
        assert_eq!(e.tables, vec!["orders", "customers"]);
    }

    #[test]
    fn test_conditions_split_on_and() {
        let e = extract(
            "SELECT * FROM a WHERE a.x > 1 and a.y = 'q' AND f(a.z, 2) < 3 GROUP BY a.x",
        );
        assert_eq!(texts(&e), vec!["a.x > 1", "a.y = 'q'", "f(a.z, 2) < 3"]);
    }

    #[test]
    fn test_and_inside_parentheses_is_not_split() {
        let e = extract("SELECT * FROM a WHERE (a.x = 1 AND a.y = 2) AND a.z = 3");
        assert_eq!(texts(&e), vec!["(a.x = 1 AND a.y = 2)", "a.z = 3"]);
    }

    #[test]
    fn test_nested_query_does_not_end_where() {
        let e = extract(
            "SELECT name FROM customers WHERE id IN (SELECT customer_id FROM orders WHERE total > 1000);",
        );
        assert_eq!(e.tables, vec!["customers"]);
        assert_eq!(e.conditions.len(), 1);
        assert!(e.conditions[0].text().starts_with("id IN ("));
    }

    #[test]
    fn test_missing_clauses() {
        let e = extract("SELECT 1");
        assert!(e.tables.is_empty());
        assert!(e.conditions.is_empty());
    }

    #[test]
    fn test_untokenizable_text_is_empty() {
        let e = extract("SELECT * FROM t WHERE name = 'unterminated");
        assert_eq!(e, Extraction::default());
    }

    #[test]
    fn test_column_refs() {
        let p = Predicate::parse("orders.total > 100 AND COUNT(x) = status");
        let refs: Vec<String> = p.columns().iter().map(|c| c.to_string()).collect();
        assert_eq!(refs, vec!["orders.total", "x", "status"]);
        assert!(p.columns()[0].compared);
        assert!(!p.columns()[1].compared);
    }

    #[test]
    fn test_quoted_literals_are_not_columns() {
        let p = Predicate::parse("country = \"USA\"");
        assert_eq!(p.columns(), &[ColumnRef { compared: true, ..ColumnRef::new("country") }]);
    }

    #[test]
    fn test_mentions() {
        let p = Predicate::parse("orders.total > 100");
        assert!(p.mentions("orders"));
        assert!(p.mentions("ORDERS"));
        assert!(!p.mentions("customers"));
        assert!(!p.mentions("order_items"));
    }

    #[test]
    fn test_compares_requires_operator_and_table() {
        let p = Predicate::parse("customers.country = 'USA'");
        assert!(p.compares("customers", "country"));
        assert!(!p.compares("c", "country"));

        let p = Predicate::parse("customers.country IS NULL");
        assert!(!p.compares("customers", "country"));
        assert!(p.references_column("country"));
    }
}
