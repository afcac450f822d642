//! Token stream shared by extraction and validation.
//!
//! Queries are tokenized with `sqlparser`'s tokenizer and nothing more: no
//! statement is parsed. Whitespace and comments are folded into a flag on the
//! following token so fragments can be rendered back with single spaces.

use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, TokenizerError};

/// A non-whitespace token with its position context.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub token: Token,
    /// Whitespace preceded this token.
    pub spaced: bool,
    /// Parenthesis nesting level the token sits at.
    pub depth: usize,
}

impl Lexeme {
    /// The keyword this token spells, if it is an unquoted keyword.
    pub fn keyword(&self) -> Option<Keyword> {
        match &self.token {
            Token::Word(w) if w.quote_style.is_none() && w.keyword != Keyword::NoKeyword => {
                Some(w.keyword)
            }
            _ => None,
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }

    /// True for a keyword at the top nesting level.
    pub fn is_top_level_keyword(&self, keywords: &[Keyword]) -> bool {
        self.depth == 0 && self.keyword().is_some_and(|k| keywords.contains(&k))
    }

    /// The value of an unquoted word (identifiers and keywords alike).
    pub fn word(&self) -> Option<&str> {
        match &self.token {
            Token::Word(w) if w.quote_style.is_none() => Some(w.value.as_str()),
            _ => None,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self.token,
            Token::Eq | Token::DoubleEq | Token::Neq | Token::Lt | Token::Gt | Token::LtEq | Token::GtEq
        )
    }
}

/// Tokenize `sql`, dropping whitespace and comments.
pub(crate) fn lex(sql: &str) -> Result<Vec<Lexeme>, TokenizerError> {
    let dialect = GenericDialect {};
    let tokens = Tokenizer::new(&dialect, sql).tokenize()?;

    let mut lexemes = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;
    let mut spaced = false;

    for token in tokens {
        match token {
            Token::Whitespace(_) => {
                spaced = true;
                continue;
            }
            Token::EOF => break,
            Token::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }

        let opens = token == Token::LParen;
        lexemes.push(Lexeme { token, spaced, depth });
        spaced = false;
        if opens {
            depth += 1;
        }
    }

    Ok(lexemes)
}

/// Render a run of lexemes back to text with whitespace collapsed.
pub(crate) fn render(lexemes: &[Lexeme]) -> String {
    let mut out = String::new();
    for (i, lexeme) in lexemes.iter().enumerate() {
        if i > 0 && lexeme.spaced {
            out.push(' ');
        }
        out.push_str(&lexeme.token.to_string());
    }
    out
}

/// Split `lexemes` on top-level separators matched by `is_separator`.
pub(crate) fn split_top_level<'a>(
    lexemes: &'a [Lexeme],
    is_separator: impl Fn(&Lexeme) -> bool,
) -> Vec<&'a [Lexeme]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, lexeme) in lexemes.iter().enumerate() {
        if lexeme.depth == 0 && is_separator(lexeme) {
            parts.push(&lexemes[start..i]);
            start = i + 1;
        }
    }
    parts.push(&lexemes[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_is_collapsed() {
        let lexemes = lex("country   =\n  \"USA\"").unwrap();
        assert_eq!(lexemes.len(), 3);
        assert_eq!(render(&lexemes), "country = \"USA\"");
    }

    #[test]
    fn test_depth_tracking() {
        let lexemes = lex("a IN (SELECT b)").unwrap();
        let depths: Vec<usize> = lexemes.iter().map(|l| l.depth).collect();
        assert_eq!(depths, vec![0, 0, 0, 1, 1, 0]);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let lexemes = lex("select x From t").unwrap();
        assert!(lexemes[0].is_keyword(Keyword::SELECT));
        assert!(lexemes[2].is_keyword(Keyword::FROM));
    }

    #[test]
    fn test_quoted_words_are_not_keywords() {
        let lexemes = lex("\"from\"").unwrap();
        assert_eq!(lexemes[0].keyword(), None);
        assert_eq!(lexemes[0].word(), None);
    }

    #[test]
    fn test_split_ignores_nested_separators() {
        let lexemes = lex("a, f(b, c), d").unwrap();
        let parts = split_top_level(&lexemes, |l| l.token == Token::Comma);
        let rendered: Vec<String> = parts.iter().map(|p| render(p)).collect();
        assert_eq!(rendered, vec!["a", "f(b, c)", "d"]);
    }
}
