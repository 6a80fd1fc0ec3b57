//! Character stream → positioned token stream.
//!
//! The tokenizer is whitespace-driven and greedy: at every byte offset it
//! tries, in order, whitespace, comments, fixed literals, integers, strings,
//! then identifiers, and fails hard the moment none of those match. There is
//! no recovery within a file — see [`TokenizerError`].

mod token;

pub use token::{Token, TokenKind};

use std::fmt::{self, Display};
use std::path::PathBuf;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::position::Position;

/// Fixed literals sorted longest-first, so `foreach` is tried before any
/// shorter literal that happens to be a prefix of it, and alphabetic
/// keywords carry a flag for the trailing boundary check.
static SORTED_LITERALS: Lazy<Vec<(&'static str, TokenKind)>> = Lazy::new(|| {
    let mut table: Vec<(&'static str, TokenKind)> = TokenKind::fixed_literals().to_vec();
    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    table
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerError {
    pub position: Position,
    pub message: String,
}

impl Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

impl std::error::Error for TokenizerError {}

pub type TokenizerResult<T> = Result<T, TokenizerError>;

const RECOGNISED_ESCAPES: &[(char, char)] = &[
    ('\\', '\\'),
    ('n', '\n'),
    ('r', '\r'),
    ('"', '"'),
    ('\'', '\''),
    ('/', '/'),
    ('0', '\0'),
    ('b', '\u{8}'),
    ('e', '\u{1b}'),
    ('f', '\u{c}'),
    ('t', '\t'),
];

/// Tokenize `source`, retaining comments and whitespace. Used by the
/// formatter (out of scope); the parser consumes [`tokenize_filtered`]
/// instead.
pub fn tokenize_unfiltered(file: Rc<PathBuf>, source: &str) -> TokenizerResult<Vec<Token>> {
    Tokenizer::new(file, source).run()
}

/// Tokenize `source`, dropping whitespace, comments and the shebang line.
/// This is the stream the parser sees.
pub fn tokenize_filtered(file: Rc<PathBuf>, source: &str) -> TokenizerResult<Vec<Token>> {
    Ok(tokenize_unfiltered(file, source)?
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .collect())
}

struct Tokenizer<'a> {
    file: Rc<PathBuf>,
    source: &'a str,
    offset: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(file: Rc<PathBuf>, source: &'a str) -> Self {
        Self {
            file,
            source,
            offset: 0,
        }
    }

    fn position_at(&self, offset: usize) -> Position {
        Position::from_offset(Rc::clone(&self.file), self.source, offset)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn run(mut self) -> TokenizerResult<Vec<Token>> {
        let mut tokens = Vec::new();

        if self.offset == 0 && self.rest().starts_with("#!") {
            tokens.push(self.consume_to_eol(TokenKind::Shebang));
        }

        while self.offset < self.source.len() {
            if let Some(token) = self.try_whitespace() {
                tokens.push(token);
                continue;
            }
            if let Some(token) = self.try_comment() {
                tokens.push(token);
                continue;
            }
            if let Some(token) = self.try_fixed_literal() {
                tokens.push(token);
                continue;
            }
            if let Some(token) = self.try_integer() {
                tokens.push(token);
                continue;
            }
            if let Some(token) = self.try_string()? {
                tokens.push(token);
                continue;
            }
            if let Some(token) = self.try_identifier() {
                tokens.push(token);
                continue;
            }

            return Err(TokenizerError {
                position: self.position_at(self.offset),
                message: format!(
                    "invalid character {:?}",
                    self.rest().chars().next().unwrap()
                ),
            });
        }

        Ok(tokens)
    }

    fn consume_to_eol(&mut self, kind: TokenKind) -> Token {
        let start = self.offset;
        let position = self.position_at(start);
        let len = self.rest().find('\n').unwrap_or(self.rest().len());
        self.offset += len;
        Token::new(kind, &self.source[start..self.offset], position)
    }

    fn try_whitespace(&mut self) -> Option<Token> {
        let rest = self.rest();
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let start = self.offset;
        let position = self.position_at(start);
        let len = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        self.offset += len;
        Some(Token::new(
            TokenKind::Whitespace,
            &self.source[start..self.offset],
            position,
        ))
    }

    fn try_comment(&mut self) -> Option<Token> {
        if !self.rest().starts_with("//") {
            return None;
        }
        Some(self.consume_to_eol(TokenKind::Comment))
    }

    fn try_fixed_literal(&mut self) -> Option<Token> {
        let rest = self.rest();
        for (literal, kind) in SORTED_LITERALS.iter() {
            if !rest.starts_with(literal) {
                continue;
            }
            if TokenKind::is_alphabetic_literal(literal) {
                let next = rest[literal.len()..].chars().next();
                let boundary_ok = match next {
                    None => true,
                    Some(c) => !(c.is_ascii_alphanumeric() || c == '_'),
                };
                if !boundary_ok {
                    continue;
                }
            }
            let start = self.offset;
            let position = self.position_at(start);
            self.offset += literal.len();
            return Some(Token::new(*kind, *literal, position));
        }
        None
    }

    fn try_integer(&mut self) -> Option<Token> {
        let rest = self.rest();
        let mut chars = rest.char_indices().peekable();
        let mut end = 0usize;

        if let Some((_, '-')) = chars.peek() {
            chars.next();
        }
        let digits_start = match chars.peek() {
            Some((idx, c)) if c.is_ascii_digit() => *idx,
            _ => return None,
        };
        let _ = digits_start;

        for (idx, c) in rest.char_indices() {
            if c == '-' && idx == 0 {
                continue;
            }
            if c.is_ascii_digit() {
                end = idx + c.len_utf8();
                continue;
            }
            break;
        }
        if end == 0 || (end == 1 && rest.starts_with('-')) {
            return None;
        }

        let start = self.offset;
        let position = self.position_at(start);
        self.offset += end;
        Some(Token::new(
            TokenKind::Integer,
            &self.source[start..self.offset],
            position,
        ))
    }

    fn try_string(&mut self) -> TokenizerResult<Option<Token>> {
        if !self.rest().starts_with('"') {
            return Ok(None);
        }
        let start = self.offset;
        let position = self.position_at(start);
        let mut cursor = start + 1;
        let bytes = self.source;

        loop {
            let Some(c) = bytes[cursor..].chars().next() else {
                return Err(TokenizerError {
                    position,
                    message: "unterminated string literal".into(),
                });
            };
            if c == '"' {
                cursor += 1;
                break;
            }
            if c == '\\' {
                let after = &bytes[cursor + 1..];
                let Some(escape) = after.chars().next() else {
                    return Err(TokenizerError {
                        position,
                        message: "unterminated string literal".into(),
                    });
                };
                if escape == 'u' {
                    cursor += 1 + 1 + self.validate_hex_escape(cursor + 2, 4, &position)?;
                    continue;
                }
                if escape == 'U' {
                    cursor += 1 + 1 + self.validate_hex_escape(cursor + 2, 8, &position)?;
                    continue;
                }
                if !RECOGNISED_ESCAPES.iter().any(|(e, _)| *e == escape) {
                    return Err(TokenizerError {
                        position,
                        message: format!("invalid escape sequence '\\{escape}'"),
                    });
                }
                cursor += 1 + escape.len_utf8();
                continue;
            }
            if c.is_control() {
                return Err(TokenizerError {
                    position,
                    message: "unterminated string literal".into(),
                });
            }
            cursor += c.len_utf8();
        }

        self.offset = cursor;
        Ok(Some(Token::new(
            TokenKind::String,
            &self.source[start..self.offset],
            position,
        )))
    }

    /// Validates that `count` hex digits follow `offset` and returns how
    /// many bytes they occupy.
    fn validate_hex_escape(
        &self,
        offset: usize,
        count: usize,
        string_start: &Position,
    ) -> TokenizerResult<usize> {
        let digits: String = self.source[offset..].chars().take(count).collect();
        if digits.len() != count || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TokenizerError {
                position: string_start.clone(),
                message: format!("invalid \\u/\\U escape, expected {count} hex digits"),
            });
        }
        Ok(digits.len())
    }

    fn try_identifier(&mut self) -> Option<Token> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        let (_, first) = chars.next()?;
        if !(first.is_ascii_alphabetic() || first == '_') {
            return None;
        }
        let mut end = first.len_utf8();
        for (idx, c) in chars {
            if c.is_ascii_alphanumeric() || c == '_' {
                end = idx + c.len_utf8();
                continue;
            }
            break;
        }
        let start = self.offset;
        let position = self.position_at(start);
        self.offset += end;
        Some(Token::new(
            TokenKind::Identifier,
            &self.source[start..self.offset],
            position,
        ))
    }
}

/// Decode the escape sequences of a lexed string literal's raw text (which
/// still includes the surrounding quotes) into its runtime value.
///
/// Assumes `raw` already passed [`Tokenizer::try_string`], so every escape
/// in it is one of the recognised sequences.
pub fn unescape_string_literal(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                push_code_point(&mut out, &hex);
            }
            Some('U') => {
                let hex: String = chars.by_ref().take(8).collect();
                push_code_point(&mut out, &hex);
            }
            Some(escape) => {
                let decoded = RECOGNISED_ESCAPES
                    .iter()
                    .find(|(e, _)| *e == escape)
                    .map(|(_, d)| *d)
                    .unwrap_or(escape);
                out.push(decoded);
            }
            None => {}
        }
    }

    out
}

fn push_code_point(out: &mut String, hex: &str) {
    if let Ok(value) = u32::from_str_radix(hex, 16) {
        if let Some(c) = char::from_u32(value) {
            out.push(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize_filtered(Rc::new(PathBuf::from("test.aaa")), source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn filters_whitespace_and_comments() {
        let kinds = kinds("fn  main // a comment\n{ }");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Fn,
                TokenKind::Identifier,
                TokenKind::LBrace,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn splits_keyword_prefixed_identifiers() {
        // "args" is a fixed literal, but "args_list" must lex as one identifier.
        let kinds = kinds("args args_list");
        assert_eq!(kinds, vec![TokenKind::Args, TokenKind::Identifier]);
    }

    #[test]
    fn negative_integers_lex_as_one_token() {
        let tokens = tokenize_filtered(Rc::new(PathBuf::from("test.aaa")), "-42").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[0].text, "-42");
    }

    #[test]
    fn lone_minus_is_not_a_valid_token() {
        let err = tokenize_filtered(Rc::new(PathBuf::from("test.aaa")), "- 1").unwrap_err();
        assert!(err.message.contains("invalid character"));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize_filtered(Rc::new(PathBuf::from("test.aaa")), "\"abc").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn invalid_escape_is_an_error() {
        let err = tokenize_filtered(Rc::new(PathBuf::from("test.aaa")), "\"\\q\"").unwrap_err();
        assert!(err.message.contains("invalid escape"));
    }

    #[test]
    fn unescape_handles_recognised_sequences() {
        assert_eq!(unescape_string_literal("\"a\\nb\""), "a\nb");
        assert_eq!(unescape_string_literal("\"\\u0041\""), "A");
    }

    #[test]
    fn shebang_line_is_dropped_by_filtered_tokenizer() {
        let kinds = kinds("#!/usr/bin/env aaac\nfn main { }");
        assert_eq!(kinds[0], TokenKind::Fn);
    }
}
