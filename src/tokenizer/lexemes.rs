use super::{FieldTree, Lexeme, Token, TokenKind};
use crate::util::Code;
use regex::bytes::Regex;
use std::collections::HashMap;

/// A lexeme utility matching a regular expression and producing a fixed
/// token kind.
pub struct Pattern {
    regexp: Regex,
    kind: TokenKind,
}

impl Pattern {
    /// Create a new [Pattern] lexeme for an anchored regular expression.
    ///
    /// The expression should not match an empty string.
    pub fn new(kind: TokenKind, pattern: &str) -> Result<Self, String> {
        let regexp = Regex::new(pattern)
            .map_err(|err| format!("Pattern should be a valid regex expression. {:?}", err))?;

        if regexp.is_match(b"") {
            return Err(format!(
                "Regex expression '{}' should not be nullable.",
                regexp.as_str()
            ));
        }

        Ok(Self { regexp, kind })
    }
}

impl Lexeme for Pattern {
    fn consume(&self, code: &Code, pointer: usize) -> Option<Token> {
        let m = self.regexp.find(&code.value[pointer..])?;
        debug_assert_eq!(m.start(), 0);
        if m.end() == 0 {
            return None;
        }
        Some(Token {
            kind: self.kind,
            start: pointer,
            end: pointer + m.end(),
        })
    }
}

/// A lexeme utility for identifier shaped words. The matched text is looked
/// up in a mapping table, so that keywords and word operators are remapped
/// to their own kinds while everything else stays an identifier.
pub struct Words {
    regexp: Regex,
    table: HashMap<&'static str, TokenKind>,
    fallback: TokenKind,
}

impl Words {
    pub fn new(
        pattern: &str,
        table: Vec<(&'static str, TokenKind)>,
        fallback: TokenKind,
    ) -> Result<Self, String> {
        let regexp = Regex::new(pattern)
            .map_err(|err| format!("Pattern should be a valid regex expression. {:?}", err))?;

        Ok(Self {
            regexp,
            table: table.into_iter().collect(),
            fallback,
        })
    }
}

impl Lexeme for Words {
    fn consume(&self, code: &Code, pointer: usize) -> Option<Token> {
        let m = self.regexp.find(&code.value[pointer..])?;
        if m.end() == 0 {
            return None;
        }
        let text = code.text(pointer, pointer + m.end());
        let kind = self.table.get(text).copied().unwrap_or(self.fallback);
        Some(Token {
            kind,
            start: pointer,
            end: pointer + m.end(),
        })
    }
}

/// A lexeme utility matching the longest punctuation or operator symbol at
/// the input position via a byte trie.
pub struct Punctuations {
    field_tree: FieldTree,
}

impl Punctuations {
    /// Create a new [Punctuations] lexeme for a set of constant string
    /// values and their token kinds.
    pub fn new(fields: Vec<(&str, TokenKind)>) -> Result<Self, String> {
        let mut field_tree = FieldTree::new();
        for (key, token) in fields {
            field_tree.insert(key.as_bytes(), token).map_err(|err| {
                format!("Punctuation '{}' is already added with token {:?}", key, err)
            })?;
        }

        Ok(Self { field_tree })
    }
}

impl Lexeme for Punctuations {
    fn consume(&self, code: &Code, pointer: usize) -> Option<Token> {
        let (kind, length) = self.field_tree.find(&code.value[pointer..])?;
        Some(Token {
            kind,
            start: pointer,
            end: pointer + length,
        })
    }
}

/// The string literal lexeme. Strings are delimited by `"`; the valid
/// escapes are `\\`, `\n` and `\"`. An invalid escape, a raw newline or a
/// missing closing quote fail the lexeme, which surfaces as a tokenize
/// error at the opening quote.
pub struct StringLexeme;

impl Lexeme for StringLexeme {
    fn consume(&self, code: &Code, pointer: usize) -> Option<Token> {
        let bytes = code.value;
        if bytes.get(pointer) != Some(&b'"') {
            return None;
        }

        let mut current = pointer + 1;
        loop {
            match *bytes.get(current)? {
                b'"' => {
                    return Some(Token {
                        kind: TokenKind::String,
                        start: pointer,
                        end: current + 1,
                    })
                }
                b'\\' => match *bytes.get(current + 1)? {
                    b'\\' | b'n' | b'"' => current += 2,
                    _ => return None,
                },
                b'\n' => return None,
                _ => current += 1,
            }
        }
    }
}
