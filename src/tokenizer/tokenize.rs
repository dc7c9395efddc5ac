use super::{
    Lexeme, Pattern, Punctuations, StringLexeme, Token, TokenizeFailure, Tokenizer, TokenKind,
    Words,
};
use crate::util::Code;
use std::fmt::Write;
use std::rc::Rc;

/// Word operators, in the order they appear in the grammar file.
pub const WORD_OPERATORS: [&str; 10] = [
    "and", "or", "not", "dup", "drop", "swap", "over", "rot", "substr", "strlen",
];

/// Operator symbols, in the order they appear in the grammar file.
/// `*` is tokenized separately since it doubles as the placeholder marker.
pub const SYMBOL_OPERATORS: [&str; 11] = ["+", "-", "/", "%", "=", "!=", "<", "<=", ">", ">=", "."];

const KEYWORDS: [(&str, TokenKind); 14] = [
    ("fn", TokenKind::Fn),
    ("begin", TokenKind::Begin),
    ("end", TokenKind::End),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("struct", TokenKind::Struct),
    ("from", TokenKind::From),
    ("import", TokenKind::Import),
    ("as", TokenKind::As),
    ("args", TokenKind::Args),
    ("return", TokenKind::Return),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
];

impl Tokenizer {
    /// Build the tokenizer of the language. The lexeme order matters:
    /// comments must win over the `/` operator and words over keywords.
    pub fn new() -> Self {
        let comment = Pattern::new(TokenKind::Comment, r"^//[^\n]*").unwrap();
        let whitespace = Pattern::new(TokenKind::Whitespace, r"^\s+").unwrap();
        let integer = Pattern::new(TokenKind::Integer, r"^[0-9]+").unwrap();

        let mut word_table: Vec<(&'static str, TokenKind)> = KEYWORDS.to_vec();
        word_table.extend(WORD_OPERATORS.iter().map(|op| (*op, TokenKind::Operator)));
        let words = Words::new(r"^[a-z_][a-z0-9_]*", word_table, TokenKind::Identifier).unwrap();

        let mut punctuations: Vec<(&str, TokenKind)> = SYMBOL_OPERATORS
            .iter()
            .map(|op| (*op, TokenKind::Operator))
            .collect();
        punctuations.extend([
            ("*", TokenKind::Star),
            (":", TokenKind::Colon),
            ("?", TokenKind::Question),
            ("!", TokenKind::Bang),
            (",", TokenKind::Comma),
            ("{", TokenKind::OpenBrace),
            ("}", TokenKind::CloseBrace),
            ("[", TokenKind::OpenBracket),
            ("]", TokenKind::CloseBracket),
        ]);
        let punctuations = Punctuations::new(punctuations).unwrap();

        Self {
            lexers: vec![
                Rc::new(comment),
                Rc::new(whitespace),
                Rc::new(StringLexeme),
                Rc::new(words),
                Rc::new(integer),
                Rc::new(punctuations),
            ],
        }
    }

    /// Tokenize the code and return the token stream, terminated by an
    /// [Eof](TokenKind::Eof) token. The stream tiles the whole input.
    pub fn tokenize(&self, code: &Code) -> Result<Vec<Token>, TokenizeFailure> {
        let mut tokenized_stream: Vec<Token> = Vec::new();
        let mut pointer: usize = 0;
        let eof_pointer: usize = code.value.len();

        while pointer < eof_pointer {
            match self
                .lexers
                .iter()
                .find_map(|lexer| lexer.consume(code, pointer))
            {
                Some(token) => {
                    debug_assert_eq!(pointer, token.start);
                    pointer = token.end;
                    tokenized_stream.push(token);
                }
                None => {
                    return Err(TokenizeFailure {
                        pointer,
                        position: code.obtain_position(pointer),
                    })
                }
            }
        }

        tokenized_stream.push(Token {
            kind: TokenKind::Eof,
            start: eof_pointer,
            end: eof_pointer,
        });
        Ok(tokenized_stream)
    }

    /// Write the token fragment of the grammar file.
    pub fn build_grammar(&self) -> String {
        let mut writer = String::new();
        writeln!(writer, "fragment operator {{").unwrap();
        for op in SYMBOL_OPERATORS {
            writeln!(writer, "    {:?} ,", op).unwrap();
        }
        for op in WORD_OPERATORS {
            writeln!(writer, "    {:?} ,", op).unwrap();
        }
        writeln!(writer, "}}").unwrap();
        writer
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    /// The raw text of the token.
    pub fn text<'c>(&self, code: &Code<'c>) -> &'c str {
        code.text(self.start, self.end)
    }
}

impl TokenKind {
    /// Whether the parser should see this token. Whitespace and comments
    /// are kept in the stream but skipped during parsing.
    pub fn is_structural(&self) -> bool {
        !matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Fn
                | TokenKind::Begin
                | TokenKind::End
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::Struct
                | TokenKind::From
                | TokenKind::Import
                | TokenKind::As
                | TokenKind::Args
                | TokenKind::Return
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// How the token kind is written in the grammar file and in parse error
    /// messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Fn => "\"fn\"",
            TokenKind::Begin => "\"begin\"",
            TokenKind::End => "\"end\"",
            TokenKind::If => "\"if\"",
            TokenKind::Else => "\"else\"",
            TokenKind::While => "\"while\"",
            TokenKind::Struct => "\"struct\"",
            TokenKind::From => "\"from\"",
            TokenKind::Import => "\"import\"",
            TokenKind::As => "\"as\"",
            TokenKind::Args => "\"args\"",
            TokenKind::Return => "\"return\"",
            TokenKind::True => "\"true\"",
            TokenKind::False => "\"false\"",
            TokenKind::Identifier => "identifier",
            TokenKind::Integer => "integer",
            TokenKind::String => "string",
            TokenKind::Operator => "operator",
            TokenKind::Star => "\"*\"",
            TokenKind::Colon => "\":\"",
            TokenKind::Question => "\"?\"",
            TokenKind::Bang => "\"!\"",
            TokenKind::Comma => "\",\"",
            TokenKind::OpenBrace => "\"{\"",
            TokenKind::CloseBrace => "\"}\"",
            TokenKind::OpenBracket => "\"[\"",
            TokenKind::CloseBracket => "\"]\"",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of file",
        }
    }
}
