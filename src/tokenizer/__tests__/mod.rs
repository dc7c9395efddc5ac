use crate::tokenizer::{TokenKind, Tokenizer};
use crate::util::{Code, Position};

fn tokenize(source: &str) -> Vec<(TokenKind, String)> {
    let code = Code::from(source);
    Tokenizer::new()
        .tokenize(&code)
        .unwrap()
        .iter()
        .map(|token| (token.kind, token.text(&code).to_string()))
        .collect()
}

fn structural_kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .into_iter()
        .filter(|(kind, _)| kind.is_structural())
        .map(|(kind, _)| kind)
        .collect()
}

#[test]
fn round_trip_reproduces_source() {
    let source = "// a comment\nfn foo args a: int begin\n    a 15 % 0 = \"x\\n\" . end\n";
    let code = Code::from(source);
    let tokens = Tokenizer::new().tokenize(&code).unwrap();

    let rebuilt: String = tokens.iter().map(|token| token.text(&code)).collect();
    assert_eq!(rebuilt, source);
    assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
}

#[test]
fn keywords_and_identifiers() {
    assert_eq!(
        structural_kinds("fn iffy if while_ while"),
        vec![
            TokenKind::Fn,
            TokenKind::Identifier,
            TokenKind::If,
            TokenKind::Identifier,
            TokenKind::While,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn word_operators_are_operators() {
    for op in ["and", "or", "not", "dup", "drop", "swap", "over", "rot", "substr", "strlen"] {
        assert_eq!(
            structural_kinds(op),
            vec![TokenKind::Operator, TokenKind::Eof],
            "{} should tokenize as an operator",
            op
        );
    }
}

#[test]
fn longest_symbol_wins() {
    assert_eq!(
        tokenize("<= < != ! >=")
            .into_iter()
            .filter(|(kind, _)| kind.is_structural())
            .collect::<Vec<_>>(),
        vec![
            (TokenKind::Operator, "<=".to_string()),
            (TokenKind::Operator, "<".to_string()),
            (TokenKind::Operator, "!=".to_string()),
            (TokenKind::Bang, "!".to_string()),
            (TokenKind::Operator, ">=".to_string()),
            (TokenKind::Eof, String::new()),
        ]
    );
}

#[test]
fn punctuation_kinds() {
    assert_eq!(
        structural_kinds("{ } [ ] , : ? * ."),
        vec![
            TokenKind::OpenBrace,
            TokenKind::CloseBrace,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Comma,
            TokenKind::Colon,
            TokenKind::Question,
            TokenKind::Star,
            TokenKind::Operator,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comment_wins_over_divide() {
    let kinds = structural_kinds("1 / 2 // 3 / 4");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Integer,
            TokenKind::Operator,
            TokenKind::Integer,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn string_escapes() {
    let tokens = tokenize(r#""asdf \\ asdf \n asdf \"""#);
    assert_eq!(tokens[0].0, TokenKind::String);
    assert_eq!(tokens[1].0, TokenKind::Eof);
}

#[test]
fn invalid_escape_fails() {
    let code = Code::from(r#"1 "a\q" 2"#);
    let failure = Tokenizer::new().tokenize(&code).unwrap_err();
    assert_eq!(failure.pointer, 2);
    assert_eq!(failure.position, Position::new(1, 3));
}

#[test]
fn unterminated_string_fails() {
    let code = Code::from("\"abc");
    assert!(Tokenizer::new().tokenize(&code).is_err());
}

#[test]
fn unknown_character_fails_with_position() {
    let code = Code::from("fn foo\n    A");
    let failure = Tokenizer::new().tokenize(&code).unwrap_err();
    assert_eq!(failure.position, Position::new(2, 5));
}

#[test]
fn positions_track_lines() {
    let source = "1\n  23\n456";
    let code = Code::from(source);
    let tokens = Tokenizer::new().tokenize(&code).unwrap();

    let integers: Vec<Position> = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Integer)
        .map(|token| code.obtain_position(token.start))
        .collect();

    assert_eq!(
        integers,
        vec![
            Position::new(1, 1),
            Position::new(2, 3),
            Position::new(3, 1),
        ]
    );
}
