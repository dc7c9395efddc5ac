use crate::errors::LoadError;
use crate::parser::models::{
    FunctionBodyItem, FunctionName, ParsedBuiltinsFile, ParsedFile, ParsedType,
};
use crate::parser::{parse_builtins_file, parse_regular_file, ParseFailure, ParseTree, Transformer};
use crate::tokenizer::{TokenKind, Tokenizer};
use crate::util::Code;
use std::path::Path;

fn parse_source(source: &str) -> Result<ParseTree, ParseFailure> {
    let code = Code::from(source);
    let tokens = Tokenizer::new().tokenize(&code).unwrap();
    parse_regular_file(&tokens)
}

fn transform_source(source: &str) -> Result<ParsedFile, LoadError> {
    let code = Code::from(source);
    let tokens = Tokenizer::new().tokenize(&code).unwrap();
    let tree = parse_regular_file(&tokens).unwrap();
    Transformer::new(Path::new("test.aaa"), &code, &tokens).transform_regular_file(&tree)
}

fn transform_builtins_source(source: &str) -> Result<ParsedBuiltinsFile, LoadError> {
    let code = Code::from(source);
    let tokens = Tokenizer::new().tokenize(&code).unwrap();
    let tree = parse_builtins_file(&tokens).unwrap();
    Transformer::new(Path::new("builtins.aaa"), &code, &tokens).transform_builtins_file(&tree)
}

#[test]
fn parse_functions() {
    let accepted = [
        "fn a begin end",
        "fn a args b: int begin end",
        "fn a args b: int, c: str return int, bool begin end",
        "fn a return vec[int] begin vec[int] end",
        "fn a begin 3 5 < true and end",
        "fn a begin if while end else while end end end",
        "fn a begin if if else end else if else end end end",
        "fn counter:bump args c: counter begin end",
        "fn a args x: *element return *element begin end",
    ];
    for source in accepted {
        assert!(parse_source(source).is_ok(), "should parse: {}", source);
    }
}

#[test]
fn parse_failures() {
    let rejected = [
        "fn a begin",
        "fn a end",
        "fn begin end",
        "fn a begin end end",
        "fn a begin if while else end end end",
        "fn a args begin end",
        "fn a args b int begin end",
        "struct s { }",
        "from \"./other\" import",
    ];
    for source in rejected {
        assert!(parse_source(source).is_err(), "should not parse: {}", source);
    }
}

#[test]
fn keyword_as_function_name_reports_identifier_expectation() {
    let failure = parse_source("fn true begin end").unwrap_err();
    assert_eq!(failure.token.kind, TokenKind::True);
    assert!(failure.expected.contains(&TokenKind::Identifier));
}

#[test]
fn failure_reports_deepest_token() {
    let source = "fn a begin 1 . end\nfn b begin ] end";
    let failure = parse_source(source).unwrap_err();
    let code = Code::from(source);
    assert_eq!(code.obtain_position(failure.token.start).line, 2);
}

#[test]
fn root_tree_spans_all_tokens() {
    let source = "fn a begin end";
    let code = Code::from(source);
    let tokens = Tokenizer::new().tokenize(&code).unwrap();
    let tree = parse_regular_file(&tokens).unwrap();
    tree.print().unwrap();

    assert_eq!(tree.token_offset, 0);
    // Everything except the trailing EOF token.
    assert_eq!(tree.token_count, tokens.len() - 1);
}

fn tree_to_json(tree: &ParseTree) -> serde_json::Value {
    serde_json::json!({
        "kind": format!("{:?}", tree.kind),
        "offset": tree.token_offset,
        "count": tree.token_count,
        "children": tree.children.iter().map(tree_to_json).collect::<Vec<_>>(),
    })
}

#[test]
fn concrete_tree_fixture() {
    // Token stream: fn _ a _ begin _ 1 _ . _ end eof, whitespace included
    // in the offsets.
    let source = "fn a begin 1 . end";
    let code = Code::from(source);
    let tokens = Tokenizer::new().tokenize(&code).unwrap();
    let tree = parse_regular_file(&tokens).unwrap();

    let leaf = |kind: &str, offset: usize| {
        serde_json::json!({ "kind": kind, "offset": offset, "count": 1, "children": [] })
    };

    assert_eq!(
        tree_to_json(&tree),
        serde_json::json!({
            "kind": "NonTerminal(RegularFileRoot)", "offset": 0, "count": 11,
            "children": [{
                "kind": "NonTerminal(RegularFileItem)", "offset": 0, "count": 11,
                "children": [{
                    "kind": "NonTerminal(FunctionDefinition)", "offset": 0, "count": 11,
                    "children": [
                        leaf("Terminal(Fn)", 0),
                        {
                            "kind": "NonTerminal(FunctionName)", "offset": 2, "count": 1,
                            "children": [leaf("Terminal(Identifier)", 2)],
                        },
                        leaf("Terminal(Begin)", 4),
                        {
                            "kind": "NonTerminal(FunctionBody)", "offset": 6, "count": 3,
                            "children": [
                                {
                                    "kind": "NonTerminal(FunctionBodyItem)", "offset": 6, "count": 1,
                                    "children": [leaf("Terminal(Integer)", 6)],
                                },
                                {
                                    "kind": "NonTerminal(FunctionBodyItem)", "offset": 8, "count": 1,
                                    "children": [{
                                        "kind": "NonTerminal(Operator)", "offset": 8, "count": 1,
                                        "children": [leaf("Terminal(Operator)", 8)],
                                    }],
                                },
                            ],
                        },
                        leaf("Terminal(End)", 10),
                    ],
                }],
            }],
        })
    );
}

#[test]
fn transform_function_body_items() {
    let parsed = transform_source(
        r#"
        fn a args n: int begin
            1 "x\n" true n
            if 1 . else 0 . end
            while dup end
            vec[int]
            counter:bump
            "field" ?
            "field" { 3 } !
        end
        "#,
    )
    .unwrap();

    let function = &parsed.functions[0];
    assert_eq!(function.name, FunctionName::Plain("a".to_string()));
    assert_eq!(function.arguments.len(), 1);

    let items = &function.body.items;
    assert!(matches!(&items[0], FunctionBodyItem::IntegerLiteral(i) if i.value == 1));
    assert!(matches!(&items[1], FunctionBodyItem::StringLiteral(s) if s.value == "x\n"));
    assert!(matches!(&items[2], FunctionBodyItem::BooleanLiteral(b) if b.value));
    assert!(matches!(&items[3], FunctionBodyItem::Identifier(i) if i.name == "n"));

    match &items[4] {
        FunctionBodyItem::Branch(branch) => {
            assert!(branch.condition.items.is_empty());
            assert_eq!(branch.if_body.items.len(), 2);
            assert_eq!(branch.else_body.items.len(), 2);
        }
        other => panic!("expected a branch, got {:?}", other),
    }
    match &items[5] {
        FunctionBodyItem::Loop(lp) => {
            assert!(lp.condition.items.is_empty());
            assert_eq!(lp.body.items.len(), 1);
        }
        other => panic!("expected a loop, got {:?}", other),
    }
    assert!(matches!(&items[6], FunctionBodyItem::TypeLiteral(t) if t.name == "vec"));
    assert!(
        matches!(&items[7], FunctionBodyItem::MemberFunction(m) if m.name_key() == "counter:bump")
    );
    assert!(
        matches!(&items[8], FunctionBodyItem::StructFieldQuery(q) if q.field_name == "field")
    );
    match &items[9] {
        FunctionBodyItem::StructFieldUpdate(update) => {
            assert_eq!(update.field_name, "field");
            assert_eq!(update.new_value_expr.items.len(), 1);
        }
        other => panic!("expected a field update, got {:?}", other),
    }
}

#[test]
fn transform_branch_without_else() {
    let parsed = transform_source("fn a begin if end end").unwrap();
    match &parsed.functions[0].body.items[0] {
        FunctionBodyItem::Branch(branch) => assert!(branch.else_body.items.is_empty()),
        other => panic!("expected a branch, got {:?}", other),
    }
}

#[test]
fn transform_struct_and_import() {
    let parsed = transform_source(
        r#"
        from "./lib/other" import foo, bar as baz
        struct point { x: int, y: int }
        "#,
    )
    .unwrap();

    let import = &parsed.imports[0];
    assert_eq!(import.source, "./lib/other");
    assert_eq!(import.items[0].original_name, "foo");
    assert_eq!(import.items[0].imported_name, "foo");
    assert_eq!(import.items[1].original_name, "bar");
    assert_eq!(import.items[1].imported_name, "baz");

    let st = &parsed.structs[0];
    assert_eq!(st.name, "point");
    assert_eq!(st.fields.len(), 2);
    assert!(matches!(&st.fields[0].ty, ParsedType::Literal(l) if l.name == "int"));
}

#[test]
fn transform_member_function_name() {
    let parsed = transform_source("fn counter:bump begin end").unwrap();
    assert_eq!(parsed.functions[0].name.name_key(), "counter:bump");
}

#[test]
fn empty_file_is_rejected() {
    assert!(matches!(
        transform_source("// nothing here\n"),
        Err(LoadError::EmptyParseTree { .. })
    ));
}

#[test]
fn colliding_argument_names_are_rejected() {
    assert!(matches!(
        transform_source("fn a args x: int, x: int begin end"),
        Err(LoadError::CollidingIdentifier { name, .. }) if name == "x"
    ));
}

#[test]
fn colliding_struct_fields_are_rejected() {
    assert!(matches!(
        transform_source("struct s { x: int, x: str }"),
        Err(LoadError::CollidingIdentifier { name, .. }) if name == "x"
    ));
}

#[test]
fn huge_integer_literal_is_rejected() {
    assert!(matches!(
        transform_source("fn a begin 99999999999999999999999999 drop end"),
        Err(LoadError::IntegerOutOfRange { .. })
    ));
}

#[test]
fn transform_builtins_file() {
    let parsed = transform_builtins_source(
        "fn \"dup\" args *a return *a, *a\nfn \"vec:push\" args vec[*a], *a return vec[*a]\n",
    )
    .unwrap();

    assert_eq!(parsed.functions.len(), 2);
    assert_eq!(parsed.functions[0].name, "dup");
    assert_eq!(parsed.functions[0].arguments.len(), 1);
    assert_eq!(parsed.functions[0].return_types.len(), 2);
    assert!(matches!(
        &parsed.functions[0].arguments[0],
        ParsedType::Placeholder(p) if p.name == "a"
    ));
    assert_eq!(parsed.functions[1].name, "vec:push");
    assert!(matches!(
        &parsed.functions[1].arguments[0],
        ParsedType::Literal(l) if l.name == "vec" && l.params.len() == 1
    ));
}
