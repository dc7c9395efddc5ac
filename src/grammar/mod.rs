//! The grammar of the language, expressed as a table of rewrite rules.
//!
//! Every non-terminal maps to an ordered alternation of sequences. Sequence
//! elements are terminals, non-terminals or the repetition wrappers
//! [Optional](Symbol::Optional), [ZeroOrMore](Symbol::ZeroOrMore) and
//! [OneOrMore](Symbol::OneOrMore). The [parser](crate::parser) reduces this
//! table to an LL style recursive matcher; [generator] renders it into the
//! canonical `grammar.txt` dump.

mod generator;

#[cfg(test)]
mod __tests__;

pub use generator::{build_grammar, check_grammar_file_staleness};

use crate::tokenizer::TokenKind;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NonTerminal {
    RegularFileRoot,
    RegularFileItem,
    BuiltinsFileRoot,
    BuiltinFunctionDefinition,
    BuiltinArguments,
    FunctionDefinition,
    FunctionName,
    Arguments,
    Argument,
    ArgumentTail,
    ReturnTypes,
    Type,
    TypeTail,
    TypeLiteral,
    TypeParams,
    TypePlaceholder,
    FunctionBody,
    FunctionBodyItem,
    Branch,
    BranchElse,
    Loop,
    Boolean,
    Operator,
    MemberFunction,
    StructFieldQuery,
    StructFieldUpdate,
    StructDefinition,
    ImportStatement,
    ImportItem,
    ImportAlias,
    ImportItemTail,
}

impl NonTerminal {
    /// Every non-terminal, in the order rules are dumped to the grammar
    /// file.
    pub const ALL: [NonTerminal; 31] = [
        NonTerminal::RegularFileRoot,
        NonTerminal::RegularFileItem,
        NonTerminal::BuiltinsFileRoot,
        NonTerminal::BuiltinFunctionDefinition,
        NonTerminal::BuiltinArguments,
        NonTerminal::FunctionDefinition,
        NonTerminal::FunctionName,
        NonTerminal::Arguments,
        NonTerminal::Argument,
        NonTerminal::ArgumentTail,
        NonTerminal::ReturnTypes,
        NonTerminal::Type,
        NonTerminal::TypeTail,
        NonTerminal::TypeLiteral,
        NonTerminal::TypeParams,
        NonTerminal::TypePlaceholder,
        NonTerminal::FunctionBody,
        NonTerminal::FunctionBodyItem,
        NonTerminal::Branch,
        NonTerminal::BranchElse,
        NonTerminal::Loop,
        NonTerminal::Boolean,
        NonTerminal::Operator,
        NonTerminal::MemberFunction,
        NonTerminal::StructFieldQuery,
        NonTerminal::StructFieldUpdate,
        NonTerminal::StructDefinition,
        NonTerminal::ImportStatement,
        NonTerminal::ImportItem,
        NonTerminal::ImportAlias,
        NonTerminal::ImportItemTail,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NonTerminal::RegularFileRoot => "regular_file_root",
            NonTerminal::RegularFileItem => "regular_file_item",
            NonTerminal::BuiltinsFileRoot => "builtins_file_root",
            NonTerminal::BuiltinFunctionDefinition => "builtin_function_definition",
            NonTerminal::BuiltinArguments => "builtin_arguments",
            NonTerminal::FunctionDefinition => "function_definition",
            NonTerminal::FunctionName => "function_name",
            NonTerminal::Arguments => "arguments",
            NonTerminal::Argument => "argument",
            NonTerminal::ArgumentTail => "argument_tail",
            NonTerminal::ReturnTypes => "return_types",
            NonTerminal::Type => "type",
            NonTerminal::TypeTail => "type_tail",
            NonTerminal::TypeLiteral => "type_literal",
            NonTerminal::TypeParams => "type_params",
            NonTerminal::TypePlaceholder => "type_placeholder",
            NonTerminal::FunctionBody => "function_body",
            NonTerminal::FunctionBodyItem => "function_body_item",
            NonTerminal::Branch => "branch",
            NonTerminal::BranchElse => "branch_else",
            NonTerminal::Loop => "loop",
            NonTerminal::Boolean => "boolean",
            NonTerminal::Operator => "operator",
            NonTerminal::MemberFunction => "member_function",
            NonTerminal::StructFieldQuery => "struct_field_query",
            NonTerminal::StructFieldUpdate => "struct_field_update",
            NonTerminal::StructDefinition => "struct_definition",
            NonTerminal::ImportStatement => "import_statement",
            NonTerminal::ImportItem => "import_item",
            NonTerminal::ImportAlias => "import_alias",
            NonTerminal::ImportItemTail => "import_item_tail",
        }
    }
}

impl Display for NonTerminal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
/// An element of a rewrite rule sequence.
pub enum Symbol {
    Terminal(TokenKind),
    NonTerminal(NonTerminal),
    Optional(Box<Symbol>),
    ZeroOrMore(Box<Symbol>),
    OneOrMore(Box<Symbol>),
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(kind) => write!(f, "{}", kind.describe()),
            Symbol::NonTerminal(nt) => write!(f, "{}", nt),
            Symbol::Optional(symbol) => write!(f, "({})?", symbol),
            Symbol::ZeroOrMore(symbol) => write!(f, "({})*", symbol),
            Symbol::OneOrMore(symbol) => write!(f, "({})+", symbol),
        }
    }
}

#[derive(Debug, Clone)]
/// An ordered alternation of symbol sequences for one non-terminal.
pub struct RewriteRule {
    pub alternatives: Vec<Vec<Symbol>>,
}

fn t(kind: TokenKind) -> Symbol {
    Symbol::Terminal(kind)
}

fn n(nt: NonTerminal) -> Symbol {
    Symbol::NonTerminal(nt)
}

fn opt(symbol: Symbol) -> Symbol {
    Symbol::Optional(Box::new(symbol))
}

fn zero_or_more(symbol: Symbol) -> Symbol {
    Symbol::ZeroOrMore(Box::new(symbol))
}

fn one_or_more(symbol: Symbol) -> Symbol {
    Symbol::OneOrMore(Box::new(symbol))
}

/// The rewrite rules of the language.
pub static REWRITE_RULES: Lazy<BTreeMap<NonTerminal, RewriteRule>> = Lazy::new(rewrite_rules);

fn rewrite_rules() -> BTreeMap<NonTerminal, RewriteRule> {
    use NonTerminal::*;
    use TokenKind as K;

    let mut rules = BTreeMap::new();
    let mut add = |nt: NonTerminal, alternatives: Vec<Vec<Symbol>>| {
        rules.insert(nt, RewriteRule { alternatives });
    };

    add(RegularFileRoot, vec![vec![zero_or_more(n(RegularFileItem))]]);
    add(
        RegularFileItem,
        vec![
            vec![n(FunctionDefinition)],
            vec![n(ImportStatement)],
            vec![n(StructDefinition)],
        ],
    );
    add(
        BuiltinsFileRoot,
        vec![vec![one_or_more(n(BuiltinFunctionDefinition))]],
    );
    add(
        BuiltinFunctionDefinition,
        vec![vec![
            t(K::Fn),
            t(K::String),
            opt(n(BuiltinArguments)),
            opt(n(ReturnTypes)),
        ]],
    );
    add(
        BuiltinArguments,
        vec![vec![t(K::Args), n(Type), zero_or_more(n(TypeTail))]],
    );
    add(
        FunctionDefinition,
        vec![vec![
            t(K::Fn),
            n(FunctionName),
            opt(n(Arguments)),
            opt(n(ReturnTypes)),
            t(K::Begin),
            n(FunctionBody),
            t(K::End),
        ]],
    );
    add(
        FunctionName,
        vec![vec![n(MemberFunction)], vec![t(K::Identifier)]],
    );
    add(
        Arguments,
        vec![vec![t(K::Args), n(Argument), zero_or_more(n(ArgumentTail))]],
    );
    add(Argument, vec![vec![t(K::Identifier), t(K::Colon), n(Type)]]);
    add(ArgumentTail, vec![vec![t(K::Comma), n(Argument)]]);
    add(
        ReturnTypes,
        vec![vec![t(K::Return), n(Type), zero_or_more(n(TypeTail))]],
    );
    add(Type, vec![vec![n(TypeLiteral)], vec![n(TypePlaceholder)]]);
    add(TypeTail, vec![vec![t(K::Comma), n(Type)]]);
    add(
        TypeLiteral,
        vec![vec![t(K::Identifier), opt(n(TypeParams))]],
    );
    add(
        TypeParams,
        vec![vec![
            t(K::OpenBracket),
            n(Type),
            zero_or_more(n(TypeTail)),
            t(K::CloseBracket),
        ]],
    );
    add(TypePlaceholder, vec![vec![t(K::Star), t(K::Identifier)]]);
    add(FunctionBody, vec![vec![zero_or_more(n(FunctionBodyItem))]]);
    add(
        FunctionBodyItem,
        vec![
            vec![n(Branch)],
            vec![n(Loop)],
            vec![n(StructFieldUpdate)],
            vec![n(StructFieldQuery)],
            vec![n(Boolean)],
            vec![n(MemberFunction)],
            vec![n(Operator)],
            vec![t(K::Integer)],
            vec![t(K::String)],
            vec![n(TypeLiteral)],
        ],
    );
    add(
        Branch,
        vec![vec![
            t(K::If),
            n(FunctionBody),
            opt(n(BranchElse)),
            t(K::End),
        ]],
    );
    add(BranchElse, vec![vec![t(K::Else), n(FunctionBody)]]);
    add(Loop, vec![vec![t(K::While), n(FunctionBody), t(K::End)]]);
    add(Boolean, vec![vec![t(K::True)], vec![t(K::False)]]);
    add(Operator, vec![vec![t(K::Operator)], vec![t(K::Star)]]);
    add(
        MemberFunction,
        vec![vec![t(K::Identifier), t(K::Colon), t(K::Identifier)]],
    );
    add(
        StructFieldQuery,
        vec![vec![t(K::String), t(K::Question)]],
    );
    add(
        StructFieldUpdate,
        vec![vec![
            t(K::String),
            t(K::OpenBrace),
            n(FunctionBody),
            t(K::CloseBrace),
            t(K::Bang),
        ]],
    );
    add(
        StructDefinition,
        vec![vec![
            t(K::Struct),
            t(K::Identifier),
            t(K::OpenBrace),
            n(Argument),
            zero_or_more(n(ArgumentTail)),
            t(K::CloseBrace),
        ]],
    );
    add(
        ImportStatement,
        vec![vec![
            t(K::From),
            t(K::String),
            t(K::Import),
            n(ImportItem),
            zero_or_more(n(ImportItemTail)),
        ]],
    );
    add(
        ImportItem,
        vec![vec![t(K::Identifier), opt(n(ImportAlias))]],
    );
    add(ImportAlias, vec![vec![t(K::As), t(K::Identifier)]]);
    add(ImportItemTail, vec![vec![t(K::Comma), n(ImportItem)]]);

    debug_assert_eq!(rules.len(), NonTerminal::ALL.len());
    rules
}
