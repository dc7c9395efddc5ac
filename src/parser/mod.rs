//! The grammar driven parser.
//!
//! [matcher] reduces the rewrite-rule table to an LL style recursive
//! matcher with ordered alternatives and greedy repetition, producing a
//! concrete [ParseTree]. [transformer] then lowers the concrete tree into
//! the typed AST of [models].

mod matcher;
pub mod models;
mod transformer;

#[cfg(test)]
mod __tests__;

pub use matcher::{parse_builtins_file, parse_regular_file};
pub use transformer::Transformer;

use crate::grammar::NonTerminal;
use crate::tokenizer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The tag of a concrete parse tree node.
pub enum TreeKind {
    Terminal(TokenKind),
    NonTerminal(NonTerminal),
}

#[derive(Debug, Clone)]
/// A node of the concrete parse tree. `token_offset` and `token_count`
/// index the unfiltered token stream, so any subtree can be mapped back to
/// its source range in constant time.
pub struct ParseTree {
    pub kind: TreeKind,
    pub token_offset: usize,
    pub token_count: usize,
    pub children: Vec<ParseTree>,
}

#[derive(Debug, Clone)]
/// The deepest partial match of a failed parse: the offending token and the
/// set of terminals which would have allowed the parser to continue there.
pub struct ParseFailure {
    pub token: Token,
    pub expected: Vec<TokenKind>,
}

impl ParseTree {
    pub fn new(
        kind: TreeKind,
        token_offset: usize,
        token_count: usize,
        children: Vec<ParseTree>,
    ) -> Self {
        Self {
            kind,
            token_offset,
            token_count,
            children,
        }
    }

    pub fn leaf(kind: TreeKind, token_offset: usize) -> Self {
        ParseTree::new(kind, token_offset, 1, Vec::with_capacity(0))
    }

    /// Whether the node was produced for the given non-terminal.
    pub fn is_rule(&self, nt: NonTerminal) -> bool {
        self.kind == TreeKind::NonTerminal(nt)
    }

    /// The first child produced for the given non-terminal.
    pub fn child_rule(&self, nt: NonTerminal) -> Option<&ParseTree> {
        self.children.iter().find(|child| child.is_rule(nt))
    }

    /// The shallow children produced for the given non-terminal.
    pub fn child_rules<'t>(&'t self, nt: NonTerminal) -> impl Iterator<Item = &'t ParseTree> {
        self.children.iter().filter(move |child| child.is_rule(nt))
    }
}

impl ptree::TreeItem for ParseTree {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match self.kind {
            TreeKind::Terminal(kind) => write!(f, "{:?}", kind),
            TreeKind::NonTerminal(nt) => write!(f, "{}", nt),
        }?;
        write!(f, " # {}+{}", self.token_offset, self.token_count)
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(&self.children)
    }
}

impl ParseTree {
    /// Render the tree to standard output, for debugging.
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}
