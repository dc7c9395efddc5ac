use super::{ParseFailure, ParseTree, TreeKind};
use crate::grammar::{NonTerminal, Symbol, REWRITE_RULES};
use crate::tokenizer::{Token, TokenKind};

/// The LL matching engine over a token stream.
///
/// Alternatives are tried in rule order and the first fully matching one
/// wins; repetitions are greedy. The matcher records the deepest terminal
/// failure so that a failed parse reports the offending token together with
/// every terminal expected there.
struct Matcher<'t> {
    tokens: &'t [Token],
    filtered: Vec<usize>,
    furthest: usize,
    expected: Vec<TokenKind>,
}

/// Parse a regular source file.
pub fn parse_regular_file(tokens: &[Token]) -> Result<ParseTree, ParseFailure> {
    Matcher::new(tokens).parse(NonTerminal::RegularFileRoot)
}

/// Parse the builtins signature file.
pub fn parse_builtins_file(tokens: &[Token]) -> Result<ParseTree, ParseFailure> {
    Matcher::new(tokens).parse(NonTerminal::BuiltinsFileRoot)
}

impl<'t> Matcher<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let filtered = tokens
            .iter()
            .enumerate()
            .filter_map(|(index, token)| {
                if token.kind.is_structural() {
                    Some(index)
                } else {
                    None
                }
            })
            .collect();

        Self {
            tokens,
            filtered,
            furthest: 0,
            expected: Vec::new(),
        }
    }

    fn parse(mut self, root: NonTerminal) -> Result<ParseTree, ParseFailure> {
        if let Some((tree, consumed)) = self.match_rule(root, 0) {
            if self.token_at(consumed).kind == TokenKind::Eof {
                return Ok(tree);
            }
            self.record_failure(consumed, TokenKind::Eof);
        }

        let token = *self.token_at(self.furthest);
        let mut expected = self.expected;
        expected.sort();
        expected.dedup();
        Err(ParseFailure { token, expected })
    }

    /// The structural token at a filtered index. The stream always ends
    /// with an [Eof](TokenKind::Eof) token, which no rule consumes, so the
    /// index stays in range.
    fn token_at(&self, index: usize) -> &Token {
        &self.tokens[self.filtered[index]]
    }

    fn record_failure(&mut self, index: usize, expected: TokenKind) {
        if index > self.furthest {
            self.furthest = index;
            self.expected.clear();
        }
        if index == self.furthest {
            self.expected.push(expected);
        }
    }

    fn match_rule(&mut self, nt: NonTerminal, index: usize) -> Option<(ParseTree, usize)> {
        let rule = &REWRITE_RULES[&nt];

        for alternative in &rule.alternatives {
            if let Some((children, consumed)) = self.match_sequence(alternative, index) {
                let tree = self.make_node(TreeKind::NonTerminal(nt), index, consumed, children);
                return Some((tree, consumed));
            }
        }
        None
    }

    fn match_sequence(
        &mut self,
        sequence: &[Symbol],
        index: usize,
    ) -> Option<(Vec<ParseTree>, usize)> {
        let mut children: Vec<ParseTree> = Vec::new();
        let mut moved_index = index;
        for symbol in sequence {
            let (trees, consumed) = self.match_symbol(symbol, moved_index)?;
            children.extend(trees);
            moved_index = consumed;
        }
        Some((children, moved_index))
    }

    fn match_symbol(&mut self, symbol: &Symbol, index: usize) -> Option<(Vec<ParseTree>, usize)> {
        match symbol {
            Symbol::Terminal(kind) => {
                if self.token_at(index).kind == *kind {
                    let leaf = ParseTree::leaf(TreeKind::Terminal(*kind), self.filtered[index]);
                    Some((vec![leaf], index + 1))
                } else {
                    self.record_failure(index, *kind);
                    None
                }
            }
            Symbol::NonTerminal(nt) => {
                let (tree, consumed) = self.match_rule(*nt, index)?;
                Some((vec![tree], consumed))
            }
            Symbol::Optional(inner) => match self.match_symbol(inner, index) {
                Some(matched) => Some(matched),
                None => Some((Vec::with_capacity(0), index)),
            },
            Symbol::ZeroOrMore(inner) => Some(self.match_repeated(inner, index)),
            Symbol::OneOrMore(inner) => {
                let (mut children, consumed) = self.match_symbol(inner, index)?;
                let (more, consumed) = self.match_repeated(inner, consumed);
                children.extend(more);
                Some((children, consumed))
            }
        }
    }

    fn match_repeated(&mut self, symbol: &Symbol, index: usize) -> (Vec<ParseTree>, usize) {
        let mut children: Vec<ParseTree> = Vec::new();
        let mut moved_index = index;
        while let Some((trees, consumed)) = self.match_symbol(symbol, moved_index) {
            if consumed == moved_index {
                break;
            }
            children.extend(trees);
            moved_index = consumed;
        }
        (children, moved_index)
    }

    /// Wrap children into a non-terminal node, mapping the filtered range
    /// back to unfiltered token offsets.
    fn make_node(
        &self,
        kind: TreeKind,
        start: usize,
        end: usize,
        children: Vec<ParseTree>,
    ) -> ParseTree {
        let token_offset = if start < self.filtered.len() {
            self.filtered[start]
        } else {
            self.tokens.len()
        };
        let token_count = if end > start {
            self.filtered[end - 1] + 1 - token_offset
        } else {
            0
        };
        ParseTree::new(kind, token_offset, token_count, children)
    }
}
