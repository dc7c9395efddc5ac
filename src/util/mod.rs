mod code;
mod logger;
mod position;

use once_cell::unsync::OnceCell;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A line/column pair inside a source file. Both fields are 1-based.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A source buffer with a lazily built table of line break offsets,
/// so that byte pointers can be mapped to a [Position] on demand.
pub struct Code<'c> {
    pub value: &'c [u8],
    line_breaks: OnceCell<Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Verbosity levels for the debugging output of the tokenizer, the parser
/// and the interpreter.
pub enum Log<T> {
    None,
    Default(T),
    Verbose(T),
}
