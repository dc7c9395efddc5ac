//! Toolchain for the aaa language: a small concatenative, stack based
//! programming language.
//!
//! # Overview
//!
//! Source files declare functions, structs and imports; function bodies are
//! sequences of words manipulating a value stack. The crate implements the
//! whole pipeline from source text to executed behavior:
//!
//! 1. The [tokenizer] performs lossless lexical analysis with exact source
//!    positions.
//! 2. The [grammar] expresses the language as a table of rewrite rules; the
//!    [parser] reduces the table to an LL style recursive matcher producing
//!    a concrete parse tree, then lowers it to a typed AST.
//! 3. The [program] loader resolves identifiers across files, loading
//!    transitive imports and detecting collisions and cycles; the
//!    [cross_referencer] binds every identifier of every function body to
//!    its definition.
//! 4. The [typing] checker validates each function's declared signature
//!    against the stack effect of its body, unifying type placeholders.
//! 5. The [instructions] generator lowers each function into a flat
//!    instruction list with explicit jump targets.
//! 6. The [runtime] interpreter executes the instruction lists on a value
//!    stack with a call stack of frames, backing the builtins natively.
//!
//! Data flows strictly forward; every stage either produces a structurally
//! stronger representation or a diagnostic ([errors]) attributed to a
//! source position. The standard library directory is supplied through the
//! `AAA_STDLIB_PATH` environment variable and must contain `builtins.aaa`.

pub mod cross_referencer;
pub mod errors;
pub mod grammar;
pub mod instructions;
pub mod parser;
pub mod program;
pub mod runtime;
pub mod tokenizer;
pub mod typing;
pub mod util;

pub use errors::{LoadError, RuntimeError};
pub use program::Program;
pub use runtime::Interpreter;
