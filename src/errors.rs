//! Diagnostics of the toolchain.
//!
//! Every load stage error carries the source file it was found in and,
//! where one exists, the line/column of the offending token. The loader
//! accumulates [LoadError]s across all files; [RuntimeError]s abort
//! execution immediately.

use crate::tokenizer::TokenKind;
use crate::typing::{format_types, Signature, VariableType};
use crate::util::Position;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
/// An error found while loading, parsing, resolving or type checking
/// source files.
pub enum LoadError {
    Tokenize {
        file: PathBuf,
        position: Position,
    },
    Parse {
        file: PathBuf,
        position: Position,
        expected: Vec<TokenKind>,
        found: String,
    },
    KeywordUsedAsIdentifier {
        file: PathBuf,
        position: Position,
        keyword: String,
    },
    EmptyParseTree {
        file: PathBuf,
    },
    IntegerOutOfRange {
        file: PathBuf,
        position: Position,
    },
    FileRead {
        file: PathBuf,
    },
    AbsoluteImport {
        file: PathBuf,
        position: Position,
        source: String,
    },
    CyclicImport {
        dependencies: Vec<PathBuf>,
        failed_import: PathBuf,
    },
    MissingEnvironmentVariable {
        name: &'static str,
    },
    MainFunctionNotFound {
        file: PathBuf,
    },
    CollidingIdentifier {
        file: PathBuf,
        position: Position,
        name: String,
    },
    FunctionNameCollision {
        file: PathBuf,
        position: Position,
        name: String,
    },
    ImportedItemNotFound {
        file: PathBuf,
        position: Position,
        item: String,
    },
    IndirectImport {
        file: PathBuf,
        position: Position,
        item: String,
    },
    UnknownIdentifier {
        file: PathBuf,
        position: Position,
        name: String,
    },
    UnknownType {
        file: PathBuf,
        position: Position,
        name: String,
    },
    UnknownFunction {
        file: PathBuf,
        position: Position,
        name: String,
    },
    UnknownStructField {
        file: PathBuf,
        position: Position,
        struct_name: String,
        field_name: String,
    },
    StackTypes {
        file: PathBuf,
        position: Position,
        name: String,
        signature: Signature,
        stack: Vec<VariableType>,
    },
    ConditionType {
        file: PathBuf,
        position: Position,
        stack: Vec<VariableType>,
    },
    BranchType {
        file: PathBuf,
        position: Position,
        if_stack: Vec<VariableType>,
        else_stack: Vec<VariableType>,
    },
    LoopType {
        file: PathBuf,
        position: Position,
        before: Vec<VariableType>,
        after: Vec<VariableType>,
    },
    ArgumentTypeMismatch {
        file: PathBuf,
        position: Position,
        expected: VariableType,
        found: Vec<VariableType>,
    },
    StructOperator {
        file: PathBuf,
        position: Position,
        operator: String,
        stack: Vec<VariableType>,
    },
    FunctionTypes {
        file: PathBuf,
        position: Position,
        name: String,
        expected: Vec<VariableType>,
        found: Vec<VariableType>,
    },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Tokenize { file, position } => {
                write!(f, "{}:{}: could not tokenize input", file.display(), position)
            }
            LoadError::Parse {
                file,
                position,
                expected,
                found,
            } => {
                let expected = expected
                    .iter()
                    .map(|kind| kind.describe())
                    .collect::<Vec<&str>>()
                    .join(", ");
                write!(
                    f,
                    "{}:{}: parse error, found {} while expecting one of: {}",
                    file.display(),
                    position,
                    found,
                    expected
                )
            }
            LoadError::KeywordUsedAsIdentifier {
                file,
                position,
                keyword,
            } => write!(
                f,
                "{}:{}: keyword '{}' can not be used as an identifier",
                file.display(),
                position,
                keyword
            ),
            LoadError::EmptyParseTree { file } => {
                write!(f, "{}: file contains no definitions", file.display())
            }
            LoadError::IntegerOutOfRange { file, position } => write!(
                f,
                "{}:{}: integer literal does not fit in 64 bits",
                file.display(),
                position
            ),
            LoadError::FileRead { file } => {
                write!(f, "{}: could not read file", file.display())
            }
            LoadError::AbsoluteImport {
                file,
                position,
                source,
            } => write!(
                f,
                "{}:{}: import source \"{}\" must be a relative path",
                file.display(),
                position,
                source
            ),
            LoadError::CyclicImport {
                dependencies,
                failed_import,
            } => {
                writeln!(f, "cyclic import of {}:", failed_import.display())?;
                for dependency in dependencies {
                    writeln!(f, "    {}", dependency.display())?;
                }
                write!(f, "    {}", failed_import.display())
            }
            LoadError::MissingEnvironmentVariable { name } => {
                write!(f, "environment variable {} is not set", name)
            }
            LoadError::MainFunctionNotFound { file } => write!(
                f,
                "{}: no function main without arguments and return types found",
                file.display()
            ),
            LoadError::CollidingIdentifier {
                file,
                position,
                name,
            } => write!(
                f,
                "{}:{}: identifier '{}' collides with an earlier definition",
                file.display(),
                position,
                name
            ),
            LoadError::FunctionNameCollision {
                file,
                position,
                name,
            } => write!(
                f,
                "{}:{}: function '{}' is defined more than once",
                file.display(),
                position,
                name
            ),
            LoadError::ImportedItemNotFound {
                file,
                position,
                item,
            } => write!(
                f,
                "{}:{}: imported item '{}' was not found",
                file.display(),
                position,
                item
            ),
            LoadError::IndirectImport {
                file,
                position,
                item,
            } => write!(
                f,
                "{}:{}: '{}' is an import itself, indirect imports are forbidden",
                file.display(),
                position,
                item
            ),
            LoadError::UnknownIdentifier {
                file,
                position,
                name,
            } => write!(
                f,
                "{}:{}: unknown identifier '{}'",
                file.display(),
                position,
                name
            ),
            LoadError::UnknownType {
                file,
                position,
                name,
            } => write!(
                f,
                "{}:{}: unknown type '{}'",
                file.display(),
                position,
                name
            ),
            LoadError::UnknownFunction {
                file,
                position,
                name,
            } => write!(
                f,
                "{}:{}: unknown function '{}'",
                file.display(),
                position,
                name
            ),
            LoadError::UnknownStructField {
                file,
                position,
                struct_name,
                field_name,
            } => write!(
                f,
                "{}:{}: struct {} has no field \"{}\"",
                file.display(),
                position,
                struct_name,
                field_name
            ),
            LoadError::StackTypes {
                file,
                position,
                name,
                signature,
                stack,
            } => write!(
                f,
                "{}:{}: '{}' expects {} but the stack holds [{}]",
                file.display(),
                position,
                name,
                signature,
                format_types(stack)
            ),
            LoadError::ConditionType {
                file,
                position,
                stack,
            } => write!(
                f,
                "{}:{}: condition must leave a bool on top, the stack holds [{}]",
                file.display(),
                position,
                format_types(stack)
            ),
            LoadError::BranchType {
                file,
                position,
                if_stack,
                else_stack,
            } => write!(
                f,
                "{}:{}: branch arms disagree, if leaves [{}] and else leaves [{}]",
                file.display(),
                position,
                format_types(if_stack),
                format_types(else_stack)
            ),
            LoadError::LoopType {
                file,
                position,
                before,
                after,
            } => write!(
                f,
                "{}:{}: loop body must restore the stack, [{}] became [{}]",
                file.display(),
                position,
                format_types(before),
                format_types(after)
            ),
            LoadError::ArgumentTypeMismatch {
                file,
                position,
                expected,
                found,
            } => write!(
                f,
                "{}:{}: field update expression must produce {} but produced [{}]",
                file.display(),
                position,
                expected,
                format_types(found)
            ),
            LoadError::StructOperator {
                file,
                position,
                operator,
                stack,
            } => write!(
                f,
                "{}:{}: '{}' needs a struct on top of the stack, the stack holds [{}]",
                file.display(),
                position,
                operator,
                format_types(stack)
            ),
            LoadError::FunctionTypes {
                file,
                position,
                name,
                expected,
                found,
            } => write!(
                f,
                "{}:{}: function '{}' should leave [{}] but leaves [{}]",
                file.display(),
                position,
                name,
                format_types(expected),
                format_types(found)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// An error aborting program execution.
pub enum RuntimeError {
    StackUnderflow,
    UnexpectedType {
        expected: &'static str,
        found: String,
    },
    StackNotEmptyAtExit {
        left: usize,
    },
    InvalidJump {
        target: usize,
        length: usize,
    },
    InvalidFunctionCall {
        file: PathBuf,
        name: String,
    },
    DivisionByZero,
    ModuloByZero,
    IndexOutOfRange {
        index: i64,
        length: usize,
    },
    KeyNotFound {
        key: String,
    },
    AssertionFailed,
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::StackUnderflow => write!(f, "stack underflow"),
            RuntimeError::UnexpectedType { expected, found } => {
                write!(f, "unexpected type: expected {}, found {}", expected, found)
            }
            RuntimeError::StackNotEmptyAtExit { left } => {
                write!(f, "{} values were left on the stack at exit", left)
            }
            RuntimeError::InvalidJump { target, length } => write!(
                f,
                "jump to instruction {} of a function with {} instructions",
                target, length
            ),
            RuntimeError::InvalidFunctionCall { file, name } => {
                write!(f, "call of unknown function {}:{}", file.display(), name)
            }
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::ModuloByZero => write!(f, "modulo by zero"),
            RuntimeError::IndexOutOfRange { index, length } => write!(
                f,
                "index {} is out of range for a vector of size {}",
                index, length
            ),
            RuntimeError::KeyNotFound { key } => write!(f, "key {} was not found", key),
            RuntimeError::AssertionFailed => write!(f, "assertion failed"),
        }
    }
}
