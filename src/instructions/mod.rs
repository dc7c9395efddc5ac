//! The flat instruction representation functions are lowered into.

mod generator;

#[cfg(test)]
mod __tests__;

pub use generator::InstructionGenerator;

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
/// A single instruction of the stack machine. `Jump` and `JumpIfFalse`
/// targets are absolute indices into the same function's instruction list;
/// a target equal to the list length returns from the function.
pub enum Instruction {
    PushInt(i64),
    PushBool(bool),
    PushString(String),
    /// Push a copy of a named argument of the current frame.
    PushFunctionArgument(String),
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equals,
    NotEqual,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    Not,
    Print,
    Drop,
    Dup,
    Swap,
    Over,
    Rot,
    Substr,
    StrLen,
    Jump(usize),
    JumpIfFalse(usize),
    CallFunction { file: PathBuf, name: String },
    PushVec,
    PushMap,
    /// Push the zero value of a struct declared in `file`.
    PushStruct { file: PathBuf, name: String },
    GetStructField(String),
    SetStructField(String),
    Nop,
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::PushInt(value) => write!(f, "PushInt({})", value),
            Instruction::PushBool(value) => write!(f, "PushBool({})", value),
            Instruction::PushString(value) => write!(f, "PushString({:?})", value),
            Instruction::PushFunctionArgument(name) => {
                write!(f, "PushFunctionArgument({})", name)
            }
            Instruction::Jump(target) => write!(f, "Jump({})", target),
            Instruction::JumpIfFalse(target) => write!(f, "JumpIfFalse({})", target),
            Instruction::CallFunction { name, .. } => write!(f, "CallFunction({})", name),
            Instruction::PushStruct { name, .. } => write!(f, "PushStruct({})", name),
            Instruction::GetStructField(name) => write!(f, "GetStructField({})", name),
            Instruction::SetStructField(name) => write!(f, "SetStructField({})", name),
            other => write!(f, "{:?}", other),
        }
    }
}
