use super::Value;
use crate::program::Program;
use crate::typing::{RootType, VariableType};
use std::fmt::{Display, Formatter};
use std::path::Path;

impl Value {
    /// The zero value of a resolved type: `0`, `false`, `""`, an empty
    /// container, or a struct with all fields zeroed.
    pub fn zero(ty: &VariableType, program: &Program) -> Value {
        match &ty.root {
            RootType::Int => Value::Int(0),
            RootType::Bool => Value::Bool(false),
            RootType::Str => Value::Str(String::new()),
            RootType::Vec => Value::Vec(Vec::new()),
            RootType::Map => Value::Map(Vec::new()),
            RootType::Custom { file, name } => Value::zero_struct(file, name, program),
            RootType::Placeholder(_) => {
                unreachable!("placeholders never reach value construction")
            }
        }
    }

    /// The zero value of a struct declared in `file`.
    pub fn zero_struct(file: &Path, name: &str, program: &Program) -> Value {
        let fields = program
            .struct_fields
            .get(file)
            .and_then(|structs| structs.get(name))
            .expect("struct definitions are resolved before execution");

        Value::Struct {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(field_name, field_type)| {
                    (field_name.clone(), Value::zero(field_type, program))
                })
                .collect(),
        }
    }

    /// The name of the value's tag, for type mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Struct { .. } => "struct",
            Value::Vec(_) => "vec",
            Value::Map(_) => "map",
        }
    }

    /// Rendering used inside containers, where strings keep their quotes.
    fn fmt_element(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(value) => write!(f, "{:?}", value),
            other => write!(f, "{}", other),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Bool(true) => write!(f, "true"),
            Value::Bool(false) => write!(f, "false"),
            Value::Str(value) => write!(f, "{}", value),
            Value::Vec(values) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index != 0 {
                        write!(f, ", ")?;
                    }
                    value.fmt_element(f)?;
                }
                write!(f, "]")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (index, (key, value)) in pairs.iter().enumerate() {
                    if index != 0 {
                        write!(f, ", ")?;
                    }
                    key.fmt_element(f)?;
                    write!(f, ": ")?;
                    value.fmt_element(f)?;
                }
                write!(f, "}}")
            }
            Value::Struct { name, fields } => {
                write!(f, "{}{{", name)?;
                for (index, (field_name, value)) in fields.iter().enumerate() {
                    if index != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", field_name)?;
                    value.fmt_element(f)?;
                }
                write!(f, "}}")
            }
        }
    }
}
