//! Types and signatures used by the stack effect checker.

mod checker;

#[cfg(test)]
mod __tests__;

pub use checker::TypeChecker;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
/// The root of a variable type.
pub enum RootType {
    Int,
    Bool,
    Str,
    Vec,
    Map,
    /// A struct type, identified by its defining file and name so that
    /// same-named structs from different files stay distinct.
    Custom { file: PathBuf, name: String },
    /// A type placeholder, lexically scoped to the function whose signature
    /// introduced it.
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A fully spelled out type: a root and its instantiated parameters, such
/// as `vec[int]` or `map[str, vec[int]]`.
pub struct VariableType {
    pub root: RootType,
    pub params: Vec<VariableType>,
}

impl VariableType {
    pub fn new(root: RootType, params: Vec<VariableType>) -> Self {
        Self { root, params }
    }

    pub fn int() -> Self {
        VariableType::new(RootType::Int, Vec::new())
    }

    pub fn bool() -> Self {
        VariableType::new(RootType::Bool, Vec::new())
    }

    pub fn str() -> Self {
        VariableType::new(RootType::Str, Vec::new())
    }

    pub fn custom(file: &Path, name: &str) -> Self {
        VariableType::new(
            RootType::Custom {
                file: file.to_path_buf(),
                name: name.to_string(),
            },
            Vec::new(),
        )
    }

    pub fn placeholder(name: &str) -> Self {
        VariableType::new(RootType::Placeholder(name.to_string()), Vec::new())
    }

    /// Unify a signature type against a concrete stack type, binding
    /// placeholders left to right into `placeholders`.
    pub fn unify(&self, stack_type: &VariableType, placeholders: &mut Placeholders) -> bool {
        match &self.root {
            RootType::Placeholder(name) => match placeholders.get(name) {
                Some(bound) => bound == stack_type,
                None => {
                    placeholders.insert(name.clone(), stack_type.clone());
                    true
                }
            },
            _ => {
                self.root == stack_type.root
                    && self.params.len() == stack_type.params.len()
                    && self
                        .params
                        .iter()
                        .zip(&stack_type.params)
                        .all(|(param, stack_param)| param.unify(stack_param, placeholders))
            }
        }
    }

    /// Substitute bound placeholders into the type. Placeholders which were
    /// never bound stay opaque.
    pub fn substitute(&self, placeholders: &Placeholders) -> VariableType {
        if let RootType::Placeholder(name) = &self.root {
            if let Some(bound) = placeholders.get(name) {
                return bound.clone();
            }
        }
        VariableType::new(
            self.root.clone(),
            self.params
                .iter()
                .map(|param| param.substitute(placeholders))
                .collect(),
        )
    }
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.root {
            RootType::Int => write!(f, "int")?,
            RootType::Bool => write!(f, "bool")?,
            RootType::Str => write!(f, "str")?,
            RootType::Vec => write!(f, "vec")?,
            RootType::Map => write!(f, "map")?,
            RootType::Custom { name, .. } => write!(f, "{}", name)?,
            RootType::Placeholder(name) => write!(f, "*{}", name)?,
        }
        if !self.params.is_empty() {
            let params = self
                .params
                .iter()
                .map(|param| format!("{}", param))
                .collect::<Vec<String>>()
                .join(", ");
            write!(f, "[{}]", params)?;
        }
        Ok(())
    }
}

/// The per-application substitution map from placeholder names to concrete
/// types.
pub type Placeholders = HashMap<String, VariableType>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The stack effect of a function: the argument types it consumes and the
/// return types it produces.
pub struct Signature {
    pub arguments: Vec<VariableType>,
    pub return_types: Vec<VariableType>,
}

impl Signature {
    pub fn new(arguments: Vec<VariableType>, return_types: Vec<VariableType>) -> Self {
        Self {
            arguments,
            return_types,
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}) -> ({})",
            format_types(&self.arguments),
            format_types(&self.return_types)
        )
    }
}

/// Render a type list the way it is shown in diagnostics.
pub fn format_types(types: &[VariableType]) -> String {
    types
        .iter()
        .map(|t| format!("{}", t))
        .collect::<Vec<String>>()
        .join(", ")
}
