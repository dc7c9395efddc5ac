//! Identifier tables and cross-file resolution.
//!
//! After a file and its imports are parsed, the cross referencer builds the
//! file's identifier table (types, structs, functions, imports), validates
//! every import against the exporting file, resolves type annotations into
//! [VariableType]s and signatures, and binds every identifier of every
//! function body to the definition it refers to.

#[cfg(test)]
mod __tests__;

use crate::errors::LoadError;
use crate::parser::models::{
    Function, FunctionBody, FunctionBodyItem, ParsedFile, ParsedType, ParsedTypeLiteral,
};
use crate::program::Program;
use crate::typing::{RootType, Signature, VariableType};
use crate::util::Position;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
/// Anything a name inside one file may refer to.
pub enum Identifiable {
    Function {
        position: Position,
    },
    Struct {
        position: Position,
    },
    Import {
        source_file: PathBuf,
        original_name: String,
        position: Position,
    },
    /// A native type. Every file sees `int`, `bool`, `str`, `vec` and
    /// `map`; there is no declaration syntax for types.
    Type {
        param_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// The definition a name resolves to, with imports followed once.
pub enum ResolvedIdentifier {
    Function { file: PathBuf, name_key: String },
    Struct { file: PathBuf, name: String },
    Type { name: String, param_count: usize },
}

#[derive(Debug, Clone, PartialEq)]
/// The definition a function body identifier was bound to.
pub enum Binding {
    Argument(VariableType),
    Function { file: PathBuf, name_key: String },
    Struct { file: PathBuf, name: String },
    Builtin { name: String },
}

#[derive(Debug, Clone, Default)]
/// The primitive signatures declared in the builtins file. A single name
/// may carry several signatures; `+` covers both ints and strings.
pub struct Builtins {
    pub functions: HashMap<String, Vec<Signature>>,
}

impl Builtins {
    pub fn empty() -> Self {
        Builtins {
            functions: HashMap::new(),
        }
    }
}

/// The native types every identifier table is seeded with.
const BUILTIN_TYPES: [(&str, usize); 5] =
    [("int", 0), ("bool", 0), ("str", 0), ("vec", 1), ("map", 2)];

fn builtin_type_root(name: &str) -> Option<RootType> {
    match name {
        "int" => Some(RootType::Int),
        "bool" => Some(RootType::Bool),
        "str" => Some(RootType::Str),
        "vec" => Some(RootType::Vec),
        "map" => Some(RootType::Map),
        _ => None,
    }
}

impl Program {
    /// Build the identifier table of one parsed file. Colliding definitions
    /// are reported and the earlier definition wins; two colliding
    /// functions are a [FunctionNameCollision](LoadError::FunctionNameCollision).
    pub(crate) fn load_file_identifiers(
        &mut self,
        file: &Path,
        parsed: &ParsedFile,
    ) -> Vec<LoadError> {
        let mut errors: Vec<LoadError> = Vec::new();
        let identifiers = self.identifiers.entry(file.to_path_buf()).or_default();

        for st in &parsed.structs {
            if identifiers.contains_key(&st.name) {
                errors.push(LoadError::CollidingIdentifier {
                    file: file.to_path_buf(),
                    position: st.position,
                    name: st.name.clone(),
                });
                continue;
            }
            identifiers.insert(
                st.name.clone(),
                Identifiable::Struct {
                    position: st.position,
                },
            );
        }

        for function in &parsed.functions {
            let name_key = function.name.name_key();
            match identifiers.get(&name_key) {
                Some(Identifiable::Function { .. }) => {
                    errors.push(LoadError::FunctionNameCollision {
                        file: file.to_path_buf(),
                        position: function.position,
                        name: name_key,
                    });
                    continue;
                }
                Some(_) => {
                    errors.push(LoadError::CollidingIdentifier {
                        file: file.to_path_buf(),
                        position: function.position,
                        name: name_key,
                    });
                    continue;
                }
                None => {}
            }
            identifiers.insert(
                name_key,
                Identifiable::Function {
                    position: function.position,
                },
            );
        }

        errors
    }

    /// Seed a file's identifier table with the native types.
    pub(crate) fn seed_native_types(&mut self, file: &Path) {
        let identifiers = self.identifiers.entry(file.to_path_buf()).or_default();
        for (name, param_count) in BUILTIN_TYPES {
            identifiers.insert(
                name.to_string(),
                Identifiable::Type { param_count },
            );
        }
    }

    /// Record one imported item in the importing file's table. The target
    /// file has been loaded already; validity is checked in
    /// [validate_imports](Program::validate_imports).
    pub(crate) fn add_import_identifier(
        &mut self,
        file: &Path,
        imported_name: &str,
        source_file: &Path,
        original_name: &str,
        position: Position,
    ) -> Option<LoadError> {
        let identifiers = self.identifiers.entry(file.to_path_buf()).or_default();
        if identifiers.contains_key(imported_name) {
            return Some(LoadError::CollidingIdentifier {
                file: file.to_path_buf(),
                position,
                name: imported_name.to_string(),
            });
        }
        identifiers.insert(
            imported_name.to_string(),
            Identifiable::Import {
                source_file: source_file.to_path_buf(),
                original_name: original_name.to_string(),
                position,
            },
        );
        None
    }

    /// Check that every import of a file names an actual definition in the
    /// exporting file, and not another import.
    pub(crate) fn validate_imports(&self, file: &Path, parsed: &ParsedFile) -> Vec<LoadError> {
        let mut errors: Vec<LoadError> = Vec::new();

        for import in &parsed.imports {
            let source_file = self.import_source_file(file, &import.source);
            let source_identifiers = match self.identifiers.get(&source_file) {
                Some(identifiers) => identifiers,
                None => continue,
            };

            for item in &import.items {
                match source_identifiers.get(&item.original_name) {
                    None | Some(Identifiable::Type { .. }) => {
                        errors.push(LoadError::ImportedItemNotFound {
                            file: file.to_path_buf(),
                            position: item.position,
                            item: item.original_name.clone(),
                        });
                    }
                    Some(Identifiable::Import { .. }) => {
                        errors.push(LoadError::IndirectImport {
                            file: file.to_path_buf(),
                            position: item.position,
                            item: item.original_name.clone(),
                        });
                    }
                    Some(Identifiable::Function { .. }) | Some(Identifiable::Struct { .. }) => {}
                }
            }
        }

        errors
    }

    /// The file an import source refers to, relative to the importing file.
    pub(crate) fn import_source_file(&self, file: &Path, source: &str) -> PathBuf {
        let directory = file.parent().expect("loaded files have a parent directory");
        crate::program::normalize_path(&directory.join(format!("{}.aaa", source)))
    }

    /// Resolve a name to its definition, following an import once.
    pub fn get_identifier(&self, file: &Path, name: &str) -> Option<ResolvedIdentifier> {
        let identifiable = self.identifiers.get(file)?.get(name)?;

        match identifiable {
            Identifiable::Function { .. } => Some(ResolvedIdentifier::Function {
                file: file.to_path_buf(),
                name_key: name.to_string(),
            }),
            Identifiable::Struct { .. } => Some(ResolvedIdentifier::Struct {
                file: file.to_path_buf(),
                name: name.to_string(),
            }),
            Identifiable::Type { param_count } => Some(ResolvedIdentifier::Type {
                name: name.to_string(),
                param_count: *param_count,
            }),
            Identifiable::Import {
                source_file,
                original_name,
                ..
            } => match self.identifiers.get(source_file)?.get(original_name)? {
                Identifiable::Function { .. } => Some(ResolvedIdentifier::Function {
                    file: source_file.clone(),
                    name_key: original_name.clone(),
                }),
                Identifiable::Struct { .. } => Some(ResolvedIdentifier::Struct {
                    file: source_file.clone(),
                    name: original_name.clone(),
                }),
                _ => None,
            },
        }
    }

    /// Resolve a type annotation into a [VariableType]. Placeholders stay
    /// placeholders; named types must be a native type with the right
    /// parameter count or a parameterless struct.
    pub(crate) fn resolve_type(
        &self,
        file: &Path,
        parsed: &ParsedType,
    ) -> Result<VariableType, LoadError> {
        match parsed {
            ParsedType::Placeholder(placeholder) => {
                Ok(VariableType::placeholder(&placeholder.name))
            }
            ParsedType::Literal(literal) => self.resolve_type_literal(file, literal),
        }
    }

    pub(crate) fn resolve_type_literal(
        &self,
        file: &Path,
        literal: &ParsedTypeLiteral,
    ) -> Result<VariableType, LoadError> {
        let unknown_type = || LoadError::UnknownType {
            file: file.to_path_buf(),
            position: literal.position,
            name: literal.name.clone(),
        };

        let params: Vec<VariableType> = literal
            .params
            .iter()
            .map(|param| self.resolve_type(file, param))
            .collect::<Result<_, _>>()?;

        match self.get_identifier(file, &literal.name) {
            Some(ResolvedIdentifier::Type { name, param_count }) => {
                if params.len() != param_count {
                    return Err(unknown_type());
                }
                let root = builtin_type_root(&name).expect("native types have known roots");
                Ok(VariableType::new(root, params))
            }
            Some(ResolvedIdentifier::Struct {
                file: defining_file,
                name,
            }) => {
                if !params.is_empty() {
                    return Err(unknown_type());
                }
                Ok(VariableType::custom(&defining_file, &name))
            }
            _ => Err(unknown_type()),
        }
    }

    /// Resolve the field types of every struct of a file.
    pub(crate) fn resolve_struct_fields(
        &mut self,
        file: &Path,
        parsed: &ParsedFile,
    ) -> Vec<LoadError> {
        let mut errors: Vec<LoadError> = Vec::new();
        let mut resolved: HashMap<String, Vec<(String, VariableType)>> = HashMap::new();

        for st in &parsed.structs {
            let mut fields: Vec<(String, VariableType)> = Vec::new();
            for field in &st.fields {
                if let ParsedType::Placeholder(placeholder) = &field.ty {
                    errors.push(LoadError::UnknownType {
                        file: file.to_path_buf(),
                        position: placeholder.position,
                        name: placeholder.name.clone(),
                    });
                    continue;
                }

                match self.resolve_type(file, &field.ty) {
                    Ok(ty) => {
                        // A struct containing itself could never be
                        // constructed.
                        let self_referential = matches!(
                            &ty.root,
                            RootType::Custom { file: defining_file, name }
                                if defining_file == file && name == &st.name
                        );
                        if self_referential {
                            errors.push(LoadError::UnknownType {
                                file: file.to_path_buf(),
                                position: field.ty.position(),
                                name: st.name.clone(),
                            });
                            continue;
                        }
                        fields.push((field.name.clone(), ty));
                    }
                    Err(error) => errors.push(error),
                }
            }
            resolved.insert(st.name.clone(), fields);
        }

        self.struct_fields.insert(file.to_path_buf(), resolved);
        errors
    }

    /// Resolve the declared signature of every function of a file.
    pub(crate) fn resolve_function_signatures(
        &mut self,
        file: &Path,
        parsed: &ParsedFile,
    ) -> Vec<LoadError> {
        let mut errors: Vec<LoadError> = Vec::new();
        let mut signatures: HashMap<String, Signature> = HashMap::new();

        for function in &parsed.functions {
            match self.resolve_signature(file, function) {
                Ok(signature) => {
                    signatures.insert(function.name.name_key(), signature);
                }
                Err(error) => errors.push(error),
            }
        }

        self.signatures.insert(file.to_path_buf(), signatures);
        errors
    }

    fn resolve_signature(&self, file: &Path, function: &Function) -> Result<Signature, LoadError> {
        let arguments = function
            .arguments
            .iter()
            .map(|argument| self.resolve_type(file, &argument.ty))
            .collect::<Result<Vec<VariableType>, LoadError>>()?;

        let return_types = function
            .return_types
            .iter()
            .map(|ty| self.resolve_type(file, ty))
            .collect::<Result<Vec<VariableType>, LoadError>>()?;

        Ok(Signature::new(arguments, return_types))
    }

    /// Bind every identifier of every function body of a file to its
    /// definition: an own argument first, then a builtin, then a local or
    /// imported function or struct.
    pub(crate) fn bind_function_bodies(
        &mut self,
        file: &Path,
        parsed: &ParsedFile,
    ) -> Vec<LoadError> {
        let mut errors: Vec<LoadError> = Vec::new();
        let mut file_bindings: HashMap<String, HashMap<String, Binding>> = HashMap::new();

        for function in &parsed.functions {
            let name_key = function.name.name_key();
            let signature = match self.signatures.get(file).and_then(|s| s.get(&name_key)) {
                Some(signature) => signature.clone(),
                None => continue,
            };

            let arguments: HashMap<&str, &VariableType> = function
                .arguments
                .iter()
                .zip(&signature.arguments)
                .map(|(argument, ty)| (argument.name.as_str(), ty))
                .collect();

            let mut bindings: HashMap<String, Binding> = HashMap::new();
            self.bind_body(file, &arguments, &function.body, &mut bindings, &mut errors);
            file_bindings.insert(name_key, bindings);
        }

        self.bindings.insert(file.to_path_buf(), file_bindings);
        errors
    }

    fn bind_body(
        &self,
        file: &Path,
        arguments: &HashMap<&str, &VariableType>,
        body: &FunctionBody,
        bindings: &mut HashMap<String, Binding>,
        errors: &mut Vec<LoadError>,
    ) {
        for item in &body.items {
            match item {
                FunctionBodyItem::Identifier(identifier) => {
                    if bindings.contains_key(&identifier.name) {
                        continue;
                    }

                    let binding = if let Some(ty) = arguments.get(identifier.name.as_str()) {
                        Binding::Argument((*ty).clone())
                    } else if self.builtins.functions.contains_key(&identifier.name) {
                        Binding::Builtin {
                            name: identifier.name.clone(),
                        }
                    } else {
                        match self.get_identifier(file, &identifier.name) {
                            Some(ResolvedIdentifier::Function { file, name_key }) => {
                                Binding::Function { file, name_key }
                            }
                            Some(ResolvedIdentifier::Struct { file, name }) => {
                                Binding::Struct { file, name }
                            }
                            _ => {
                                errors.push(LoadError::UnknownIdentifier {
                                    file: file.to_path_buf(),
                                    position: identifier.position,
                                    name: identifier.name.clone(),
                                });
                                continue;
                            }
                        }
                    };
                    bindings.insert(identifier.name.clone(), binding);
                }
                FunctionBodyItem::MemberFunction(member) => {
                    let name_key = member.name_key();
                    if bindings.contains_key(&name_key) {
                        continue;
                    }

                    let binding = if self.builtins.functions.contains_key(&name_key) {
                        Binding::Builtin {
                            name: name_key.clone(),
                        }
                    } else {
                        match self.get_identifier(file, &name_key) {
                            Some(ResolvedIdentifier::Function { file, name_key }) => {
                                Binding::Function { file, name_key }
                            }
                            _ => {
                                errors.push(LoadError::UnknownFunction {
                                    file: file.to_path_buf(),
                                    position: member.position,
                                    name: name_key,
                                });
                                continue;
                            }
                        }
                    };
                    bindings.insert(name_key, binding);
                }
                FunctionBodyItem::Branch(branch) => {
                    self.bind_body(file, arguments, &branch.condition, bindings, errors);
                    self.bind_body(file, arguments, &branch.if_body, bindings, errors);
                    self.bind_body(file, arguments, &branch.else_body, bindings, errors);
                }
                FunctionBodyItem::Loop(lp) => {
                    self.bind_body(file, arguments, &lp.condition, bindings, errors);
                    self.bind_body(file, arguments, &lp.body, bindings, errors);
                }
                FunctionBodyItem::StructFieldUpdate(update) => {
                    self.bind_body(file, arguments, &update.new_value_expr, bindings, errors);
                }
                _ => {}
            }
        }
    }

    /// The binding of one identifier inside one function.
    pub fn get_binding(&self, file: &Path, function_key: &str, name: &str) -> Option<&Binding> {
        self.bindings.get(file)?.get(function_key)?.get(name)
    }
}
