//! The multi-file loader.
//!
//! A [Program] owns everything the pipeline derives from the entry point
//! file: parsed files, identifier tables, resolved struct fields and
//! signatures, per-function bindings and instruction lists. Loading walks
//! imports depth first, so an imported file is fully processed before its
//! importer is resolved; diagnostics are accumulated across files instead
//! of stopping at the first one.

use crate::cross_referencer::{Binding, Builtins, Identifiable};
use crate::errors::LoadError;
use crate::instructions::{Instruction, InstructionGenerator};
use crate::parser::models::{Function, ParsedFile};
use crate::parser::{self, ParseFailure, Transformer};
use crate::tokenizer::{TokenKind, Tokenizer};
use crate::typing::{Signature, TypeChecker, VariableType};
use crate::util::Code;
use std::collections::{HashMap, HashSet};
use std::io::Write as IoWrite;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

/// The environment variable pointing at the standard library directory.
pub const STDLIB_PATH_VAR: &str = "AAA_STDLIB_PATH";

pub struct Program {
    pub entry_point_file: PathBuf,
    pub builtins_file: PathBuf,
    pub builtins: Builtins,
    pub parsed_files: HashMap<PathBuf, ParsedFile>,
    pub identifiers: HashMap<PathBuf, HashMap<String, Identifiable>>,
    pub struct_fields: HashMap<PathBuf, HashMap<String, Vec<(String, VariableType)>>>,
    pub signatures: HashMap<PathBuf, HashMap<String, Signature>>,
    pub bindings: HashMap<PathBuf, HashMap<String, HashMap<String, Binding>>>,
    pub function_instructions: HashMap<PathBuf, HashMap<String, Rc<Vec<Instruction>>>>,
    pub file_load_errors: Vec<LoadError>,
    tokenizer: Tokenizer,
    file_load_stack: Vec<PathBuf>,
    loaded_files: HashSet<PathBuf>,
    failed_files: HashSet<PathBuf>,
}

impl Program {
    /// Load a program with the standard library from [STDLIB_PATH_VAR].
    pub fn load(entry_point_file: &Path) -> Program {
        match std::env::var(STDLIB_PATH_VAR) {
            Ok(stdlib_path) => Self::load_with_stdlib(entry_point_file, Path::new(&stdlib_path)),
            Err(_) => {
                let mut program = Self::empty(entry_point_file, Path::new(""));
                program.file_load_errors = vec![LoadError::MissingEnvironmentVariable {
                    name: STDLIB_PATH_VAR,
                }];
                program
            }
        }
    }

    /// Load a program against an explicit standard library directory.
    pub fn load_with_stdlib(entry_point_file: &Path, stdlib_path: &Path) -> Program {
        let builtins_file = absolute_path(&stdlib_path.join("builtins.aaa"));
        let mut program = Self::empty(entry_point_file, &builtins_file);

        let builtin_errors = program.load_builtins();
        if !builtin_errors.is_empty() {
            program.file_load_errors = builtin_errors;
            return program;
        }

        let entry = program.entry_point_file.clone();
        if let Err(errors) = program.load_file(&entry) {
            program.file_load_errors.extend(errors);
        }
        program
    }

    /// Wrap a code snippet in `fn main begin ... end`, save it to a
    /// temporary file and load it. The returned guard removes the file.
    pub fn without_file(code: &str) -> std::io::Result<(Program, tempfile::TempPath)> {
        let mut file = tempfile::Builder::new()
            .prefix("aaa-cmd-")
            .suffix(".aaa")
            .tempfile()?;
        writeln!(file, "fn main begin\n{}\nend", code)?;
        let temp_path = file.into_temp_path();

        let program = Self::load(&temp_path);
        Ok((program, temp_path))
    }

    fn empty(entry_point_file: &Path, builtins_file: &Path) -> Program {
        Program {
            entry_point_file: absolute_path(entry_point_file),
            builtins_file: builtins_file.to_path_buf(),
            builtins: Builtins::empty(),
            parsed_files: HashMap::new(),
            identifiers: HashMap::new(),
            struct_fields: HashMap::new(),
            signatures: HashMap::new(),
            bindings: HashMap::new(),
            function_instructions: HashMap::new(),
            file_load_errors: Vec::new(),
            tokenizer: Tokenizer::new(),
            file_load_stack: Vec::new(),
            loaded_files: HashSet::new(),
            failed_files: HashSet::new(),
        }
    }

    /// Parse the builtins signature file and record every declaration. The
    /// builtins file only sees the native types and placeholders.
    fn load_builtins(&mut self) -> Vec<LoadError> {
        let builtins_file = self.builtins_file.clone();

        let text = match std::fs::read_to_string(&builtins_file) {
            Ok(text) => text,
            Err(_) => {
                return vec![LoadError::FileRead {
                    file: builtins_file,
                }]
            }
        };

        let code = Code::from(text.as_str());
        let tokens = match self.tokenizer.tokenize(&code) {
            Ok(tokens) => tokens,
            Err(failure) => {
                return vec![LoadError::Tokenize {
                    file: builtins_file,
                    position: failure.position,
                }]
            }
        };

        let tree = match parser::parse_builtins_file(&tokens) {
            Ok(tree) => tree,
            Err(failure) => return vec![parse_failure_error(&builtins_file, &code, failure)],
        };

        let parsed = match Transformer::new(&builtins_file, &code, &tokens)
            .transform_builtins_file(&tree)
        {
            Ok(parsed) => parsed,
            Err(error) => return vec![error],
        };

        self.seed_native_types(&builtins_file);

        let mut errors: Vec<LoadError> = Vec::new();
        for declaration in &parsed.functions {
            let resolve_all = |types: &[parser::models::ParsedType]| {
                types
                    .iter()
                    .map(|ty| self.resolve_type(&builtins_file, ty))
                    .collect::<Result<Vec<VariableType>, LoadError>>()
            };

            let arguments = match resolve_all(&declaration.arguments) {
                Ok(arguments) => arguments,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };
            let return_types = match resolve_all(&declaration.return_types) {
                Ok(return_types) => return_types,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };

            self.builtins
                .functions
                .entry(declaration.name.clone())
                .or_default()
                .push(Signature::new(arguments, return_types));
        }
        errors
    }

    /// Load one file and everything it imports. `Err` carries the new
    /// diagnostics; a file which already failed earlier yields an empty
    /// `Err` so that its importers still stop.
    fn load_file(&mut self, file: &Path) -> Result<(), Vec<LoadError>> {
        if self.file_load_stack.iter().any(|loading| loading == file) {
            return Err(vec![LoadError::CyclicImport {
                dependencies: self.file_load_stack.clone(),
                failed_import: file.to_path_buf(),
            }]);
        }
        if self.loaded_files.contains(file) {
            return Ok(());
        }
        if self.failed_files.contains(file) {
            return Err(Vec::new());
        }

        self.file_load_stack.push(file.to_path_buf());
        let result = self.load_file_stages(file);
        self.file_load_stack.pop();

        match result {
            Ok(()) => {
                self.loaded_files.insert(file.to_path_buf());
                Ok(())
            }
            Err(errors) => {
                self.failed_files.insert(file.to_path_buf());
                Err(errors)
            }
        }
    }

    fn load_file_stages(&mut self, file: &Path) -> Result<(), Vec<LoadError>> {
        let parsed = self.parse_regular_file(file).map_err(|error| vec![error])?;

        // Imported files load first, depth first, so that everything this
        // file refers to is resolved before its own resolution runs.
        let mut errors: Vec<LoadError> = Vec::new();
        for import in &parsed.imports {
            if import.source.starts_with('/') {
                errors.push(LoadError::AbsoluteImport {
                    file: file.to_path_buf(),
                    position: import.position,
                    source: import.source.clone(),
                });
                continue;
            }
            let source_file = self.import_source_file(file, &import.source);
            if let Err(import_errors) = self.load_file(&source_file) {
                errors.extend(import_errors);
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        self.seed_native_types(file);
        let mut errors = self.load_file_identifiers(file, &parsed);
        for import in &parsed.imports {
            let source_file = self.import_source_file(file, &import.source);
            for item in &import.items {
                if let Some(error) = self.add_import_identifier(
                    file,
                    &item.imported_name,
                    &source_file,
                    &item.original_name,
                    item.position,
                ) {
                    errors.push(error);
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut errors = self.validate_imports(file, &parsed);
        errors.extend(self.resolve_struct_fields(file, &parsed));
        errors.extend(self.resolve_function_signatures(file, &parsed));
        if !errors.is_empty() {
            return Err(errors);
        }

        let errors = self.bind_function_bodies(file, &parsed);
        if !errors.is_empty() {
            return Err(errors);
        }

        let errors = self.type_check_file(file, &parsed);
        if !errors.is_empty() {
            return Err(errors);
        }

        self.generate_file_instructions(file, &parsed);
        self.parsed_files.insert(file.to_path_buf(), parsed);
        Ok(())
    }

    fn parse_regular_file(&self, file: &Path) -> Result<ParsedFile, LoadError> {
        let text = std::fs::read_to_string(file).map_err(|_| LoadError::FileRead {
            file: file.to_path_buf(),
        })?;

        let code = Code::from(text.as_str());
        let tokens = self
            .tokenizer
            .tokenize(&code)
            .map_err(|failure| LoadError::Tokenize {
                file: file.to_path_buf(),
                position: failure.position,
            })?;

        let tree = parser::parse_regular_file(&tokens)
            .map_err(|failure| parse_failure_error(file, &code, failure))?;

        Transformer::new(file, &code, &tokens).transform_regular_file(&tree)
    }

    fn type_check_file(&self, file: &Path, parsed: &ParsedFile) -> Vec<LoadError> {
        let mut errors: Vec<LoadError> = Vec::new();

        if file == self.entry_point_file {
            let main_found = parsed.functions.iter().any(|function| {
                function.name.name_key() == "main"
                    && function.arguments.is_empty()
                    && function.return_types.is_empty()
            });
            if !main_found {
                errors.push(LoadError::MainFunctionNotFound {
                    file: file.to_path_buf(),
                });
            }
        }

        for function in &parsed.functions {
            if let Err(error) = TypeChecker::new(file, function, self).check() {
                errors.push(error);
            }
        }
        errors
    }

    fn generate_file_instructions(&mut self, file: &Path, parsed: &ParsedFile) {
        let mut file_instructions: HashMap<String, Rc<Vec<Instruction>>> = HashMap::new();
        for function in &parsed.functions {
            let instructions = InstructionGenerator::new(file, function, self)
                .generate_instructions();
            file_instructions.insert(function.name.name_key(), Rc::new(instructions));
        }
        self.function_instructions
            .insert(file.to_path_buf(), file_instructions);
    }

    /// The instruction list of a function, if it exists.
    pub fn get_instructions(&self, file: &Path, name: &str) -> Option<Rc<Vec<Instruction>>> {
        self.function_instructions.get(file)?.get(name).cloned()
    }

    /// The parsed definition of a function, by name key.
    pub fn get_function(&self, file: &Path, name_key: &str) -> Option<&Function> {
        self.parsed_files
            .get(file)?
            .functions
            .iter()
            .find(|function| function.name.name_key() == name_key)
    }

    /// Dump every function's instruction list to standard error.
    pub fn print_all_instructions(&self) {
        let mut files: Vec<&PathBuf> = self.function_instructions.keys().collect();
        files.sort();

        for file in files {
            let functions = &self.function_instructions[file];
            let mut names: Vec<&String> = functions.keys().collect();
            names.sort();

            for name in names {
                let function_name = crate::runtime::format_str(name, 15);
                for (instruction_pointer, instruction) in functions[name].iter().enumerate() {
                    let instruction = crate::runtime::format_str(&format!("{}", instruction), 30);
                    eprintln!(
                        "DEBUG | {:>15} | IP: {:>3} | {:>30}",
                        function_name, instruction_pointer, instruction
                    );
                }
                eprintln!();
            }
        }
        eprintln!("---");
    }

    /// Print the accumulated diagnostics followed by an error count, the
    /// way the command line surface reports a failed load.
    pub fn print_load_errors(&self) {
        for error in &self.file_load_errors {
            eprintln!("{}", error);
            eprintln!();
        }

        let error_count = self.file_load_errors.len();
        let maybe_s = if error_count == 1 { "" } else { "s" };
        eprintln!("Found {} error{}.", error_count, maybe_s);
    }
}

/// Map a parse failure to a diagnostic. A keyword sitting where an
/// identifier was required gets its own kind.
fn parse_failure_error(file: &Path, code: &Code, failure: ParseFailure) -> LoadError {
    let position = code.obtain_position(failure.token.start);

    if failure.token.kind.is_keyword() && failure.expected.contains(&TokenKind::Identifier) {
        return LoadError::KeywordUsedAsIdentifier {
            file: file.to_path_buf(),
            position,
            keyword: failure.token.text(code).to_string(),
        };
    }

    let found = if failure.token.kind == TokenKind::Eof {
        "end of file".to_string()
    } else {
        format!("'{}'", failure.token.text(code))
    };

    LoadError::Parse {
        file: file.to_path_buf(),
        position,
        expected: failure.expected,
        found,
    }
}

/// Normalize away `.` and `..` components without touching the filesystem,
/// so that the same file is always tracked under the same key.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        let current_dir = std::env::current_dir().expect("current directory is accessible");
        normalize_path(&current_dir.join(path))
    }
}
