//! The command line surface of the toolchain.

use aaa_lang::grammar::check_grammar_file_staleness;
use aaa_lang::{Interpreter, Program};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const GRAMMAR_FILE_PATH: &str = "grammar.txt";

#[derive(Parser)]
#[command(name = "aaa", about = "Toolchain for the aaa stack language.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and execute a source file.
    Run {
        file: PathBuf,
        /// Trace instructions and stack state to standard error.
        #[arg(short)]
        verbose: bool,
    },
    /// Wrap a code snippet in `fn main begin ... end` and run it.
    Cmd {
        code: String,
        /// Trace instructions and stack state to standard error.
        #[arg(short)]
        verbose: bool,
    },
    /// Write or refresh the canonical grammar dump.
    GenerateGrammarFile,
    /// Run the developer test suite.
    Runtests,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { file, verbose } => {
            let program = Program::load(&file);
            execute(&program, verbose)
        }
        Command::Cmd { code, verbose } => match Program::without_file(&code) {
            Ok((program, _guard)) => execute(&program, verbose),
            Err(error) => {
                eprintln!("could not save the code snippet: {}", error);
                ExitCode::FAILURE
            }
        },
        Command::GenerateGrammarFile => generate_grammar_file(),
        Command::Runtests => runtests(),
    }
}

fn execute(program: &Program, verbose: bool) -> ExitCode {
    if !program.file_load_errors.is_empty() {
        program.print_load_errors();
        return ExitCode::FAILURE;
    }

    let mut interpreter = Interpreter::new(program, verbose);
    match interpreter.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Runtime error: {}", error);
            if verbose {
                interpreter.dump_stacks();
            }
            ExitCode::FAILURE
        }
    }
}

fn generate_grammar_file() -> ExitCode {
    let path = Path::new(GRAMMAR_FILE_PATH);
    let (stale, new_grammar) = check_grammar_file_staleness(path);

    if stale {
        if let Err(error) = std::fs::write(path, new_grammar) {
            eprintln!("could not write {}: {}", GRAMMAR_FILE_PATH, error);
            return ExitCode::FAILURE;
        }
        println!("{} was created or updated.", GRAMMAR_FILE_PATH);
    } else {
        println!("{} was up-to-date.", GRAMMAR_FILE_PATH);
    }
    ExitCode::SUCCESS
}

fn runtests() -> ExitCode {
    match std::process::Command::new("cargo").arg("test").status() {
        Ok(status) if status.success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("could not run cargo test: {}", error);
            ExitCode::FAILURE
        }
    }
}
