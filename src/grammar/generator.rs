use super::{NonTerminal, REWRITE_RULES};
use crate::tokenizer::Tokenizer;
use std::fmt::Write;
use std::path::Path;

/// Render the rewrite rules into the canonical grammar dump. The output is
/// deterministic so that the generated file can be diffed and checked for
/// staleness.
pub fn build_grammar() -> String {
    let mut writer = String::new();

    for nt in NonTerminal::ALL {
        let rule = &REWRITE_RULES[&nt];
        writeln!(writer, "{}", nt.name()).unwrap();
        for (index, alternative) in rule.alternatives.iter().enumerate() {
            let prefix = if index == 0 { ':' } else { '|' };
            let sequence = alternative
                .iter()
                .map(|symbol| format!("{}", symbol))
                .collect::<Vec<String>>()
                .join(" ");
            writeln!(writer, "    {} {}", prefix, sequence).unwrap();
        }
        writeln!(writer, "    ;").unwrap();
        writeln!(writer).unwrap();
    }

    writer.push_str(&Tokenizer::new().build_grammar());
    writer
}

/// Compare the grammar file at `path` against the canonical dump of the
/// rewrite rules. Returns whether the file is stale together with the fresh
/// dump. A missing file counts as stale.
pub fn check_grammar_file_staleness(path: &Path) -> (bool, String) {
    let new_grammar = build_grammar();
    let stale = match std::fs::read_to_string(path) {
        Ok(current) => current != new_grammar,
        Err(_) => true,
    };
    (stale, new_grammar)
}
