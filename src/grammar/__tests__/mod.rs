use crate::grammar::{build_grammar, check_grammar_file_staleness, NonTerminal, REWRITE_RULES};
use std::path::PathBuf;

#[test]
fn every_non_terminal_has_a_rule() {
    for nt in NonTerminal::ALL {
        assert!(
            REWRITE_RULES.contains_key(&nt),
            "{} has no rewrite rule",
            nt
        );
    }
    assert_eq!(REWRITE_RULES.len(), NonTerminal::ALL.len());
}

#[test]
fn grammar_dump_mentions_every_rule() {
    let grammar = build_grammar();
    for nt in NonTerminal::ALL {
        assert!(
            grammar.contains(nt.name()),
            "{} is missing from the grammar dump",
            nt
        );
    }
}

#[test]
fn grammar_file_up_to_date() {
    let grammar_file = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("grammar.txt");
    let (stale, _) = check_grammar_file_staleness(&grammar_file);

    assert!(
        !stale,
        "grammar.txt is out of date, please run 'aaa generate-grammar-file'"
    );
}

#[test]
fn missing_grammar_file_is_stale() {
    let (stale, new_grammar) = check_grammar_file_staleness(&PathBuf::from("no_such_grammar.txt"));
    assert!(stale);
    assert!(!new_grammar.is_empty());
}
