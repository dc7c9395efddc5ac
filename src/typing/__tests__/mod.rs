use crate::errors::LoadError;
use crate::program::Program;
use crate::typing::{Placeholders, RootType, VariableType};
use std::path::PathBuf;
use tempfile::TempDir;

fn stdlib() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("stdlib")
}

fn load_source(content: &str) -> (Program, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.aaa");
    std::fs::write(&path, content).unwrap();
    (Program::load_with_stdlib(&path, &stdlib()), dir)
}

fn check_main_body(body: &str) -> Vec<LoadError> {
    let (program, _dir) = load_source(&format!("fn main begin {} end", body));
    program.file_load_errors
}

fn vec_of(inner: VariableType) -> VariableType {
    VariableType::new(RootType::Vec, vec![inner])
}

#[test]
fn unify_binds_placeholders_left_to_right() {
    let mut placeholders = Placeholders::new();
    let signature_type = vec_of(VariableType::placeholder("a"));

    assert!(signature_type.unify(&vec_of(VariableType::int()), &mut placeholders));
    assert_eq!(placeholders["a"], VariableType::int());

    // A bound placeholder only matches its binding.
    assert!(VariableType::placeholder("a").unify(&VariableType::int(), &mut placeholders));
    assert!(!VariableType::placeholder("a").unify(&VariableType::str(), &mut placeholders));
}

#[test]
fn unify_rejects_mismatched_roots_and_arity() {
    let mut placeholders = Placeholders::new();
    assert!(!VariableType::int().unify(&VariableType::bool(), &mut placeholders));
    assert!(!vec_of(VariableType::int()).unify(&VariableType::int(), &mut placeholders));
}

#[test]
fn substitute_replaces_bound_placeholders() {
    let mut placeholders = Placeholders::new();
    placeholders.insert("a".to_string(), VariableType::str());

    let substituted = vec_of(VariableType::placeholder("a")).substitute(&placeholders);
    assert_eq!(substituted, vec_of(VariableType::str()));

    // Unbound placeholders stay opaque.
    let opaque = VariableType::placeholder("b").substitute(&placeholders);
    assert_eq!(opaque, VariableType::placeholder("b"));
}

#[test]
fn display_of_types() {
    let ty = VariableType::new(
        RootType::Map,
        vec![VariableType::str(), vec_of(VariableType::placeholder("a"))],
    );
    assert_eq!(format!("{}", ty), "map[str, vec[*a]]");
}

#[test]
fn well_typed_bodies_pass() {
    let accepted = [
        "",
        "1 2 + .",
        "\"foo\" \"bar\" + .",
        "1 2 = .",
        "true false and .",
        "true if 1 . else 0 . end",
        "0 true while dup . 1 + dup 9 <= end drop",
        "\"abc\" 1 2 substr .",
        "\"abc\" strlen .",
        "1 2 over rot . . .",
        "vec[int] 1 vec:push drop",
        "map[str, int] \"one\" 1 map:set drop",
    ];
    for body in accepted {
        let errors = check_main_body(body);
        assert!(errors.is_empty(), "'{}' should check: {:?}", body, errors);
    }
}

#[test]
fn operator_type_mismatch() {
    assert!(matches!(
        check_main_body("1 true + .").as_slice(),
        [LoadError::StackTypes { name, .. }] if name == "+"
    ));
}

#[test]
fn operand_count_mismatch() {
    assert!(matches!(
        check_main_body("1 + .").as_slice(),
        [LoadError::StackTypes { name, .. }] if name == "+"
    ));
}

#[test]
fn branch_needs_a_bool_condition() {
    assert!(matches!(
        check_main_body("1 if drop end").as_slice(),
        [LoadError::ConditionType { .. }]
    ));
    assert!(matches!(
        check_main_body("if end").as_slice(),
        [LoadError::ConditionType { .. }]
    ));
}

#[test]
fn branch_arms_must_agree() {
    assert!(matches!(
        check_main_body("true if 1 . else end").as_slice(),
        [LoadError::BranchType { .. }]
    ));
    assert!(matches!(
        check_main_body("true if 1 else \"x\" end drop").as_slice(),
        [LoadError::BranchType { .. }]
    ));
}

#[test]
fn loop_body_must_restore_the_stack() {
    assert!(matches!(
        check_main_body("true while 1 end").as_slice(),
        [LoadError::LoopType { .. }]
    ));
}

#[test]
fn function_must_leave_declared_returns() {
    assert!(matches!(
        check_main_body("1").as_slice(),
        [LoadError::FunctionTypes { name, .. }] if name == "main"
    ));
}

#[test]
fn generic_functions_check_against_placeholders() {
    let (program, _dir) = load_source(
        "fn pair args x: *a return *a, *a begin x end\nfn main begin 1 pair + . end",
    );
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);
}

#[test]
fn generic_call_propagates_concrete_types() {
    // pair on an int gives two ints; adding a string to the result fails.
    let (program, _dir) = load_source(
        "fn pair args x: *a return *a, *a begin x end\nfn main begin 1 pair drop \"s\" + . end",
    );
    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::StackTypes { name, .. }] if name == "+"
    ));
}

#[test]
fn member_function_calls_use_the_name_key() {
    let (program, _dir) = load_source(
        r#"
        struct counter { value: int }
        fn counter:bump args c: counter return counter begin
            "value" { "value" ? 1 + } !
        end
        fn main begin
            counter counter:bump drop
        end
        "#,
    );
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);
}

#[test]
fn struct_query_pushes_the_field_type() {
    let (program, _dir) = load_source(
        "struct point { x: int }\nfn main begin point \"x\" ? . drop end",
    );
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);
}

#[test]
fn struct_query_needs_a_struct() {
    assert!(matches!(
        check_main_body("1 \"x\" ? . drop").as_slice(),
        [LoadError::StructOperator { operator, .. }] if operator == "?"
    ));
}

#[test]
fn unknown_struct_field() {
    let (program, _dir) = load_source(
        "struct point { x: int }\nfn main begin point \"z\" ? . drop end",
    );
    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::UnknownStructField { field_name, .. }] if field_name == "z"
    ));
}

#[test]
fn field_update_expression_must_match_field_type() {
    let (program, _dir) = load_source(
        "struct point { x: int }\nfn main begin point \"x\" { \"oops\" } ! drop end",
    );
    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::ArgumentTypeMismatch { .. }]
    ));
}

#[test]
fn vec_literal_needs_known_parameter_types() {
    assert!(matches!(
        check_main_body("vec[unknown] drop").as_slice(),
        [LoadError::UnknownType { name, .. }] if name == "unknown"
    ));
}

#[test]
fn parameterized_native_scalar_is_rejected() {
    assert!(matches!(
        check_main_body("int[int] drop").as_slice(),
        [LoadError::UnknownType { name, .. }] if name == "int"
    ));
}
