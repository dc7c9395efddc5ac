use crate::cross_referencer::{Binding, ResolvedIdentifier};
use crate::errors::LoadError;
use crate::program::Program;
use std::path::PathBuf;
use tempfile::TempDir;

fn stdlib() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("stdlib")
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn load_source(content: &str) -> (Program, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let entry = write_file(&dir, "main.aaa", content);
    (Program::load_with_stdlib(&entry, &stdlib()), dir)
}

#[test]
fn builtins_are_loaded() {
    let (program, _dir) = load_source("fn main begin end");

    assert_eq!(program.builtins.functions["+"].len(), 2);
    assert_eq!(program.builtins.functions["dup"].len(), 1);
    assert_eq!(program.builtins.functions["vec:push"].len(), 1);
    let dup = &program.builtins.functions["dup"][0];
    assert_eq!(dup.arguments.len(), 1);
    assert_eq!(dup.return_types.len(), 2);
}

#[test]
fn missing_stdlib_is_a_file_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let entry = write_file(&dir, "main.aaa", "fn main begin end");
    let program = Program::load_with_stdlib(&entry, &dir.path().join("no_stdlib"));

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::FileRead { .. }]
    ));
}

#[test]
fn function_name_collision() {
    let (program, _dir) = load_source("fn foo begin end\nfn foo begin end\nfn main begin end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::FunctionNameCollision { name, .. }] if name == "foo"
    ));
}

#[test]
fn struct_and_function_collision() {
    let (program, _dir) =
        load_source("struct foo { x: int }\nfn foo begin end\nfn main begin end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::CollidingIdentifier { name, .. }] if name == "foo"
    ));
}

#[test]
fn struct_colliding_with_native_type() {
    let (program, _dir) = load_source("struct int { x: bool }\nfn main begin end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::CollidingIdentifier { name, .. }] if name == "int"
    ));
}

#[test]
fn unknown_identifier_in_body() {
    let (program, _dir) = load_source("fn main begin missing end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::UnknownIdentifier { name, .. }] if name == "missing"
    ));
}

#[test]
fn unknown_argument_type() {
    let (program, _dir) = load_source("fn foo args x: whatever begin end\nfn main begin end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::UnknownType { name, .. }] if name == "whatever"
    ));
}

#[test]
fn import_binds_to_definition() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        &dir,
        "lib.aaa",
        "fn answer return int begin 42 end",
    );
    let entry = write_file(
        &dir,
        "main.aaa",
        "from \"./lib\" import answer as solution\nfn main begin solution . end",
    );
    let program = Program::load_with_stdlib(&entry, &stdlib());
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);

    let lib = dir.path().join("lib.aaa");
    match program.get_identifier(&program.entry_point_file, "solution") {
        Some(ResolvedIdentifier::Function { file, name_key }) => {
            assert_eq!(file, lib);
            assert_eq!(name_key, "answer");
        }
        other => panic!("unexpected resolution: {:?}", other),
    }

    match program.get_binding(&program.entry_point_file, "main", "solution") {
        Some(Binding::Function { file, name_key }) => {
            assert_eq!(file, &lib);
            assert_eq!(name_key, "answer");
        }
        other => panic!("unexpected binding: {:?}", other),
    }
}

#[test]
fn imported_item_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "lib.aaa", "fn answer return int begin 42 end");
    let entry = write_file(
        &dir,
        "main.aaa",
        "from \"./lib\" import question\nfn main begin end",
    );
    let program = Program::load_with_stdlib(&entry, &stdlib());

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::ImportedItemNotFound { item, .. }] if item == "question"
    ));
}

#[test]
fn indirect_import_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "base.aaa", "fn answer return int begin 42 end");
    write_file(&dir, "middle.aaa", "from \"./base\" import answer\nfn unused begin end");
    let entry = write_file(
        &dir,
        "main.aaa",
        "from \"./middle\" import answer\nfn main begin end",
    );
    let program = Program::load_with_stdlib(&entry, &stdlib());

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::IndirectImport { item, .. }] if item == "answer"
    ));
}

#[test]
fn absolute_import_is_rejected() {
    let (program, _dir) =
        load_source("from \"/etc/lib\" import foo\nfn main begin end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::AbsoluteImport { source, .. }] if source == "/etc/lib"
    ));
}

#[test]
fn self_import_is_a_single_cyclic_import_error() {
    let dir = tempfile::tempdir().unwrap();
    let entry = write_file(
        &dir,
        "main.aaa",
        "from \"./main\" import main\nfn main begin end",
    );
    let program = Program::load_with_stdlib(&entry, &stdlib());

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::CyclicImport { .. }]
    ));
}

#[test]
fn import_cycle_through_a_chain() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "a.aaa", "from \"./b\" import bee\nfn aye begin end");
    write_file(&dir, "b.aaa", "from \"./a\" import aye\nfn bee begin end");
    let entry = write_file(
        &dir,
        "main.aaa",
        "from \"./a\" import aye\nfn main begin end",
    );
    let program = Program::load_with_stdlib(&entry, &stdlib());

    assert_eq!(program.file_load_errors.len(), 1);
    match &program.file_load_errors[0] {
        LoadError::CyclicImport {
            dependencies,
            failed_import,
        } => {
            assert_eq!(failed_import, &dir.path().join("a.aaa"));
            assert_eq!(dependencies.len(), 3);
        }
        other => panic!("expected a cyclic import error, got {:?}", other),
    }
}

#[test]
fn missing_file_import() {
    let (program, _dir) = load_source("from \"./nowhere\" import foo\nfn main begin end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::FileRead { .. }]
    ));
}

#[test]
fn main_function_not_found() {
    let (program, _dir) = load_source("fn helper begin end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::MainFunctionNotFound { .. }]
    ));
}

#[test]
fn main_with_arguments_is_not_main() {
    let (program, _dir) = load_source("fn main args x: int begin drop end");

    assert!(matches!(
        program.file_load_errors.as_slice(),
        [LoadError::MainFunctionNotFound { .. }]
    ));
}

#[test]
fn body_bindings_cover_all_identifier_kinds() {
    let (program, _dir) = load_source(
        r#"
        struct point { x: int, y: int }
        fn helper begin end
        fn exercise args unused: bool begin
            drop
            helper
            point
            "x" ? .
            drop
            vec[int] 1 vec:push drop
        end
        fn main begin end
        "#,
    );
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);

    let entry = program.entry_point_file.clone();
    assert!(matches!(
        program.get_binding(&entry, "exercise", "helper"),
        Some(Binding::Function { .. })
    ));
    assert!(matches!(
        program.get_binding(&entry, "exercise", "point"),
        Some(Binding::Struct { .. })
    ));
    assert!(matches!(
        program.get_binding(&entry, "exercise", "vec:push"),
        Some(Binding::Builtin { .. })
    ));
}

#[test]
fn argument_binding_wins_over_functions() {
    let (program, _dir) = load_source(
        "fn helper begin end\nfn foo args helper: int begin helper . drop end\nfn main begin end",
    );
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);

    assert!(matches!(
        program.get_binding(&program.entry_point_file, "foo", "helper"),
        Some(Binding::Argument(_))
    ));
}
