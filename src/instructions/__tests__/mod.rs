use crate::instructions::Instruction;
use crate::program::Program;
use std::path::PathBuf;
use tempfile::TempDir;

fn stdlib() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("stdlib")
}

fn load_source(content: &str) -> (Program, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.aaa");
    std::fs::write(&path, content).unwrap();
    let program = Program::load_with_stdlib(&path, &stdlib());
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);
    (program, dir)
}

fn main_instructions(program: &Program) -> Vec<Instruction> {
    program
        .get_instructions(&program.entry_point_file, "main")
        .unwrap()
        .to_vec()
}

#[test]
fn literals_and_operators() {
    let (program, _dir) = load_source("fn main begin 1 2 + . \"x\" . true . end");
    assert_eq!(
        main_instructions(&program),
        vec![
            Instruction::PushInt(1),
            Instruction::PushInt(2),
            Instruction::Plus,
            Instruction::Print,
            Instruction::PushString("x".to_string()),
            Instruction::Print,
            Instruction::PushBool(true),
            Instruction::Print,
        ]
    );
}

#[test]
fn branch_lowering() {
    let (program, _dir) = load_source("fn main begin true if 1 . else 0 . end end");
    assert_eq!(
        main_instructions(&program),
        vec![
            Instruction::PushBool(true),
            Instruction::JumpIfFalse(5),
            Instruction::PushInt(1),
            Instruction::Print,
            Instruction::Jump(7),
            Instruction::PushInt(0),
            Instruction::Print,
        ]
    );
}

#[test]
fn branch_without_else_jumps_to_end() {
    let (program, _dir) = load_source("fn main begin true if 1 . end end");
    assert_eq!(
        main_instructions(&program),
        vec![
            Instruction::PushBool(true),
            Instruction::JumpIfFalse(5),
            Instruction::PushInt(1),
            Instruction::Print,
            Instruction::Jump(5),
        ]
    );
}

#[test]
fn loop_lowering() {
    let (program, _dir) = load_source("fn main begin 0 true while dup . 1 + dup 9 <= end drop end");
    assert_eq!(
        main_instructions(&program),
        vec![
            Instruction::PushInt(0),
            Instruction::PushBool(true),
            Instruction::JumpIfFalse(11),
            Instruction::Dup,
            Instruction::Print,
            Instruction::PushInt(1),
            Instruction::Plus,
            Instruction::Dup,
            Instruction::PushInt(9),
            Instruction::LessEq,
            Instruction::Jump(2),
            Instruction::Drop,
        ]
    );
}

#[test]
fn calls_arguments_and_struct_pushes() {
    let (program, _dir) = load_source(
        r#"
        struct point { x: int }
        fn takes args n: int begin drop n . end
        fn main begin
            7 takes
            point "x" { 3 } ! drop
            vec[int] 1 vec:push drop
        end
        "#,
    );

    let entry = program.entry_point_file.clone();
    let takes = program.get_instructions(&entry, "takes").unwrap().to_vec();
    assert_eq!(
        takes,
        vec![
            Instruction::Drop,
            Instruction::PushFunctionArgument("n".to_string()),
            Instruction::Print,
        ]
    );

    let main = main_instructions(&program);
    assert_eq!(
        main,
        vec![
            Instruction::PushInt(7),
            Instruction::CallFunction {
                file: entry.clone(),
                name: "takes".to_string(),
            },
            Instruction::PushStruct {
                file: entry,
                name: "point".to_string(),
            },
            Instruction::PushInt(3),
            Instruction::SetStructField("x".to_string()),
            Instruction::Drop,
            Instruction::PushVec,
            Instruction::PushInt(1),
            Instruction::CallFunction {
                file: program.builtins_file.clone(),
                name: "vec:push".to_string(),
            },
            Instruction::Drop,
        ]
    );
}

#[test]
fn query_lowering() {
    let (program, _dir) = load_source(
        "struct point { x: int }\nfn main begin point \"x\" ? . drop end",
    );
    let main = main_instructions(&program);
    assert!(main.contains(&Instruction::GetStructField("x".to_string())));
}

#[test]
fn jump_targets_stay_inside_the_function() {
    let (program, _dir) = load_source(
        r#"
        fn fizzbuzz args n: int begin
            n 15 % 0 = if "fizzbuzz" . else n . end "\n" . drop
        end
        fn main begin
            1 true while dup fizzbuzz 1 + dup 100 <= end drop
        end
        "#,
    );

    for functions in program.function_instructions.values() {
        for instructions in functions.values() {
            for instruction in instructions.iter() {
                if let Instruction::Jump(target) | Instruction::JumpIfFalse(target) = instruction {
                    assert!(*target <= instructions.len());
                }
            }
        }
    }
}
