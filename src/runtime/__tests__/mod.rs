use crate::errors::RuntimeError;
use crate::instructions::Instruction;
use crate::program::Program;
use crate::runtime::Interpreter;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

fn stdlib() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("stdlib")
}

fn load_file_source(content: &str) -> (Program, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.aaa");
    std::fs::write(&path, content).unwrap();
    let program = Program::load_with_stdlib(&path, &stdlib());
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);
    (program, dir)
}

#[derive(Clone)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn new() -> Self {
        SharedBuffer(Rc::new(RefCell::new(Vec::new())))
    }

    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn run_program(program: &Program) -> Result<String, RuntimeError> {
    let buffer = SharedBuffer::new();
    let mut interpreter = Interpreter::with_output(program, false, Box::new(buffer.clone()));
    interpreter.run()?;
    Ok(buffer.contents())
}

fn run_code(code: &str) -> String {
    let (program, _dir) = load_file_source(&format!("fn main begin {} end", code));
    run_program(&program).unwrap()
}

fn run_code_error(code: &str) -> RuntimeError {
    let (program, _dir) = load_file_source(&format!("fn main begin {} end", code));
    run_program(&program).unwrap_err()
}

/// Replace main's generated instructions, for exercising the machine on
/// hand-built lists the checker would reject.
fn run_raw_instructions(instructions: Vec<Instruction>) -> Result<String, RuntimeError> {
    let (mut program, _dir) = load_file_source("fn main begin end");
    let entry = program.entry_point_file.clone();
    program
        .function_instructions
        .get_mut(&entry)
        .unwrap()
        .insert("main".to_string(), Rc::new(instructions));
    run_program(&program)
}

#[test]
fn addition_prints_sum() {
    assert_eq!(run_code("1 2 + ."), "3");
}

#[test]
fn int_math() {
    assert_eq!(run_code("2 3 * ."), "6");
    assert_eq!(run_code("3 2 - ."), "1");
    assert_eq!(run_code("3 5 - ."), "-2");
    assert_eq!(run_code("6 3 / ."), "2");
    assert_eq!(run_code("7 3 / ."), "2");
    assert_eq!(run_code("7 3 % ."), "1");
}

#[test]
fn comparisons_and_booleans() {
    assert_eq!(run_code("1 2 < ."), "true");
    assert_eq!(run_code("1 2 >= ."), "false");
    assert_eq!(run_code("1 1 = ."), "true");
    assert_eq!(run_code("1 2 != ."), "true");
    assert_eq!(run_code("true not ."), "false");
    assert_eq!(run_code("true false or ."), "true");
}

#[test]
fn string_operations() {
    assert_eq!(run_code("\"foo\" \"bar\" + ."), "foobar");
    assert_eq!(run_code("\"hello\" strlen ."), "5");
    assert_eq!(run_code("\"abc\" 1 2 substr ."), "b");
}

#[test]
fn substr_clamps() {
    assert_eq!(run_code("\"abc\" 5 7 substr ."), "");
    assert_eq!(run_code("\"abc\" 1 99 substr ."), "bc");
    assert_eq!(run_code("\"abc\" 1 1 substr ."), "");
    assert_eq!(run_code("\"abc\" 2 0 substr ."), "");
    assert_eq!(run_code("\"abc\" 0 3 substr ."), "abc");
}

#[test]
fn stack_shufflers() {
    assert_eq!(run_code("1 2 over . . ."), "121");
    assert_eq!(run_code("1 2 3 rot . . ."), "132");
    assert_eq!(run_code("1 2 swap . ."), "12");
    assert_eq!(run_code("1 dup . ."), "11");
}

#[test]
fn branch_picks_an_arm() {
    assert_eq!(run_code("true if 1 . else 0 . end"), "1");
    assert_eq!(run_code("false if 1 . else 0 . end"), "0");
    assert_eq!(run_code("false if 1 . end"), "");
}

#[test]
fn counting_loop() {
    assert_eq!(run_code("0 true while dup . 1 + dup 9 <= end drop"), "0123456789");
}

#[test]
fn division_by_zero() {
    assert_eq!(run_code_error("7 0 / ."), RuntimeError::DivisionByZero);
    assert_eq!(run_code_error("7 0 % ."), RuntimeError::ModuloByZero);
}

#[test]
fn assert_builtin() {
    assert_eq!(run_code("true assert 1 ."), "1");
    assert_eq!(run_code_error("false assert"), RuntimeError::AssertionFailed);
}

#[test]
fn function_calls_consume_arguments() {
    let (program, _dir) = load_file_source(
        r#"
        fn add args a: int, b: int return int begin + end
        fn double args n: int return int begin dup + end
        fn main begin 1 2 add double . end
        "#,
    );
    assert_eq!(run_program(&program).unwrap(), "6");
}

#[test]
fn named_arguments_push_copies() {
    let (program, _dir) = load_file_source(
        r#"
        fn weird args n: int return int begin drop n n + end
        fn main begin 21 weird . end
        "#,
    );
    assert_eq!(run_program(&program).unwrap(), "42");
}

#[test]
fn imported_function_runs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("lib.aaa"),
        "fn answer return int begin 42 end",
    )
    .unwrap();
    let entry = dir.path().join("main.aaa");
    std::fs::write(
        &entry,
        "from \"./lib\" import answer\nfn main begin answer . \"\\n\" . end",
    )
    .unwrap();
    let program = Program::load_with_stdlib(&entry, &stdlib());
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);

    assert_eq!(run_program(&program).unwrap(), "42\n");
}

#[test]
fn struct_query_and_update() {
    let (program, _dir) = load_file_source(
        r#"
        struct counter { value: int, label: str }
        fn counter:bump args c: counter return counter begin
            "value" { "value" ? 1 + } !
        end
        fn main begin
            counter
            "label" { "ticks" } !
            "value" { 10 } !
            counter:bump
            counter:bump
            "label" ? .
            " " .
            "value" ? .
            drop
        end
        "#,
    );
    assert_eq!(run_program(&program).unwrap(), "ticks 12");
}

#[test]
fn struct_zero_values() {
    let (program, _dir) = load_file_source(
        r#"
        struct point { x: int, label: str, flag: bool }
        fn main begin
            point
            "x" ? . drop
            point
            "label" ? strlen . drop
            point
            "flag" ? . drop
        end
        "#,
    );
    assert_eq!(run_program(&program).unwrap(), "00false");
}

#[test]
fn vec_builtins() {
    assert_eq!(
        run_code("vec[int] 5 vec:push 8 vec:push 0 vec:get . vec:size . drop"),
        "52"
    );
    assert_eq!(run_code("vec[int] 3 vec:push vec:pop . drop"), "3");
    assert_eq!(
        run_code_error("vec[int] 0 vec:get . drop"),
        RuntimeError::IndexOutOfRange { index: 0, length: 0 }
    );
    assert_eq!(
        run_code_error("vec[int] vec:pop . drop"),
        RuntimeError::IndexOutOfRange { index: 0, length: 0 }
    );
}

#[test]
fn map_builtins() {
    assert_eq!(
        run_code("map[str, int] \"one\" 1 map:set \"one\" map:get . map:size . drop"),
        "11"
    );
    assert_eq!(
        run_code("map[str, int] \"one\" 1 map:set \"two\" map:has_key . drop"),
        "false"
    );
    assert_eq!(
        run_code_error("map[str, int] \"one\" map:get . drop"),
        RuntimeError::KeyNotFound {
            key: "one".to_string()
        }
    );
}

#[test]
fn container_printing() {
    assert_eq!(
        run_code("vec[str] \"a\" vec:push \"b\" vec:push ."),
        "[\"a\", \"b\"]"
    );
    assert_eq!(run_code("map[str, int] \"k\" 7 map:set ."), "{\"k\": 7}");
}

#[test]
fn fizzbuzz_demo() {
    let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/fizzbuzz.aaa");
    let program = Program::load_with_stdlib(&demo, &stdlib());
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);

    let mut expected = String::new();
    for i in 1..=100 {
        let line = match (i % 3, i % 5) {
            (0, 0) => "fizzbuzz".to_string(),
            (0, _) => "fizz".to_string(),
            (_, 0) => "buzz".to_string(),
            _ => i.to_string(),
        };
        expected.push_str(&line);
        expected.push('\n');
    }

    assert_eq!(run_program(&program).unwrap(), expected);
}

#[test]
fn stack_fed_loop_consumes_preloaded_booleans() {
    // The historical stack-fed loop form: each iteration pops one of the
    // preloaded booleans. The checker rejects this shape, so it is driven
    // through a hand-built instruction list.
    let output = run_raw_instructions(vec![
        Instruction::PushBool(false),
        Instruction::PushBool(true),
        Instruction::PushBool(true),
        Instruction::PushBool(true),
        Instruction::JumpIfFalse(8),
        Instruction::PushInt(1),
        Instruction::Print,
        Instruction::Jump(4),
        Instruction::Nop,
    ])
    .unwrap();
    assert_eq!(output, "111");
}

#[test]
fn invalid_jump_is_reported() {
    let error = run_raw_instructions(vec![Instruction::Jump(17)]).unwrap_err();
    assert_eq!(
        error,
        RuntimeError::InvalidJump {
            target: 17,
            length: 1
        }
    );
}

#[test]
fn stack_underflow_is_reported() {
    let error = run_raw_instructions(vec![Instruction::Plus]).unwrap_err();
    assert_eq!(error, RuntimeError::StackUnderflow);
}

#[test]
fn unexpected_type_is_reported() {
    let error = run_raw_instructions(vec![
        Instruction::PushBool(true),
        Instruction::PushInt(3),
        Instruction::Plus,
    ])
    .unwrap_err();
    assert!(matches!(error, RuntimeError::UnexpectedType { .. }));
}

#[test]
fn leftover_values_are_reported_at_exit() {
    let error = run_raw_instructions(vec![Instruction::PushInt(3)]).unwrap_err();
    assert_eq!(error, RuntimeError::StackNotEmptyAtExit { left: 1 });
}

#[test]
fn cmd_wrapping_runs_a_snippet() {
    std::env::set_var("AAA_STDLIB_PATH", stdlib());
    let (program, _guard) = Program::without_file("1 2 + .").unwrap();
    assert!(program.file_load_errors.is_empty(), "{:?}", program.file_load_errors);
    assert_eq!(run_program(&program).unwrap(), "3");
}
