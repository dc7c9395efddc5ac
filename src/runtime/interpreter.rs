use super::debug::format_str;
use super::{Frame, Interpreter, Value};
use crate::errors::RuntimeError;
use crate::instructions::Instruction;
use crate::program::Program;
use crate::util::Log;
use std::io::Write;
use std::path::Path;

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program, verbose: bool) -> Self {
        Self::with_output(program, verbose, Box::new(std::io::stdout()))
    }

    /// Create an interpreter writing program output into `output` instead
    /// of standard output.
    pub fn with_output(
        program: &'p Program,
        verbose: bool,
        output: Box<dyn std::io::Write>,
    ) -> Self {
        let log = if verbose {
            Log::Verbose("interpreter")
        } else {
            Log::None
        };

        Self {
            program,
            stack: Vec::new(),
            call_stack: Vec::new(),
            log,
            output,
        }
    }

    /// Execute the program, starting at the entry point's `main`. Returns
    /// once the call stack is empty or a runtime error occurred.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        if self.log.is_verbose() {
            self.program.print_all_instructions();
        }

        let result = self.run_loop();
        self.output.flush().ok();
        result?;

        if !self.stack.is_empty() {
            return Err(RuntimeError::StackNotEmptyAtExit {
                left: self.stack.len(),
            });
        }
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), RuntimeError> {
        let entry_file = self.program.entry_point_file.clone();
        self.push_frame(&entry_file, "main")?;

        while let Some(frame) = self.call_stack.last() {
            if frame.instruction_pointer >= frame.instructions.len() {
                self.call_stack.pop();
                continue;
            }

            let instruction = frame.instructions[frame.instruction_pointer].clone();

            if self.log.is_verbose() {
                self.print_step(&instruction);
            }

            self.call_stack
                .last_mut()
                .expect("a frame is executing")
                .instruction_pointer += 1;
            self.execute(instruction)?;
        }
        Ok(())
    }

    /// The value and call stacks, as printed when a verbose run fails.
    pub fn dump_stacks(&self) {
        eprintln!(
            "value stack: [{}]",
            self.stack
                .iter()
                .map(|value| format!("{}", value))
                .collect::<Vec<String>>()
                .join(", ")
        );
        eprintln!("call stack:");
        for frame in self.call_stack.iter().rev() {
            eprintln!(
                "    {} (IP: {}) in {}",
                frame.function_name,
                frame.instruction_pointer,
                frame.file.display()
            );
        }
    }

    fn print_step(&self, instruction: &Instruction) {
        let frame = self.call_stack.last().expect("a frame is executing");
        let stack = self
            .stack
            .iter()
            .map(|value| format!("{}", value))
            .collect::<Vec<String>>()
            .join(" ");

        eprintln!(
            "DEBUG | {:>15} | IP: {:>3} | {:<30} | Stack: {}",
            format_str(&frame.function_name, 15),
            frame.instruction_pointer,
            format_str(&format!("{}", instruction), 30),
            format_str(&stack, 60),
        );
    }

    fn execute(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
        match instruction {
            Instruction::PushInt(value) => self.stack.push(Value::Int(value)),
            Instruction::PushBool(value) => self.stack.push(Value::Bool(value)),
            Instruction::PushString(value) => self.stack.push(Value::Str(value)),
            Instruction::PushVec => self.stack.push(Value::Vec(Vec::new())),
            Instruction::PushMap => self.stack.push(Value::Map(Vec::new())),
            Instruction::PushStruct { file, name } => {
                let value = Value::zero_struct(&file, &name, self.program);
                self.stack.push(value);
            }
            Instruction::PushFunctionArgument(name) => {
                let frame = self.call_stack.last().expect("a frame is executing");
                let value = frame
                    .arguments
                    .iter()
                    .find(|(argument, _)| argument == &name)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| RuntimeError::InvalidFunctionCall {
                        file: frame.file.clone(),
                        name: frame.function_name.clone(),
                    })?;
                self.stack.push(value);
            }
            Instruction::Plus => {
                let right = self.pop()?;
                let left = self.pop()?;
                let result = match (left, right) {
                    (Value::Int(left), Value::Int(right)) => {
                        Value::Int(left.wrapping_add(right))
                    }
                    (Value::Str(left), Value::Str(right)) => Value::Str(left + &right),
                    (left, _) => return Err(unexpected("int or str", &left)),
                };
                self.stack.push(result);
            }
            Instruction::Minus => self.int_op(|left, right| Value::Int(left.wrapping_sub(right)))?,
            Instruction::Multiply => {
                self.int_op(|left, right| Value::Int(left.wrapping_mul(right)))?
            }
            Instruction::Divide => {
                let right = self.pop_int()?;
                let left = self.pop_int()?;
                if right == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                self.stack.push(Value::Int(left.wrapping_div(right)));
            }
            Instruction::Modulo => {
                let right = self.pop_int()?;
                let left = self.pop_int()?;
                if right == 0 {
                    return Err(RuntimeError::ModuloByZero);
                }
                self.stack.push(Value::Int(left.wrapping_rem(right)));
            }
            Instruction::Equals => {
                let (left, right) = self.pop_same_kind()?;
                self.stack.push(Value::Bool(left == right));
            }
            Instruction::NotEqual => {
                let (left, right) = self.pop_same_kind()?;
                self.stack.push(Value::Bool(left != right));
            }
            Instruction::Less => self.int_op(|left, right| Value::Bool(left < right))?,
            Instruction::LessEq => self.int_op(|left, right| Value::Bool(left <= right))?,
            Instruction::Greater => self.int_op(|left, right| Value::Bool(left > right))?,
            Instruction::GreaterEq => self.int_op(|left, right| Value::Bool(left >= right))?,
            Instruction::And => {
                let right = self.pop_bool()?;
                let left = self.pop_bool()?;
                self.stack.push(Value::Bool(left && right));
            }
            Instruction::Or => {
                let right = self.pop_bool()?;
                let left = self.pop_bool()?;
                self.stack.push(Value::Bool(left || right));
            }
            Instruction::Not => {
                let value = self.pop_bool()?;
                self.stack.push(Value::Bool(!value));
            }
            Instruction::Print => {
                let value = self.pop()?;
                write!(self.output, "{}", value).ok();
            }
            Instruction::Drop => {
                self.pop()?;
            }
            Instruction::Dup => {
                let top = self.pop()?;
                self.stack.push(top.clone());
                self.stack.push(top);
            }
            Instruction::Swap => {
                let top = self.pop()?;
                let below = self.pop()?;
                self.stack.push(top);
                self.stack.push(below);
            }
            Instruction::Over => {
                let top = self.pop()?;
                let below = self.pop()?;
                self.stack.push(below.clone());
                self.stack.push(top);
                self.stack.push(below);
            }
            Instruction::Rot => {
                let top = self.pop()?;
                let middle = self.pop()?;
                let bottom = self.pop()?;
                self.stack.push(middle);
                self.stack.push(top);
                self.stack.push(bottom);
            }
            Instruction::Substr => {
                let end = self.pop_int()?;
                let start = self.pop_int()?;
                let value = self.pop_str()?;
                self.stack.push(Value::Str(substr(&value, start, end)));
            }
            Instruction::StrLen => {
                let value = self.pop_str()?;
                self.stack.push(Value::Int(value.chars().count() as i64));
            }
            Instruction::Jump(target) => self.jump(target)?,
            Instruction::JumpIfFalse(target) => {
                if !self.pop_bool()? {
                    self.jump(target)?;
                }
            }
            Instruction::CallFunction { file, name } => {
                if let Some(result) = self.call_builtin(&name) {
                    result?;
                } else {
                    self.push_frame(&file, &name)?;
                }
            }
            Instruction::GetStructField(field_name) => {
                let value = match self.top()? {
                    Value::Struct { fields, .. } => fields
                        .iter()
                        .find(|(name, _)| name == &field_name)
                        .map(|(_, value)| value.clone()),
                    other => return Err(unexpected("struct", other)),
                };
                match value {
                    Some(value) => self.stack.push(value),
                    None => {
                        return Err(RuntimeError::KeyNotFound {
                            key: field_name,
                        })
                    }
                }
            }
            Instruction::SetStructField(field_name) => {
                let new_value = self.pop()?;
                match self.top_mut()? {
                    Value::Struct { fields, .. } => {
                        match fields.iter_mut().find(|(name, _)| name == &field_name) {
                            Some((_, value)) => *value = new_value,
                            None => {
                                return Err(RuntimeError::KeyNotFound {
                                    key: field_name,
                                })
                            }
                        }
                    }
                    other => return Err(unexpected("struct", other)),
                }
            }
            Instruction::Nop => {}
        }
        Ok(())
    }

    fn jump(&mut self, target: usize) -> Result<(), RuntimeError> {
        let frame = self.call_stack.last_mut().expect("a frame is executing");
        if target > frame.instructions.len() {
            return Err(RuntimeError::InvalidJump {
                target,
                length: frame.instructions.len(),
            });
        }
        frame.instruction_pointer = target;
        Ok(())
    }

    /// Push a frame for a function call. The callee's named arguments are
    /// copied off the top of the value stack; the values themselves stay
    /// for the body to consume.
    fn push_frame(&mut self, file: &Path, name: &str) -> Result<(), RuntimeError> {
        let invalid_call = || RuntimeError::InvalidFunctionCall {
            file: file.to_path_buf(),
            name: name.to_string(),
        };

        let instructions = self
            .program
            .get_instructions(file, name)
            .ok_or_else(invalid_call)?;
        let function = self.program.get_function(file, name).ok_or_else(invalid_call)?;

        let argument_count = function.arguments.len();
        if self.stack.len() < argument_count {
            return Err(RuntimeError::StackUnderflow);
        }

        let first_argument = self.stack.len() - argument_count;
        let arguments = function
            .arguments
            .iter()
            .zip(&self.stack[first_argument..])
            .map(|(argument, value)| (argument.name.clone(), value.clone()))
            .collect();

        self.call_stack.push(Frame {
            file: file.to_path_buf(),
            function_name: name.to_string(),
            instructions,
            instruction_pointer: 0,
            arguments,
        });
        Ok(())
    }

    fn int_op<F: Fn(i64, i64) -> Value>(&mut self, op: F) -> Result<(), RuntimeError> {
        let right = self.pop_int()?;
        let left = self.pop_int()?;
        self.stack.push(op(left, right));
        Ok(())
    }

    pub(super) fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    pub(super) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn top(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    fn top_mut(&mut self) -> Result<&mut Value, RuntimeError> {
        self.stack.last_mut().ok_or(RuntimeError::StackUnderflow)
    }

    pub(super) fn pop_int(&mut self) -> Result<i64, RuntimeError> {
        match self.pop()? {
            Value::Int(value) => Ok(value),
            other => Err(unexpected("int", &other)),
        }
    }

    pub(super) fn pop_bool(&mut self) -> Result<bool, RuntimeError> {
        match self.pop()? {
            Value::Bool(value) => Ok(value),
            other => Err(unexpected("bool", &other)),
        }
    }

    pub(super) fn pop_str(&mut self) -> Result<String, RuntimeError> {
        match self.pop()? {
            Value::Str(value) => Ok(value),
            other => Err(unexpected("str", &other)),
        }
    }

    fn pop_same_kind(&mut self) -> Result<(Value, Value), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        if left.kind() != right.kind() {
            return Err(unexpected(left.kind(), &right));
        }
        Ok((left, right))
    }
}

pub(super) fn unexpected(expected: &'static str, found: &Value) -> RuntimeError {
    RuntimeError::UnexpectedType {
        expected,
        found: found.kind().to_string(),
    }
}

/// Substring with the clamping rules of the language: `start` at or past
/// the end gives `""`, `end` past the end gives the suffix from `start`,
/// and an empty or inverted range gives `""`. Indices count characters.
fn substr(value: &str, start: i64, end: i64) -> String {
    let length = value.chars().count() as i64;
    let start = start.max(0);
    if start >= length || end <= start {
        return String::new();
    }
    let end = end.min(length);
    value
        .chars()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect()
}
