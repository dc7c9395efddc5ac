use super::Instruction;
use crate::cross_referencer::Binding;
use crate::parser::models::{Function, FunctionBody, FunctionBodyItem};
use crate::program::Program;
use crate::typing::RootType;
use std::path::Path;

/// Lowers the typed AST of one resolved, type checked function into a flat
/// instruction list. Branches and loops become explicit jumps whose targets
/// are patched once the surrounding code has been emitted.
pub struct InstructionGenerator<'p> {
    file: &'p Path,
    function: &'p Function,
    program: &'p Program,
}

impl<'p> InstructionGenerator<'p> {
    pub fn new(file: &'p Path, function: &'p Function, program: &'p Program) -> Self {
        Self {
            file,
            function,
            program,
        }
    }

    pub fn generate_instructions(&self) -> Vec<Instruction> {
        self.generate_body(&self.function.body, 0)
    }

    /// Generate instructions for a body. `offset` is the absolute index of
    /// the first emitted instruction inside the function, so that jump
    /// targets can be computed while emitting.
    fn generate_body(&self, body: &FunctionBody, offset: usize) -> Vec<Instruction> {
        let mut instructions: Vec<Instruction> = Vec::new();

        for item in &body.items {
            match item {
                FunctionBodyItem::IntegerLiteral(literal) => {
                    instructions.push(Instruction::PushInt(literal.value))
                }
                FunctionBodyItem::StringLiteral(literal) => {
                    instructions.push(Instruction::PushString(literal.value.clone()))
                }
                FunctionBodyItem::BooleanLiteral(literal) => {
                    instructions.push(Instruction::PushBool(literal.value))
                }
                FunctionBodyItem::Operator(operator) => {
                    instructions.push(operator_instruction(&operator.value))
                }
                FunctionBodyItem::Identifier(identifier) => {
                    instructions.push(self.identifier_instruction(&identifier.name))
                }
                FunctionBodyItem::MemberFunction(member) => {
                    instructions.push(self.identifier_instruction(&member.name_key()))
                }
                FunctionBodyItem::Branch(branch) => {
                    let condition =
                        self.generate_body(&branch.condition, offset + instructions.len());
                    instructions.extend(condition);

                    let jump_if_false_index = instructions.len();
                    instructions.push(Instruction::Nop);

                    let if_body = self.generate_body(&branch.if_body, offset + instructions.len());
                    instructions.extend(if_body);

                    let jump_index = instructions.len();
                    instructions.push(Instruction::Nop);

                    let else_offset = offset + instructions.len();
                    let else_body = self.generate_body(&branch.else_body, else_offset);
                    instructions.extend(else_body);

                    let end_offset = offset + instructions.len();
                    instructions[jump_if_false_index] = Instruction::JumpIfFalse(else_offset);
                    instructions[jump_index] = Instruction::Jump(end_offset);
                }
                FunctionBodyItem::Loop(lp) => {
                    let start_offset = offset + instructions.len();
                    let condition = self.generate_body(&lp.condition, start_offset);
                    instructions.extend(condition);

                    let jump_if_false_index = instructions.len();
                    instructions.push(Instruction::Nop);

                    let loop_body = self.generate_body(&lp.body, offset + instructions.len());
                    instructions.extend(loop_body);
                    instructions.push(Instruction::Jump(start_offset));

                    let end_offset = offset + instructions.len();
                    instructions[jump_if_false_index] = Instruction::JumpIfFalse(end_offset);
                }
                FunctionBodyItem::StructFieldQuery(query) => {
                    instructions.push(Instruction::GetStructField(query.field_name.clone()))
                }
                FunctionBodyItem::StructFieldUpdate(update) => {
                    let expression =
                        self.generate_body(&update.new_value_expr, offset + instructions.len());
                    instructions.extend(expression);
                    instructions.push(Instruction::SetStructField(update.field_name.clone()));
                }
                FunctionBodyItem::TypeLiteral(literal) => {
                    let ty = self
                        .program
                        .resolve_type_literal(self.file, literal)
                        .expect("body type literals are resolved during type checking");
                    match ty.root {
                        RootType::Vec => instructions.push(Instruction::PushVec),
                        RootType::Map => instructions.push(Instruction::PushMap),
                        _ => unreachable!("only vec and map literals reach generation"),
                    }
                }
            }
        }

        instructions
    }

    fn identifier_instruction(&self, name: &str) -> Instruction {
        let binding = self
            .program
            .get_binding(self.file, &self.function.name.name_key(), name)
            .expect("identifiers are bound during cross referencing");

        match binding {
            Binding::Argument(_) => Instruction::PushFunctionArgument(name.to_string()),
            Binding::Function { file, name_key } => Instruction::CallFunction {
                file: file.clone(),
                name: name_key.clone(),
            },
            Binding::Builtin { name } => Instruction::CallFunction {
                file: self.program.builtins_file.clone(),
                name: name.clone(),
            },
            Binding::Struct { file, name } => Instruction::PushStruct {
                file: file.clone(),
                name: name.clone(),
            },
        }
    }
}

/// The direct instruction of an operator word or symbol.
fn operator_instruction(operator: &str) -> Instruction {
    match operator {
        "+" => Instruction::Plus,
        "-" => Instruction::Minus,
        "*" => Instruction::Multiply,
        "/" => Instruction::Divide,
        "%" => Instruction::Modulo,
        "=" => Instruction::Equals,
        "!=" => Instruction::NotEqual,
        "<" => Instruction::Less,
        "<=" => Instruction::LessEq,
        ">" => Instruction::Greater,
        ">=" => Instruction::GreaterEq,
        "and" => Instruction::And,
        "or" => Instruction::Or,
        "not" => Instruction::Not,
        "." => Instruction::Print,
        "drop" => Instruction::Drop,
        "dup" => Instruction::Dup,
        "swap" => Instruction::Swap,
        "over" => Instruction::Over,
        "rot" => Instruction::Rot,
        "substr" => Instruction::Substr,
        "strlen" => Instruction::StrLen,
        other => unreachable!("unknown operator '{}'", other),
    }
}
