use super::{Placeholders, RootType, Signature, VariableType};
use crate::cross_referencer::Binding;
use crate::errors::LoadError;
use crate::parser::models::{
    Branch, Function, FunctionBody, FunctionBodyItem, Loop, StructFieldQuery, StructFieldUpdate,
};
use crate::program::Program;
use crate::util::Position;
use std::path::{Path, PathBuf};

/// The stack effect checker.
///
/// Starting from the declared argument types, the checker walks a function
/// body and tracks the exact type stack at every program point; the body
/// must end on exactly the declared return types. Placeholders unify left
/// to right against the stack through a per-application substitution map.
pub struct TypeChecker<'p> {
    file: &'p Path,
    function: &'p Function,
    program: &'p Program,
}

impl<'p> TypeChecker<'p> {
    pub fn new(file: &'p Path, function: &'p Function, program: &'p Program) -> Self {
        Self {
            file,
            function,
            program,
        }
    }

    pub fn check(&self) -> Result<(), LoadError> {
        let name_key = self.function.name.name_key();
        let signature = self
            .program
            .signatures
            .get(self.file)
            .and_then(|signatures| signatures.get(&name_key))
            .expect("signatures are resolved before checking")
            .clone();

        let stack = self.check_body(signature.arguments.clone(), &self.function.body)?;

        if stack != signature.return_types {
            return Err(LoadError::FunctionTypes {
                file: self.file_buf(),
                position: self.function.position,
                name: name_key,
                expected: signature.return_types,
                found: stack,
            });
        }
        Ok(())
    }

    fn check_body(
        &self,
        stack: Vec<VariableType>,
        body: &FunctionBody,
    ) -> Result<Vec<VariableType>, LoadError> {
        let mut stack = stack;
        for item in &body.items {
            stack = self.check_item(stack, item)?;
        }
        Ok(stack)
    }

    fn check_item(
        &self,
        mut stack: Vec<VariableType>,
        item: &FunctionBodyItem,
    ) -> Result<Vec<VariableType>, LoadError> {
        match item {
            FunctionBodyItem::IntegerLiteral(_) => {
                stack.push(VariableType::int());
                Ok(stack)
            }
            FunctionBodyItem::StringLiteral(_) => {
                stack.push(VariableType::str());
                Ok(stack)
            }
            FunctionBodyItem::BooleanLiteral(_) => {
                stack.push(VariableType::bool());
                Ok(stack)
            }
            FunctionBodyItem::Operator(operator) => {
                let signatures = self
                    .program
                    .builtins
                    .functions
                    .get(&operator.value)
                    .ok_or_else(|| LoadError::UnknownFunction {
                        file: self.file_buf(),
                        position: operator.position,
                        name: operator.value.clone(),
                    })?;
                self.apply_signatures(stack, signatures, &operator.value, operator.position)
            }
            FunctionBodyItem::Identifier(identifier) => {
                let binding = self
                    .program
                    .get_binding(self.file, &self.function.name.name_key(), &identifier.name)
                    .expect("identifiers are bound before checking");

                match binding {
                    Binding::Argument(ty) => {
                        stack.push(ty.clone());
                        Ok(stack)
                    }
                    Binding::Struct { file, name } => {
                        stack.push(VariableType::custom(file, name));
                        Ok(stack)
                    }
                    Binding::Function { file, name_key } => {
                        let signature = self
                            .program
                            .signatures
                            .get(file)
                            .and_then(|signatures| signatures.get(name_key))
                            .expect("bound functions have resolved signatures")
                            .clone();
                        self.apply_signatures(
                            stack,
                            &[signature],
                            &identifier.name,
                            identifier.position,
                        )
                    }
                    Binding::Builtin { name } => {
                        let signatures = self.program.builtins.functions[name].clone();
                        self.apply_signatures(
                            stack,
                            &signatures,
                            &identifier.name,
                            identifier.position,
                        )
                    }
                }
            }
            FunctionBodyItem::MemberFunction(member) => {
                let name_key = member.name_key();
                let binding = self
                    .program
                    .get_binding(self.file, &self.function.name.name_key(), &name_key)
                    .expect("member functions are bound before checking");

                let signatures = match binding {
                    Binding::Builtin { name } => self.program.builtins.functions[name].clone(),
                    Binding::Function { file, name_key } => vec![self
                        .program
                        .signatures
                        .get(file)
                        .and_then(|signatures| signatures.get(name_key))
                        .expect("bound functions have resolved signatures")
                        .clone()],
                    _ => unreachable!("member functions bind to functions or builtins"),
                };
                self.apply_signatures(stack, &signatures, &name_key, member.position)
            }
            FunctionBodyItem::Branch(branch) => self.check_branch(stack, branch),
            FunctionBodyItem::Loop(lp) => self.check_loop(stack, lp),
            FunctionBodyItem::StructFieldQuery(query) => self.check_field_query(stack, query),
            FunctionBodyItem::StructFieldUpdate(update) => self.check_field_update(stack, update),
            FunctionBodyItem::TypeLiteral(literal) => {
                let ty = self.program.resolve_type_literal(self.file, literal)?;
                stack.push(ty);
                Ok(stack)
            }
        }
    }

    /// Pop a condition's boolean result off the checked stack. The code in
    /// front of the branch or loop keyword must have left a single bool on
    /// top.
    fn pop_condition_bool(
        &self,
        mut stack: Vec<VariableType>,
        position: Position,
    ) -> Result<Vec<VariableType>, LoadError> {
        match stack.last() {
            Some(top) if top == &VariableType::bool() => {
                stack.pop();
                Ok(stack)
            }
            _ => Err(LoadError::ConditionType {
                file: self.file_buf(),
                position,
                stack,
            }),
        }
    }

    fn check_branch(
        &self,
        stack: Vec<VariableType>,
        branch: &Branch,
    ) -> Result<Vec<VariableType>, LoadError> {
        let after_condition = self.check_body(stack, &branch.condition)?;
        let base = self.pop_condition_bool(after_condition, branch.position)?;

        let if_stack = self.check_body(base.clone(), &branch.if_body)?;
        let else_stack = self.check_body(base, &branch.else_body)?;

        if if_stack != else_stack {
            return Err(LoadError::BranchType {
                file: self.file_buf(),
                position: branch.position,
                if_stack,
                else_stack,
            });
        }
        Ok(if_stack)
    }

    fn check_loop(
        &self,
        stack: Vec<VariableType>,
        lp: &Loop,
    ) -> Result<Vec<VariableType>, LoadError> {
        let after_condition = self.check_body(stack.clone(), &lp.condition)?;
        let base = self.pop_condition_bool(after_condition, lp.position)?;

        let after_body = self.check_body(base.clone(), &lp.body)?;

        // The body feeds the next condition check, so it must rebuild the
        // stack the loop was entered with.
        if after_body != stack {
            return Err(LoadError::LoopType {
                file: self.file_buf(),
                position: lp.position,
                before: stack,
                after: after_body,
            });
        }
        Ok(base)
    }

    /// The struct definition behind the type on top of the stack.
    fn struct_on_top(
        &self,
        stack: &[VariableType],
        operator: &str,
        position: Position,
    ) -> Result<(PathBuf, String), LoadError> {
        match stack.last() {
            Some(VariableType {
                root: RootType::Custom { file, name },
                ..
            }) => Ok((file.clone(), name.clone())),
            _ => Err(LoadError::StructOperator {
                file: self.file_buf(),
                position,
                operator: operator.to_string(),
                stack: stack.to_vec(),
            }),
        }
    }

    fn field_type(
        &self,
        struct_file: &Path,
        struct_name: &str,
        field_name: &str,
        position: Position,
    ) -> Result<VariableType, LoadError> {
        self.program
            .struct_fields
            .get(struct_file)
            .and_then(|structs| structs.get(struct_name))
            .and_then(|fields| {
                fields
                    .iter()
                    .find(|(name, _)| name == field_name)
                    .map(|(_, ty)| ty.clone())
            })
            .ok_or_else(|| LoadError::UnknownStructField {
                file: self.file_buf(),
                position,
                struct_name: struct_name.to_string(),
                field_name: field_name.to_string(),
            })
    }

    fn check_field_query(
        &self,
        mut stack: Vec<VariableType>,
        query: &StructFieldQuery,
    ) -> Result<Vec<VariableType>, LoadError> {
        let (struct_file, struct_name) = self.struct_on_top(&stack, "?", query.position)?;
        let field_type =
            self.field_type(&struct_file, &struct_name, &query.field_name, query.position)?;

        // The struct stays; its field value lands on top of it.
        stack.push(field_type);
        Ok(stack)
    }

    fn check_field_update(
        &self,
        stack: Vec<VariableType>,
        update: &StructFieldUpdate,
    ) -> Result<Vec<VariableType>, LoadError> {
        let (struct_file, struct_name) = self.struct_on_top(&stack, "!", update.position)?;
        let field_type = self.field_type(
            &struct_file,
            &struct_name,
            &update.field_name,
            update.position,
        )?;

        let mut expected = stack.clone();
        expected.push(field_type.clone());

        let after_expression = self.check_body(stack.clone(), &update.new_value_expr)?;
        if after_expression != expected {
            return Err(LoadError::ArgumentTypeMismatch {
                file: self.file_buf(),
                position: update.position,
                expected: field_type,
                found: after_expression,
            });
        }
        Ok(stack)
    }

    /// Apply the first unifying signature to the stack: pop the argument
    /// types, push the return types with placeholders substituted.
    fn apply_signatures(
        &self,
        stack: Vec<VariableType>,
        signatures: &[Signature],
        name: &str,
        position: Position,
    ) -> Result<Vec<VariableType>, LoadError> {
        for signature in signatures {
            if let Some(new_stack) = apply_signature(&stack, signature) {
                return Ok(new_stack);
            }
        }

        Err(LoadError::StackTypes {
            file: self.file_buf(),
            position,
            name: name.to_string(),
            signature: signatures[0].clone(),
            stack,
        })
    }

    fn file_buf(&self) -> PathBuf {
        self.file.to_path_buf()
    }
}

fn apply_signature(stack: &[VariableType], signature: &Signature) -> Option<Vec<VariableType>> {
    let argument_count = signature.arguments.len();
    if stack.len() < argument_count {
        return None;
    }

    let split = stack.len() - argument_count;
    let mut placeholders = Placeholders::new();
    for (signature_type, stack_type) in signature.arguments.iter().zip(&stack[split..]) {
        if !signature_type.unify(stack_type, &mut placeholders) {
            return None;
        }
    }

    let mut new_stack = stack[..split].to_vec();
    new_stack.extend(
        signature
            .return_types
            .iter()
            .map(|ty| ty.substitute(&placeholders)),
    );
    Some(new_stack)
}
