//! The typed AST produced by the [Transformer](super::Transformer).

use crate::util::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBodyItem {
    IntegerLiteral(IntegerLiteral),
    StringLiteral(StringLiteral),
    BooleanLiteral(BooleanLiteral),
    Identifier(Identifier),
    Operator(Operator),
    Branch(Branch),
    Loop(Loop),
    MemberFunction(MemberFunction),
    StructFieldQuery(StructFieldQuery),
    StructFieldUpdate(StructFieldUpdate),
    TypeLiteral(ParsedTypeLiteral),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegerLiteral {
    pub value: i64,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub value: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub value: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: FunctionBody,
    pub if_body: FunctionBody,
    pub else_body: FunctionBody,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub condition: FunctionBody,
    pub body: FunctionBody,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberFunction {
    pub type_name: String,
    pub func_name: String,
    pub position: Position,
}

impl MemberFunction {
    pub fn name_key(&self) -> String {
        format!("{}:{}", self.type_name, self.func_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructFieldQuery {
    pub field_name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructFieldUpdate {
    pub field_name: String,
    pub new_value_expr: FunctionBody,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub items: Vec<FunctionBodyItem>,
}

impl FunctionBody {
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A type annotation as written in the source: either a named type with
/// optional parameters or a `*name` placeholder.
pub enum ParsedType {
    Literal(ParsedTypeLiteral),
    Placeholder(ParsedTypePlaceholder),
}

impl ParsedType {
    pub fn position(&self) -> Position {
        match self {
            ParsedType::Literal(literal) => literal.position,
            ParsedType::Placeholder(placeholder) => placeholder.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTypeLiteral {
    pub name: String,
    pub params: Vec<ParsedType>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTypePlaceholder {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub ty: ParsedType,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
/// A function name: plain, or qualified by a type for member functions.
pub enum FunctionName {
    Plain(String),
    Member { type_name: String, func_name: String },
}

impl FunctionName {
    /// The string under which the function is registered. Member functions
    /// use the `type:func` form.
    pub fn name_key(&self) -> String {
        match self {
            FunctionName::Plain(name) => name.clone(),
            FunctionName::Member {
                type_name,
                func_name,
            } => format!("{}:{}", type_name, func_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: FunctionName,
    pub arguments: Vec<Argument>,
    pub return_types: Vec<ParsedType>,
    pub body: FunctionBody,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Argument>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub original_name: String,
    pub imported_name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub source: String,
    pub items: Vec<ImportItem>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedFile {
    pub functions: Vec<Function>,
    pub imports: Vec<Import>,
    pub structs: Vec<Struct>,
}

impl ParsedFile {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.imports.is_empty() && self.structs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A primitive signature declaration from the builtins file. Builtins have
/// no bodies and their arguments are unnamed.
pub struct BuiltinFunction {
    pub name: String,
    pub arguments: Vec<ParsedType>,
    pub return_types: Vec<ParsedType>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedBuiltinsFile {
    pub functions: Vec<BuiltinFunction>,
}
