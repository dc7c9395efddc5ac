use super::models::{
    Argument, BooleanLiteral, Branch, BuiltinFunction, Function, FunctionBody, FunctionBodyItem,
    FunctionName, Identifier, Import, ImportItem, IntegerLiteral, Loop, MemberFunction, Operator,
    ParsedBuiltinsFile, ParsedFile, ParsedType, ParsedTypeLiteral, ParsedTypePlaceholder,
    StringLiteral, Struct, StructFieldQuery, StructFieldUpdate,
};
use super::{ParseTree, TreeKind};
use crate::errors::LoadError;
use crate::grammar::NonTerminal;
use crate::tokenizer::{Token, TokenKind};
use crate::util::{Code, Position};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Lowers a concrete parse tree into the typed AST of [models](super::models).
pub struct Transformer<'a> {
    file: &'a Path,
    code: &'a Code<'a>,
    tokens: &'a [Token],
}

impl<'a> Transformer<'a> {
    pub fn new(file: &'a Path, code: &'a Code<'a>, tokens: &'a [Token]) -> Self {
        Self { file, code, tokens }
    }

    pub fn transform_regular_file(&self, tree: &ParseTree) -> Result<ParsedFile, LoadError> {
        debug_assert!(tree.is_rule(NonTerminal::RegularFileRoot));

        if tree.children.is_empty() {
            return Err(LoadError::EmptyParseTree {
                file: self.file.to_path_buf(),
            });
        }

        let mut parsed = ParsedFile::default();
        for item in &tree.children {
            let inner = &item.children[0];
            match inner.kind {
                TreeKind::NonTerminal(NonTerminal::FunctionDefinition) => {
                    parsed.functions.push(self.transform_function(inner)?)
                }
                TreeKind::NonTerminal(NonTerminal::ImportStatement) => {
                    parsed.imports.push(self.transform_import(inner)?)
                }
                TreeKind::NonTerminal(NonTerminal::StructDefinition) => {
                    parsed.structs.push(self.transform_struct(inner)?)
                }
                _ => unreachable!("regular file items are functions, imports or structs"),
            }
        }
        Ok(parsed)
    }

    pub fn transform_builtins_file(
        &self,
        tree: &ParseTree,
    ) -> Result<ParsedBuiltinsFile, LoadError> {
        debug_assert!(tree.is_rule(NonTerminal::BuiltinsFileRoot));

        let mut parsed = ParsedBuiltinsFile::default();
        for child in &tree.children {
            parsed.functions.push(self.transform_builtin_function(child)?);
        }
        Ok(parsed)
    }

    fn transform_builtin_function(&self, tree: &ParseTree) -> Result<BuiltinFunction, LoadError> {
        let mut name = String::new();
        let mut arguments: Vec<ParsedType> = Vec::new();
        let mut return_types: Vec<ParsedType> = Vec::new();

        for child in &tree.children {
            match child.kind {
                TreeKind::Terminal(TokenKind::String) => {
                    name = self.string_value(child);
                }
                TreeKind::NonTerminal(NonTerminal::BuiltinArguments) => {
                    arguments = self.transform_type_list(child)?;
                }
                TreeKind::NonTerminal(NonTerminal::ReturnTypes) => {
                    return_types = self.transform_type_list(child)?;
                }
                _ => {}
            }
        }

        Ok(BuiltinFunction {
            name,
            arguments,
            return_types,
            position: self.position_of(tree),
        })
    }

    fn transform_function(&self, tree: &ParseTree) -> Result<Function, LoadError> {
        let mut name = None;
        let mut arguments: Vec<Argument> = Vec::new();
        let mut return_types: Vec<ParsedType> = Vec::new();
        let mut body = FunctionBody::empty();

        for child in &tree.children {
            match child.kind {
                TreeKind::NonTerminal(NonTerminal::FunctionName) => {
                    name = Some(self.transform_function_name(child));
                }
                TreeKind::NonTerminal(NonTerminal::Arguments) => {
                    arguments = self.transform_arguments(child)?;
                }
                TreeKind::NonTerminal(NonTerminal::ReturnTypes) => {
                    return_types = self.transform_type_list(child)?;
                }
                TreeKind::NonTerminal(NonTerminal::FunctionBody) => {
                    body = self.transform_body(child)?;
                }
                _ => {}
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for argument in &arguments {
            if !seen.insert(&argument.name) {
                return Err(LoadError::CollidingIdentifier {
                    file: self.file_buf(),
                    position: argument.position,
                    name: argument.name.clone(),
                });
            }
        }

        Ok(Function {
            name: name.expect("function definitions always carry a name"),
            arguments,
            return_types,
            body,
            position: self.position_of(tree),
        })
    }

    fn transform_function_name(&self, tree: &ParseTree) -> FunctionName {
        let inner = &tree.children[0];
        match inner.kind {
            TreeKind::Terminal(TokenKind::Identifier) => {
                FunctionName::Plain(self.leaf_text(inner).to_string())
            }
            TreeKind::NonTerminal(NonTerminal::MemberFunction) => {
                let member = self.transform_member_function(inner);
                FunctionName::Member {
                    type_name: member.type_name,
                    func_name: member.func_name,
                }
            }
            _ => unreachable!("function names are identifiers or member functions"),
        }
    }

    fn transform_arguments(&self, tree: &ParseTree) -> Result<Vec<Argument>, LoadError> {
        self.collect_separated(tree, NonTerminal::Argument, NonTerminal::ArgumentTail)
            .into_iter()
            .map(|argument| self.transform_argument(argument))
            .collect()
    }

    fn transform_argument(&self, tree: &ParseTree) -> Result<Argument, LoadError> {
        let name = self.leaf_text(&tree.children[0]).to_string();
        let ty = self.transform_type(&tree.children[2])?;
        Ok(Argument {
            name,
            ty,
            position: self.position_of(tree),
        })
    }

    /// A comma separated type list: `return_types`, `builtin_arguments` and
    /// `type_params` all share this shape.
    fn transform_type_list(&self, tree: &ParseTree) -> Result<Vec<ParsedType>, LoadError> {
        self.collect_separated(tree, NonTerminal::Type, NonTerminal::TypeTail)
            .into_iter()
            .map(|ty| self.transform_type(ty))
            .collect()
    }

    fn transform_type(&self, tree: &ParseTree) -> Result<ParsedType, LoadError> {
        let inner = &tree.children[0];
        match inner.kind {
            TreeKind::NonTerminal(NonTerminal::TypeLiteral) => {
                Ok(ParsedType::Literal(self.transform_type_literal(inner)?))
            }
            TreeKind::NonTerminal(NonTerminal::TypePlaceholder) => {
                Ok(ParsedType::Placeholder(ParsedTypePlaceholder {
                    name: self.leaf_text(&inner.children[1]).to_string(),
                    position: self.position_of(inner),
                }))
            }
            _ => unreachable!("types are literals or placeholders"),
        }
    }

    fn transform_type_literal(&self, tree: &ParseTree) -> Result<ParsedTypeLiteral, LoadError> {
        let name = self.leaf_text(&tree.children[0]).to_string();
        let params = match tree.child_rule(NonTerminal::TypeParams) {
            Some(params) => self.transform_type_list(params)?,
            None => Vec::new(),
        };
        Ok(ParsedTypeLiteral {
            name,
            params,
            position: self.position_of(tree),
        })
    }

    fn transform_body(&self, tree: &ParseTree) -> Result<FunctionBody, LoadError> {
        let mut items: Vec<FunctionBodyItem> = Vec::new();
        for item in &tree.children {
            items.push(self.transform_body_item(&item.children[0])?);
        }
        Ok(FunctionBody { items })
    }

    fn transform_body_item(&self, tree: &ParseTree) -> Result<FunctionBodyItem, LoadError> {
        let position = self.position_of(tree);

        let item = match tree.kind {
            TreeKind::NonTerminal(NonTerminal::Branch) => {
                let mut bodies = tree.child_rules(NonTerminal::FunctionBody);
                let if_body = self.transform_body(bodies.next().expect("branch has an if body"))?;
                let else_body = match tree.child_rule(NonTerminal::BranchElse) {
                    Some(branch_else) => self.transform_body(
                        branch_else
                            .child_rule(NonTerminal::FunctionBody)
                            .expect("else clause has a body"),
                    )?,
                    None => FunctionBody::empty(),
                };

                FunctionBodyItem::Branch(Branch {
                    condition: FunctionBody::empty(),
                    if_body,
                    else_body,
                    position,
                })
            }
            TreeKind::NonTerminal(NonTerminal::Loop) => {
                let body = self.transform_body(
                    tree.child_rule(NonTerminal::FunctionBody)
                        .expect("loop has a body"),
                )?;
                FunctionBodyItem::Loop(Loop {
                    condition: FunctionBody::empty(),
                    body,
                    position,
                })
            }
            TreeKind::NonTerminal(NonTerminal::StructFieldUpdate) => {
                let new_value_expr = self.transform_body(
                    tree.child_rule(NonTerminal::FunctionBody)
                        .expect("field update has a value expression"),
                )?;
                FunctionBodyItem::StructFieldUpdate(StructFieldUpdate {
                    field_name: self.string_value(&tree.children[0]),
                    new_value_expr,
                    position,
                })
            }
            TreeKind::NonTerminal(NonTerminal::StructFieldQuery) => {
                FunctionBodyItem::StructFieldQuery(StructFieldQuery {
                    field_name: self.string_value(&tree.children[0]),
                    position,
                })
            }
            TreeKind::NonTerminal(NonTerminal::Boolean) => {
                FunctionBodyItem::BooleanLiteral(BooleanLiteral {
                    value: tree.children[0].kind == TreeKind::Terminal(TokenKind::True),
                    position,
                })
            }
            TreeKind::NonTerminal(NonTerminal::MemberFunction) => {
                FunctionBodyItem::MemberFunction(self.transform_member_function(tree))
            }
            TreeKind::NonTerminal(NonTerminal::Operator) => FunctionBodyItem::Operator(Operator {
                value: self.leaf_text(&tree.children[0]).to_string(),
                position,
            }),
            TreeKind::Terminal(TokenKind::Integer) => {
                let value: i64 =
                    self.leaf_text(tree)
                        .parse()
                        .map_err(|_| LoadError::IntegerOutOfRange {
                            file: self.file_buf(),
                            position,
                        })?;
                FunctionBodyItem::IntegerLiteral(IntegerLiteral { value, position })
            }
            TreeKind::Terminal(TokenKind::String) => {
                FunctionBodyItem::StringLiteral(StringLiteral {
                    value: self.string_value(tree),
                    position,
                })
            }
            TreeKind::NonTerminal(NonTerminal::TypeLiteral) => {
                let literal = self.transform_type_literal(tree)?;
                if literal.params.is_empty() {
                    // A bare name in body position is a reference, not a type.
                    FunctionBodyItem::Identifier(Identifier {
                        name: literal.name,
                        position,
                    })
                } else {
                    FunctionBodyItem::TypeLiteral(literal)
                }
            }
            _ => unreachable!("unhandled function body item {:?}", tree.kind),
        };
        Ok(item)
    }

    fn transform_member_function(&self, tree: &ParseTree) -> MemberFunction {
        MemberFunction {
            type_name: self.leaf_text(&tree.children[0]).to_string(),
            func_name: self.leaf_text(&tree.children[2]).to_string(),
            position: self.position_of(tree),
        }
    }

    fn transform_struct(&self, tree: &ParseTree) -> Result<Struct, LoadError> {
        let name = self.leaf_text(&tree.children[1]).to_string();
        let fields: Vec<Argument> = self
            .collect_separated(tree, NonTerminal::Argument, NonTerminal::ArgumentTail)
            .into_iter()
            .map(|field| self.transform_argument(field))
            .collect::<Result<_, _>>()?;

        let mut seen: HashSet<&str> = HashSet::new();
        for field in &fields {
            if !seen.insert(&field.name) {
                return Err(LoadError::CollidingIdentifier {
                    file: self.file_buf(),
                    position: field.position,
                    name: field.name.clone(),
                });
            }
        }

        Ok(Struct {
            name,
            fields,
            position: self.position_of(tree),
        })
    }

    fn transform_import(&self, tree: &ParseTree) -> Result<Import, LoadError> {
        let source = self.string_value(&tree.children[1]);
        let items = self
            .collect_separated(tree, NonTerminal::ImportItem, NonTerminal::ImportItemTail)
            .into_iter()
            .map(|item| self.transform_import_item(item))
            .collect();

        Ok(Import {
            source,
            items,
            position: self.position_of(tree),
        })
    }

    fn transform_import_item(&self, tree: &ParseTree) -> ImportItem {
        let original_name = self.leaf_text(&tree.children[0]).to_string();
        let imported_name = match tree.child_rule(NonTerminal::ImportAlias) {
            Some(alias) => self.leaf_text(&alias.children[1]).to_string(),
            None => original_name.clone(),
        };
        ImportItem {
            original_name,
            imported_name,
            position: self.position_of(tree),
        }
    }

    /// Shallow collection of a comma separated list: direct `item` children
    /// plus the `item` inside every `tail` child.
    fn collect_separated<'t>(
        &self,
        tree: &'t ParseTree,
        item: NonTerminal,
        tail: NonTerminal,
    ) -> Vec<&'t ParseTree> {
        let mut collected: Vec<&ParseTree> = Vec::new();
        for child in &tree.children {
            if child.is_rule(item) {
                collected.push(child);
            } else if child.is_rule(tail) {
                collected.extend(child.child_rules(item));
            }
        }
        collected
    }

    fn leaf_text(&self, tree: &ParseTree) -> &'a str {
        debug_assert_eq!(tree.token_count, 1);
        self.tokens[tree.token_offset].text(self.code)
    }

    /// The unescaped value of a string literal leaf.
    fn string_value(&self, tree: &ParseTree) -> String {
        unescape_string(self.leaf_text(tree))
    }

    fn position_of(&self, tree: &ParseTree) -> Position {
        let pointer = match self.tokens.get(tree.token_offset) {
            Some(token) => token.start,
            None => self.code.value.len(),
        };
        self.code.obtain_position(pointer)
    }

    fn file_buf(&self) -> PathBuf {
        self.file.to_path_buf()
    }
}

/// Strip the quotes of a string literal and resolve the `\\`, `\n` and `\"`
/// escapes. The tokenizer already rejected every other escape.
pub fn unescape_string(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('\\') => value.push('\\'),
                Some('n') => value.push('\n'),
                Some('"') => value.push('"'),
                _ => unreachable!("invalid escapes do not tokenize"),
            }
        } else {
            value.push(c);
        }
    }
    value
}
