//! Parse tree to AST conversion

use crate::ast::{Node, NodeKind, Position, Program};
use crate::error::{Error, Result};
use crate::line_index::LineIndex;
use gml_grammar::directive::{parse_directive, Directive};
use gml_grammar::{Child, ParseTree, Rule, Token, TokenKind};
use tracing::debug;

/// Result of a structural build: the program plus the declarations the
/// builder saw on the way.
#[derive(Debug, Clone)]
pub struct Built {
    pub program: Program,
    pub directives: Vec<String>,
    pub enums: Vec<String>,
}

/// Build the AST for `tree`, which was parsed from `source`. Positions are in
/// `source` coordinates.
pub fn build(tree: &ParseTree, source: &str) -> Result<Built> {
    let mut builder = AstBuilder {
        lines: LineIndex::new(source),
        directives: Vec::new(),
        enums: Vec::new(),
    };

    let program = builder.program(tree)?;
    debug!("Built AST with {} nodes", program.node_count());

    Ok(Built {
        program,
        directives: builder.directives,
        enums: builder.enums,
    })
}

struct AstBuilder<'a> {
    lines: LineIndex<'a>,
    directives: Vec<String>,
    enums: Vec<String>,
}

impl<'a> AstBuilder<'a> {
    fn program(&mut self, tree: &ParseTree) -> Result<Program> {
        if tree.rule != Rule::Program {
            return Err(malformed(tree, "expected a program"));
        }

        let body = self.list(tree.trees())?;
        if body.is_empty() && tree.start == tree.stop {
            return Ok(Program::empty());
        }

        let (start, end) = self.span(tree);
        Ok(Program::new(body, start, end))
    }

    fn node(&mut self, tree: &ParseTree) -> Result<Node> {
        let kind = match tree.rule {
            Rule::Block => NodeKind::BlockStatement {
                body: self.list(tree.trees())?,
            },
            Rule::EmptyStatement => NodeKind::EmptyStatement,
            Rule::ExpressionStatement => NodeKind::ExpressionStatement {
                expression: self.boxed(tree, 0)?,
            },
            Rule::VariableDeclaration => NodeKind::VariableDeclaration {
                kind: token(tree, 0)?.text.clone(),
                declarations: self.list(tree.trees())?,
            },
            Rule::VariableDeclarator => NodeKind::VariableDeclarator {
                id: self.boxed(tree, 0)?,
                init: self.optional(tree, 1)?,
            },
            Rule::FunctionDeclaration => NodeKind::FunctionDeclaration {
                id: self.optional(tree, 0)?,
                params: self.list(subtree(tree, 1)?.trees())?,
                body: self.boxed(tree, 2)?,
            },
            Rule::ConstructorDeclaration => NodeKind::ConstructorDeclaration {
                id: self.optional(tree, 0)?,
                params: self.list(subtree(tree, 1)?.trees())?,
                parent: self.optional(tree, 2)?,
                body: self.boxed(tree, 3)?,
            },
            Rule::ConstructorParent => NodeKind::ConstructorParentClause {
                id: self.boxed(tree, 0)?,
                params: self.list(subtree(tree, 1)?.trees())?,
            },
            Rule::DefaultParameter => NodeKind::DefaultParameter {
                left: self.boxed(tree, 0)?,
                right: self.boxed(tree, 1)?,
            },
            Rule::If => NodeKind::IfStatement {
                test: self.boxed(tree, 0)?,
                consequent: self.boxed(tree, 1)?,
                alternate: self.optional(tree, 2)?,
            },
            Rule::For => NodeKind::ForStatement {
                init: self.optional(tree, 0)?,
                test: self.optional(tree, 1)?,
                update: self.optional(tree, 2)?,
                body: self.boxed(tree, 3)?,
            },
            Rule::While => NodeKind::WhileStatement {
                test: self.boxed(tree, 0)?,
                body: self.boxed(tree, 1)?,
            },
            Rule::DoUntil => NodeKind::DoUntilStatement {
                body: self.boxed(tree, 0)?,
                test: self.boxed(tree, 1)?,
            },
            Rule::Repeat => NodeKind::RepeatStatement {
                test: self.boxed(tree, 0)?,
                body: self.boxed(tree, 1)?,
            },
            Rule::With => NodeKind::WithStatement {
                object: self.boxed(tree, 0)?,
                body: self.boxed(tree, 1)?,
            },
            Rule::Switch => NodeKind::SwitchStatement {
                discriminant: self.boxed(tree, 0)?,
                cases: self.list(tree.trees().skip(1))?,
            },
            Rule::Case => NodeKind::SwitchCase {
                test: self.optional(tree, 0)?,
                body: self.list(trees_from(tree, 1))?,
            },
            Rule::Return => NodeKind::ReturnStatement {
                argument: self.optional(tree, 0)?,
            },
            Rule::Exit => NodeKind::ExitStatement,
            Rule::Break => NodeKind::BreakStatement,
            Rule::Continue => NodeKind::ContinueStatement,
            Rule::Throw => NodeKind::ThrowStatement {
                argument: self.boxed(tree, 0)?,
            },
            Rule::Delete => NodeKind::DeleteStatement {
                argument: self.boxed(tree, 0)?,
            },
            Rule::Try => NodeKind::TryStatement {
                block: self.boxed(tree, 0)?,
                handler: self.optional(tree, 1)?,
                finalizer: match tree.tree(2) {
                    Some(finally) => Some(self.boxed(finally, 0)?),
                    None => None,
                },
            },
            Rule::Catch => NodeKind::CatchClause {
                param: self.optional(tree, 0)?,
                body: self.boxed(tree, 1)?,
            },
            Rule::Enum => {
                let name = self.boxed(tree, 0)?;
                if let NodeKind::Identifier { name } = &name.kind {
                    self.enums.push(name.clone());
                }
                NodeKind::EnumDeclaration {
                    name,
                    members: self.list(tree.trees().skip(1))?,
                }
            }
            Rule::EnumMember => NodeKind::EnumMember {
                name: self.boxed(tree, 0)?,
                initializer: self.optional(tree, 1)?,
            },
            Rule::Macro | Rule::Region | Rule::EndRegion => self.directive(tree)?,
            Rule::Identifier => NodeKind::Identifier {
                name: token(tree, 0)?.text.clone(),
            },
            Rule::Literal => NodeKind::Literal {
                value: token(tree, 0)?.text.clone(),
            },
            Rule::TemplateString => NodeKind::TemplateStringExpression {
                atoms: self.list(tree.trees())?,
            },
            Rule::TemplateText => NodeKind::TemplateStringText {
                value: token(tree, 0)?.text.clone(),
            },
            Rule::Array => NodeKind::ArrayExpression {
                elements: self.list(tree.trees())?,
            },
            Rule::Struct => NodeKind::StructExpression {
                properties: self.list(tree.trees())?,
            },
            Rule::Property => NodeKind::Property {
                name: self.boxed(tree, 0)?,
                value: self.boxed(tree, 1)?,
            },
            Rule::Call => NodeKind::CallExpression {
                object: self.boxed(tree, 0)?,
                arguments: self.list(subtree(tree, 1)?.trees())?,
            },
            Rule::New => NodeKind::NewExpression {
                expression: self.boxed(tree, 0)?,
                arguments: match tree.tree(1) {
                    Some(arguments) => self.list(arguments.trees())?,
                    None => Vec::new(),
                },
            },
            Rule::MemberDot => NodeKind::MemberDotExpression {
                object: self.boxed(tree, 0)?,
                property: self.boxed(tree, 1)?,
            },
            Rule::MemberIndex => NodeKind::MemberIndexExpression {
                object: self.boxed(tree, 0)?,
                property: self.list(tree.trees().skip(1))?,
                accessor: token(tree, 1)?.text.clone(),
            },
            Rule::Binary => NodeKind::BinaryExpression {
                operator: token(tree, 1)?.text.clone(),
                left: self.boxed(tree, 0)?,
                right: self.boxed(tree, 2)?,
            },
            Rule::Assignment => NodeKind::AssignmentExpression {
                operator: token(tree, 1)?.text.clone(),
                left: self.boxed(tree, 0)?,
                right: self.boxed(tree, 2)?,
            },
            Rule::Unary => {
                let operator = token(tree, 0)?;
                let argument = self.boxed(tree, 1)?;
                if is_update(operator) {
                    NodeKind::UpdateExpression {
                        operator: operator.text.clone(),
                        prefix: true,
                        argument,
                    }
                } else {
                    NodeKind::UnaryExpression {
                        operator: operator.text.clone(),
                        prefix: true,
                        argument,
                    }
                }
            }
            Rule::Postfix => NodeKind::UpdateExpression {
                operator: token(tree, 1)?.text.clone(),
                prefix: false,
                argument: self.boxed(tree, 0)?,
            },
            Rule::Ternary => NodeKind::TernaryExpression {
                test: self.boxed(tree, 0)?,
                consequent: self.boxed(tree, 1)?,
                alternate: self.boxed(tree, 2)?,
            },
            Rule::Parenthesized => NodeKind::ParenthesizedExpression {
                expression: self.boxed(tree, 0)?,
            },
            Rule::MissingArgument => NodeKind::MissingOptionalArgument,
            Rule::Program | Rule::Parameters | Rule::Arguments | Rule::Finally => {
                return Err(malformed(tree, "unexpected nested rule"));
            }
        };

        let (start, end) = self.span(tree);
        Ok(Node::new(kind, start, end))
    }

    fn directive(&mut self, tree: &ParseTree) -> Result<NodeKind> {
        let token = token(tree, 0)?;
        let text = token.text.as_str();
        let directive = parse_directive(text).ok_or_else(|| malformed(tree, "unreadable directive"))?;

        self.directives.push(text.trim_end().to_string());

        Ok(match directive {
            Directive::Macro {
                config,
                name,
                value,
            } => {
                let start = token.start + offset_within(text, name);
                let end = start + name.len();
                NodeKind::MacroDeclaration {
                    name: Box::new(Node::new(
                        NodeKind::Identifier {
                            name: name.to_string(),
                        },
                        self.lines.position(start),
                        self.lines.position(end),
                    )),
                    config: config.map(str::to_string),
                    value: value.to_string(),
                }
            }
            Directive::Region { name } => NodeKind::RegionStatement {
                name: name.to_string(),
            },
            Directive::EndRegion { name } => NodeKind::EndRegionStatement {
                name: name.to_string(),
            },
        })
    }

    fn boxed(&mut self, tree: &ParseTree, index: usize) -> Result<Box<Node>> {
        Ok(Box::new(self.node(subtree(tree, index)?)?))
    }

    fn optional(&mut self, tree: &ParseTree, index: usize) -> Result<Option<Box<Node>>> {
        match tree.tree(index) {
            Some(child) => Ok(Some(Box::new(self.node(child)?))),
            None => Ok(None),
        }
    }

    fn list<'t>(&mut self, trees: impl Iterator<Item = &'t ParseTree>) -> Result<Vec<Node>> {
        trees.map(|tree| self.node(tree)).collect()
    }

    fn span(&self, tree: &ParseTree) -> (Position, Position) {
        (self.lines.position(tree.start), self.lines.position(tree.stop))
    }
}

/// Replace the value of every quoted-string `Literal` and every
/// `TemplateStringText` with the exact text of `original` at the node's
/// range. Positions must already be in `original` coordinates.
pub fn restore_original_literal_text(program: &mut Program, original: &str) {
    for node in program.body.iter_mut() {
        restore_node(node, original);
    }
}

fn restore_node(node: &mut Node, original: &str) {
    let range = node.start.index..node.end.index;

    match &mut node.kind {
        NodeKind::Literal { value } if is_quoted(value) => {
            if let Some(text) = original.get(range) {
                *value = text.to_string();
            }
        }
        NodeKind::TemplateStringText { value } => {
            if let Some(text) = original.get(range) {
                *value = text.to_string();
            }
        }
        _ => {}
    }

    for child in node.children_mut() {
        restore_node(child, original);
    }
}

fn is_quoted(value: &str) -> bool {
    value.starts_with(['"', '\'', '@'])
}

fn is_update(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Increment | TokenKind::Decrement)
}

fn subtree(tree: &ParseTree, index: usize) -> Result<&ParseTree> {
    tree.tree(index)
        .ok_or_else(|| malformed(tree, &format!("missing child {}", index)))
}

fn token(tree: &ParseTree, index: usize) -> Result<&Token> {
    tree.token(index)
        .ok_or_else(|| malformed(tree, &format!("missing token {}", index)))
}

/// Sub-trees from child `index` onwards.
fn trees_from(tree: &ParseTree, index: usize) -> impl Iterator<Item = &ParseTree> {
    tree.children.iter().skip(index).filter_map(|child| match child {
        Child::Tree(tree) => Some(tree),
        _ => None,
    })
}

/// Byte offset of `inner`, a slice borrowed from `outer`.
fn offset_within(outer: &str, inner: &str) -> usize {
    (inner.as_ptr() as usize).saturating_sub(outer.as_ptr() as usize)
}

fn malformed(tree: &ParseTree, reason: &str) -> Error {
    Error::MalformedTree(format!("{:?} at {}..{}: {}", tree.rule, tree.start, tree.stop, reason))
}
