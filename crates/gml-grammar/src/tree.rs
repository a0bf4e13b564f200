//! Generic parse tree produced by the parser
//!
//! Each node records the grammar rule that produced it, the byte range it
//! spans and its children in source order. Optional grammar slots that were
//! not present are kept as [`Child::Missing`] so that every rule has a fixed
//! child layout:
//!
//! | Rule | Children |
//! |------|----------|
//! | `VariableDeclaration` | keyword token, declarators |
//! | `VariableDeclarator` | identifier, initializer? |
//! | `FunctionDeclaration` | identifier?, `Parameters`, `Block` |
//! | `ConstructorDeclaration` | identifier?, `Parameters`, `ConstructorParent`?, `Block` |
//! | `If` | test, consequent, alternate? |
//! | `For` | init?, test?, update?, body |
//! | `Case` | test? (`None` for `default`), statements |
//! | `Try` | `Block`, `Catch`?, `Finally`? |
//! | `Catch` | identifier?, `Block` |
//! | `MemberIndex` | object, accessor token, indices |
//! | `Binary`, `Assignment` | left, operator token, right |
//! | `Unary` | operator token, argument |
//! | `Postfix` | argument, operator token |
//! | `New` | callee, `Arguments`? |
//!
//! The remaining rules hold their sub-trees (or their single token) in order.

use crate::lexer::Token;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    Program,
    Block,
    EmptyStatement,
    ExpressionStatement,
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    ConstructorDeclaration,
    ConstructorParent,
    Parameters,
    DefaultParameter,
    If,
    For,
    While,
    DoUntil,
    Repeat,
    With,
    Switch,
    Case,
    Return,
    Exit,
    Break,
    Continue,
    Throw,
    Delete,
    Try,
    Catch,
    Finally,
    Enum,
    EnumMember,
    Macro,
    Region,
    EndRegion,
    Identifier,
    Literal,
    TemplateString,
    TemplateText,
    Array,
    Struct,
    Property,
    Call,
    Arguments,
    New,
    MemberDot,
    MemberIndex,
    Binary,
    Assignment,
    Unary,
    Postfix,
    Ternary,
    Parenthesized,
    MissingArgument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Child {
    Tree(ParseTree),
    Token(Token),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseTree {
    pub rule: Rule,
    pub start: usize,
    pub stop: usize,
    pub children: Vec<Child>,
}

impl ParseTree {
    pub fn new(rule: Rule, start: usize, stop: usize, children: Vec<Child>) -> Self {
        Self {
            rule,
            start,
            stop,
            children,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    /// Sub-tree at `index`, or `None` for tokens, missing slots and
    /// out-of-range indices.
    pub fn tree(&self, index: usize) -> Option<&ParseTree> {
        match self.children.get(index) {
            Some(Child::Tree(tree)) => Some(tree),
            _ => None,
        }
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        match self.children.get(index) {
            Some(Child::Token(token)) => Some(token),
            _ => None,
        }
    }

    pub fn trees(&self) -> impl Iterator<Item = &ParseTree> {
        self.children.iter().filter_map(|child| match child {
            Child::Tree(tree) => Some(tree),
            _ => None,
        })
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.stop).unwrap_or("")
    }
}
