//! Abstract Syntax Tree definitions for GML

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point in a source text. `index` is a byte offset, `line` is 1-based and
/// `column` counts characters from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl From<Position> for LineColumn {
    fn from(position: Position) -> Self {
        Self {
            line: position.line,
            column: position.column,
        }
    }
}

/// Serialized location fields, set by the location normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeLocation {
    Full {
        start: Position,
        end: Position,
        loc: SourceLocation,
    },
    Simplified {
        start: usize,
        end: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Program {
    pub body: Vec<Node>,
    pub comments: Vec<Node>,
    /// Always empty; kept for consumers that expect the field.
    pub tokens: Vec<Node>,
    pub source_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub whitespaces: Vec<Node>,
    #[serde(skip)]
    pub start: Position,
    #[serde(skip)]
    pub end: Position,
    #[serde(flatten)]
    pub location: Option<NodeLocation>,
}

impl Program {
    pub fn new(body: Vec<Node>, start: Position, end: Position) -> Self {
        Self {
            body,
            comments: Vec::new(),
            tokens: Vec::new(),
            source_type: "script".to_string(),
            whitespaces: Vec::new(),
            start,
            end,
            location: None,
        }
    }

    pub fn empty() -> Self {
        let origin = Position {
            index: 0,
            line: 1,
            column: 0,
        };
        Self::new(Vec::new(), origin, origin)
    }

    /// Top-level nodes: statements, then comments, then whitespace runs.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.body
            .iter()
            .chain(self.comments.iter())
            .chain(self.whitespaces.iter())
    }

    pub fn roots_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.body
            .iter_mut()
            .chain(self.comments.iter_mut())
            .chain(self.whitespaces.iter_mut())
    }

    pub fn node_count(&self) -> usize {
        1 + self.roots().map(Node::size).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip)]
    pub start: Position,
    #[serde(skip)]
    pub end: Position,
    #[serde(flatten)]
    pub location: Option<NodeLocation>,
}

impl Node {
    pub fn new(kind: NodeKind, start: Position, end: Position) -> Self {
        Self {
            kind,
            start,
            end,
            location: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn children(&self) -> Vec<&Node> {
        self.kind.children()
    }

    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        self.kind.children_mut()
    }

    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children().into_iter().map(Node::size).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NodeKind {
    // Statements
    BlockStatement { body: Vec<Node> },
    ExpressionStatement { expression: Box<Node> },
    EmptyStatement,
    VariableDeclaration { kind: String, declarations: Vec<Node> },
    VariableDeclarator { id: Box<Node>, init: Option<Box<Node>> },
    FunctionDeclaration {
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
    },
    ConstructorDeclaration {
        id: Option<Box<Node>>,
        params: Vec<Node>,
        parent: Option<Box<Node>>,
        body: Box<Node>,
    },
    ConstructorParentClause { id: Box<Node>, params: Vec<Node> },
    DefaultParameter { left: Box<Node>, right: Box<Node> },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    ForStatement {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    WhileStatement { test: Box<Node>, body: Box<Node> },
    DoUntilStatement { body: Box<Node>, test: Box<Node> },
    RepeatStatement { test: Box<Node>, body: Box<Node> },
    WithStatement { object: Box<Node>, body: Box<Node> },
    SwitchStatement { discriminant: Box<Node>, cases: Vec<Node> },
    SwitchCase { test: Option<Box<Node>>, body: Vec<Node> },
    ReturnStatement { argument: Option<Box<Node>> },
    ExitStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement { argument: Box<Node> },
    DeleteStatement { argument: Box<Node> },
    TryStatement {
        block: Box<Node>,
        handler: Option<Box<Node>>,
        finalizer: Option<Box<Node>>,
    },
    CatchClause { param: Option<Box<Node>>, body: Box<Node> },
    EnumDeclaration { name: Box<Node>, members: Vec<Node> },
    EnumMember { name: Box<Node>, initializer: Option<Box<Node>> },
    MacroDeclaration {
        name: Box<Node>,
        config: Option<String>,
        value: String,
    },
    RegionStatement { name: String },
    EndRegionStatement { name: String },

    // Expressions
    Identifier { name: String },
    Literal { value: String },
    TemplateStringExpression { atoms: Vec<Node> },
    TemplateStringText { value: String },
    ArrayExpression { elements: Vec<Node> },
    StructExpression { properties: Vec<Node> },
    Property { name: Box<Node>, value: Box<Node> },
    CallExpression { object: Box<Node>, arguments: Vec<Node> },
    NewExpression { expression: Box<Node>, arguments: Vec<Node> },
    MemberDotExpression { object: Box<Node>, property: Box<Node> },
    MemberIndexExpression {
        object: Box<Node>,
        property: Vec<Node>,
        accessor: String,
    },
    BinaryExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryExpression {
        operator: String,
        prefix: bool,
        argument: Box<Node>,
    },
    UpdateExpression {
        operator: String,
        prefix: bool,
        argument: Box<Node>,
    },
    TernaryExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    ParenthesizedExpression { expression: Box<Node> },
    MissingOptionalArgument,

    // Hidden nodes
    CommentLine {
        value: String,
        leading_whitespace: String,
        trailing_whitespace: String,
    },
    CommentBlock {
        value: String,
        leading_whitespace: String,
        trailing_whitespace: String,
    },
    Whitespace { value: String },
}

/// A field that may hold child nodes.
trait ChildSlot {
    fn collect<'a>(&'a self, out: &mut Vec<&'a Node>);
    fn collect_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Node>);
}

impl ChildSlot for Box<Node> {
    fn collect<'a>(&'a self, out: &mut Vec<&'a Node>) {
        out.push(&**self);
    }

    fn collect_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Node>) {
        out.push(&mut **self);
    }
}

impl ChildSlot for Vec<Node> {
    fn collect<'a>(&'a self, out: &mut Vec<&'a Node>) {
        out.extend(self.iter());
    }

    fn collect_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Node>) {
        out.extend(self.iter_mut());
    }
}

impl<T: ChildSlot> ChildSlot for Option<T> {
    fn collect<'a>(&'a self, out: &mut Vec<&'a Node>) {
        if let Some(slot) = self {
            slot.collect(out);
        }
    }

    fn collect_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Node>) {
        if let Some(slot) = self {
            slot.collect_mut(out);
        }
    }
}

/// One table drives child traversal and visitor keys, so the two cannot
/// drift apart. Each entry lists the fields holding child nodes, in source
/// order.
macro_rules! node_kinds {
    ($($tag:ident [$($field:ident),*]),* $(,)?) => {
        impl NodeKind {
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(NodeKind::$tag { .. } => stringify!($tag),)*
                }
            }

            #[allow(unused_mut)]
            pub fn children(&self) -> Vec<&Node> {
                let mut out = Vec::new();
                match self {
                    $(NodeKind::$tag { $($field,)* .. } => {
                        $(ChildSlot::collect($field, &mut out);)*
                    })*
                }
                out
            }

            #[allow(unused_mut)]
            pub fn children_mut(&mut self) -> Vec<&mut Node> {
                let mut out = Vec::new();
                match self {
                    $(NodeKind::$tag { $($field,)* .. } => {
                        $(ChildSlot::collect_mut($field, &mut out);)*
                    })*
                }
                out
            }
        }

        const NODE_CHILD_FIELDS: &[(&str, &[&str])] = &[
            ("Program", &["body"]),
            $((stringify!($tag), &[$(stringify!($field)),*]),)*
        ];
    };
}

node_kinds! {
    BlockStatement [body],
    ExpressionStatement [expression],
    EmptyStatement [],
    VariableDeclaration [declarations],
    VariableDeclarator [id, init],
    FunctionDeclaration [id, params, body],
    ConstructorDeclaration [id, params, parent, body],
    ConstructorParentClause [id, params],
    DefaultParameter [left, right],
    IfStatement [test, consequent, alternate],
    ForStatement [init, test, update, body],
    WhileStatement [test, body],
    DoUntilStatement [body, test],
    RepeatStatement [test, body],
    WithStatement [object, body],
    SwitchStatement [discriminant, cases],
    SwitchCase [test, body],
    ReturnStatement [argument],
    ExitStatement [],
    BreakStatement [],
    ContinueStatement [],
    ThrowStatement [argument],
    DeleteStatement [argument],
    TryStatement [block, handler, finalizer],
    CatchClause [param, body],
    EnumDeclaration [name, members],
    EnumMember [name, initializer],
    MacroDeclaration [name],
    RegionStatement [],
    EndRegionStatement [],
    Identifier [],
    Literal [],
    TemplateStringExpression [atoms],
    TemplateStringText [],
    ArrayExpression [elements],
    StructExpression [properties],
    Property [name, value],
    CallExpression [object, arguments],
    NewExpression [expression, arguments],
    MemberDotExpression [object, property],
    MemberIndexExpression [object, property],
    BinaryExpression [left, right],
    AssignmentExpression [left, right],
    UnaryExpression [argument],
    UpdateExpression [argument],
    TernaryExpression [test, consequent, alternate],
    ParenthesizedExpression [expression],
    MissingOptionalArgument [],
    CommentLine [],
    CommentBlock [],
    Whitespace [],
}

pub type VisitorKeys = BTreeMap<&'static str, Vec<&'static str>>;

/// Node type to the names of its child-bearing fields.
pub fn visitor_keys() -> VisitorKeys {
    NODE_CHILD_FIELDS
        .iter()
        .map(|(tag, fields)| (*tag, fields.to_vec()))
        .collect()
}
