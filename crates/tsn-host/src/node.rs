//! Syntax node definitions.
//!
//! Nodes live in a [`NodeArena`](crate::NodeArena) and refer to each other by
//! [`NodeIndex`]. The node set is the expression/statement subset of
//! TypeScript that the schema evaluator understands; everything else is
//! modeled by the host as a node whose type the oracle can answer for.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use tsn_common::Span;

/// Index of a node inside a [`NodeArena`](crate::NodeArena).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Sentinel for "no node" (e.g. the parent of a source file).
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("#none")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

// =============================================================================
// Operators
// =============================================================================

/// Binary operator tokens the evaluator can fold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Remainder,
    #[serde(rename = "**")]
    Exponent,
    #[serde(rename = "&")]
    BitwiseAnd,
    #[serde(rename = "|")]
    BitwiseOr,
    #[serde(rename = "^")]
    BitwiseXor,
    #[serde(rename = "<<")]
    LeftShift,
    #[serde(rename = ">>")]
    RightShift,
    #[serde(rename = ">>>")]
    UnsignedRightShift,
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "===")]
    StrictEquals,
    #[serde(rename = "!==")]
    StrictNotEquals,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<=")]
    LessThanEquals,
    #[serde(rename = ">=")]
    GreaterThanEquals,
    #[serde(rename = "&&")]
    LogicalAnd,
    #[serde(rename = "||")]
    LogicalOr,
    #[serde(rename = "??")]
    NullishCoalescing,
    #[serde(rename = ",")]
    Comma,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    InstanceOf,
}

impl BinaryOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::Exponent => "**",
            Self::BitwiseAnd => "&",
            Self::BitwiseOr => "|",
            Self::BitwiseXor => "^",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::UnsignedRightShift => ">>>",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::StrictEquals => "===",
            Self::StrictNotEquals => "!==",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanEquals => "<=",
            Self::GreaterThanEquals => ">=",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::NullishCoalescing => "??",
            Self::Comma => ",",
            Self::In => "in",
            Self::InstanceOf => "instanceof",
        }
    }

    /// Operators whose result is always a boolean.
    pub const fn is_relational(self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::NotEquals
                | Self::StrictEquals
                | Self::StrictNotEquals
                | Self::LessThan
                | Self::GreaterThan
                | Self::LessThanEquals
                | Self::GreaterThanEquals
                | Self::In
                | Self::InstanceOf
        )
    }

    /// Short-circuiting operators that select one operand.
    pub const fn is_logical(self) -> bool {
        matches!(
            self,
            Self::LogicalAnd | Self::LogicalOr | Self::NullishCoalescing | Self::Comma
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix and postfix unary operator tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Tilde,
    Exclamation,
    PlusPlus,
    MinusMinus,
    TypeOf,
    Void,
}

impl UnaryOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Tilde => "~",
            Self::Exclamation => "!",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::TypeOf => "typeof",
            Self::Void => "void",
        }
    }
}

// =============================================================================
// Node payloads
// =============================================================================

bitflags! {
    /// Modifiers of a function-like node.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FunctionFlags: u8 {
        const ASYNC = 1 << 0;
        const GENERATOR = 1 << 1;
    }
}

/// Shared payload of every function-like node.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionData {
    /// Identifier for declarations and named expressions, property name for methods.
    pub name: Option<NodeIndex>,
    pub parameters: Vec<NodeIndex>,
    /// A `Block` for statement bodies, any expression for concise arrow bodies.
    pub body: Option<NodeIndex>,
    pub flags: FunctionFlags,
}

impl FunctionData {
    #[inline]
    pub fn is_async(&self) -> bool {
        self.flags.contains(FunctionFlags::ASYNC)
    }

    #[inline]
    pub fn is_generator(&self) -> bool {
        self.flags.contains(FunctionFlags::GENERATOR)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Const,
    Let,
    Var,
}

/// One `${expression}literal` run of a template expression.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateSpan {
    pub expression: NodeIndex,
    pub literal: String,
}

/// Node payload. The variant is the node's syntax kind.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    SourceFile {
        file_name: String,
        statements: Vec<NodeIndex>,
    },

    // ----- Statements -----
    Block {
        statements: Vec<NodeIndex>,
    },
    VariableStatement {
        declarations: Vec<NodeIndex>,
    },
    VariableDeclaration {
        name: NodeIndex,
        initializer: Option<NodeIndex>,
        kind: VariableKind,
    },
    ExpressionStatement {
        expression: NodeIndex,
    },
    ReturnStatement {
        expression: Option<NodeIndex>,
    },
    IfStatement {
        condition: NodeIndex,
        then_statement: NodeIndex,
        else_statement: Option<NodeIndex>,
    },
    FunctionDeclaration(FunctionData),

    // ----- Literals and names -----
    Identifier {
        text: String,
    },
    NumericLiteral {
        value: f64,
    },
    StringLiteral {
        value: String,
    },
    BigIntLiteral {
        text: String,
    },
    TrueKeyword,
    FalseKeyword,
    NullKeyword,
    TemplateExpression {
        head: String,
        spans: Vec<TemplateSpan>,
    },

    // ----- Object and array construction -----
    ObjectLiteral {
        properties: Vec<NodeIndex>,
    },
    PropertyAssignment {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    ShorthandPropertyAssignment {
        name: NodeIndex,
    },
    SpreadAssignment {
        expression: NodeIndex,
    },
    MethodDeclaration(FunctionData),
    ComputedPropertyName {
        expression: NodeIndex,
    },
    ArrayLiteral {
        elements: Vec<NodeIndex>,
    },
    SpreadElement {
        expression: NodeIndex,
    },
    OmittedExpression,

    // ----- Operators -----
    Binary {
        operator: BinaryOperator,
        left: NodeIndex,
        right: NodeIndex,
    },
    PrefixUnary {
        operator: UnaryOperator,
        operand: NodeIndex,
    },
    PostfixUnary {
        operator: UnaryOperator,
        operand: NodeIndex,
    },
    Conditional {
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    },
    Parenthesized {
        expression: NodeIndex,
    },
    /// `as`, `satisfies`, `!` and angle-bracket assertions.
    TypeAssertion {
        expression: NodeIndex,
    },
    Await {
        expression: NodeIndex,
    },

    // ----- Access and calls -----
    Call {
        callee: NodeIndex,
        arguments: Vec<NodeIndex>,
    },
    PropertyAccess {
        expression: NodeIndex,
        name: NodeIndex,
    },
    ElementAccess {
        expression: NodeIndex,
        argument: NodeIndex,
    },

    // ----- Functions -----
    FunctionExpression(FunctionData),
    ArrowFunction(FunctionData),
    Parameter {
        name: NodeIndex,
        initializer: Option<NodeIndex>,
        rest: bool,
    },

    // ----- JSX -----
    JsxElement {
        tag_name: String,
        attributes: Vec<NodeIndex>,
        children: Vec<NodeIndex>,
    },
    JsxFragment {
        children: Vec<NodeIndex>,
    },
    JsxAttribute {
        name: String,
        initializer: Option<NodeIndex>,
    },
    JsxSpreadAttribute {
        expression: NodeIndex,
    },
    JsxText {
        text: String,
    },
    JsxExpression {
        expression: Option<NodeIndex>,
    },
}

impl NodeData {
    /// Short kind name used in logs and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::SourceFile { .. } => "SourceFile",
            Self::Block { .. } => "Block",
            Self::VariableStatement { .. } => "VariableStatement",
            Self::VariableDeclaration { .. } => "VariableDeclaration",
            Self::ExpressionStatement { .. } => "ExpressionStatement",
            Self::ReturnStatement { .. } => "ReturnStatement",
            Self::IfStatement { .. } => "IfStatement",
            Self::FunctionDeclaration(_) => "FunctionDeclaration",
            Self::Identifier { .. } => "Identifier",
            Self::NumericLiteral { .. } => "NumericLiteral",
            Self::StringLiteral { .. } => "StringLiteral",
            Self::BigIntLiteral { .. } => "BigIntLiteral",
            Self::TrueKeyword => "TrueKeyword",
            Self::FalseKeyword => "FalseKeyword",
            Self::NullKeyword => "NullKeyword",
            Self::TemplateExpression { .. } => "TemplateExpression",
            Self::ObjectLiteral { .. } => "ObjectLiteral",
            Self::PropertyAssignment { .. } => "PropertyAssignment",
            Self::ShorthandPropertyAssignment { .. } => "ShorthandPropertyAssignment",
            Self::SpreadAssignment { .. } => "SpreadAssignment",
            Self::MethodDeclaration(_) => "MethodDeclaration",
            Self::ComputedPropertyName { .. } => "ComputedPropertyName",
            Self::ArrayLiteral { .. } => "ArrayLiteral",
            Self::SpreadElement { .. } => "SpreadElement",
            Self::OmittedExpression => "OmittedExpression",
            Self::Binary { .. } => "Binary",
            Self::PrefixUnary { .. } => "PrefixUnary",
            Self::PostfixUnary { .. } => "PostfixUnary",
            Self::Conditional { .. } => "Conditional",
            Self::Parenthesized { .. } => "Parenthesized",
            Self::TypeAssertion { .. } => "TypeAssertion",
            Self::Await { .. } => "Await",
            Self::Call { .. } => "Call",
            Self::PropertyAccess { .. } => "PropertyAccess",
            Self::ElementAccess { .. } => "ElementAccess",
            Self::FunctionExpression(_) => "FunctionExpression",
            Self::ArrowFunction(_) => "ArrowFunction",
            Self::Parameter { .. } => "Parameter",
            Self::JsxElement { .. } => "JsxElement",
            Self::JsxFragment { .. } => "JsxFragment",
            Self::JsxAttribute { .. } => "JsxAttribute",
            Self::JsxSpreadAttribute { .. } => "JsxSpreadAttribute",
            Self::JsxText { .. } => "JsxText",
            Self::JsxExpression { .. } => "JsxExpression",
        }
    }

    /// Function payload of function-like nodes.
    pub fn function(&self) -> Option<&FunctionData> {
        match self {
            Self::FunctionDeclaration(func)
            | Self::FunctionExpression(func)
            | Self::ArrowFunction(func)
            | Self::MethodDeclaration(func) => Some(func),
            _ => None,
        }
    }
}

/// A node: payload, span and parent link (set when the parent is added).
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub data: NodeData,
    pub span: Span,
    pub parent: NodeIndex,
}
