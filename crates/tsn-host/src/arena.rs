//! NodeArena: storage and navigation for syntax nodes.
//!
//! Nodes are appended bottom-up: children first, then the parent. Adding a
//! node links every child back to it, so parent pointers are always complete
//! once the enclosing source file has been added.

use crate::node::{FunctionData, Node, NodeData, NodeIndex};
use smallvec::SmallVec;
use tsn_common::{SourceLocation, Span};

#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node and link its children to it. The stored span is widened
    /// to cover every child.
    pub fn add(&mut self, data: NodeData, span: Span) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        let children = Self::children_of(&data);
        let span = children
            .iter()
            .fold(span, |acc, &child| acc.cover(self.span(child)));
        self.nodes.push(Node {
            data,
            span,
            parent: NodeIndex::NONE,
        });
        for child in children {
            if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                node.parent = idx;
            }
        }
        idx
    }

    #[inline]
    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get(idx.0 as usize)
    }

    #[inline]
    pub fn data(&self, idx: NodeIndex) -> Option<&NodeData> {
        self.get(idx).map(|node| &node.data)
    }

    #[inline]
    pub fn span(&self, idx: NodeIndex) -> Span {
        self.get(idx).map(|node| node.span).unwrap_or_default()
    }

    #[inline]
    pub fn parent(&self, idx: NodeIndex) -> NodeIndex {
        self.get(idx).map_or(NodeIndex::NONE, |node| node.parent)
    }

    /// Kind name for logs; `"<missing>"` for dangling indices.
    pub fn kind_name(&self, idx: NodeIndex) -> &'static str {
        self.data(idx).map_or("<missing>", NodeData::kind_name)
    }

    /// Direct children in source order.
    pub fn children(&self, idx: NodeIndex) -> SmallVec<[NodeIndex; 4]> {
        self.data(idx).map(Self::children_of).unwrap_or_default()
    }

    fn children_of(data: &NodeData) -> SmallVec<[NodeIndex; 4]> {
        let mut out = SmallVec::new();
        let function = |out: &mut SmallVec<[NodeIndex; 4]>, func: &FunctionData| {
            out.extend(func.name);
            out.extend(func.parameters.iter().copied());
            out.extend(func.body);
        };
        match data {
            NodeData::SourceFile { statements, .. } | NodeData::Block { statements } => {
                out.extend(statements.iter().copied());
            }
            NodeData::VariableStatement { declarations } => {
                out.extend(declarations.iter().copied());
            }
            NodeData::VariableDeclaration {
                name, initializer, ..
            } => {
                out.push(*name);
                out.extend(*initializer);
            }
            NodeData::ExpressionStatement { expression }
            | NodeData::SpreadAssignment { expression }
            | NodeData::ComputedPropertyName { expression }
            | NodeData::SpreadElement { expression }
            | NodeData::Parenthesized { expression }
            | NodeData::TypeAssertion { expression }
            | NodeData::Await { expression }
            | NodeData::JsxSpreadAttribute { expression } => out.push(*expression),
            NodeData::ReturnStatement { expression } | NodeData::JsxExpression { expression } => {
                out.extend(*expression);
            }
            NodeData::IfStatement {
                condition,
                then_statement,
                else_statement,
            } => {
                out.push(*condition);
                out.push(*then_statement);
                out.extend(*else_statement);
            }
            NodeData::FunctionDeclaration(func)
            | NodeData::FunctionExpression(func)
            | NodeData::ArrowFunction(func)
            | NodeData::MethodDeclaration(func) => function(&mut out, func),
            NodeData::TemplateExpression { spans, .. } => {
                out.extend(spans.iter().map(|span| span.expression));
            }
            NodeData::ObjectLiteral { properties } => out.extend(properties.iter().copied()),
            NodeData::PropertyAssignment { name, initializer } => {
                out.push(*name);
                out.push(*initializer);
            }
            NodeData::ShorthandPropertyAssignment { name } => out.push(*name),
            NodeData::ArrayLiteral { elements } => out.extend(elements.iter().copied()),
            NodeData::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeData::PrefixUnary { operand, .. } | NodeData::PostfixUnary { operand, .. } => {
                out.push(*operand);
            }
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                out.push(*condition);
                out.push(*when_true);
                out.push(*when_false);
            }
            NodeData::Call { callee, arguments } => {
                out.push(*callee);
                out.extend(arguments.iter().copied());
            }
            NodeData::PropertyAccess { expression, name } => {
                out.push(*expression);
                out.push(*name);
            }
            NodeData::ElementAccess {
                expression,
                argument,
            } => {
                out.push(*expression);
                out.push(*argument);
            }
            NodeData::Parameter {
                name, initializer, ..
            } => {
                out.push(*name);
                out.extend(*initializer);
            }
            NodeData::JsxElement {
                attributes,
                children,
                ..
            } => {
                out.extend(attributes.iter().copied());
                out.extend(children.iter().copied());
            }
            NodeData::JsxFragment { children } => out.extend(children.iter().copied()),
            NodeData::JsxAttribute { initializer, .. } => out.extend(*initializer),
            NodeData::Identifier { .. }
            | NodeData::NumericLiteral { .. }
            | NodeData::StringLiteral { .. }
            | NodeData::BigIntLiteral { .. }
            | NodeData::TrueKeyword
            | NodeData::FalseKeyword
            | NodeData::NullKeyword
            | NodeData::OmittedExpression
            | NodeData::JsxText { .. } => {}
        }
        out
    }

    // -------------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------------

    pub fn identifier_text(&self, idx: NodeIndex) -> Option<&str> {
        match self.data(idx)? {
            NodeData::Identifier { text } => Some(text),
            _ => None,
        }
    }

    pub fn function_data(&self, idx: NodeIndex) -> Option<&FunctionData> {
        self.data(idx)?.function()
    }

    #[inline]
    pub fn is_function_like(&self, idx: NodeIndex) -> bool {
        self.function_data(idx).is_some()
    }

    /// Static text of a property name: identifiers, string and numeric
    /// literals. Computed names return `None`.
    pub fn property_name_text(&self, idx: NodeIndex) -> Option<String> {
        match self.data(idx)? {
            NodeData::Identifier { text } => Some(text.clone()),
            NodeData::StringLiteral { value } => Some(value.clone()),
            NodeData::NumericLiteral { value } => Some(format_property_number(*value)),
            _ => None,
        }
    }

    /// Name text of a declaration node (variable, parameter, function).
    pub fn declaration_name(&self, idx: NodeIndex) -> Option<&str> {
        match self.data(idx)? {
            NodeData::VariableDeclaration { name, .. } | NodeData::Parameter { name, .. } => {
                self.identifier_text(*name)
            }
            NodeData::FunctionDeclaration(func)
            | NodeData::FunctionExpression(func)
            | NodeData::MethodDeclaration(func) => func.name.and_then(|n| self.identifier_text(n)),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Walk parents until a node satisfies `pred`. The start node is excluded.
    pub fn find_ancestor(
        &self,
        idx: NodeIndex,
        mut pred: impl FnMut(&NodeData) -> bool,
    ) -> Option<NodeIndex> {
        let mut current = self.parent(idx);
        while current.is_some() {
            let data = self.data(current)?;
            if pred(data) {
                return Some(current);
            }
            current = self.parent(current);
        }
        None
    }

    pub fn source_file_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        if matches!(self.data(idx), Some(NodeData::SourceFile { .. })) {
            return Some(idx);
        }
        self.find_ancestor(idx, |data| matches!(data, NodeData::SourceFile { .. }))
    }

    pub fn file_name_of(&self, idx: NodeIndex) -> Option<&str> {
        match self.data(self.source_file_of(idx)?)? {
            NodeData::SourceFile { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    /// Location used in diagnostics; `<unknown>` when the node is detached.
    pub fn location(&self, idx: NodeIndex) -> SourceLocation {
        let file = self.file_name_of(idx).unwrap_or("<unknown>");
        SourceLocation::new(file, self.span(idx))
    }

    /// Innermost function-like node containing `idx`.
    pub fn enclosing_function(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.find_ancestor(idx, |data| data.function().is_some())
    }
}

/// Property keys from numeric literals use the JS number-to-string form.
fn format_property_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod arena_tests;
