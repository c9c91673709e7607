//! Value-driven evaluator.
//!
//! [`SchemaEvaluator::schema_of_node`] abstractly evaluates a syntax node:
//! literals fold, operators fold over union alternatives, objects and arrays
//! are built member by member, calls are evaluated under parameter bindings.
//! Every handler returns `Ok(None)` when it cannot say anything better than
//! the node's nominal type, in which case the type-driven converter takes
//! over.
//!
//! Handlers are split by node family:
//! - `operators`: binary/unary/conditional/template expressions
//! - `objects`: object and array literals, spreads, property reads
//! - `calls`: function-likes, calls, `await`
//! - `jsx`: JSX elements and fragments

mod calls;
mod jsx;
mod objects;
mod operators;

use crate::classify::{with_origin, with_origin_overriding};
use crate::context::EvaluationContext;
use crate::error::{EvaluationError, Result};
use crate::literal_ops::normalize_bigint;
use crate::schema::{PrimitiveKind, SchemaNode};
use tracing::{debug, trace};
use tsn_common::limits;
use tsn_host::{Host, NodeData, NodeIndex, SymbolId, VariableKind};

/// Evaluates syntax nodes and types into schemas against one host.
#[derive(Clone, Copy)]
pub struct SchemaEvaluator<'a> {
    pub(crate) host: Host<'a>,
}

impl<'a> SchemaEvaluator<'a> {
    pub fn new(host: Host<'a>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> Host<'a> {
        self.host
    }

    /// Schema of a node: the value path first, the nominal type second.
    ///
    /// Errors raised below are wrapped with this node's location unless a
    /// deeper node already attached one.
    pub fn schema_of_node(&self, node: NodeIndex, ctx: &EvaluationContext) -> Result<SchemaNode> {
        if ctx.is_exhausted() {
            ctx.note_degraded();
            return Ok(SchemaNode::unknown());
        }
        stacker::maybe_grow(limits::STACK_RED_ZONE, limits::STACK_GROWTH_SIZE, || {
            let kind = self.host.arena.kind_name(node);
            trace!(node = %node, kind, "evaluating node");
            let mut child = ctx.child(true);
            child.push_trace(node);
            let result = match self.evaluate_node(node, &child) {
                Ok(Some(schema)) => Ok(schema),
                Ok(None) => self.type_fallback(node, &child),
                Err(err) => Err(err),
            };
            result.map_err(|err| err.with_context(self.host.arena.location(node), kind))
        })
    }

    /// Convert the nominal type of `node`, stamping it as the origin of any
    /// unresolved leaf.
    pub(crate) fn type_fallback(&self, node: NodeIndex, ctx: &EvaluationContext) -> Result<SchemaNode> {
        match self.host.oracle.type_of_node(node) {
            Some(ty) => {
                debug!(node = %node, ty = %self.host.oracle.type_to_string(ty), "type fallback");
                Ok(with_origin(self.convert_type(ty, Some(node), ctx)?, node))
            }
            None => {
                debug!(node = %node, "no type for node, using unknown");
                Ok(SchemaNode::Primitive {
                    name: PrimitiveKind::Unknown,
                    origin: Some(node),
                })
            }
        }
    }

    /// Node-kind dispatch.
    fn evaluate_node(&self, node: NodeIndex, ctx: &EvaluationContext) -> Result<Option<SchemaNode>> {
        let arena = self.host.arena;
        let Some(data) = arena.data(node) else {
            return Ok(None);
        };
        match data {
            // Literals
            NodeData::NumericLiteral { value } => Ok(Some(SchemaNode::number(*value))),
            NodeData::StringLiteral { value } => Ok(Some(SchemaNode::string(value.as_str()))),
            NodeData::BigIntLiteral { text } => Ok(Some(SchemaNode::bigint(normalize_bigint(text)))),
            NodeData::TrueKeyword => Ok(Some(SchemaNode::boolean(true))),
            NodeData::FalseKeyword => Ok(Some(SchemaNode::boolean(false))),
            NodeData::NullKeyword => Ok(Some(SchemaNode::null())),
            NodeData::TemplateExpression { head, spans } => {
                self.evaluate_template(head, spans, ctx).map(Some)
            }
            NodeData::Identifier { .. } => self.evaluate_identifier(node, ctx),

            // Construction
            NodeData::ObjectLiteral { properties } => {
                self.evaluate_object_literal(properties, ctx).map(Some)
            }
            NodeData::ArrayLiteral { elements } => {
                self.evaluate_array_literal(elements, ctx).map(Some)
            }
            NodeData::PropertyAssignment { initializer, .. } => {
                self.schema_of_node(*initializer, ctx).map(Some)
            }
            NodeData::ShorthandPropertyAssignment { name } => {
                self.schema_of_node(*name, ctx).map(Some)
            }
            NodeData::SpreadAssignment { expression } => self.schema_of_node(*expression, ctx).map(Some),
            NodeData::ComputedPropertyName { expression } => {
                self.schema_of_node(*expression, ctx).map(Some)
            }
            NodeData::OmittedExpression => Ok(Some(SchemaNode::undefined())),

            // Operators
            NodeData::Binary {
                operator,
                left,
                right,
            } => self.evaluate_binary(*operator, *left, *right, ctx).map(Some),
            NodeData::PrefixUnary { operator, operand } => {
                self.evaluate_unary(*operator, *operand, false, ctx).map(Some)
            }
            NodeData::PostfixUnary { operator, operand } => {
                self.evaluate_unary(*operator, *operand, true, ctx).map(Some)
            }
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            } => self
                .evaluate_conditional(*condition, *when_true, *when_false, ctx)
                .map(Some),
            NodeData::Parenthesized { expression } | NodeData::TypeAssertion { expression } => {
                self.schema_of_node(*expression, ctx).map(Some)
            }

            // Functions and calls
            NodeData::FunctionDeclaration(_)
            | NodeData::FunctionExpression(_)
            | NodeData::ArrowFunction(_)
            | NodeData::MethodDeclaration(_) => self.evaluate_function_like(node, ctx),
            NodeData::Parameter { .. } => self.evaluate_parameter(node, None, ctx),
            NodeData::Call { .. } => self.evaluate_call(node, ctx),
            NodeData::Await { expression } => self.evaluate_await(*expression, ctx).map(Some),
            NodeData::PropertyAccess { expression, name } => {
                self.evaluate_property_access(*expression, *name, ctx)
            }
            NodeData::ElementAccess {
                expression,
                argument,
            } => self.evaluate_element_access(*expression, *argument, ctx),

            // Declarations and statements
            NodeData::VariableDeclaration { .. } => {
                let symbol = self.host.resolver.symbol_of_declaration(node);
                self.evaluate_declaration(node, symbol, ctx)
            }
            NodeData::ExpressionStatement { expression } => {
                self.schema_of_node(*expression, ctx).map(Some)
            }
            NodeData::ReturnStatement { expression } => match expression {
                Some(expression) => self.schema_of_node(*expression, ctx).map(Some),
                None => Ok(Some(SchemaNode::undefined())),
            },

            // JSX
            NodeData::JsxElement {
                tag_name,
                attributes,
                children,
            } => self
                .evaluate_jsx(SchemaNode::string(tag_name.as_str()), attributes, children, ctx)
                .map(Some),
            NodeData::JsxFragment { children } => self
                .evaluate_jsx(SchemaNode::string("Fragment"), &[], children, ctx)
                .map(Some),
            NodeData::JsxExpression { expression } => match expression {
                Some(expression) => self.schema_of_node(*expression, ctx).map(Some),
                None => Ok(Some(SchemaNode::undefined())),
            },
            NodeData::JsxText { text } => Ok(Some(SchemaNode::string(text.trim()))),
            NodeData::JsxAttribute { initializer, .. } => match initializer {
                Some(initializer) => self.schema_of_node(*initializer, ctx).map(Some),
                None => Ok(Some(SchemaNode::boolean(true))),
            },

            NodeData::SourceFile { .. }
            | NodeData::Block { .. }
            | NodeData::VariableStatement { .. }
            | NodeData::IfStatement { .. }
            | NodeData::SpreadElement { .. }
            | NodeData::JsxSpreadAttribute { .. } => self.unsupported(node, ctx),
        }
    }

    /// Permissive mode falls back to the nominal type; strict mode fails.
    fn unsupported(&self, node: NodeIndex, ctx: &EvaluationContext) -> Result<Option<SchemaNode>> {
        let kind = self.host.arena.kind_name(node);
        if ctx.options().permissive {
            debug!(node = %node, kind, "unsupported node, falling back to type");
            Ok(None)
        } else {
            Err(EvaluationError::UnsupportedNode { kind })
        }
    }

    // =========================================================================
    // Names and declarations
    // =========================================================================

    fn evaluate_identifier(&self, node: NodeIndex, ctx: &EvaluationContext) -> Result<Option<SchemaNode>> {
        let Some(resolved) = self.host.resolver.resolve(node) else {
            let text = self.host.arena.identifier_text(node).unwrap_or_default();
            return Ok(match text {
                "undefined" => Some(SchemaNode::undefined()),
                "NaN" => Some(SchemaNode::number(f64::NAN)),
                "Infinity" => Some(SchemaNode::number(f64::INFINITY)),
                _ => None,
            });
        };
        if let Some(bound) = ctx.binding(resolved.symbol) {
            trace!(node = %node, symbol = resolved.symbol.0, "using parameter binding");
            return Ok(Some(bound.clone()));
        }
        self.evaluate_declaration(resolved.declaration, Some(resolved.symbol), ctx)
    }

    /// Evaluate what a name refers to.
    ///
    /// `const` variables evaluate their initializer. `let`/`var` variables
    /// may be reassigned, so only their declared type is trusted.
    pub(crate) fn evaluate_declaration(
        &self,
        declaration: NodeIndex,
        symbol: Option<SymbolId>,
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        match self.host.arena.data(declaration) {
            Some(NodeData::VariableDeclaration {
                initializer: Some(initializer),
                kind: VariableKind::Const,
                ..
            }) => self.schema_of_node(*initializer, ctx).map(Some),
            Some(NodeData::VariableDeclaration { .. }) => {
                let ty = self
                    .host
                    .oracle
                    .type_of_node(declaration)
                    .or_else(|| symbol.and_then(|s| self.host.oracle.type_of_symbol(s)));
                let schema = match ty {
                    Some(ty) => self.convert_type(ty, None, ctx)?,
                    None => SchemaNode::unknown(),
                };
                Ok(Some(with_origin(schema, declaration)))
            }
            Some(NodeData::Parameter { .. }) => self.evaluate_parameter(declaration, symbol, ctx),
            Some(data) if data.function().is_some() => self.evaluate_function_like(declaration, ctx),
            Some(_) => self.schema_of_node(declaration, ctx).map(Some),
            None => Err(EvaluationError::MissingDeclaration {
                subject: declaration.to_string(),
            }),
        }
    }

    /// The current binding, else the declared type with the parameter
    /// stamped as origin of every unresolved leaf.
    fn evaluate_parameter(
        &self,
        parameter: NodeIndex,
        symbol: Option<SymbolId>,
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        let symbol = symbol.or_else(|| self.host.resolver.symbol_of_declaration(parameter));
        if let Some(bound) = symbol.and_then(|s| ctx.binding(s)) {
            return Ok(Some(bound.clone()));
        }
        let declared = match self.host.oracle.type_of_node(parameter) {
            Some(ty) => self.convert_type(ty, None, ctx)?,
            None => SchemaNode::unknown(),
        };
        Ok(Some(with_origin_overriding(declared, parameter)))
    }
}

#[cfg(test)]
#[path = "../../tests/evaluate_tests.rs"]
mod evaluate_tests;
