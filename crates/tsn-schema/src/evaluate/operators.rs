//! Operator, conditional and template expressions.

use super::SchemaEvaluator;
use crate::algebra::{alternatives, union};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::fold::{build_template, fold_binary_schemas, fold_unary_schema};
use crate::literal_ops::is_truthy;
use crate::schema::SchemaNode;
use tsn_host::{BinaryOperator, NodeIndex, TemplateSpan, UnaryOperator};

/// Truthiness of a schema when every alternative agrees on it.
fn known_truthiness(node: &SchemaNode) -> Option<bool> {
    let mut verdict = None;
    for alternative in alternatives(node) {
        let truthy = match &alternative {
            SchemaNode::Literal { value } => is_truthy(value),
            SchemaNode::Object { .. }
            | SchemaNode::Array { .. }
            | SchemaNode::Tuple { .. }
            | SchemaNode::Function { .. } => true,
            _ => return None,
        };
        match verdict {
            None => verdict = Some(truthy),
            Some(previous) if previous != truthy => return None,
            Some(_) => {}
        }
    }
    verdict
}

impl<'a> SchemaEvaluator<'a> {
    pub(super) fn evaluate_binary(
        &self,
        op: BinaryOperator,
        left: NodeIndex,
        right: NodeIndex,
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        let left = self.schema_of_node(left, ctx)?;

        // Object operands decide `&&`/`||` on their own; literals are left to
        // the folder so that unions split per alternative.
        if op.is_logical() && !matches!(left, SchemaNode::Literal { .. } | SchemaNode::Union { .. }) {
            match (op, known_truthiness(&left)) {
                (BinaryOperator::LogicalAnd, Some(false)) | (BinaryOperator::LogicalOr, Some(true)) => {
                    return Ok(left);
                }
                (BinaryOperator::NullishCoalescing, Some(_)) => return Ok(left),
                (_, Some(_)) => return self.schema_of_node(right, ctx),
                _ => {}
            }
        }

        let right = self.schema_of_node(right, ctx)?;
        Ok(fold_binary_schemas(
            op,
            left,
            right,
            ctx.options().max_union_expansion,
        ))
    }

    pub(super) fn evaluate_unary(
        &self,
        op: UnaryOperator,
        operand: NodeIndex,
        postfix: bool,
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        let operand = self.schema_of_node(operand, ctx)?;
        Ok(fold_unary_schema(
            op,
            operand,
            postfix,
            ctx.options().max_union_expansion,
        ))
    }

    /// A condition with known truthiness picks its branch; otherwise both
    /// branches are unioned.
    pub(super) fn evaluate_conditional(
        &self,
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        let condition = self.schema_of_node(condition, ctx)?;
        match known_truthiness(&condition) {
            Some(true) => self.schema_of_node(when_true, ctx),
            Some(false) => self.schema_of_node(when_false, ctx),
            None => Ok(union([
                self.schema_of_node(when_true, ctx)?,
                self.schema_of_node(when_false, ctx)?,
            ])),
        }
    }

    pub(super) fn evaluate_template(
        &self,
        head: &str,
        spans: &[TemplateSpan],
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        let mut parts = Vec::with_capacity(spans.len() * 2 + 1);
        parts.push(SchemaNode::string(head));
        for span in spans {
            parts.push(self.schema_of_node(span.expression, ctx)?);
            parts.push(SchemaNode::string(span.literal.as_str()));
        }
        Ok(build_template(parts, ctx.options().max_union_expansion))
    }
}
