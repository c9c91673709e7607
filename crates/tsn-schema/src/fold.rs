//! Schema-level operator folding.
//!
//! Lifts the literal folding of [`literal_ops`](crate::literal_ops) over
//! unions: operands are expanded into their alternatives, every combination
//! is folded, and the results are re-wrapped in a union. Operands that are
//! not literals keep the operation symbolic so that a later substitution
//! (call propagation) can fold it with [`refold`].

use crate::algebra::{alternatives, cartesian, intersection, union};
use crate::literal_ops::{self, fold_binary, fold_unary, is_truthy, to_js_string};
use crate::schema::{PrimitiveKind, SchemaLiteral, SchemaNode};
use smallvec::SmallVec;
use tracing::trace;
use tsn_host::{BinaryOperator, UnaryOperator};

// =============================================================================
// Binary
// =============================================================================

pub fn fold_binary_schemas(
    op: BinaryOperator,
    left: SchemaNode,
    right: SchemaNode,
    cap: usize,
) -> SchemaNode {
    if op == BinaryOperator::Comma {
        return right;
    }
    let lists = [alternatives(&left), alternatives(&right)];
    let Some(pairs) = cartesian(&lists, cap) else {
        trace!(%op, "binary expansion over cap, keeping symbolic");
        return SchemaNode::binary(op, left, right);
    };
    union(pairs.into_iter().map(|pair| {
        let mut pair = pair.into_iter();
        let (a, b) = (
            pair.next().unwrap_or_else(SchemaNode::unknown),
            pair.next().unwrap_or_else(SchemaNode::unknown),
        );
        fold_pair(op, a, b)
    }))
}

fn fold_pair(op: BinaryOperator, left: SchemaNode, right: SchemaNode) -> SchemaNode {
    if let Some(l) = left.as_literal() {
        // Short-circuit operators only need the left operand to decide.
        match op {
            BinaryOperator::LogicalAnd => return if is_truthy(l) { right } else { left },
            BinaryOperator::LogicalOr => return if is_truthy(l) { left } else { right },
            BinaryOperator::NullishCoalescing => {
                return if l.is_nullish() { right } else { left };
            }
            _ => {}
        }
        if let Some(r) = right.as_literal()
            && let Some(folded) = fold_binary(op, l, r)
        {
            return SchemaNode::literal(folded);
        }
    }
    SchemaNode::binary(op, left, right)
}

// =============================================================================
// Unary
// =============================================================================

/// Fold a unary operator. Object-like operands are treated as `NaN` for
/// arithmetic and as truthy for `!`; non-literal primitives are re-expressed
/// as an equivalent binary expression.
pub fn fold_unary_schema(op: UnaryOperator, operand: SchemaNode, postfix: bool, cap: usize) -> SchemaNode {
    match operand {
        SchemaNode::Union { items } => union(
            items
                .into_iter()
                .map(|item| fold_unary_schema(op, item, postfix, cap)),
        ),
        SchemaNode::Intersection { items } => intersection(
            items
                .into_iter()
                .map(|item| fold_unary_schema(op, item, postfix, cap)),
        ),
        SchemaNode::Literal { value } => match fold_unary(op, &value, postfix) {
            Some(folded) => SchemaNode::literal(folded),
            None => SchemaNode::error(format!(
                "Cannot apply `{}` to {}",
                op.as_str(),
                literal_ops::type_of(&value)
            )),
        },
        SchemaNode::Object { .. }
        | SchemaNode::Array { .. }
        | SchemaNode::Tuple { .. }
        | SchemaNode::Function { .. } => {
            let is_function = matches!(operand, SchemaNode::Function { .. });
            match op {
                UnaryOperator::Exclamation => SchemaNode::boolean(false),
                UnaryOperator::TypeOf => {
                    SchemaNode::string(if is_function { "function" } else { "object" })
                }
                UnaryOperator::Void => SchemaNode::undefined(),
                _ => fold_unary_schema(op, SchemaNode::number(f64::NAN), postfix, cap),
            }
        }
        other => reexpress_unary(op, other, postfix),
    }
}

fn reexpress_unary(op: UnaryOperator, operand: SchemaNode, postfix: bool) -> SchemaNode {
    use BinaryOperator as B;
    let origin = operand.origin();
    match op {
        UnaryOperator::Minus => SchemaNode::binary(B::Subtract, SchemaNode::number(0.0), operand),
        UnaryOperator::Tilde => SchemaNode::binary(B::BitwiseXor, operand, SchemaNode::number(-1.0)),
        UnaryOperator::PlusPlus if !postfix => {
            SchemaNode::binary(B::Subtract, operand, SchemaNode::number(-1.0))
        }
        UnaryOperator::MinusMinus if !postfix => {
            SchemaNode::binary(B::Subtract, operand, SchemaNode::number(1.0))
        }
        UnaryOperator::Plus | UnaryOperator::PlusPlus | UnaryOperator::MinusMinus => {
            SchemaNode::binary(B::Multiply, operand, SchemaNode::number(1.0))
        }
        UnaryOperator::Void => SchemaNode::undefined(),
        UnaryOperator::Exclamation => SchemaNode::Primitive {
            name: PrimitiveKind::Boolean,
            origin,
        },
        UnaryOperator::TypeOf => match &operand {
            SchemaNode::Primitive { name, .. } => match name {
                PrimitiveKind::String
                | PrimitiveKind::Number
                | PrimitiveKind::Boolean
                | PrimitiveKind::BigInt
                | PrimitiveKind::Symbol => SchemaNode::string(name.as_str()),
                PrimitiveKind::Object => SchemaNode::string("object"),
                PrimitiveKind::Void => SchemaNode::string("undefined"),
                _ => SchemaNode::Primitive {
                    name: PrimitiveKind::String,
                    origin,
                },
            },
            _ => SchemaNode::Primitive {
                name: PrimitiveKind::String,
                origin,
            },
        },
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Build a template literal from its parts (literal texts and interpolated
/// schemas). Nested templates flatten. When every part is a literal (or a
/// union of literals) the result is the cartesian set of concatenations;
/// otherwise adjacent literal runs merge and the template stays symbolic.
pub fn build_template(parts: impl IntoIterator<Item = SchemaNode>, cap: usize) -> SchemaNode {
    let mut flat: Vec<SchemaNode> = Vec::new();
    for part in parts {
        match part {
            SchemaNode::TemplateLiteral { items } => flat.extend(items),
            other => flat.push(other),
        }
    }

    let lists: Vec<SmallVec<[SchemaNode; 4]>> = flat.iter().map(alternatives).collect();
    let all_literal = lists
        .iter()
        .all(|list| list.iter().all(SchemaNode::is_literal));
    if all_literal && let Some(combos) = cartesian(&lists, cap) {
        return union(combos.into_iter().map(|combo| {
            SchemaNode::string(
                combo
                    .iter()
                    .filter_map(SchemaNode::as_literal)
                    .map(to_js_string)
                    .collect::<String>(),
            )
        }));
    }

    let mut items: Vec<SchemaNode> = Vec::new();
    for part in flat {
        let Some(text) = part.as_literal().map(to_js_string) else {
            items.push(part);
            continue;
        };
        if let Some(SchemaNode::Literal {
            value: SchemaLiteral::String(prev),
        }) = items.last_mut()
        {
            prev.push_str(&text);
        } else {
            items.push(SchemaNode::string(text));
        }
    }
    items.retain(|item| !matches!(item.as_literal(), Some(SchemaLiteral::String(s)) if s.is_empty()));
    match items.len() {
        0 => SchemaNode::string(""),
        _ => SchemaNode::TemplateLiteral { items },
    }
}

// =============================================================================
// Re-folding
// =============================================================================

/// Re-fold symbolic binary expressions and templates bottom-up, e.g. after
/// substituting literals for parameter placeholders.
pub fn refold(node: SchemaNode, cap: usize) -> SchemaNode {
    match node {
        SchemaNode::BinaryExpression {
            operator,
            left,
            right,
        } => fold_binary_schemas(operator, refold(*left, cap), refold(*right, cap), cap),
        SchemaNode::TemplateLiteral { items } => {
            build_template(items.into_iter().map(|item| refold(item, cap)), cap)
        }
        SchemaNode::Union { items } => union(items.into_iter().map(|item| refold(item, cap))),
        SchemaNode::Intersection { items } => {
            intersection(items.into_iter().map(|item| refold(item, cap)))
        }
        other => other.map_children(&mut |child| refold(child, cap)),
    }
}

#[cfg(test)]
#[path = "../tests/fold_tests.rs"]
mod fold_tests;
