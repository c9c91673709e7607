//! Schema classification and structural equality.
//!
//! A schema is *concrete* when it pins down actual values: every leaf is a
//! literal, and composites only combine concrete children. Anything else
//! still depends on an input the evaluator could not fold.

use crate::schema::{SchemaLiteral, SchemaNode};
use rustc_hash::FxHashSet;
use tsn_host::NodeIndex;

/// True when no leaf is a primitive, error, index or index-access, and no
/// object has abstract index keys.
pub fn is_concrete_schema(node: &SchemaNode) -> bool {
    match node {
        SchemaNode::Primitive { .. }
        | SchemaNode::Error { .. }
        | SchemaNode::Index { .. }
        | SchemaNode::IndexAccess { .. } => false,
        SchemaNode::Literal { .. } => true,
        SchemaNode::Object {
            properties,
            abstract_index_keys,
        } => abstract_index_keys.is_empty() && properties.values().all(is_concrete_schema),
        SchemaNode::Reference { type_args, .. } => type_args.iter().all(is_concrete_schema),
        other => {
            let mut concrete = true;
            other.for_each_child(|child| concrete &= is_concrete_schema(child));
            concrete
        }
    }
}

/// Origins behind every unresolved leaf, deduplicated, in traversal order.
pub fn non_concrete_inputs(node: &SchemaNode) -> Vec<NodeIndex> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    collect_inputs(node, &mut seen, &mut out);
    out
}

fn collect_inputs(node: &SchemaNode, seen: &mut FxHashSet<NodeIndex>, out: &mut Vec<NodeIndex>) {
    if let Some(origin) = node.origin()
        && seen.insert(origin)
    {
        out.push(origin);
    }
    node.for_each_child(|child| collect_inputs(child, seen, out));
}

/// Stamp `origin` onto every unresolved leaf that does not have one yet.
pub fn with_origin(node: SchemaNode, origin: NodeIndex) -> SchemaNode {
    stamp(node, origin, false)
}

/// Stamp `origin` onto every unresolved leaf, replacing existing origins.
pub fn with_origin_overriding(node: SchemaNode, origin: NodeIndex) -> SchemaNode {
    stamp(node, origin, true)
}

fn stamp(node: SchemaNode, new_origin: NodeIndex, replace: bool) -> SchemaNode {
    let pick = |current: Option<NodeIndex>| match current {
        Some(existing) if !replace => Some(existing),
        _ => Some(new_origin),
    };
    match node {
        SchemaNode::Primitive { name, origin } => SchemaNode::Primitive {
            name,
            origin: pick(origin),
        },
        SchemaNode::Error { reason, origin } => SchemaNode::Error {
            reason,
            origin: pick(origin),
        },
        SchemaNode::Index { of, origin } => SchemaNode::Index {
            of: Box::new(stamp(*of, new_origin, replace)),
            origin: pick(origin),
        },
        SchemaNode::IndexAccess {
            object,
            index,
            origin,
        } => SchemaNode::IndexAccess {
            object: Box::new(stamp(*object, new_origin, replace)),
            index: Box::new(stamp(*index, new_origin, replace)),
            origin: pick(origin),
        },
        other => other.map_children(&mut |child| stamp(child, new_origin, replace)),
    }
}

// =============================================================================
// Equality
// =============================================================================

pub fn are_literals_equal(a: &SchemaLiteral, b: &SchemaLiteral) -> bool {
    match (a, b) {
        (SchemaLiteral::String(x), SchemaLiteral::String(y)) => x == y,
        (SchemaLiteral::Number(x), SchemaLiteral::Number(y)) => {
            (x.is_nan() && y.is_nan()) || x == y
        }
        (SchemaLiteral::BigInt(x), SchemaLiteral::BigInt(y)) => x == y,
        (SchemaLiteral::Boolean(x), SchemaLiteral::Boolean(y)) => x == y,
        (SchemaLiteral::Null, SchemaLiteral::Null)
        | (SchemaLiteral::Undefined, SchemaLiteral::Undefined) => true,
        _ => false,
    }
}

fn are_lists_equal(a: &[SchemaNode], b: &[SchemaNode]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| are_schemas_equal(x, y))
}

/// Deep structural equality. `NaN` equals `NaN`, object property order is
/// irrelevant and origins are ignored.
pub fn are_schemas_equal(a: &SchemaNode, b: &SchemaNode) -> bool {
    match (a, b) {
        (SchemaNode::Primitive { name: x, .. }, SchemaNode::Primitive { name: y, .. }) => x == y,
        (SchemaNode::Literal { value: x }, SchemaNode::Literal { value: y }) => {
            are_literals_equal(x, y)
        }
        (SchemaNode::Union { items: x }, SchemaNode::Union { items: y })
        | (SchemaNode::Intersection { items: x }, SchemaNode::Intersection { items: y })
        | (SchemaNode::TemplateLiteral { items: x }, SchemaNode::TemplateLiteral { items: y }) => {
            are_lists_equal(x, y)
        }
        (
            SchemaNode::Tuple {
                items: x,
                element_flags: fx,
            },
            SchemaNode::Tuple {
                items: y,
                element_flags: fy,
            },
        ) => fx == fy && are_lists_equal(x, y),
        (SchemaNode::Array { items: x }, SchemaNode::Array { items: y }) => {
            are_schemas_equal(x, y)
        }
        (
            SchemaNode::Object {
                properties: px,
                abstract_index_keys: kx,
            },
            SchemaNode::Object {
                properties: py,
                abstract_index_keys: ky,
            },
        ) => {
            px.len() == py.len()
                && px.iter().all(|(name, value)| {
                    py.get(name)
                        .is_some_and(|other| are_schemas_equal(value, other))
                })
                && kx.len() == ky.len()
                && kx.iter().zip(ky).all(|((k1, v1), (k2, v2))| {
                    are_schemas_equal(k1, k2) && are_schemas_equal(v1, v2)
                })
        }
        (
            SchemaNode::Function {
                parameters: px,
                return_type: rx,
            },
            SchemaNode::Function {
                parameters: py,
                return_type: ry,
            },
        ) => {
            px.len() == py.len()
                && px
                    .iter()
                    .zip(py)
                    .all(|((n1, s1), (n2, s2))| n1 == n2 && are_schemas_equal(s1, s2))
                && are_schemas_equal(rx, ry)
        }
        (
            SchemaNode::BinaryExpression {
                operator: ox,
                left: lx,
                right: rx,
            },
            SchemaNode::BinaryExpression {
                operator: oy,
                left: ly,
                right: ry,
            },
        ) => ox == oy && are_schemas_equal(lx, ly) && are_schemas_equal(rx, ry),
        (SchemaNode::Index { of: x, .. }, SchemaNode::Index { of: y, .. }) => {
            are_schemas_equal(x, y)
        }
        (
            SchemaNode::IndexAccess {
                object: ox,
                index: ix,
                ..
            },
            SchemaNode::IndexAccess {
                object: oy,
                index: iy,
                ..
            },
        ) => are_schemas_equal(ox, oy) && are_schemas_equal(ix, iy),
        (
            SchemaNode::Reference {
                stable_id: sx,
                type_args: ax,
                ..
            },
            SchemaNode::Reference {
                stable_id: sy,
                type_args: ay,
                ..
            },
        ) => sx == sy && are_lists_equal(ax, ay),
        (SchemaNode::Error { reason: x, .. }, SchemaNode::Error { reason: y, .. }) => x == y,
        _ => false,
    }
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        are_schemas_equal(self, other)
    }
}

impl PartialEq for SchemaLiteral {
    fn eq(&self, other: &Self) -> bool {
        are_literals_equal(self, other)
    }
}

#[cfg(test)]
#[path = "../tests/classify_tests.rs"]
mod classify_tests;
