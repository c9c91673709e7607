//! Union/intersection algebra.
//!
//! Constructors here normalize as they build: nested unions flatten,
//! duplicates collapse (by structural equality), `never` disappears from
//! unions and `any` absorbs everything. Operations that combine several
//! unions (binary operators, template literals, computed keys) go through
//! [`cartesian`], which refuses to materialize more than the configured
//! number of combinations.

use crate::classify::{are_schemas_equal, is_concrete_schema};
use tsn_host::NodeIndex;
use crate::schema::{PrimitiveKind, SchemaLiteral, SchemaNode};
use indexmap::IndexMap;
use smallvec::SmallVec;

/// The alternatives a schema stands for: union members, or itself.
pub fn alternatives(node: &SchemaNode) -> SmallVec<[SchemaNode; 4]> {
    match node {
        SchemaNode::Union { items } => items.iter().cloned().collect(),
        other => smallvec::smallvec![other.clone()],
    }
}

/// Origins of the leaves that substitution may still replace. Error leaves
/// are terminal and do not count.
fn placeholder_origins(node: &SchemaNode) -> SmallVec<[NodeIndex; 2]> {
    let mut out = SmallVec::new();
    collect_placeholders(node, &mut out);
    out
}

fn collect_placeholders(node: &SchemaNode, out: &mut SmallVec<[NodeIndex; 2]>) {
    if !node.is_error()
        && let Some(origin) = node.origin()
    {
        out.push(origin);
    }
    node.for_each_child(|child| collect_placeholders(child, out));
}

/// Structurally equal schemas standing for different inputs stay apart:
/// `number@x` and `number@y` fold to different values once substituted.
fn same_member(a: &SchemaNode, b: &SchemaNode) -> bool {
    are_schemas_equal(a, b) && placeholder_origins(a) == placeholder_origins(b)
}

fn push_unique(out: &mut Vec<SchemaNode>, node: SchemaNode) {
    if !out.iter().any(|existing| same_member(existing, &node)) {
        out.push(node);
    }
}

/// An origin-free primitive of `kind`. Placeholders never absorb or
/// subsume other members.
fn is_plain(node: &SchemaNode, kind: PrimitiveKind) -> bool {
    node.is_primitive(kind) && node.origin().is_none()
}

/// Deduplicate by structural equality, keeping first occurrences in order.
/// Placeholders with different origins are kept.
pub fn dedupe(items: impl IntoIterator<Item = SchemaNode>) -> Vec<SchemaNode> {
    let mut out = Vec::new();
    for item in items {
        push_unique(&mut out, item);
    }
    out
}

/// Build a normalized union.
///
/// - nested unions are flattened
/// - `never` members vanish; an empty union is `never`
/// - `any` absorbs the union, then `unknown` does
/// - literals are dropped when their primitive is also present
/// - parameter placeholders survive all of the above
/// - `true | false` becomes `boolean`
pub fn union(items: impl IntoIterator<Item = SchemaNode>) -> SchemaNode {
    let mut flat = Vec::new();
    for item in items {
        match item {
            SchemaNode::Union { items } => {
                for nested in items {
                    push_unique(&mut flat, nested);
                }
            }
            other => push_unique(&mut flat, other),
        }
    }
    flat.retain(|item| !item.is_primitive(PrimitiveKind::Never));

    for absorbing in [PrimitiveKind::Any, PrimitiveKind::Unknown] {
        if let Some(pos) = flat.iter().position(|item| is_plain(item, absorbing)) {
            return flat.swap_remove(pos);
        }
    }

    let has_true = flat.contains(&SchemaNode::boolean(true));
    let has_false = flat.contains(&SchemaNode::boolean(false));
    if has_true && has_false {
        let pos = flat
            .iter()
            .position(|item| matches!(item.as_literal(), Some(SchemaLiteral::Boolean(_))))
            .unwrap_or(0);
        flat.retain(|item| !matches!(item.as_literal(), Some(SchemaLiteral::Boolean(_))));
        let boolean = SchemaNode::primitive(PrimitiveKind::Boolean);
        if !flat.contains(&boolean) {
            flat.insert(pos.min(flat.len()), boolean);
        }
    }

    let primitives: SmallVec<[PrimitiveKind; 4]> = flat
        .iter()
        .filter_map(|item| match item {
            SchemaNode::Primitive { name, origin: None } => Some(*name),
            _ => None,
        })
        .collect();
    if !primitives.is_empty() {
        flat.retain(|item| match item.as_literal().and_then(SchemaLiteral::primitive_kind) {
            Some(kind) => !primitives.contains(&kind),
            None => true,
        });
    }

    match flat.len() {
        0 => SchemaNode::never(),
        1 => flat.pop().unwrap_or_else(SchemaNode::never),
        _ => SchemaNode::Union { items: flat },
    }
}

/// Build a normalized intersection. When every member is object-shaped the
/// property maps are deep-merged instead.
pub fn intersection(items: impl IntoIterator<Item = SchemaNode>) -> SchemaNode {
    let mut flat = Vec::new();
    for item in items {
        match item {
            SchemaNode::Intersection { items } => {
                for nested in items {
                    push_unique(&mut flat, nested);
                }
            }
            other => push_unique(&mut flat, other),
        }
    }
    if flat
        .iter()
        .any(|item| item.is_primitive(PrimitiveKind::Never))
    {
        return SchemaNode::never();
    }
    if let Some(pos) = flat.iter().position(|item| is_plain(item, PrimitiveKind::Any)) {
        return flat.swap_remove(pos);
    }
    flat.retain(|item| !is_plain(item, PrimitiveKind::Unknown));

    if flat.len() > 1 && flat.iter().all(|item| matches!(item, SchemaNode::Object { .. })) {
        return merge_objects(flat);
    }
    match flat.len() {
        0 => SchemaNode::unknown(),
        1 => flat.pop().unwrap_or_else(SchemaNode::unknown),
        _ => SchemaNode::Intersection { items: flat },
    }
}

/// Deep-merge object schemas left to right. Conflicting concrete keys take
/// the rightmost value; nested objects merge recursively; anything else
/// intersects.
pub fn merge_objects(objects: impl IntoIterator<Item = SchemaNode>) -> SchemaNode {
    let mut properties: IndexMap<String, SchemaNode> = IndexMap::new();
    let mut abstract_index_keys = Vec::new();
    for object in objects {
        let SchemaNode::Object {
            properties: props,
            abstract_index_keys: keys,
        } = object
        else {
            continue;
        };
        for (name, value) in props {
            if let Some(slot) = properties.get_mut(&name) {
                let existing = std::mem::replace(slot, SchemaNode::never());
                *slot = merge_property(existing, value);
            } else {
                properties.insert(name, value);
            }
        }
        abstract_index_keys.extend(keys);
    }
    SchemaNode::Object {
        properties,
        abstract_index_keys,
    }
}

fn merge_property(existing: SchemaNode, incoming: SchemaNode) -> SchemaNode {
    match (existing, incoming) {
        (left @ SchemaNode::Object { .. }, right @ SchemaNode::Object { .. }) => {
            merge_objects([left, right])
        }
        (left, right) if is_concrete_schema(&left) && is_concrete_schema(&right) => right,
        (left, right) => intersection([left, right]),
    }
}

/// Cartesian product of alternative lists. `None` when the product would
/// exceed `cap` combinations.
pub fn cartesian(lists: &[SmallVec<[SchemaNode; 4]>], cap: usize) -> Option<Vec<Vec<SchemaNode>>> {
    let mut total: usize = 1;
    for list in lists {
        total = total.checked_mul(list.len())?;
        if total > cap {
            return None;
        }
    }
    let mut product: Vec<Vec<SchemaNode>> = vec![Vec::with_capacity(lists.len())];
    for list in lists {
        let mut next = Vec::with_capacity(product.len() * list.len());
        for prefix in &product {
            for item in list {
                let mut combo = prefix.clone();
                combo.push(item.clone());
                next.push(combo);
            }
        }
        product = next;
    }
    Some(product)
}

#[cfg(test)]
#[path = "../tests/algebra_tests.rs"]
mod algebra_tests;
