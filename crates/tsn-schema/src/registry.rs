//! Named definition registry.
//!
//! Generic instantiations that are not well-known library types are not
//! converted inline. The converter registers them here under a stable id and
//! emits a `reference`; the body is converted on demand (or when the request
//! finishes). Because a definition body only ever contains references to
//! other definitions, recursive generic aliases terminate.
//!
//! After evaluation, [`reduce_references`] trims the registry down to what the
//! final tree actually needs: trivial definitions are substituted, unused ones
//! dropped, and (optionally) definitions used exactly once are inlined.

use crate::schema::{Schema, SchemaNode};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};
use tsn_host::TypeId;

/// Lifecycle of one definition.
#[derive(Clone, Debug)]
pub enum DefinitionState {
    /// Registered; the body type has not been converted yet.
    Pending(TypeId),
    /// Conversion in progress.
    Resolving,
    Ready(SchemaNode),
}

#[derive(Clone, Debug)]
pub struct Definition {
    /// Display name of the generic (`Box`).
    pub name: String,
    /// Generic declaration the instantiation came from.
    pub target: TypeId,
    pub state: DefinitionState,
}

#[derive(Clone, Debug, Default)]
pub struct DefinitionRegistry {
    entries: IndexMap<String, Definition>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register an instantiation and return its stable id.
    ///
    /// `display` is the instantiation as type text (`Box<number>`). The same
    /// generic with the same arguments always maps to the same id; a
    /// different generic that prints identically gets a `#n` suffix.
    pub fn register(&mut self, name: &str, display: &str, target: TypeId, body: TypeId) -> String {
        let mut stable_id = display.to_string();
        let mut suffix = 1;
        loop {
            match self.entries.get(&stable_id) {
                Some(existing) if existing.target == target => return stable_id,
                Some(_) => {
                    suffix += 1;
                    stable_id = format!("{display}#{suffix}");
                }
                None => break,
            }
        }
        trace!(stable_id = %stable_id, "registering definition");
        self.entries.insert(
            stable_id.clone(),
            Definition {
                name: name.to_string(),
                target,
                state: DefinitionState::Pending(body),
            },
        );
        stable_id
    }

    pub fn contains(&self, stable_id: &str) -> bool {
        self.entries.contains_key(stable_id)
    }

    pub fn get(&self, stable_id: &str) -> Option<&Definition> {
        self.entries.get(stable_id)
    }

    /// Claim a pending definition for conversion. Returns the body type and
    /// marks the entry as resolving.
    pub fn begin(&mut self, stable_id: &str) -> Option<TypeId> {
        let entry = self.entries.get_mut(stable_id)?;
        match entry.state {
            DefinitionState::Pending(body) => {
                entry.state = DefinitionState::Resolving;
                Some(body)
            }
            _ => None,
        }
    }

    pub fn complete(&mut self, stable_id: &str, schema: SchemaNode) {
        if let Some(entry) = self.entries.get_mut(stable_id) {
            entry.state = DefinitionState::Ready(schema);
        }
    }

    /// Converted body, if conversion has finished.
    pub fn ready(&self, stable_id: &str) -> Option<&SchemaNode> {
        match &self.entries.get(stable_id)?.state {
            DefinitionState::Ready(schema) => Some(schema),
            _ => None,
        }
    }

    /// Ids of every definition still waiting for conversion.
    pub fn pending(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| matches!(entry.state, DefinitionState::Pending(_)))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// All converted definitions, in registration order.
    pub fn ready_definitions(&self) -> IndexMap<String, SchemaNode> {
        self.entries
            .iter()
            .filter_map(|(id, entry)| match &entry.state {
                DefinitionState::Ready(schema) => Some((id.clone(), schema.clone())),
                _ => None,
            })
            .collect()
    }
}

// =============================================================================
// Reduction
// =============================================================================

/// Produce the final [`Schema`] from a root and the converted definitions.
///
/// 1. references to trivial definitions (errors, primitives, literals,
///    aliases of another reference) are replaced by the definition body
/// 2. definitions used exactly once and not self-referential are inlined
///    when `inline_single_use` is set
/// 3. definitions unreachable from the root are removed
pub fn reduce_references(
    root: SchemaNode,
    defs: IndexMap<String, SchemaNode>,
    inline_single_use: bool,
) -> Schema {
    let mut root = root;
    let mut defs = defs;

    // Trivial substitution, repeated until nothing changes: an alias of an
    // alias resolves over several rounds.
    loop {
        let trivial: FxHashMap<String, SchemaNode> = defs
            .iter()
            .filter(|(id, body)| is_trivial(body) && !references(body, id))
            .map(|(id, body)| (id.clone(), body.clone()))
            .collect();
        if trivial.is_empty() {
            break;
        }
        root = substitute(root, &trivial);
        defs = defs
            .into_iter()
            .filter(|(id, _)| !trivial.contains_key(id))
            .map(|(id, body)| (id, substitute(body, &trivial)))
            .collect();
    }

    if inline_single_use {
        while let Some(id) = single_use_candidate(&root, &defs) {
            let Some(body) = defs.shift_remove(&id) else {
                break;
            };
            debug!(stable_id = %id, "inlining single-use definition");
            let mapping = FxHashMap::from_iter([(id, body)]);
            root = substitute(root, &mapping);
            defs = defs
                .into_iter()
                .map(|(id, body)| (id, substitute(body, &mapping)))
                .collect();
        }
    }

    let reachable = reachable_definitions(&root, &defs);
    let before = defs.len();
    defs.retain(|id, _| reachable.contains(id));
    if defs.len() != before {
        debug!(removed = before - defs.len(), "dropped unreachable definitions");
    }

    Schema { root, defs }
}

fn is_trivial(body: &SchemaNode) -> bool {
    matches!(
        body,
        SchemaNode::Error { .. } | SchemaNode::Primitive { .. } | SchemaNode::Literal { .. }
    ) || matches!(body, SchemaNode::Reference { type_args, .. } if type_args.is_empty())
}

/// Whether `node` mentions `stable_id` anywhere.
fn references(node: &SchemaNode, stable_id: &str) -> bool {
    if let SchemaNode::Reference { stable_id: id, .. } = node
        && id == stable_id
    {
        return true;
    }
    let mut found = false;
    node.for_each_child(|child| found = found || references(child, stable_id));
    found
}

fn count_references(node: &SchemaNode, defs: &IndexMap<String, SchemaNode>, counts: &mut FxHashMap<String, usize>) {
    if let SchemaNode::Reference { stable_id, .. } = node
        && defs.contains_key(stable_id)
    {
        *counts.entry(stable_id.clone()).or_default() += 1;
    }
    node.for_each_child(|child| count_references(child, defs, counts));
}

fn single_use_candidate(root: &SchemaNode, defs: &IndexMap<String, SchemaNode>) -> Option<String> {
    let mut counts = FxHashMap::default();
    count_references(root, defs, &mut counts);
    for body in defs.values() {
        count_references(body, defs, &mut counts);
    }
    defs.iter()
        .find(|(id, body)| counts.get(*id) == Some(&1) && !references(body, id))
        .map(|(id, _)| id.clone())
}

fn reachable_definitions(root: &SchemaNode, defs: &IndexMap<String, SchemaNode>) -> FxHashSet<String> {
    let mut reachable = FxHashSet::default();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let SchemaNode::Reference { stable_id, .. } = node
            && let Some(body) = defs.get(stable_id)
            && reachable.insert(stable_id.clone())
        {
            stack.push(body);
        }
        node.for_each_child(|child| stack.push(child));
    }
    reachable
}

/// Replace references whose stable id is in `mapping` with the mapped body.
fn substitute(node: SchemaNode, mapping: &FxHashMap<String, SchemaNode>) -> SchemaNode {
    if let SchemaNode::Reference { stable_id, .. } = &node
        && let Some(body) = mapping.get(stable_id)
    {
        return body.clone();
    }
    node.map_children(&mut |child| substitute(child, mapping))
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod registry_tests;
