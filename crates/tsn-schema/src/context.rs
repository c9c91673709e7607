//! Evaluation context.
//!
//! A context is split into two halves:
//!
//! - **branch-local** state (`types_handled`, `functions_handled`,
//!   `parameter_bindings`, the remaining depth budget, the trace) is copied by
//!   [`EvaluationContext::child`], so a sibling branch never sees another
//!   branch's guards or bindings;
//! - **session** state (options, the type memo cache, the definition
//!   registry, the degradation counter) is shared by reference between every
//!   context derived from the same root.

use crate::options::EvaluationOptions;
use crate::registry::DefinitionRegistry;
use crate::schema::SchemaNode;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;
use tsn_host::{NodeIndex, SymbolId, TypeId};

/// State shared by every context of one request.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) options: EvaluationOptions,
    pub(crate) type_cache: RefCell<FxHashMap<TypeId, SchemaNode>>,
    pub(crate) definitions: RefCell<DefinitionRegistry>,
    degraded: Cell<u32>,
}

#[derive(Clone, Debug)]
pub struct EvaluationContext {
    types_handled: FxHashSet<TypeId>,
    functions_handled: FxHashSet<NodeIndex>,
    parameter_bindings: FxHashMap<SymbolId, SchemaNode>,
    remaining_depth: u32,
    trace: Vec<NodeIndex>,
    session: Rc<Session>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new(EvaluationOptions::default())
    }
}

impl EvaluationContext {
    pub fn new(options: EvaluationOptions) -> Self {
        let remaining_depth = options.max_depth;
        Self {
            types_handled: FxHashSet::default(),
            functions_handled: FxHashSet::default(),
            parameter_bindings: FxHashMap::default(),
            remaining_depth,
            trace: Vec::new(),
            session: Rc::new(Session {
                options,
                ..Session::default()
            }),
        }
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.session.options
    }

    /// Branch clone. Guards, bindings and trace are copied; caches and the
    /// registry stay shared. `descend` spends one unit of depth budget.
    pub fn child(&self, descend: bool) -> Self {
        let mut child = self.clone();
        if descend {
            child.remaining_depth = child.remaining_depth.saturating_sub(1);
        }
        child
    }

    /// Context in the same session with empty guards and bindings. Used for
    /// definition bodies, which must not depend on the branch that first
    /// needed them.
    pub fn detached(&self) -> Self {
        Self {
            types_handled: FxHashSet::default(),
            functions_handled: FxHashSet::default(),
            parameter_bindings: FxHashMap::default(),
            remaining_depth: self.remaining_depth,
            trace: self.trace.clone(),
            session: Rc::clone(&self.session),
        }
    }

    // -------------------------------------------------------------------------
    // Depth budget
    // -------------------------------------------------------------------------

    pub fn remaining_depth(&self) -> u32 {
        self.remaining_depth
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_depth == 0
    }

    /// Record that a branch was cut short by the depth budget.
    pub fn note_degraded(&self) {
        let count = self.session.degraded.get() + 1;
        self.session.degraded.set(count);
        debug!(count, "depth budget exhausted, degrading to unknown");
    }

    pub fn degraded_count(&self) -> u32 {
        self.session.degraded.get()
    }

    // -------------------------------------------------------------------------
    // Branch-local guards
    // -------------------------------------------------------------------------

    pub fn is_handling_type(&self, ty: TypeId) -> bool {
        self.types_handled.contains(&ty)
    }

    /// Child context with `ty` marked as in flight.
    pub fn with_type(&self, ty: TypeId) -> Self {
        let mut child = self.child(true);
        child.types_handled.insert(ty);
        child
    }

    pub fn is_handling_function(&self, function: NodeIndex) -> bool {
        self.functions_handled.contains(&function)
    }

    /// Child context for evaluating a call into `function` with the given
    /// parameter bindings. Bindings of enclosing calls stay visible unless
    /// shadowed.
    pub fn with_function(
        &self,
        function: NodeIndex,
        bindings: impl IntoIterator<Item = (SymbolId, SchemaNode)>,
    ) -> Self {
        let mut child = self.child(true);
        child.functions_handled.insert(function);
        child.parameter_bindings.extend(bindings);
        child
    }

    pub fn binding(&self, symbol: SymbolId) -> Option<&SchemaNode> {
        self.parameter_bindings.get(&symbol)
    }

    pub fn has_bindings(&self) -> bool {
        !self.parameter_bindings.is_empty()
    }

    // -------------------------------------------------------------------------
    // Trace
    // -------------------------------------------------------------------------

    pub fn push_trace(&mut self, node: NodeIndex) {
        self.trace.push(node);
    }

    /// Nodes on the current evaluation path, outermost first.
    pub fn trace(&self) -> &[NodeIndex] {
        &self.trace
    }

    // -------------------------------------------------------------------------
    // Shared state
    // -------------------------------------------------------------------------

    pub fn cached_type(&self, ty: TypeId) -> Option<SchemaNode> {
        self.session.type_cache.borrow().get(&ty).cloned()
    }

    pub fn cache_type(&self, ty: TypeId, schema: SchemaNode) {
        self.session.type_cache.borrow_mut().insert(ty, schema);
    }

    pub fn definitions(&self) -> &RefCell<DefinitionRegistry> {
        &self.session.definitions
    }

    /// Whether two contexts belong to the same session.
    pub fn shares_session_with(&self, other: &EvaluationContext) -> bool {
        Rc::ptr_eq(&self.session, &other.session)
    }
}

#[cfg(test)]
#[path = "../tests/context_tests.rs"]
mod context_tests;
