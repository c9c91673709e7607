//! Call-argument propagator.
//!
//! Answers "with which concrete arguments is this function called?". Call
//! sites come from the symbol table. An argument that still depends on a
//! parameter of an enclosing function (a *hole*) is filled in from that
//! function's own call sites, recursively up the call graph:
//!
//! ```text
//! function foo(n) {}
//! function bar(x) { foo(x + 1) }   // foo: (x + 1) with hole `x` owned by bar
//! bar(19)                          // bar: (19)  =>  foo: (20)
//! ```
//!
//! The traversal has two phases. **Discovery** walks owner functions with a
//! worklist, evaluating the raw arguments of every call site once.
//! **Resolution** then visits owners in dependency post-order so that every
//! upstream function is resolved before the calls that depend on it; a
//! [`RecursionGuard`] cuts cycles (recursive functions), whose back-edge
//! calls stay symbolic.

use crate::classify::{is_concrete_schema, non_concrete_inputs};
use crate::context::EvaluationContext;
use crate::error::{EvaluationError, Result};
use crate::evaluate::SchemaEvaluator;
use crate::fold::refold;
use crate::recursion::{RecursionGuard, RecursionResult};
use crate::schema::SchemaNode;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};
use tsn_common::limits;
use tsn_host::{Host, NodeData, NodeIndex, SymbolId};

/// How a call's argument list was obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallResolution {
    /// Every argument was concrete at the call site.
    Concrete,
    /// Holes were filled from upstream call sites; every argument is now
    /// concrete.
    Propagated,
    /// At least one argument is still symbolic.
    Symbolic { reason: String },
}

impl CallResolution {
    fn symbolic(reason: impl Into<String>) -> Self {
        Self::Symbolic {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterInfo {
    pub declaration: NodeIndex,
    pub symbol: Option<SymbolId>,
    pub name: String,
}

/// One (possibly propagated) invocation of a function.
#[derive(Clone, Debug)]
pub struct FunctionCallInfo {
    pub call: NodeIndex,
    pub arguments: Vec<SchemaNode>,
    pub parameters: Vec<ParameterInfo>,
    pub resolution: CallResolution,
}

/// Enumerate the calls of the function declared by `symbol`, with arguments
/// propagated through enclosing call chains.
///
/// Fails with [`EvaluationError::MissingDeclaration`] when the symbol has no
/// declaration, and [`EvaluationError::UnexpectedSchema`] when the
/// declaration is not a function.
pub fn resolve_function_calls(
    host: Host<'_>,
    symbol: SymbolId,
    ctx: &EvaluationContext,
) -> Result<Vec<FunctionCallInfo>> {
    let evaluator = SchemaEvaluator::new(host);
    let declaration =
        host.resolver
            .declaration_of_symbol(symbol)
            .ok_or_else(|| EvaluationError::MissingDeclaration {
                subject: format!("symbol {}", symbol.0),
            })?;
    let function = evaluator.function_of_declaration(declaration).ok_or(
        EvaluationError::UnexpectedSchema {
            expected: "function",
            found: host.arena.kind_name(declaration),
        },
    )?;

    let mut propagator = CallPropagator::new(evaluator, ctx);
    propagator.discover(function, symbol)?;
    Ok(propagator.resolve(function)?.unwrap_or_default())
}

// =============================================================================
// Propagator
// =============================================================================

/// Call site with arguments as evaluated in place.
#[derive(Clone, Debug)]
struct RawCall {
    call: NodeIndex,
    arguments: Vec<SchemaNode>,
    /// Functions owning the holes, in source order.
    owners: Vec<NodeIndex>,
    /// Arguments could not be laid out positionally (non-flattenable spread).
    positional: bool,
}

struct CallPropagator<'a, 'c> {
    evaluator: SchemaEvaluator<'a>,
    ctx: &'c EvaluationContext,
    /// Function node → raw calls, filled by discovery.
    raw: FxHashMap<NodeIndex, Vec<RawCall>>,
    parameters: FxHashMap<NodeIndex, Vec<ParameterInfo>>,
    /// Function node → resolved calls, filled by resolution.
    resolved: FxHashMap<NodeIndex, Vec<FunctionCallInfo>>,
    guard: RecursionGuard<NodeIndex>,
}

impl<'a, 'c> CallPropagator<'a, 'c> {
    fn new(evaluator: SchemaEvaluator<'a>, ctx: &'c EvaluationContext) -> Self {
        Self {
            evaluator,
            ctx,
            raw: FxHashMap::default(),
            parameters: FxHashMap::default(),
            resolved: FxHashMap::default(),
            guard: RecursionGuard::new(limits::MAX_PROPAGATION_DEPTH),
        }
    }

    fn host(&self) -> Host<'a> {
        self.evaluator.host()
    }

    // -------------------------------------------------------------------------
    // Phase 1: discovery
    // -------------------------------------------------------------------------

    fn discover(&mut self, root: NodeIndex, root_symbol: SymbolId) -> Result<()> {
        let mut worklist = VecDeque::from([(root, Some(root_symbol), 0u32)]);
        while let Some((function, symbol, depth)) = worklist.pop_front() {
            if self.raw.contains_key(&function) {
                continue;
            }
            let symbol = symbol.or_else(|| self.symbol_of_function(function));
            let calls = match symbol {
                Some(symbol) => self.raw_calls(symbol)?,
                None => Vec::new(),
            };
            trace!(function = %function, calls = calls.len(), depth, "discovered call sites");
            if depth < limits::MAX_PROPAGATION_DEPTH {
                for owner in calls.iter().flat_map(|call| call.owners.iter().copied()) {
                    if !self.raw.contains_key(&owner) {
                        worklist.push_back((owner, None, depth + 1));
                    }
                }
            }
            let parameters = self.parameter_infos(function);
            self.parameters.insert(function, parameters);
            self.raw.insert(function, calls);
        }
        Ok(())
    }

    /// Call sites of `symbol`: references used directly as a callee, or as
    /// the member name of a callee (`obj.method(...)`).
    fn call_sites(&self, symbol: SymbolId) -> Vec<NodeIndex> {
        let arena = self.host().arena;
        let mut calls = Vec::new();
        for &reference in self.host().symbols.references(symbol) {
            let parent = arena.parent(reference);
            let call = match arena.data(parent) {
                Some(NodeData::Call { callee, .. }) if *callee == reference => Some(parent),
                Some(NodeData::PropertyAccess { name, .. }) if *name == reference => {
                    let grandparent = arena.parent(parent);
                    match arena.data(grandparent) {
                        Some(NodeData::Call { callee, .. }) if *callee == parent => Some(grandparent),
                        _ => None,
                    }
                }
                _ => None,
            };
            if let Some(call) = call
                && !calls.contains(&call)
            {
                calls.push(call);
            }
        }
        calls
    }

    fn raw_calls(&self, symbol: SymbolId) -> Result<Vec<RawCall>> {
        let arena = self.host().arena;
        let mut out = Vec::new();
        for call in self.call_sites(symbol) {
            let Some(NodeData::Call { arguments, .. }) = arena.data(call) else {
                continue;
            };
            let ctx = self.ctx.child(false);
            let (arguments, positional) = match self.evaluator.argument_schemas(arguments, &ctx)? {
                Some(schemas) => (schemas, true),
                None => {
                    let mut schemas = Vec::with_capacity(arguments.len());
                    for &argument in arguments {
                        let node = match arena.data(argument) {
                            Some(NodeData::SpreadElement { expression }) => *expression,
                            _ => argument,
                        };
                        schemas.push(self.evaluator.schema_of_node(node, &ctx)?);
                    }
                    (schemas, false)
                }
            };
            let owners = self.hole_owners(call, &arguments);
            out.push(RawCall {
                call,
                arguments,
                owners,
                positional,
            });
        }
        Ok(out)
    }

    /// Distinct functions whose parameters the arguments depend on, limited
    /// to functions that enclose the call.
    fn hole_owners(&self, call: NodeIndex, arguments: &[SchemaNode]) -> Vec<NodeIndex> {
        let arena = self.host().arena;
        let mut owners = Vec::new();
        for argument in arguments {
            for input in non_concrete_inputs(argument) {
                if !matches!(arena.data(input), Some(NodeData::Parameter { .. })) {
                    continue;
                }
                let owner = arena.parent(input);
                let encloses = arena.is_function_like(owner) && self.is_ancestor(owner, call);
                if encloses && !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }
        owners.sort_by_key(|&owner| arena.span(owner).start);
        owners
    }

    fn is_ancestor(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        let arena = self.host().arena;
        let mut current = arena.parent(node);
        while current.is_some() {
            if current == ancestor {
                return true;
            }
            current = arena.parent(current);
        }
        false
    }

    /// Symbol a function-like is callable by: its own declaration, or the
    /// `const` it initializes.
    fn symbol_of_function(&self, function: NodeIndex) -> Option<SymbolId> {
        let host = self.host();
        if let Some(symbol) = host.resolver.symbol_of_declaration(function) {
            return Some(symbol);
        }
        let mut parent = host.arena.parent(function);
        while let Some(NodeData::Parenthesized { .. } | NodeData::TypeAssertion { .. }) =
            host.arena.data(parent)
        {
            parent = host.arena.parent(parent);
        }
        match host.arena.data(parent) {
            Some(NodeData::VariableDeclaration { .. }) => host.resolver.symbol_of_declaration(parent),
            _ => None,
        }
    }

    fn parameter_infos(&self, function: NodeIndex) -> Vec<ParameterInfo> {
        let host = self.host();
        let Some(func) = host.arena.function_data(function) else {
            return Vec::new();
        };
        func.parameters
            .iter()
            .map(|&param| ParameterInfo {
                declaration: param,
                symbol: host.resolver.symbol_of_declaration(param),
                name: host.arena.declaration_name(param).unwrap_or_default().to_string(),
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Phase 2: resolution
    // -------------------------------------------------------------------------

    /// Resolved calls of `function`; `None` when it is already on the
    /// resolution stack or beyond the depth limit.
    fn resolve(&mut self, function: NodeIndex) -> Result<Option<Vec<FunctionCallInfo>>> {
        if let Some(done) = self.resolved.get(&function) {
            return Ok(Some(done.clone()));
        }
        match self.guard.enter(function) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                debug!(
                    function = %function,
                    length = self.guard.cycle_from(function).len(),
                    "cycle in call graph"
                );
                return Ok(None);
            }
            RecursionResult::DepthExceeded => {
                debug!(function = %function, "propagation depth exceeded");
                return Ok(None);
            }
        }

        let raw = self.raw.get(&function).cloned().unwrap_or_default();
        let parameters = self.parameters.get(&function).cloned().unwrap_or_default();
        let mut out: Vec<FunctionCallInfo> = Vec::new();
        let mut failure = None;
        for call in raw {
            match self.resolve_call(call, &parameters) {
                Ok(infos) => {
                    for info in infos {
                        if !out
                            .iter()
                            .any(|existing| existing.arguments == info.arguments)
                        {
                            out.push(info);
                        }
                    }
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        self.guard.leave(function);
        if let Some(err) = failure {
            return Err(err);
        }
        self.resolved.insert(function, out.clone());
        Ok(Some(out))
    }

    fn resolve_call(&mut self, call: RawCall, parameters: &[ParameterInfo]) -> Result<Vec<FunctionCallInfo>> {
        let info = |arguments: Vec<SchemaNode>, resolution: CallResolution| FunctionCallInfo {
            call: call.call,
            arguments,
            parameters: parameters.to_vec(),
            resolution,
        };

        if !call.positional {
            return Ok(vec![info(
                call.arguments.clone(),
                CallResolution::symbolic("spread argument with unknown length"),
            )]);
        }
        if call.arguments.iter().all(is_concrete_schema) {
            return Ok(vec![info(call.arguments.clone(), CallResolution::Concrete)]);
        }
        let Some(&owner) = call.owners.first() else {
            return Ok(vec![info(
                call.arguments.clone(),
                CallResolution::symbolic("unresolved inputs are not parameters of an enclosing function"),
            )]);
        };
        if call.owners.len() > 1 {
            warn!(
                call = %call.call,
                owners = call.owners.len(),
                "arguments depend on parameters of several functions; propagating through the first only"
            );
        }

        let Some(upstream) = self.resolve(owner)? else {
            return Ok(vec![info(
                call.arguments.clone(),
                CallResolution::symbolic("recursive call chain"),
            )]);
        };
        if upstream.is_empty() {
            return Ok(vec![info(
                call.arguments.clone(),
                CallResolution::symbolic("enclosing function is never called"),
            )]);
        }

        let owner_params: Vec<ParameterInfo> = self.parameters.get(&owner).cloned().unwrap_or_default();
        let cap = self.ctx.options().max_union_expansion;
        let mut out = Vec::with_capacity(upstream.len());
        for upstream_call in &upstream {
            let mapping = self.parameter_mapping(&owner_params, &upstream_call.arguments)?;
            let arguments: Vec<SchemaNode> = call
                .arguments
                .iter()
                .map(|argument| refold(substitute(argument.clone(), &mapping), cap))
                .collect();
            let resolution = if call.owners.len() > 1 {
                CallResolution::symbolic("holes owned by multiple functions")
            } else if arguments.iter().all(is_concrete_schema) {
                CallResolution::Propagated
            } else {
                CallResolution::symbolic("arguments remain symbolic after propagation")
            };
            out.push(info(arguments, resolution));
        }
        Ok(out)
    }

    /// Parameter declaration → schema for one upstream call, bound the way
    /// a direct call binds them (initializers fill missing arguments).
    fn parameter_mapping(
        &self,
        parameters: &[ParameterInfo],
        arguments: &[SchemaNode],
    ) -> Result<FxHashMap<NodeIndex, SchemaNode>> {
        let ctx = self.ctx.child(false);
        let mut mapping = FxHashMap::default();
        for (position, param) in parameters.iter().enumerate() {
            let schema = self
                .evaluator
                .parameter_argument(param.declaration, position, arguments, &ctx)?
                .unwrap_or_else(|| {
                    arguments
                        .get(position)
                        .cloned()
                        .unwrap_or_else(SchemaNode::undefined)
                });
            mapping.insert(param.declaration, schema);
        }
        Ok(mapping)
    }
}

/// Replace every unresolved leaf whose origin is a mapped parameter.
fn substitute(node: SchemaNode, mapping: &FxHashMap<NodeIndex, SchemaNode>) -> SchemaNode {
    if let Some(origin) = node.origin()
        && let Some(replacement) = mapping.get(&origin)
    {
        return replacement.clone();
    }
    node.map_children(&mut |child| substitute(child, mapping))
}

#[cfg(test)]
#[path = "../tests/propagate_tests.rs"]
mod propagate_tests;
