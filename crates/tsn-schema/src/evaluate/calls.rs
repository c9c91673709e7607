//! Function-likes, calls and `await`.

use super::SchemaEvaluator;
use crate::algebra::{alternatives, union};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::schema::{ElementFlag, PrimitiveKind, SchemaNode};
use tracing::{debug, trace};
use tsn_host::{FunctionData, NodeData, NodeIndex, SymbolId, VariableKind};

const PROMISE: &str = "Promise";

/// `Promise<T>` → `T`; anything else is returned unchanged.
pub(crate) fn unwrap_promise(node: SchemaNode) -> SchemaNode {
    match node {
        SchemaNode::Reference {
            name, mut type_args, ..
        } if matches!(name.as_str(), "Promise" | "PromiseLike") && type_args.len() == 1 => {
            type_args.pop().unwrap_or_else(SchemaNode::unknown)
        }
        other => other,
    }
}

impl<'a> SchemaEvaluator<'a> {
    // =========================================================================
    // Function-likes
    // =========================================================================

    /// `function` schema of a function-like node. Generators are left to the
    /// type path.
    pub(crate) fn evaluate_function_like(
        &self,
        function: NodeIndex,
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        let arena = self.host.arena;
        let Some(func) = arena.function_data(function) else {
            return Ok(None);
        };
        if func.is_generator() {
            trace!(function = %function, "generator, using declared type");
            return Ok(None);
        }
        let mut parameters = Vec::with_capacity(func.parameters.len());
        for &param in &func.parameters {
            let name = arena.declaration_name(param).unwrap_or("arg").to_string();
            parameters.push((name, self.schema_of_node(param, ctx)?));
        }
        let return_type = self
            .evaluate_return_type(function, ctx)?
            .unwrap_or_else(SchemaNode::unknown);
        Ok(Some(SchemaNode::Function {
            parameters,
            return_type: Box::new(return_type),
        }))
    }

    /// Union of every `return` belonging to `function` (not to nested
    /// function-likes), or the concise arrow body. `async` functions wrap the
    /// result in `Promise`.
    pub(crate) fn evaluate_return_type(
        &self,
        function: NodeIndex,
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        let arena = self.host.arena;
        let Some(func) = arena.function_data(function) else {
            return Ok(None);
        };
        let Some(body) = func.body else {
            return Ok(None);
        };
        let result = match arena.data(body) {
            Some(NodeData::Block { .. }) => {
                let mut returns = Vec::new();
                self.collect_returns(body, &mut returns);
                if returns.is_empty() {
                    SchemaNode::primitive(PrimitiveKind::Void)
                } else {
                    let mut schemas = Vec::with_capacity(returns.len());
                    for ret in returns {
                        schemas.push(self.schema_of_node(ret, ctx)?);
                    }
                    union(schemas)
                }
            }
            _ => self.schema_of_node(body, ctx)?,
        };
        if func.is_async() {
            let settled = union(alternatives(&result).into_iter().map(unwrap_promise));
            return Ok(Some(SchemaNode::well_known(PROMISE, vec![settled])));
        }
        Ok(Some(result))
    }

    fn collect_returns(&self, node: NodeIndex, out: &mut Vec<NodeIndex>) {
        let arena = self.host.arena;
        for child in arena.children(node) {
            match arena.data(child) {
                Some(NodeData::ReturnStatement { .. }) => out.push(child),
                Some(data) if data.function().is_some() => {}
                _ => self.collect_returns(child, out),
            }
        }
    }

    pub(super) fn evaluate_await(&self, expression: NodeIndex, ctx: &EvaluationContext) -> Result<SchemaNode> {
        let awaited = self.schema_of_node(expression, ctx)?;
        Ok(union(alternatives(&awaited).into_iter().map(unwrap_promise)))
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Evaluate the callee's body under bindings built from the arguments.
    /// Unknown callees, generators, unflattenable spreads and recursive
    /// re-entry fall back to the call's nominal type.
    pub(super) fn evaluate_call(&self, call: NodeIndex, ctx: &EvaluationContext) -> Result<Option<SchemaNode>> {
        let arena = self.host.arena;
        let Some(NodeData::Call { callee, arguments }) = arena.data(call) else {
            return Ok(None);
        };
        let Some(function) = self.callee_function(*callee) else {
            return Ok(None);
        };
        let Some(func) = arena.function_data(function) else {
            return Ok(None);
        };
        if func.is_generator() {
            return Ok(None);
        }
        if ctx.is_handling_function(function) {
            debug!(call = %call, function = %function, "recursive call, using declared type");
            return Ok(None);
        }
        let Some(arguments) = self.argument_schemas(arguments, ctx)? else {
            return Ok(None);
        };
        let bindings = self.bind_parameters(func, &arguments, ctx)?;
        let call_ctx = ctx.with_function(function, bindings);
        self.evaluate_return_type(function, &call_ctx)
    }

    /// The function-like a callee expression denotes: an inline function
    /// expression, a function declaration, or a `const` bound to one.
    pub(crate) fn callee_function(&self, callee: NodeIndex) -> Option<NodeIndex> {
        let arena = self.host.arena;
        let callee = self.skip_parentheses(callee);
        match arena.data(callee)? {
            data if data.function().is_some() => Some(callee),
            NodeData::Identifier { .. } => {
                let declaration = self.host.resolver.resolve(callee)?.declaration;
                self.function_of_declaration(declaration)
            }
            _ => None,
        }
    }

    /// Function-like node behind a declaration: the declaration itself, or
    /// the function initializer of a `const`.
    pub(crate) fn function_of_declaration(&self, declaration: NodeIndex) -> Option<NodeIndex> {
        let arena = self.host.arena;
        match arena.data(declaration)? {
            NodeData::FunctionDeclaration(_) | NodeData::MethodDeclaration(_) => Some(declaration),
            NodeData::VariableDeclaration {
                initializer: Some(init),
                kind: VariableKind::Const,
                ..
            } => {
                let init = self.skip_parentheses(*init);
                arena.is_function_like(init).then_some(init)
            }
            _ => None,
        }
    }

    pub(crate) fn skip_parentheses(&self, mut node: NodeIndex) -> NodeIndex {
        while let Some(NodeData::Parenthesized { expression } | NodeData::TypeAssertion { expression }) =
            self.host.arena.data(node)
        {
            node = *expression;
        }
        node
    }

    /// Argument schemas in positional order. Spreads of array literals and
    /// tuples flatten; any other spread makes positions unknowable (`None`).
    pub(crate) fn argument_schemas(
        &self,
        arguments: &[NodeIndex],
        ctx: &EvaluationContext,
    ) -> Result<Option<Vec<SchemaNode>>> {
        let arena = self.host.arena;
        let mut schemas = Vec::with_capacity(arguments.len());
        for &argument in arguments {
            let Some(NodeData::SpreadElement { expression }) = arena.data(argument) else {
                schemas.push(self.schema_of_node(argument, ctx)?);
                continue;
            };
            let source = self.skip_parentheses(*expression);
            if let Some(NodeData::ArrayLiteral { elements }) = arena.data(source)
                && !elements
                    .iter()
                    .any(|&e| matches!(arena.data(e), Some(NodeData::SpreadElement { .. })))
            {
                for &element in elements {
                    schemas.push(self.schema_of_node(element, ctx)?);
                }
                continue;
            }
            match self.schema_of_node(source, ctx)? {
                SchemaNode::Tuple { items, element_flags }
                    if element_flags.iter().all(|f| *f == ElementFlag::Required) =>
                {
                    schemas.extend(items);
                }
                other => {
                    debug!(argument = %argument, kind = other.kind_name(), "cannot flatten spread argument");
                    return Ok(None);
                }
            }
        }
        Ok(Some(schemas))
    }

    /// Parameter symbol → argument schema, see [`Self::parameter_argument`].
    fn bind_parameters(
        &self,
        func: &FunctionData,
        arguments: &[SchemaNode],
        ctx: &EvaluationContext,
    ) -> Result<Vec<(SymbolId, SchemaNode)>> {
        let mut bindings = Vec::with_capacity(func.parameters.len());
        for (position, &param) in func.parameters.iter().enumerate() {
            let Some(symbol) = self.host.resolver.symbol_of_declaration(param) else {
                continue;
            };
            if let Some(schema) = self.parameter_argument(param, position, arguments, ctx)? {
                bindings.push((symbol, schema));
            }
        }
        Ok(bindings)
    }

    /// Value the parameter at `position` takes for one argument list.
    /// Missing (or `undefined`) arguments take the parameter initializer; a
    /// rest parameter collects the remaining arguments into a tuple. `None`
    /// when `param` is not a parameter declaration.
    pub(crate) fn parameter_argument(
        &self,
        param: NodeIndex,
        position: usize,
        arguments: &[SchemaNode],
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        let Some(NodeData::Parameter {
            initializer, rest, ..
        }) = self.host.arena.data(param)
        else {
            return Ok(None);
        };
        let schema = if *rest {
            SchemaNode::tuple(arguments.get(position..).unwrap_or_default().to_vec())
        } else {
            match (arguments.get(position), initializer) {
                (Some(argument), Some(init)) if argument == &SchemaNode::undefined() => {
                    self.schema_of_node(*init, ctx)?
                }
                (Some(argument), _) => argument.clone(),
                (None, Some(init)) => self.schema_of_node(*init, ctx)?,
                (None, None) => SchemaNode::undefined(),
            }
        };
        Ok(Some(schema))
    }
}
