//! Schema evaluation engine.
//!
//! Narrows an expression, a declaration, or a nominal type into a
//! [`Schema`]: a canonical tree of literal values and shapes plus the named
//! definitions it refers to. Two converters cooperate through one
//! [`EvaluationContext`]:
//!
//! - the value-driven evaluator ([`SchemaEvaluator::schema_of_node`]) executes
//!   expressions symbolically, folding literals and following calls
//! - the type-driven converter ([`SchemaEvaluator::convert_type`]) maps types
//!   from the host's [`TypeOracle`](tsn_host::TypeOracle)
//!
//! [`resolve_function_calls`] lists the concrete arguments a function is
//! called with across the program. [`print_type`] and [`to_json_schema`]
//! render results.

pub mod algebra;
pub mod classify;
pub mod context;
pub mod error;
pub mod evaluate;
pub mod fold;
pub mod json_schema;
pub mod literal_ops;
pub mod options;
pub mod printer;
pub mod propagate;
pub mod recursion;
pub mod registry;
pub mod schema;
pub mod type_convert;

pub use classify::{are_schemas_equal, is_concrete_schema, non_concrete_inputs};
pub use context::EvaluationContext;
pub use error::{EvaluationError, Result};
pub use evaluate::SchemaEvaluator;
pub use json_schema::to_json_schema;
pub use options::EvaluationOptions;
pub use printer::{print_schema, print_type};
pub use propagate::{CallResolution, FunctionCallInfo, ParameterInfo, resolve_function_calls};
pub use schema::{ElementFlag, PrimitiveKind, Schema, SchemaLiteral, SchemaNode};

use tracing::debug;
use tsn_host::{Host, NodeIndex, TypeId};

/// What to evaluate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// An expression, declaration, or statement.
    Node(NodeIndex),
    /// A nominal type, optionally with the node it was read from.
    Type { ty: TypeId, node: Option<NodeIndex> },
}

/// Evaluate `entry` and reduce the result into a self-contained [`Schema`].
///
/// Every definition registered while evaluating is converted before
/// reduction, including definitions first reached from another definition.
pub fn evaluate(host: Host<'_>, entry: Entry, ctx: &EvaluationContext) -> Result<Schema> {
    let evaluator = SchemaEvaluator::new(host);
    let root = match entry {
        Entry::Node(node) => evaluator.schema_of_node(node, ctx)?,
        Entry::Type { ty, node } => evaluator.convert_type(ty, node, ctx)?,
    };

    loop {
        let pending = ctx.definitions().borrow().pending();
        if pending.is_empty() {
            break;
        }
        for stable_id in pending {
            evaluator.materialize_definition(&stable_id, ctx)?;
        }
    }

    let defs = ctx.definitions().borrow().ready_definitions();
    debug!(definitions = defs.len(), degraded = ctx.degraded_count(), "evaluation finished");
    Ok(registry::reduce_references(
        root,
        defs,
        ctx.options().inline_single_use_definitions,
    ))
}
