//! Type-driven converter.
//!
//! Maps a nominal type from the oracle onto a schema. Dispatch order:
//!
//! 1. intrinsic and literal types map 1:1 (`null`/`undefined` become literals)
//! 2. template literal types build a template (expanded when every hole is a
//!    literal set)
//! 3. unions and intersections go through the algebra constructors
//! 4. tuples keep their element flags; arrays convert the element type, or
//!    re-derive from the array literal the type was inferred from
//! 5. object types: well-known names collapse to references, callables
//!    become functions, everything else enumerates properties and index
//!    signatures
//! 6. `keyof`/indexed access survive as `index`/`index-access`; type
//!    parameters convert their constraint
//! 7. generic applications register a lazy definition and return a
//!    `reference`
//!
//! Re-entering a type that is already being converted on the current branch
//! yields `error("Circular type")`.

use crate::algebra::{intersection, union};
use crate::context::EvaluationContext;
use crate::error::{EvaluationError, Result};
use crate::evaluate::SchemaEvaluator;
use crate::fold::build_template;
use crate::schema::{ElementFlag, PrimitiveKind, SchemaNode};
use tracing::{debug, trace};
use tsn_common::limits;
use tsn_host::{
    IntrinsicKind, LiteralValue, NodeData, NodeIndex, ObjectShape, Signature, TemplateTypeSpan,
    TupleElement, TypeData, TypeId,
};

pub const CIRCULAR_TYPE: &str = "Circular type";

fn intrinsic_schema(kind: IntrinsicKind) -> SchemaNode {
    match kind {
        IntrinsicKind::Undefined => SchemaNode::undefined(),
        IntrinsicKind::Null => SchemaNode::null(),
        IntrinsicKind::Any => SchemaNode::any(),
        IntrinsicKind::Unknown => SchemaNode::unknown(),
        IntrinsicKind::Never => SchemaNode::never(),
        IntrinsicKind::Void => SchemaNode::primitive(PrimitiveKind::Void),
        IntrinsicKind::Boolean => SchemaNode::primitive(PrimitiveKind::Boolean),
        IntrinsicKind::Number => SchemaNode::primitive(PrimitiveKind::Number),
        IntrinsicKind::String => SchemaNode::primitive(PrimitiveKind::String),
        IntrinsicKind::BigInt => SchemaNode::primitive(PrimitiveKind::BigInt),
        IntrinsicKind::Symbol => SchemaNode::primitive(PrimitiveKind::Symbol),
        IntrinsicKind::Object => SchemaNode::primitive(PrimitiveKind::Object),
    }
}

fn literal_schema(value: &LiteralValue) -> SchemaNode {
    match value {
        LiteralValue::String(s) => SchemaNode::string(s.as_str()),
        LiteralValue::Number(n) => SchemaNode::number(*n),
        LiteralValue::BigInt(digits) => SchemaNode::bigint(digits.as_str()),
        LiteralValue::Boolean(b) => SchemaNode::boolean(*b),
    }
}

fn contains_error(node: &SchemaNode) -> bool {
    if node.is_error() {
        return true;
    }
    let mut found = false;
    node.for_each_child(|child| found = found || contains_error(child));
    found
}

impl<'a> SchemaEvaluator<'a> {
    /// Convert a type. `node` is the syntax node the type belongs to, if any;
    /// it lets array and object-literal types re-derive from the value.
    pub fn convert_type(
        &self,
        ty: TypeId,
        node: Option<NodeIndex>,
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        if ctx.is_exhausted() {
            ctx.note_degraded();
            return Ok(SchemaNode::unknown());
        }
        let Some(data) = self.host.oracle.lookup(ty) else {
            debug!(ty = ty.0, "type not found in oracle, using unknown");
            return Ok(SchemaNode::unknown());
        };
        match data {
            TypeData::Intrinsic(kind) => return Ok(intrinsic_schema(*kind)),
            TypeData::Literal(value) => return Ok(literal_schema(value)),
            _ => {}
        }
        if ctx.is_handling_type(ty) {
            debug!(ty = %self.host.oracle.type_to_string(ty), "circular type");
            return Ok(SchemaNode::error(CIRCULAR_TYPE));
        }

        let cacheable = node.is_none() && !ctx.has_bindings();
        if cacheable && let Some(hit) = ctx.cached_type(ty) {
            trace!(ty = ty.0, "type cache hit");
            return Ok(hit);
        }
        let degraded_before = ctx.degraded_count();
        let inner = ctx.with_type(ty);
        let schema = stacker::maybe_grow(limits::STACK_RED_ZONE, limits::STACK_GROWTH_SIZE, || {
            self.convert_type_data(ty, data, node, &inner)
        })?;
        if cacheable && ctx.degraded_count() == degraded_before && !contains_error(&schema) {
            ctx.cache_type(ty, schema.clone());
        }
        Ok(schema)
    }

    fn convert_type_data(
        &self,
        ty: TypeId,
        data: &TypeData,
        node: Option<NodeIndex>,
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        let oracle = self.host.oracle;
        match data {
            TypeData::Intrinsic(kind) => Ok(intrinsic_schema(*kind)),
            TypeData::Literal(value) => Ok(literal_schema(value)),
            TypeData::TemplateLiteral(spans) => {
                let mut parts = Vec::with_capacity(spans.len());
                for span in spans {
                    parts.push(match span {
                        TemplateTypeSpan::Text(text) => SchemaNode::string(text.as_str()),
                        TemplateTypeSpan::Type(t) => self.convert_type(*t, None, ctx)?,
                    });
                }
                Ok(build_template(parts, ctx.options().max_union_expansion))
            }
            TypeData::Union(members) => Ok(union(self.convert_all(members, ctx)?)),
            TypeData::Intersection(members) => Ok(intersection(self.convert_all(members, ctx)?)),
            TypeData::Tuple(elements) => self.convert_tuple(elements, ctx),
            TypeData::Array(element) => {
                if let Some(node) = node
                    && let Some(NodeData::ArrayLiteral { elements }) = self.host.arena.data(node)
                {
                    return self.evaluate_array_literal(elements, ctx);
                }
                Ok(SchemaNode::array(self.convert_type(*element, None, ctx)?))
            }
            TypeData::Object(shape) => self.convert_object(ty, shape, ctx),
            TypeData::KeyOf(operand) => Ok(SchemaNode::Index {
                of: Box::new(self.convert_type(*operand, None, ctx)?),
                origin: node,
            }),
            TypeData::IndexAccess { object, index } => Ok(SchemaNode::IndexAccess {
                object: Box::new(self.convert_type(*object, None, ctx)?),
                index: Box::new(self.convert_type(*index, None, ctx)?),
                origin: node,
            }),
            TypeData::TypeParameter { constraint, .. } => match constraint {
                Some(constraint) => self.convert_type(*constraint, None, ctx),
                None => Ok(SchemaNode::unknown()),
            },
            TypeData::Application {
                name,
                target,
                args,
                body,
            } => {
                let type_args = self.convert_all(args, ctx)?;
                if ctx.options().is_well_known(name) {
                    return Ok(SchemaNode::well_known(name.as_str(), type_args));
                }
                let display = oracle.type_to_string(ty);
                let stable_id = ctx
                    .definitions()
                    .borrow_mut()
                    .register(name, &display, *target, *body);
                Ok(SchemaNode::Reference {
                    name: name.clone(),
                    type_args,
                    stable_id,
                })
            }
        }
    }

    fn convert_all(&self, types: &[TypeId], ctx: &EvaluationContext) -> Result<Vec<SchemaNode>> {
        types
            .iter()
            .map(|&t| self.convert_type(t, None, ctx))
            .collect()
    }

    fn convert_tuple(&self, elements: &[TupleElement], ctx: &EvaluationContext) -> Result<SchemaNode> {
        let mut items = Vec::with_capacity(elements.len());
        let mut element_flags = Vec::with_capacity(elements.len());
        for element in elements {
            let schema = self.convert_type(element.type_id, None, ctx)?;
            if element.rest {
                // `...T[]` stores the array type; the tuple keeps the element.
                items.push(match schema {
                    SchemaNode::Array { items } => *items,
                    other => other,
                });
                element_flags.push(ElementFlag::Rest);
            } else {
                items.push(schema);
                element_flags.push(if element.optional {
                    ElementFlag::Optional
                } else {
                    ElementFlag::Required
                });
            }
        }
        Ok(SchemaNode::Tuple {
            items,
            element_flags,
        })
    }

    fn convert_object(&self, ty: TypeId, shape: &ObjectShape, ctx: &EvaluationContext) -> Result<SchemaNode> {
        let oracle = self.host.oracle;
        if let Some(name) = &shape.name
            && ctx.options().is_well_known(name)
        {
            return Ok(SchemaNode::well_known(name.as_str(), Vec::new()));
        }

        let signatures = oracle.call_signatures(ty);
        if !signatures.is_empty() {
            let mut functions = Vec::with_capacity(signatures.len());
            for signature in &signatures {
                functions.push(self.convert_signature(signature, ctx)?);
            }
            return Ok(union(functions));
        }

        let mut properties = indexmap::IndexMap::new();
        for property in oracle.properties_of_type(ty) {
            let schema = match (shape.literal, property.declaration) {
                (Some(_), Some(declaration)) => self.schema_of_node(declaration, ctx)?,
                _ => {
                    let declared_is_parameter = matches!(
                        oracle.lookup(property.declared_type),
                        Some(TypeData::TypeParameter { .. })
                    );
                    let source = if declared_is_parameter {
                        property.type_id
                    } else {
                        property.declared_type
                    };
                    self.convert_type(source, None, ctx)?
                }
            };
            let schema = if property.optional {
                union([schema, SchemaNode::undefined()])
            } else {
                schema
            };
            properties.insert(property.name, schema);
        }

        let mut abstract_index_keys = Vec::new();
        for info in oracle.index_infos_of_type(ty) {
            abstract_index_keys.push((
                self.convert_type(info.key_type, None, ctx)?,
                self.convert_type(info.value_type, None, ctx)?,
            ));
        }
        Ok(SchemaNode::Object {
            properties,
            abstract_index_keys,
        })
    }

    fn convert_signature(&self, signature: &Signature, ctx: &EvaluationContext) -> Result<SchemaNode> {
        let mut parameters = Vec::with_capacity(signature.parameters.len());
        for param in &signature.parameters {
            let schema = self.convert_type(param.type_id, None, ctx)?;
            let schema = if param.optional {
                union([schema, SchemaNode::undefined()])
            } else {
                schema
            };
            parameters.push((param.name.clone(), schema));
        }
        Ok(SchemaNode::Function {
            parameters,
            return_type: Box::new(self.convert_type(signature.return_type, None, ctx)?),
        })
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Resolve a `reference` to its definition body. Other schemas are
    /// returned as they are.
    ///
    /// Unregistered well-known names degrade to `unknown`; any other
    /// unregistered name is a fatal [`EvaluationError::DefinitionNotFound`].
    /// A definition whose body is still being converted resolves to the
    /// reference itself.
    pub fn resolve_schema(&self, schema: &SchemaNode, ctx: &EvaluationContext) -> Result<SchemaNode> {
        let SchemaNode::Reference {
            name, stable_id, ..
        } = schema
        else {
            return Ok(schema.clone());
        };
        let registered = ctx.definitions().borrow().contains(stable_id);
        if !registered {
            if ctx.options().is_well_known(name) {
                return Ok(SchemaNode::unknown());
            }
            return Err(EvaluationError::DefinitionNotFound {
                stable_id: stable_id.clone(),
            });
        }
        Ok(self
            .materialize_definition(stable_id, ctx)?
            .unwrap_or_else(|| schema.clone()))
    }

    /// Convert a registered definition's body if it has not been converted
    /// yet. `None` while the body is in progress.
    pub(crate) fn materialize_definition(
        &self,
        stable_id: &str,
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        if let Some(ready) = ctx.definitions().borrow().ready(stable_id) {
            return Ok(Some(ready.clone()));
        }
        let body = ctx.definitions().borrow_mut().begin(stable_id);
        let Some(body) = body else {
            return Ok(None);
        };
        trace!(stable_id, "converting definition body");
        let schema = self.convert_type(body, None, &ctx.detached())?;
        ctx.definitions()
            .borrow_mut()
            .complete(stable_id, schema.clone());
        Ok(Some(schema))
    }
}

#[cfg(test)]
#[path = "../tests/type_convert_tests.rs"]
mod type_convert_tests;
