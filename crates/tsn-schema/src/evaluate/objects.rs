//! Object literals, array literals, spreads and property reads.
//!
//! An object literal evaluates to a set of alternative shapes. Most members
//! update every alternative in place; a spread of a union forks each
//! alternative once per union member (capped by
//! [`MAX_SPREAD_ALTERNATIVES`](tsn_common::limits::MAX_SPREAD_ALTERNATIVES)).
//! The alternatives are finally unioned, which also deduplicates them.

use super::SchemaEvaluator;
use crate::algebra::{alternatives, union};
use crate::classify::is_concrete_schema;
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::literal_ops::{string_to_number, to_js_string};
use crate::schema::{ElementFlag, PrimitiveKind, SchemaLiteral, SchemaNode};
use indexmap::IndexMap;
use tracing::debug;
use tsn_common::limits;
use tsn_host::{NodeData, NodeIndex};

/// One alternative shape of an object under construction.
#[derive(Clone, Debug, Default)]
pub(super) struct ObjectBuilder {
    properties: IndexMap<String, SchemaNode>,
    abstract_index_keys: Vec<(SchemaNode, SchemaNode)>,
}

impl ObjectBuilder {
    pub(super) fn set(&mut self, key: String, value: SchemaNode) {
        self.properties.insert(key, value);
    }

    fn set_abstract(&mut self, key: SchemaNode, value: SchemaNode) {
        self.abstract_index_keys.push((key, value));
    }

    fn unsupported_spread(mut self) -> Self {
        self.set_abstract(
            SchemaNode::primitive(PrimitiveKind::String),
            SchemaNode::error("Unsupported spread"),
        );
        self
    }

    /// Spread a schema that does not branch (no unions, intersections or
    /// references left).
    fn spread(mut self, source: &SchemaNode) -> Self {
        match source {
            SchemaNode::Object {
                properties,
                abstract_index_keys,
            } => {
                for (name, value) in properties {
                    self.set(name.clone(), value.clone());
                }
                self.abstract_index_keys
                    .extend(abstract_index_keys.iter().cloned());
                self
            }
            SchemaNode::Tuple { items, element_flags } => {
                for (i, (item, flag)) in items.iter().zip(element_flags).enumerate() {
                    match flag {
                        ElementFlag::Rest => self.set_abstract(
                            SchemaNode::primitive(PrimitiveKind::Number),
                            item.clone(),
                        ),
                        ElementFlag::Optional => {
                            self.set(i.to_string(), union([item.clone(), SchemaNode::undefined()]))
                        }
                        ElementFlag::Required => self.set(i.to_string(), item.clone()),
                    }
                }
                self
            }
            SchemaNode::Array { items } => {
                self.set_abstract(
                    SchemaNode::primitive(PrimitiveKind::Number),
                    (**items).clone(),
                );
                self
            }
            SchemaNode::Primitive {
                name: PrimitiveKind::Any,
                ..
            } => {
                self.set_abstract(SchemaNode::any(), SchemaNode::any());
                self
            }
            // Primitives and nullish values contribute no own properties.
            SchemaNode::Literal { .. }
            | SchemaNode::TemplateLiteral { .. }
            | SchemaNode::BinaryExpression { .. }
            | SchemaNode::Index { .. }
            | SchemaNode::Function { .. } => self,
            SchemaNode::Primitive { name, .. } => match name {
                PrimitiveKind::Unknown | PrimitiveKind::Object => self.unsupported_spread(),
                _ => self,
            },
            SchemaNode::IndexAccess { .. }
            | SchemaNode::Error { .. }
            | SchemaNode::Reference { .. }
            | SchemaNode::Union { .. }
            | SchemaNode::Intersection { .. } => self.unsupported_spread(),
        }
    }

    pub(super) fn build(self) -> SchemaNode {
        SchemaNode::Object {
            properties: self.properties,
            abstract_index_keys: self.abstract_index_keys,
        }
    }
}

/// Keys produced by a property name.
enum PropertyKeys {
    Static(Vec<String>),
    Abstract(SchemaNode),
}

impl<'a> SchemaEvaluator<'a> {
    // =========================================================================
    // Object literals
    // =========================================================================

    pub(super) fn evaluate_object_literal(
        &self,
        members: &[NodeIndex],
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        let arena = self.host.arena;
        let mut builders = vec![ObjectBuilder::default()];
        for &member in members {
            match arena.data(member) {
                Some(NodeData::PropertyAssignment { name, initializer }) => {
                    let value = self.schema_of_node(*initializer, ctx)?;
                    let keys = self.property_keys(*name, ctx)?;
                    apply_keys(&mut builders, keys, value);
                }
                Some(NodeData::ShorthandPropertyAssignment { name }) => {
                    let key = arena.identifier_text(*name).unwrap_or_default().to_string();
                    let value = self.schema_of_node(*name, ctx)?;
                    apply_keys(&mut builders, PropertyKeys::Static(vec![key]), value);
                }
                Some(NodeData::MethodDeclaration(func)) => {
                    let value = self.schema_of_node(member, ctx)?;
                    let keys = match func.name {
                        Some(name) => self.property_keys(name, ctx)?,
                        None => continue,
                    };
                    apply_keys(&mut builders, keys, value);
                }
                Some(NodeData::SpreadAssignment { expression }) => {
                    let source = self.schema_of_node(*expression, ctx)?;
                    builders = self.apply_spread(builders, &source, ctx)?;
                }
                _ => debug!(member = %member, "skipping unsupported object member"),
            }
        }
        Ok(union(builders.into_iter().map(ObjectBuilder::build)))
    }

    /// Static names map to one key. Computed names map to one key per
    /// literal alternative, or to an abstract key when not concrete.
    fn property_keys(&self, name: NodeIndex, ctx: &EvaluationContext) -> Result<PropertyKeys> {
        if let Some(text) = self.host.arena.property_name_text(name) {
            return Ok(PropertyKeys::Static(vec![text]));
        }
        let key = match self.host.arena.data(name) {
            Some(NodeData::ComputedPropertyName { expression }) => {
                self.schema_of_node(*expression, ctx)?
            }
            _ => self.schema_of_node(name, ctx)?,
        };
        let literal_keys: Option<Vec<String>> = alternatives(&key)
            .iter()
            .map(|alternative| alternative.as_literal().map(to_js_string))
            .collect();
        Ok(match literal_keys {
            Some(keys) if is_concrete_schema(&key) => PropertyKeys::Static(keys),
            _ => PropertyKeys::Abstract(key),
        })
    }

    /// Merge a spread source into every alternative, forking per union
    /// member.
    pub(super) fn apply_spread(
        &self,
        builders: Vec<ObjectBuilder>,
        source: &SchemaNode,
        ctx: &EvaluationContext,
    ) -> Result<Vec<ObjectBuilder>> {
        match source {
            SchemaNode::Union { items } => {
                if builders.len().saturating_mul(items.len()) > limits::MAX_SPREAD_ALTERNATIVES {
                    debug!(
                        alternatives = builders.len() * items.len(),
                        "spread alternatives over cap"
                    );
                    return Ok(builders
                        .into_iter()
                        .map(ObjectBuilder::unsupported_spread)
                        .collect());
                }
                let mut forked = Vec::with_capacity(builders.len() * items.len());
                for item in items {
                    forked.extend(self.apply_spread(builders.clone(), item, ctx)?);
                }
                Ok(forked)
            }
            SchemaNode::Intersection { items } => {
                let mut current = builders;
                for item in items {
                    current = self.apply_spread(current, item, ctx)?;
                }
                Ok(current)
            }
            SchemaNode::Reference { .. } => {
                let resolved = self.resolve_schema(source, ctx)?;
                if matches!(resolved, SchemaNode::Reference { .. }) {
                    return Ok(builders
                        .into_iter()
                        .map(ObjectBuilder::unsupported_spread)
                        .collect());
                }
                self.apply_spread(builders, &resolved, ctx)
            }
            other => Ok(builders.into_iter().map(|b| b.spread(other)).collect()),
        }
    }

    // =========================================================================
    // Array literals
    // =========================================================================

    /// Elements are deduplicated and unioned into one `array`. Spreads of
    /// tuples and arrays contribute their elements.
    pub(crate) fn evaluate_array_literal(
        &self,
        elements: &[NodeIndex],
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        let mut items = Vec::with_capacity(elements.len());
        for &element in elements {
            match self.host.arena.data(element) {
                Some(NodeData::SpreadElement { expression }) => {
                    let source = self.schema_of_node(*expression, ctx)?;
                    for alternative in alternatives(&source) {
                        items.extend(self.spread_elements(alternative, element, ctx)?);
                    }
                }
                _ => items.push(self.schema_of_node(element, ctx)?),
            }
        }
        if items.is_empty() {
            return Ok(SchemaNode::array(SchemaNode::never()));
        }
        Ok(SchemaNode::array(union(items)))
    }

    fn spread_elements(
        &self,
        source: SchemaNode,
        spread: NodeIndex,
        ctx: &EvaluationContext,
    ) -> Result<Vec<SchemaNode>> {
        Ok(match source {
            SchemaNode::Tuple { items, element_flags } => items
                .into_iter()
                .zip(element_flags)
                .map(|(item, flag)| match (flag, item) {
                    (ElementFlag::Rest, SchemaNode::Array { items }) => *items,
                    (ElementFlag::Optional, item) => union([item, SchemaNode::undefined()]),
                    (_, item) => item,
                })
                .collect(),
            SchemaNode::Array { items } => vec![*items],
            SchemaNode::Reference {
                ref name,
                ref type_args,
                ..
            } if matches!(name.as_str(), "Array" | "ReadonlyArray" | "Set" | "ReadonlySet")
                && type_args.len() == 1 =>
            {
                type_args.clone()
            }
            reference @ SchemaNode::Reference { .. } => {
                let resolved = self.resolve_schema(&reference, ctx)?;
                if matches!(resolved, SchemaNode::Reference { .. }) {
                    vec![SchemaNode::Primitive {
                        name: PrimitiveKind::Unknown,
                        origin: Some(spread),
                    }]
                } else {
                    self.spread_elements(resolved, spread, ctx)?
                }
            }
            SchemaNode::Literal {
                value: SchemaLiteral::String(text),
            } => text
                .chars()
                .map(|c| SchemaNode::string(c.to_string()))
                .collect(),
            SchemaNode::Primitive {
                name: PrimitiveKind::String,
                ..
            } => vec![SchemaNode::primitive(PrimitiveKind::String)],
            SchemaNode::Primitive {
                name: PrimitiveKind::Any,
                ..
            } => vec![SchemaNode::any()],
            _ => vec![SchemaNode::Primitive {
                name: PrimitiveKind::Unknown,
                origin: Some(spread),
            }],
        })
    }

    // =========================================================================
    // Property reads
    // =========================================================================

    pub(super) fn evaluate_property_access(
        &self,
        expression: NodeIndex,
        name: NodeIndex,
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        let Some(key) = self.host.arena.identifier_text(name) else {
            return Ok(None);
        };
        let object = self.schema_of_node(expression, ctx)?;
        self.read_property(&object, key, ctx)
    }

    pub(super) fn evaluate_element_access(
        &self,
        expression: NodeIndex,
        argument: NodeIndex,
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        let object = self.schema_of_node(expression, ctx)?;
        let index = self.schema_of_node(argument, ctx)?;
        let mut values = Vec::new();
        for alternative in alternatives(&index) {
            let Some(key) = alternative.as_literal() else {
                return Ok(None);
            };
            match self.read_property(&object, &to_js_string(key), ctx)? {
                Some(value) => values.push(value),
                None => return Ok(None),
            }
        }
        Ok(Some(union(values)))
    }

    /// Read a statically known property. `None` when the schema cannot
    /// answer, so the caller falls back to the nominal type.
    pub(crate) fn read_property(
        &self,
        object: &SchemaNode,
        key: &str,
        ctx: &EvaluationContext,
    ) -> Result<Option<SchemaNode>> {
        Ok(match object {
            SchemaNode::Object {
                properties,
                abstract_index_keys,
            } => match properties.get(key) {
                Some(value) => Some(value.clone()),
                None => {
                    let matching: Vec<SchemaNode> = abstract_index_keys
                        .iter()
                        .filter(|(index, _)| key_matches(index, key))
                        .map(|(_, value)| value.clone())
                        .collect();
                    (!matching.is_empty()).then(|| union(matching))
                }
            },
            SchemaNode::Tuple { items, element_flags } => {
                let fixed = element_flags.iter().all(|f| *f == ElementFlag::Required);
                if key == "length" {
                    fixed.then(|| SchemaNode::number(items.len() as f64))
                } else {
                    key.parse::<usize>()
                        .ok()
                        .and_then(|i| Some((items.get(i)?, element_flags.get(i)?)))
                        .and_then(|(item, flag)| match flag {
                            ElementFlag::Required => Some(item.clone()),
                            ElementFlag::Optional => {
                                Some(union([item.clone(), SchemaNode::undefined()]))
                            }
                            ElementFlag::Rest => None,
                        })
                }
            }
            SchemaNode::Array { items } => {
                if key == "length" {
                    Some(SchemaNode::primitive(PrimitiveKind::Number))
                } else if is_array_index(key) {
                    Some((**items).clone())
                } else {
                    None
                }
            }
            SchemaNode::Literal {
                value: SchemaLiteral::String(text),
            } => {
                if key == "length" {
                    Some(SchemaNode::number(text.encode_utf16().count() as f64))
                } else {
                    None
                }
            }
            SchemaNode::Union { items } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match self.read_property(item, key, ctx)? {
                        Some(value) => values.push(value),
                        None => return Ok(None),
                    }
                }
                Some(union(values))
            }
            SchemaNode::Intersection { items } => {
                let mut found = None;
                for item in items {
                    if let Some(value) = self.read_property(item, key, ctx)? {
                        found = Some(value);
                    }
                }
                found
            }
            SchemaNode::Reference { .. } => {
                let resolved = self.resolve_schema(object, ctx)?;
                if matches!(resolved, SchemaNode::Reference { .. }) {
                    None
                } else {
                    self.read_property(&resolved, key, ctx)?
                }
            }
            _ => None,
        })
    }
}

fn apply_keys(builders: &mut [ObjectBuilder], keys: PropertyKeys, value: SchemaNode) {
    for builder in builders.iter_mut() {
        match &keys {
            PropertyKeys::Static(names) => {
                for name in names {
                    builder.set(name.clone(), value.clone());
                }
            }
            PropertyKeys::Abstract(key) => builder.set_abstract(key.clone(), value.clone()),
        }
    }
}

fn is_array_index(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Whether an abstract index key admits the property name `key`.
fn key_matches(index: &SchemaNode, key: &str) -> bool {
    match index {
        SchemaNode::Primitive { name, .. } => match name {
            PrimitiveKind::String | PrimitiveKind::Any => true,
            PrimitiveKind::Number => !string_to_number(key).is_nan(),
            _ => false,
        },
        SchemaNode::Literal { value } => to_js_string(value) == key,
        SchemaNode::Union { items } => items.iter().any(|item| key_matches(item, key)),
        _ => false,
    }
}
