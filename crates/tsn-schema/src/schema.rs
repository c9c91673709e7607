//! Schema IR.
//!
//! A `SchemaNode` is a closed tagged union describing the narrowed shape of a
//! value. Trees are built bottom-up and never mutated afterwards; passes that
//! rewrite a tree (substitution, reference inlining) rebuild it with
//! [`SchemaNode::map_children`].
//!
//! Unresolved leaves (`primitive`, `error`, `index`, `index-access`) may carry
//! the syntax node they came from. The origin is what the call propagator
//! substitutes on; it takes no part in equality or serialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tsn_host::{BinaryOperator, NodeIndex};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Any,
    Unknown,
    Never,
    Void,
    String,
    Number,
    Boolean,
    #[serde(rename = "bigint")]
    BigInt,
    Symbol,
    Object,
}

impl PrimitiveKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Unknown => "unknown",
            Self::Never => "never",
            Self::Void => "void",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Symbol => "symbol",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a literal schema.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SchemaLiteral {
    String(String),
    Number(f64),
    /// Decimal digits, no `n` suffix.
    #[serde(rename = "bigint")]
    BigInt(String),
    Boolean(bool),
    Null,
    Undefined,
}

impl SchemaLiteral {
    /// Primitive kind this literal belongs to; `None` for `null`/`undefined`.
    pub const fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::String(_) => Some(PrimitiveKind::String),
            Self::Number(_) => Some(PrimitiveKind::Number),
            Self::BigInt(_) => Some(PrimitiveKind::BigInt),
            Self::Boolean(_) => Some(PrimitiveKind::Boolean),
            Self::Null | Self::Undefined => None,
        }
    }

    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }
}

/// Per-element flag of a tuple schema.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementFlag {
    Required,
    Optional,
    Rest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SchemaNode {
    Primitive {
        name: PrimitiveKind,
        #[serde(skip)]
        origin: Option<NodeIndex>,
    },
    Literal {
        value: SchemaLiteral,
    },
    Union {
        items: Vec<SchemaNode>,
    },
    Intersection {
        items: Vec<SchemaNode>,
    },
    #[serde(rename_all = "camelCase")]
    Tuple {
        items: Vec<SchemaNode>,
        element_flags: Vec<ElementFlag>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    #[serde(rename_all = "camelCase")]
    Object {
        properties: IndexMap<String, SchemaNode>,
        abstract_index_keys: Vec<(SchemaNode, SchemaNode)>,
    },
    #[serde(rename_all = "camelCase")]
    Function {
        parameters: Vec<(String, SchemaNode)>,
        return_type: Box<SchemaNode>,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: Box<SchemaNode>,
        right: Box<SchemaNode>,
    },
    TemplateLiteral {
        items: Vec<SchemaNode>,
    },
    Index {
        of: Box<SchemaNode>,
        #[serde(skip)]
        origin: Option<NodeIndex>,
    },
    IndexAccess {
        object: Box<SchemaNode>,
        index: Box<SchemaNode>,
        #[serde(skip)]
        origin: Option<NodeIndex>,
    },
    #[serde(rename_all = "camelCase")]
    Reference {
        name: String,
        type_args: Vec<SchemaNode>,
        stable_id: String,
    },
    Error {
        reason: String,
        #[serde(skip)]
        origin: Option<NodeIndex>,
    },
}

// =============================================================================
// Constructors
// =============================================================================

impl SchemaNode {
    pub const fn primitive(name: PrimitiveKind) -> Self {
        Self::Primitive { name, origin: None }
    }

    pub const fn unknown() -> Self {
        Self::primitive(PrimitiveKind::Unknown)
    }

    pub const fn any() -> Self {
        Self::primitive(PrimitiveKind::Any)
    }

    pub const fn never() -> Self {
        Self::primitive(PrimitiveKind::Never)
    }

    pub const fn literal(value: SchemaLiteral) -> Self {
        Self::Literal { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::literal(SchemaLiteral::String(value.into()))
    }

    pub const fn number(value: f64) -> Self {
        Self::literal(SchemaLiteral::Number(value))
    }

    pub fn bigint(digits: impl Into<String>) -> Self {
        Self::literal(SchemaLiteral::BigInt(digits.into()))
    }

    pub const fn boolean(value: bool) -> Self {
        Self::literal(SchemaLiteral::Boolean(value))
    }

    pub const fn null() -> Self {
        Self::literal(SchemaLiteral::Null)
    }

    pub const fn undefined() -> Self {
        Self::literal(SchemaLiteral::Undefined)
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
            origin: None,
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    pub fn tuple(items: Vec<SchemaNode>) -> Self {
        let element_flags = vec![ElementFlag::Required; items.len()];
        Self::Tuple {
            items,
            element_flags,
        }
    }

    pub fn object(properties: IndexMap<String, SchemaNode>) -> Self {
        Self::Object {
            properties,
            abstract_index_keys: Vec::new(),
        }
    }

    /// Object schema from `(name, schema)` pairs, in order.
    pub fn object_from<K: Into<String>>(properties: impl IntoIterator<Item = (K, SchemaNode)>) -> Self {
        Self::object(
            properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        )
    }

    pub fn binary(operator: BinaryOperator, left: SchemaNode, right: SchemaNode) -> Self {
        Self::BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Opaque reference without a registered definition (well-known types).
    pub fn well_known(name: impl Into<String>, type_args: Vec<SchemaNode>) -> Self {
        let name = name.into();
        Self::Reference {
            stable_id: name.clone(),
            name,
            type_args,
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

impl SchemaNode {
    /// The serialized `kind` tag.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive { .. } => "primitive",
            Self::Literal { .. } => "literal",
            Self::Union { .. } => "union",
            Self::Intersection { .. } => "intersection",
            Self::Tuple { .. } => "tuple",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Function { .. } => "function",
            Self::BinaryExpression { .. } => "binary-expression",
            Self::TemplateLiteral { .. } => "template-literal",
            Self::Index { .. } => "index",
            Self::IndexAccess { .. } => "index-access",
            Self::Reference { .. } => "reference",
            Self::Error { .. } => "error",
        }
    }

    pub const fn as_literal(&self) -> Option<&SchemaLiteral> {
        match self {
            Self::Literal { value } => Some(value),
            _ => None,
        }
    }

    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    pub fn is_primitive(&self, kind: PrimitiveKind) -> bool {
        matches!(self, Self::Primitive { name, .. } if *name == kind)
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Originating syntax node of an unresolved leaf.
    pub const fn origin(&self) -> Option<NodeIndex> {
        match self {
            Self::Primitive { origin, .. }
            | Self::Index { origin, .. }
            | Self::IndexAccess { origin, .. }
            | Self::Error { origin, .. } => *origin,
            _ => None,
        }
    }

    /// Whether `undefined` is one of the values this schema admits.
    pub fn accepts_undefined(&self) -> bool {
        match self {
            Self::Literal {
                value: SchemaLiteral::Undefined,
            } => true,
            Self::Primitive { name, .. } => matches!(
                name,
                PrimitiveKind::Any | PrimitiveKind::Unknown | PrimitiveKind::Void
            ),
            Self::Union { items } => items.iter().any(Self::accepts_undefined),
            _ => false,
        }
    }

    /// Visit direct children in a fixed order.
    pub fn for_each_child<'s>(&'s self, mut f: impl FnMut(&'s SchemaNode)) {
        match self {
            Self::Primitive { .. } | Self::Literal { .. } | Self::Error { .. } => {}
            Self::Union { items }
            | Self::Intersection { items }
            | Self::Tuple { items, .. }
            | Self::TemplateLiteral { items } => items.iter().for_each(f),
            Self::Array { items } => f(items),
            Self::Object {
                properties,
                abstract_index_keys,
            } => {
                properties.values().for_each(&mut f);
                for (key, value) in abstract_index_keys {
                    f(key);
                    f(value);
                }
            }
            Self::Function {
                parameters,
                return_type,
            } => {
                for (_, param) in parameters {
                    f(param);
                }
                f(return_type);
            }
            Self::BinaryExpression { left, right, .. } => {
                f(left);
                f(right);
            }
            Self::Index { of, .. } => f(of),
            Self::IndexAccess { object, index, .. } => {
                f(object);
                f(index);
            }
            Self::Reference { type_args, .. } => type_args.iter().for_each(f),
        }
    }

    /// Rebuild this node with every direct child passed through `f`.
    pub fn map_children(self, f: &mut impl FnMut(SchemaNode) -> SchemaNode) -> SchemaNode {
        match self {
            leaf @ (Self::Primitive { .. } | Self::Literal { .. } | Self::Error { .. }) => leaf,
            Self::Union { items } => Self::Union {
                items: items.into_iter().map(&mut *f).collect(),
            },
            Self::Intersection { items } => Self::Intersection {
                items: items.into_iter().map(&mut *f).collect(),
            },
            Self::Tuple {
                items,
                element_flags,
            } => Self::Tuple {
                items: items.into_iter().map(&mut *f).collect(),
                element_flags,
            },
            Self::TemplateLiteral { items } => Self::TemplateLiteral {
                items: items.into_iter().map(&mut *f).collect(),
            },
            Self::Array { items } => Self::Array {
                items: Box::new(f(*items)),
            },
            Self::Object {
                properties,
                abstract_index_keys,
            } => Self::Object {
                properties: properties
                    .into_iter()
                    .map(|(name, value)| (name, f(value)))
                    .collect(),
                abstract_index_keys: abstract_index_keys
                    .into_iter()
                    .map(|(key, value)| (f(key), f(value)))
                    .collect(),
            },
            Self::Function {
                parameters,
                return_type,
            } => Self::Function {
                parameters: parameters
                    .into_iter()
                    .map(|(name, param)| (name, f(param)))
                    .collect(),
                return_type: Box::new(f(*return_type)),
            },
            Self::BinaryExpression {
                operator,
                left,
                right,
            } => Self::BinaryExpression {
                operator,
                left: Box::new(f(*left)),
                right: Box::new(f(*right)),
            },
            Self::Index { of, origin } => Self::Index {
                of: Box::new(f(*of)),
                origin,
            },
            Self::IndexAccess {
                object,
                index,
                origin,
            } => Self::IndexAccess {
                object: Box::new(f(*object)),
                index: Box::new(f(*index)),
                origin,
            },
            Self::Reference {
                name,
                type_args,
                stable_id,
            } => Self::Reference {
                name,
                type_args: type_args.into_iter().map(&mut *f).collect(),
                stable_id,
            },
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Result of one evaluation: a root plus the named definitions that survived
/// reference reduction, keyed by stable id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Schema {
    pub root: SchemaNode,
    pub defs: IndexMap<String, SchemaNode>,
}

impl Schema {
    pub fn new(root: SchemaNode) -> Self {
        Self {
            root,
            defs: IndexMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/schema_tests.rs"]
mod schema_tests;
