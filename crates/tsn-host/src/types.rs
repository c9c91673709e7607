//! Type model spoken by the type oracle.
//!
//! `TypeId` is an opaque handle; `TypeData` describes the structure behind it.
//! The intrinsic types are pre-allocated at fixed ids so that both hosts and
//! the engine can name them without a lookup.

use crate::node::NodeIndex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const ANY: TypeId = TypeId(0);
    pub const UNKNOWN: TypeId = TypeId(1);
    pub const NEVER: TypeId = TypeId(2);
    pub const VOID: TypeId = TypeId(3);
    pub const UNDEFINED: TypeId = TypeId(4);
    pub const NULL: TypeId = TypeId(5);
    pub const BOOLEAN: TypeId = TypeId(6);
    pub const NUMBER: TypeId = TypeId(7);
    pub const STRING: TypeId = TypeId(8);
    pub const BIGINT: TypeId = TypeId(9);
    pub const SYMBOL: TypeId = TypeId(10);
    pub const OBJECT: TypeId = TypeId(11);

    /// First id available for non-intrinsic types.
    pub const FIRST_USER: u32 = 12;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Any,
    Unknown,
    Never,
    Void,
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    BigInt,
    Symbol,
    Object,
}

impl IntrinsicKind {
    const ALL: [IntrinsicKind; 12] = [
        Self::Any,
        Self::Unknown,
        Self::Never,
        Self::Void,
        Self::Undefined,
        Self::Null,
        Self::Boolean,
        Self::Number,
        Self::String,
        Self::BigInt,
        Self::Symbol,
        Self::Object,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Unknown => "unknown",
            Self::Never => "never",
            Self::Void => "void",
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::BigInt => "bigint",
            Self::Symbol => "symbol",
            Self::Object => "object",
        }
    }
}

/// Value of a literal type.
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    /// Decimal digits without the `n` suffix.
    BigInt(String),
    Boolean(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TupleElement {
    pub type_id: TypeId,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateTypeSpan {
    Text(String),
    Type(TypeId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyInfo {
    pub name: String,
    /// Type as seen through the (possibly instantiated) owner.
    pub type_id: TypeId,
    /// Type written at the declaration site.
    pub declared_type: TypeId,
    pub optional: bool,
    pub declaration: Option<NodeIndex>,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
            declared_type: type_id,
            optional: false,
            declaration: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn declared_as(mut self, declared_type: TypeId) -> Self {
        self.declared_type = declared_type;
        self
    }

    pub fn declared_at(mut self, declaration: NodeIndex) -> Self {
        self.declaration = Some(declaration);
        self
    }
}

/// A `[key: K]: V` index signature.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexInfo {
    pub key_type: TypeId,
    pub value_type: TypeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub type_id: TypeId,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    pub parameters: Vec<ParamInfo>,
    pub return_type: TypeId,
    pub declaration: Option<NodeIndex>,
}

/// Object, class and interface structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectShape {
    /// Nominal name for interfaces, classes and library types.
    pub name: Option<String>,
    pub properties: Vec<PropertyInfo>,
    pub index_infos: Vec<IndexInfo>,
    pub call_signatures: Vec<Signature>,
    /// Object literal expression this type was inferred from.
    pub literal: Option<NodeIndex>,
}

/// Structural description of a type.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeData {
    Intrinsic(IntrinsicKind),
    Literal(LiteralValue),
    Union(Vec<TypeId>),
    Intersection(Vec<TypeId>),
    Array(TypeId),
    Tuple(Vec<TupleElement>),
    Object(ObjectShape),
    TemplateLiteral(Vec<TemplateTypeSpan>),
    /// `keyof T`
    KeyOf(TypeId),
    /// `T[K]`
    IndexAccess {
        object: TypeId,
        index: TypeId,
    },
    TypeParameter {
        name: String,
        constraint: Option<TypeId>,
    },
    /// Generic instantiation `Name<Args>`.
    Application {
        name: String,
        /// Identity of the generic declaration.
        target: TypeId,
        args: Vec<TypeId>,
        /// Instantiated structure.
        body: TypeId,
    },
}

// =============================================================================
// TypeTable
// =============================================================================

/// Append-only type storage with pre-allocated intrinsics.
#[derive(Clone, Debug)]
pub struct TypeTable {
    types: Vec<TypeData>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let types = IntrinsicKind::ALL
            .iter()
            .map(|&kind| TypeData::Intrinsic(kind))
            .collect::<Vec<_>>();
        debug_assert_eq!(types.len() as u32, TypeId::FIRST_USER);
        Self { types }
    }

    #[inline]
    pub fn lookup(&self, id: TypeId) -> Option<&TypeData> {
        self.types.get(id.0 as usize)
    }

    pub fn alloc(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    /// Reserve an id whose structure is provided later by [`define`](Self::define).
    /// Needed for self-referential types such as `type T = { self: T }`.
    pub fn reserve(&mut self) -> TypeId {
        self.alloc(TypeData::Intrinsic(IntrinsicKind::Unknown))
    }

    pub fn define(&mut self, id: TypeId, data: TypeData) {
        if let Some(slot) = self.types.get_mut(id.0 as usize) {
            *slot = data;
        }
    }

    // -------------------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------------------

    pub fn literal_string(&mut self, value: impl Into<String>) -> TypeId {
        self.alloc(TypeData::Literal(LiteralValue::String(value.into())))
    }

    pub fn literal_number(&mut self, value: f64) -> TypeId {
        self.alloc(TypeData::Literal(LiteralValue::Number(value)))
    }

    pub fn literal_bigint(&mut self, digits: impl Into<String>) -> TypeId {
        self.alloc(TypeData::Literal(LiteralValue::BigInt(digits.into())))
    }

    pub fn literal_boolean(&mut self, value: bool) -> TypeId {
        self.alloc(TypeData::Literal(LiteralValue::Boolean(value)))
    }

    pub fn union(&mut self, members: Vec<TypeId>) -> TypeId {
        self.alloc(TypeData::Union(members))
    }

    pub fn intersection(&mut self, members: Vec<TypeId>) -> TypeId {
        self.alloc(TypeData::Intersection(members))
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        self.alloc(TypeData::Array(element))
    }

    pub fn tuple(&mut self, elements: Vec<TupleElement>) -> TypeId {
        self.alloc(TypeData::Tuple(elements))
    }

    pub fn object(&mut self, shape: ObjectShape) -> TypeId {
        self.alloc(TypeData::Object(shape))
    }

    /// Anonymous object type with the given required properties.
    pub fn object_with(&mut self, properties: Vec<(&str, TypeId)>) -> TypeId {
        let properties = properties
            .into_iter()
            .map(|(name, ty)| PropertyInfo::new(name, ty))
            .collect();
        self.object(ObjectShape {
            properties,
            ..ObjectShape::default()
        })
    }

    /// Function type with one call signature.
    pub fn function(&mut self, parameters: Vec<ParamInfo>, return_type: TypeId) -> TypeId {
        self.object(ObjectShape {
            call_signatures: vec![Signature {
                parameters,
                return_type,
                declaration: None,
            }],
            ..ObjectShape::default()
        })
    }

    /// Opaque library object type such as `Date` or `RegExp`.
    pub fn named_object(&mut self, name: impl Into<String>) -> TypeId {
        self.object(ObjectShape {
            name: Some(name.into()),
            ..ObjectShape::default()
        })
    }

    pub fn template_literal(&mut self, spans: Vec<TemplateTypeSpan>) -> TypeId {
        self.alloc(TypeData::TemplateLiteral(spans))
    }

    pub fn keyof(&mut self, operand: TypeId) -> TypeId {
        self.alloc(TypeData::KeyOf(operand))
    }

    pub fn index_access(&mut self, object: TypeId, index: TypeId) -> TypeId {
        self.alloc(TypeData::IndexAccess { object, index })
    }

    pub fn type_parameter(&mut self, name: impl Into<String>, constraint: Option<TypeId>) -> TypeId {
        self.alloc(TypeData::TypeParameter {
            name: name.into(),
            constraint,
        })
    }

    pub fn application(
        &mut self,
        name: impl Into<String>,
        target: TypeId,
        args: Vec<TypeId>,
        body: TypeId,
    ) -> TypeId {
        self.alloc(TypeData::Application {
            name: name.into(),
            target,
            args,
            body,
        })
    }

    // -------------------------------------------------------------------------
    // Display
    // -------------------------------------------------------------------------

    /// TypeScript-like display text.
    pub fn display(&self, id: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, id, 0);
        out
    }

    fn write_list(&self, out: &mut String, ids: &[TypeId], sep: &str, depth: u32) {
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write_type(out, id, depth + 1);
        }
    }

    fn write_type(&self, out: &mut String, id: TypeId, depth: u32) {
        // Self-referential types print their name (or `...`) past this depth.
        if depth > 8 {
            out.push_str("...");
            return;
        }
        let Some(data) = self.lookup(id) else {
            out.push_str("error");
            return;
        };
        match data {
            TypeData::Intrinsic(kind) => out.push_str(kind.as_str()),
            TypeData::Literal(LiteralValue::String(s)) => {
                let _ = write!(out, "{s:?}");
            }
            TypeData::Literal(LiteralValue::Number(n)) => {
                let _ = write!(out, "{n}");
            }
            TypeData::Literal(LiteralValue::BigInt(b)) => {
                let _ = write!(out, "{b}n");
            }
            TypeData::Literal(LiteralValue::Boolean(b)) => {
                let _ = write!(out, "{b}");
            }
            TypeData::Union(members) => self.write_list(out, members, " | ", depth),
            TypeData::Intersection(members) => self.write_list(out, members, " & ", depth),
            TypeData::Array(element) => {
                self.write_type(out, *element, depth + 1);
                out.push_str("[]");
            }
            TypeData::Tuple(elements) => {
                out.push('[');
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if element.rest {
                        out.push_str("...");
                    }
                    self.write_type(out, element.type_id, depth + 1);
                    if element.optional {
                        out.push('?');
                    }
                }
                out.push(']');
            }
            TypeData::Object(shape) => {
                if let Some(name) = &shape.name {
                    out.push_str(name);
                    return;
                }
                if let [signature] = shape.call_signatures.as_slice()
                    && shape.properties.is_empty()
                {
                    out.push('(');
                    for (i, param) in signature.parameters.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        let _ = write!(out, "{}: ", param.name);
                        self.write_type(out, param.type_id, depth + 1);
                    }
                    out.push_str(") => ");
                    self.write_type(out, signature.return_type, depth + 1);
                    return;
                }
                out.push_str("{ ");
                for prop in &shape.properties {
                    out.push_str(&prop.name);
                    if prop.optional {
                        out.push('?');
                    }
                    out.push_str(": ");
                    self.write_type(out, prop.type_id, depth + 1);
                    out.push_str("; ");
                }
                out.push('}');
            }
            TypeData::TemplateLiteral(spans) => {
                out.push('`');
                for span in spans {
                    match span {
                        TemplateTypeSpan::Text(text) => out.push_str(text),
                        TemplateTypeSpan::Type(ty) => {
                            out.push_str("${");
                            self.write_type(out, *ty, depth + 1);
                            out.push('}');
                        }
                    }
                }
                out.push('`');
            }
            TypeData::KeyOf(operand) => {
                out.push_str("keyof ");
                self.write_type(out, *operand, depth + 1);
            }
            TypeData::IndexAccess { object, index } => {
                self.write_type(out, *object, depth + 1);
                out.push('[');
                self.write_type(out, *index, depth + 1);
                out.push(']');
            }
            TypeData::TypeParameter { name, .. } => out.push_str(name),
            TypeData::Application { name, args, .. } => {
                out.push_str(name);
                out.push('<');
                self.write_list(out, args, ", ", depth);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod types_tests;
