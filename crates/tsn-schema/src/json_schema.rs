//! JSON Schema (2020-12) printer.
//!
//! Definitions land under `$defs` and are referenced with `$ref`. Library
//! references map onto their JSON shape (`Date` → date-time string,
//! `Array<T>` → array, `Promise<T>` → `T`); schema kinds JSON cannot express
//! (functions, errors) become permissive schemas with a `description` or
//! `$comment`.

use crate::literal_ops::parse_bigint;
use crate::printer::{binary_result_kind, print_type};
use crate::schema::{ElementFlag, PrimitiveKind, Schema, SchemaLiteral, SchemaNode};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};

const NUMBER_PATTERN: &str = "-?(?:0|[1-9][0-9]*)(?:\\.[0-9]+)?(?:[eE][+-]?[0-9]+)?";

/// Render a schema (root plus definitions) as a JSON Schema document.
pub fn to_json_schema(schema: &Schema) -> Value {
    let printer = JsonSchemaPrinter { defs: &schema.defs };
    let mut root = printer.node(&schema.root);
    if !schema.defs.is_empty()
        && let Value::Object(map) = &mut root
    {
        let defs: Map<String, Value> = schema
            .defs
            .iter()
            .map(|(id, body)| (id.clone(), printer.node(body)))
            .collect();
        map.insert("$defs".to_string(), Value::Object(defs));
    }
    root
}

/// Escape a definition key for use in a JSON pointer.
fn pointer_escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn regex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn literal_value(value: &SchemaLiteral) -> Option<Value> {
    match value {
        SchemaLiteral::String(s) => Some(Value::String(s.clone())),
        SchemaLiteral::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number),
        SchemaLiteral::BigInt(digits) => {
            let n = parse_bigint(digits)?;
            i64::try_from(n).ok().map(Value::from)
        }
        SchemaLiteral::Boolean(b) => Some(Value::Bool(*b)),
        SchemaLiteral::Null => Some(Value::Null),
        SchemaLiteral::Undefined => None,
    }
}

fn primitive(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::String => json!({ "type": "string" }),
        PrimitiveKind::Number => json!({ "type": "number" }),
        PrimitiveKind::Boolean => json!({ "type": "boolean" }),
        PrimitiveKind::BigInt => json!({ "type": "integer" }),
        PrimitiveKind::Object => json!({ "type": "object" }),
        PrimitiveKind::Never => json!({ "not": {} }),
        PrimitiveKind::Any | PrimitiveKind::Unknown | PrimitiveKind::Void | PrimitiveKind::Symbol => {
            json!({})
        }
    }
}

struct JsonSchemaPrinter<'s> {
    defs: &'s IndexMap<String, SchemaNode>,
}

impl<'s> JsonSchemaPrinter<'s> {
    fn node(&self, node: &SchemaNode) -> Value {
        match node {
            SchemaNode::Primitive { name, .. } => primitive(*name),
            SchemaNode::Literal { value } => self.literal(value),
            SchemaNode::Union { items } => self.union(items),
            SchemaNode::Intersection { items } => {
                json!({ "allOf": items.iter().map(|item| self.node(item)).collect::<Vec<_>>() })
            }
            SchemaNode::Tuple {
                items,
                element_flags,
            } => self.tuple(items, element_flags),
            SchemaNode::Array { items } => {
                if items.is_primitive(PrimitiveKind::Never) {
                    json!({ "type": "array", "maxItems": 0 })
                } else {
                    json!({ "type": "array", "items": self.node(items) })
                }
            }
            SchemaNode::Object {
                properties,
                abstract_index_keys,
            } => self.object(properties, abstract_index_keys),
            SchemaNode::Function { .. } => json!({ "description": print_type(node) }),
            SchemaNode::BinaryExpression {
                operator,
                left,
                right,
            } => match binary_result_kind(*operator, left, right) {
                Some(kind) => primitive(kind),
                None => json!({ "anyOf": [self.node(left), self.node(right)] }),
            },
            SchemaNode::TemplateLiteral { items } => {
                json!({ "type": "string", "pattern": format!("^{}$", template_pattern(items)) })
            }
            SchemaNode::Index { .. } => json!({ "type": ["string", "number"] }),
            SchemaNode::IndexAccess { .. } => json!({ "description": print_type(node) }),
            SchemaNode::Reference {
                name,
                type_args,
                stable_id,
            } => self.reference(name, type_args, stable_id),
            SchemaNode::Error { reason, .. } => json!({ "$comment": reason }),
        }
    }

    fn literal(&self, value: &SchemaLiteral) -> Value {
        match (value, literal_value(value)) {
            (_, Some(constant)) => json!({ "const": constant }),
            (SchemaLiteral::Number(_), None) => json!({ "type": "number" }),
            (SchemaLiteral::BigInt(_), None) => json!({ "type": "integer" }),
            _ => json!({ "not": {} }),
        }
    }

    fn union(&self, items: &[SchemaNode]) -> Value {
        let constants: Option<Vec<Value>> = items
            .iter()
            .map(|item| item.as_literal().and_then(literal_value))
            .collect();
        match constants {
            Some(values) => json!({ "enum": values }),
            None => {
                json!({ "anyOf": items.iter().map(|item| self.node(item)).collect::<Vec<_>>() })
            }
        }
    }

    fn tuple(&self, items: &[SchemaNode], flags: &[ElementFlag]) -> Value {
        let mut prefix = Vec::new();
        let mut rest = None;
        let mut min_items = 0;
        for (item, flag) in items.iter().zip(flags) {
            match flag {
                ElementFlag::Required => {
                    min_items += 1;
                    prefix.push(self.node(item));
                }
                ElementFlag::Optional => prefix.push(self.node(item)),
                ElementFlag::Rest => rest = Some(self.node(item)),
            }
        }
        let mut map = Map::new();
        map.insert("type".to_string(), json!("array"));
        map.insert("minItems".to_string(), json!(min_items));
        match rest {
            Some(rest) => {
                map.insert("prefixItems".to_string(), Value::Array(prefix));
                map.insert("items".to_string(), rest);
            }
            None => {
                map.insert("maxItems".to_string(), json!(prefix.len()));
                map.insert("prefixItems".to_string(), Value::Array(prefix));
                map.insert("items".to_string(), Value::Bool(false));
            }
        }
        Value::Object(map)
    }

    /// Properties admitting `undefined` are optional; the `undefined` member
    /// itself is dropped from their schema.
    fn object(&self, properties: &IndexMap<String, SchemaNode>, index_keys: &[(SchemaNode, SchemaNode)]) -> Value {
        let mut props = Map::new();
        let mut required = Vec::new();
        for (name, value) in properties {
            let defined = strip_undefined(value);
            let members = match value {
                SchemaNode::Union { items } => items.len(),
                _ => 1,
            };
            if defined.len() == members {
                required.push(Value::String(name.clone()));
            }
            let schema = match defined.as_slice() {
                [] => json!({ "not": {} }),
                [single] => self.node(single),
                many => self.union(&many.iter().map(|n| (*n).clone()).collect::<Vec<_>>()),
            };
            props.insert(name.clone(), schema);
        }

        let mut map = Map::new();
        map.insert("type".to_string(), json!("object"));
        if !props.is_empty() {
            map.insert("properties".to_string(), Value::Object(props));
        }
        if !required.is_empty() {
            map.insert("required".to_string(), Value::Array(required));
        }

        let mut patterns = Map::new();
        let mut additional = Vec::new();
        for (key, value) in index_keys {
            match key {
                SchemaNode::Primitive {
                    name: PrimitiveKind::Number,
                    ..
                } => {
                    patterns.insert(format!("^{NUMBER_PATTERN}$"), self.node(value));
                }
                SchemaNode::TemplateLiteral { items } => {
                    patterns.insert(format!("^{}$", template_pattern(items)), self.node(value));
                }
                _ => additional.push(self.node(value)),
            }
        }
        if !patterns.is_empty() {
            map.insert("patternProperties".to_string(), Value::Object(patterns));
        }
        match additional.len() {
            0 => {}
            1 => {
                map.insert("additionalProperties".to_string(), additional.remove(0));
            }
            _ => {
                map.insert("additionalProperties".to_string(), json!({ "anyOf": additional }));
            }
        }
        Value::Object(map)
    }

    fn reference(&self, name: &str, type_args: &[SchemaNode], stable_id: &str) -> Value {
        if self.defs.contains_key(stable_id) {
            return json!({ "$ref": format!("#/$defs/{}", pointer_escape(stable_id)) });
        }
        let arg = |i: usize| type_args.get(i).map_or_else(|| json!({}), |a| self.node(a));
        match name {
            "Date" => json!({ "type": "string", "format": "date-time" }),
            "RegExp" => json!({ "type": "string", "format": "regex" }),
            "Array" | "ReadonlyArray" => json!({ "type": "array", "items": arg(0) }),
            "Set" | "ReadonlySet" => json!({ "type": "array", "items": arg(0), "uniqueItems": true }),
            "Map" | "ReadonlyMap" => json!({ "type": "object", "additionalProperties": arg(1) }),
            "Promise" | "PromiseLike" => arg(0),
            _ => json!({ "title": name }),
        }
    }
}

fn strip_undefined(node: &SchemaNode) -> Vec<&SchemaNode> {
    let is_undefined = |n: &SchemaNode| matches!(n.as_literal(), Some(SchemaLiteral::Undefined));
    match node {
        SchemaNode::Union { items } => items.iter().filter(|n| !is_undefined(n)).collect(),
        other if is_undefined(other) => Vec::new(),
        other => vec![other],
    }
}

/// Regex body matching every string a template literal admits.
fn template_pattern(items: &[SchemaNode]) -> String {
    items.iter().map(template_item_pattern).collect()
}

fn template_item_pattern(item: &SchemaNode) -> String {
    match item {
        SchemaNode::Literal { value } => regex_escape(&crate::literal_ops::to_js_string(value)),
        SchemaNode::Primitive {
            name: PrimitiveKind::Number,
            ..
        } => NUMBER_PATTERN.to_string(),
        SchemaNode::Primitive {
            name: PrimitiveKind::BigInt,
            ..
        } => "-?[0-9]+".to_string(),
        SchemaNode::Primitive {
            name: PrimitiveKind::Boolean,
            ..
        } => "(?:true|false)".to_string(),
        SchemaNode::Union { items } => format!(
            "(?:{})",
            items
                .iter()
                .map(template_item_pattern)
                .collect::<Vec<_>>()
                .join("|")
        ),
        SchemaNode::TemplateLiteral { items } => template_pattern(items),
        _ => ".*".to_string(),
    }
}

#[cfg(test)]
#[path = "../tests/json_schema_tests.rs"]
mod json_schema_tests;
