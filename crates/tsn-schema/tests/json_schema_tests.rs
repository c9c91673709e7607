use super::*;
use crate::algebra::union;
use tsn_host::BinaryOperator;

fn number() -> SchemaNode {
    SchemaNode::primitive(PrimitiveKind::Number)
}

#[test]
fn test_literal_union_becomes_enum() {
    let schema = Schema::new(union([SchemaNode::string("a"), SchemaNode::string("b")]));
    assert_eq!(to_json_schema(&schema), json!({ "enum": ["a", "b"] }));
}

#[test]
fn test_mixed_union_becomes_any_of() {
    let schema = Schema::new(union([SchemaNode::string("a"), number()]));
    assert_eq!(
        to_json_schema(&schema),
        json!({ "anyOf": [{ "const": "a" }, { "type": "number" }] })
    );
}

#[test]
fn test_optional_property_is_not_required() {
    let obj = SchemaNode::object_from([
        ("id", number()),
        ("name", union([SchemaNode::primitive(PrimitiveKind::String), SchemaNode::undefined()])),
    ]);
    assert_eq!(
        to_json_schema(&Schema::new(obj)),
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "number" },
                "name": { "type": "string" }
            },
            "required": ["id"]
        })
    );
}

#[test]
fn test_index_keys_map_to_additional_and_pattern_properties() {
    let obj = SchemaNode::Object {
        properties: IndexMap::new(),
        abstract_index_keys: vec![
            (SchemaNode::primitive(PrimitiveKind::String), SchemaNode::boolean(true)),
            (number(), SchemaNode::null()),
        ],
    };
    let value = to_json_schema(&Schema::new(obj));
    assert_eq!(value["additionalProperties"], json!({ "const": true }));
    let patterns = value["patternProperties"].as_object().map(|m| m.len());
    assert_eq!(patterns, Some(1));
}

#[test]
fn test_tuple_with_optional_and_rest() {
    let tuple = SchemaNode::Tuple {
        items: vec![SchemaNode::string("x"), number(), SchemaNode::boolean(true)],
        element_flags: vec![ElementFlag::Required, ElementFlag::Optional, ElementFlag::Rest],
    };
    assert_eq!(
        to_json_schema(&Schema::new(tuple)),
        json!({
            "type": "array",
            "minItems": 1,
            "prefixItems": [{ "const": "x" }, { "type": "number" }],
            "items": { "const": true }
        })
    );
}

#[test]
fn test_closed_tuple_has_max_items() {
    let value = to_json_schema(&Schema::new(SchemaNode::tuple(vec![number()])));
    assert_eq!(value["maxItems"], json!(1));
    assert_eq!(value["items"], json!(false));
}

#[test]
fn test_well_known_references() {
    let date = SchemaNode::well_known("Date", Vec::new());
    assert_eq!(
        to_json_schema(&Schema::new(date)),
        json!({ "type": "string", "format": "date-time" })
    );
    let promise = SchemaNode::well_known("Promise", vec![SchemaNode::number(1.0)]);
    assert_eq!(to_json_schema(&Schema::new(promise)), json!({ "const": 1.0 }));
    let map = SchemaNode::well_known("Map", vec![SchemaNode::primitive(PrimitiveKind::String), number()]);
    assert_eq!(
        to_json_schema(&Schema::new(map)),
        json!({ "type": "object", "additionalProperties": { "type": "number" } })
    );
}

#[test]
fn test_definitions_are_referenced_through_defs() {
    let reference = SchemaNode::Reference {
        name: "Pair".to_string(),
        type_args: vec![number()],
        stable_id: "Pair<a/b>".to_string(),
    };
    let mut schema = Schema::new(SchemaNode::object_from([("p", reference)]));
    schema
        .defs
        .insert("Pair<a/b>".to_string(), SchemaNode::tuple(vec![number(), number()]));
    let value = to_json_schema(&schema);
    assert_eq!(value["properties"]["p"], json!({ "$ref": "#/$defs/Pair<a~1b>" }));
    assert_eq!(value["$defs"]["Pair<a/b>"]["type"], json!("array"));
}

#[test]
fn test_symbolic_nodes() {
    let sum = SchemaNode::binary(BinaryOperator::Add, number(), SchemaNode::number(1.0));
    assert_eq!(to_json_schema(&Schema::new(sum)), json!({ "type": "number" }));
    let err = SchemaNode::error("Circular type");
    assert_eq!(to_json_schema(&Schema::new(err)), json!({ "$comment": "Circular type" }));
    assert_eq!(to_json_schema(&Schema::new(SchemaNode::bigint("12"))), json!({ "const": 12 }));
    assert_eq!(
        to_json_schema(&Schema::new(SchemaNode::number(f64::NAN))),
        json!({ "type": "number" })
    );
}

#[test]
fn test_template_literal_pattern() {
    let template = SchemaNode::TemplateLiteral {
        items: vec![SchemaNode::string("v."), number()],
    };
    let value = to_json_schema(&Schema::new(template));
    assert_eq!(value["type"], json!("string"));
    let pattern = value["pattern"].as_str().unwrap_or_default();
    assert!(pattern.starts_with("^v\\."));
    assert!(pattern.ends_with('$'));
}
