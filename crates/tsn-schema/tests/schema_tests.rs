use super::*;
use serde_json::json;

#[test]
fn test_serialized_kind_tags() {
    let value = serde_json::to_value(SchemaNode::primitive(PrimitiveKind::BigInt)).unwrap();
    assert_eq!(value, json!({ "kind": "primitive", "name": "bigint" }));

    let value = serde_json::to_value(SchemaNode::number(1.5)).unwrap();
    assert_eq!(
        value,
        json!({ "kind": "literal", "value": { "type": "number", "value": 1.5 } })
    );

    let value = serde_json::to_value(SchemaNode::undefined()).unwrap();
    assert_eq!(value, json!({ "kind": "literal", "value": { "type": "undefined" } }));
}

#[test]
fn test_serialized_field_names_are_camel_case() {
    let tuple = serde_json::to_value(SchemaNode::tuple(vec![SchemaNode::null()])).unwrap();
    assert_eq!(tuple["kind"], json!("tuple"));
    assert_eq!(tuple["elementFlags"], json!(["required"]));

    let reference = serde_json::to_value(SchemaNode::well_known("Date", Vec::new())).unwrap();
    assert_eq!(
        reference,
        json!({ "kind": "reference", "name": "Date", "typeArgs": [], "stableId": "Date" })
    );

    let sum = SchemaNode::binary(
        BinaryOperator::Add,
        SchemaNode::number(1.0),
        SchemaNode::primitive(PrimitiveKind::Number),
    );
    let value = serde_json::to_value(sum).unwrap();
    assert_eq!(value["kind"], json!("binary-expression"));
    assert_eq!(value["operator"], json!("+"));
}

#[test]
fn test_origin_is_not_serialized() {
    let param = SchemaNode::Primitive {
        name: PrimitiveKind::Any,
        origin: Some(NodeIndex(7)),
    };
    let value = serde_json::to_value(&param).unwrap();
    assert_eq!(value, json!({ "kind": "primitive", "name": "any" }));

    let back: SchemaNode = serde_json::from_value(value).unwrap();
    assert_eq!(back.origin(), None);
    assert_eq!(back, param);
}

#[test]
fn test_kind_name_matches_tag() {
    let nodes = [
        SchemaNode::error("x"),
        SchemaNode::array(SchemaNode::never()),
        SchemaNode::object(IndexMap::new()),
        SchemaNode::TemplateLiteral { items: Vec::new() },
    ];
    for node in nodes {
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["kind"], json!(node.kind_name()));
    }
}

#[test]
fn test_accepts_undefined() {
    assert!(SchemaNode::undefined().accepts_undefined());
    assert!(SchemaNode::unknown().accepts_undefined());
    assert!(!SchemaNode::null().accepts_undefined());
    let optional = SchemaNode::Union {
        items: vec![SchemaNode::string("a"), SchemaNode::undefined()],
    };
    assert!(optional.accepts_undefined());
}

#[test]
fn test_map_children_rebuilds_in_place() {
    let obj = SchemaNode::object_from([("a", SchemaNode::number(1.0)), ("b", SchemaNode::number(2.0))]);
    let doubled = obj.map_children(&mut |child| match child.as_literal() {
        Some(SchemaLiteral::Number(n)) => SchemaNode::number(n * 2.0),
        _ => child,
    });
    assert_eq!(
        doubled,
        SchemaNode::object_from([("a", SchemaNode::number(2.0)), ("b", SchemaNode::number(4.0))])
    );
}
