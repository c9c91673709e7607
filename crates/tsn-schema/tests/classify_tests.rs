use super::*;
use crate::schema::PrimitiveKind;
use tsn_host::BinaryOperator;

fn number_param(origin: u32) -> SchemaNode {
    SchemaNode::Primitive {
        name: PrimitiveKind::Number,
        origin: Some(NodeIndex(origin)),
    }
}

#[test]
fn test_literals_and_their_composites_are_concrete() {
    let obj = SchemaNode::object_from([
        ("a", SchemaNode::number(1.0)),
        ("b", SchemaNode::tuple(vec![SchemaNode::string("x"), SchemaNode::null()])),
    ]);
    assert!(is_concrete_schema(&obj));
    assert!(is_concrete_schema(&SchemaNode::well_known(
        "Promise",
        vec![SchemaNode::boolean(true)]
    )));
}

#[test]
fn test_unresolved_leaves_are_not_concrete() {
    assert!(!is_concrete_schema(&SchemaNode::unknown()));
    assert!(!is_concrete_schema(&SchemaNode::error("Circular type")));
    let sum = SchemaNode::binary(BinaryOperator::Add, number_param(3), SchemaNode::number(1.0));
    assert!(!is_concrete_schema(&sum));

    let abstract_object = SchemaNode::Object {
        properties: Default::default(),
        abstract_index_keys: vec![(SchemaNode::string("k"), SchemaNode::number(1.0))],
    };
    assert!(!is_concrete_schema(&abstract_object));
}

#[test]
fn test_non_concrete_inputs_dedupes_in_order() {
    let node = SchemaNode::tuple(vec![
        number_param(7),
        SchemaNode::binary(BinaryOperator::Multiply, number_param(3), number_param(7)),
        SchemaNode::unknown(),
    ]);
    assert_eq!(non_concrete_inputs(&node), vec![NodeIndex(7), NodeIndex(3)]);
}

#[test]
fn test_equality_ignores_property_order_and_origins() {
    let a = SchemaNode::object_from([("x", number_param(1)), ("y", SchemaNode::string("s"))]);
    let b = SchemaNode::object_from([
        ("y", SchemaNode::string("s")),
        ("x", SchemaNode::primitive(PrimitiveKind::Number)),
    ]);
    assert!(are_schemas_equal(&a, &b));
    assert_eq!(a, b);
}

#[test]
fn test_nan_equals_nan_and_kinds_must_match() {
    assert_eq!(SchemaNode::number(f64::NAN), SchemaNode::number(f64::NAN));
    assert_ne!(SchemaNode::number(1.0), SchemaNode::string("1"));
    assert_ne!(
        SchemaNode::array(SchemaNode::number(1.0)),
        SchemaNode::tuple(vec![SchemaNode::number(1.0)])
    );
}

#[test]
fn test_with_origin_keeps_existing_unless_overriding() {
    let node = SchemaNode::tuple(vec![number_param(1), SchemaNode::unknown()]);
    let stamped = with_origin(node.clone(), NodeIndex(9));
    assert_eq!(non_concrete_inputs(&stamped), vec![NodeIndex(1), NodeIndex(9)]);

    let overridden = with_origin_overriding(node, NodeIndex(9));
    assert_eq!(non_concrete_inputs(&overridden), vec![NodeIndex(9)]);
}
