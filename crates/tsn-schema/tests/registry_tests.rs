use super::*;
use crate::schema::PrimitiveKind;

fn reference(id: &str) -> SchemaNode {
    SchemaNode::Reference {
        name: id.split('<').next().unwrap_or(id).to_string(),
        type_args: vec![SchemaNode::primitive(PrimitiveKind::Number)],
        stable_id: id.to_string(),
    }
}

#[test]
fn test_register_reuses_stable_id_for_same_target() {
    let mut registry = DefinitionRegistry::new();
    let first = registry.register("Box", "Box<number>", TypeId(20), TypeId(21));
    let second = registry.register("Box", "Box<number>", TypeId(20), TypeId(30));
    assert_eq!(first, "Box<number>");
    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_register_suffixes_colliding_display() {
    let mut registry = DefinitionRegistry::new();
    let first = registry.register("Box", "Box<number>", TypeId(20), TypeId(21));
    let other = registry.register("Box", "Box<number>", TypeId(40), TypeId(41));
    assert_eq!(first, "Box<number>");
    assert_eq!(other, "Box<number>#2");
}

#[test]
fn test_definition_lifecycle() {
    let mut registry = DefinitionRegistry::new();
    let id = registry.register("Box", "Box<number>", TypeId(20), TypeId(21));
    assert_eq!(registry.pending(), vec![id.clone()]);
    assert_eq!(registry.begin(&id), Some(TypeId(21)));
    assert!(registry.begin(&id).is_none());
    assert!(registry.ready(&id).is_none());
    registry.complete(&id, SchemaNode::number(1.0));
    assert_eq!(registry.ready(&id), Some(&SchemaNode::number(1.0)));
    assert!(registry.pending().is_empty());
    assert_eq!(registry.ready_definitions().len(), 1);
}

#[test]
fn test_reduce_substitutes_trivial_definitions() {
    let mut defs = IndexMap::new();
    defs.insert("Alias<number>".to_string(), SchemaNode::primitive(PrimitiveKind::String));
    let root = SchemaNode::object_from([("a", reference("Alias<number>")), ("b", reference("Alias<number>"))]);

    let schema = reduce_references(root, defs, false);
    assert!(schema.defs.is_empty());
    assert_eq!(
        schema.root,
        SchemaNode::object_from([
            ("a", SchemaNode::primitive(PrimitiveKind::String)),
            ("b", SchemaNode::primitive(PrimitiveKind::String)),
        ])
    );
}

#[test]
fn test_reduce_inlines_single_use() {
    let mut defs = IndexMap::new();
    let body = SchemaNode::object_from([("value", SchemaNode::primitive(PrimitiveKind::Number))]);
    defs.insert("Box<number>".to_string(), body.clone());
    let root = SchemaNode::array(reference("Box<number>"));

    let inlined = reduce_references(root.clone(), defs.clone(), true);
    assert!(inlined.defs.is_empty());
    assert_eq!(inlined.root, SchemaNode::array(body));

    let kept = reduce_references(root, defs, false);
    assert_eq!(kept.defs.len(), 1);
}

#[test]
fn test_reduce_keeps_self_referential_definitions() {
    let mut defs = IndexMap::new();
    let list = SchemaNode::object_from([
        ("value", SchemaNode::primitive(PrimitiveKind::Number)),
        ("next", reference("List<number>")),
    ]);
    defs.insert("List<number>".to_string(), list);
    let root = reference("List<number>");

    let schema = reduce_references(root.clone(), defs, true);
    assert_eq!(schema.root, root);
    assert!(schema.defs.contains_key("List<number>"));
}

#[test]
fn test_reduce_drops_unreachable_definitions() {
    let mut defs = IndexMap::new();
    let used = SchemaNode::object_from([("x", reference("Used<number>"))]);
    defs.insert("Used<number>".to_string(), used);
    let unused = SchemaNode::object_from([("y", reference("Unused<number>"))]);
    defs.insert("Unused<number>".to_string(), unused);

    let schema = reduce_references(reference("Used<number>"), defs, true);
    assert_eq!(schema.defs.keys().collect::<Vec<_>>(), vec!["Used<number>"]);
}
