use super::*;

#[test]
fn test_intrinsics_are_preallocated() {
    let table = TypeTable::new();
    assert_eq!(
        table.lookup(TypeId::STRING),
        Some(&TypeData::Intrinsic(IntrinsicKind::String))
    );
    assert_eq!(
        table.lookup(TypeId::OBJECT),
        Some(&TypeData::Intrinsic(IntrinsicKind::Object))
    );
    assert!(table.lookup(TypeId(TypeId::FIRST_USER)).is_none());
}

#[test]
fn test_display_composite_types() {
    let mut table = TypeTable::new();
    let a = table.literal_string("a");
    let one = table.literal_number(1.0);
    let union = table.union(vec![a, one, TypeId::NULL]);
    assert_eq!(table.display(union), "\"a\" | 1 | null");

    let array = table.array(TypeId::NUMBER);
    assert_eq!(table.display(array), "number[]");

    let tuple = table.tuple(vec![
        TupleElement {
            type_id: TypeId::STRING,
            optional: false,
            rest: false,
        },
        TupleElement {
            type_id: TypeId::NUMBER,
            optional: true,
            rest: false,
        },
    ]);
    assert_eq!(table.display(tuple), "[string, number?]");

    let promise = table.named_object("Promise");
    let app = table.application("Promise", promise, vec![TypeId::STRING], promise);
    assert_eq!(table.display(app), "Promise<string>");
}

#[test]
fn test_display_function_and_object() {
    let mut table = TypeTable::new();
    let f = table.function(
        vec![ParamInfo {
            name: "x".to_string(),
            type_id: TypeId::NUMBER,
            optional: false,
            rest: false,
        }],
        TypeId::STRING,
    );
    assert_eq!(table.display(f), "(x: number) => string");

    let obj = table.object_with(vec![("a", TypeId::NUMBER)]);
    assert!(table.display(obj).contains("a: number;"));
}

#[test]
fn test_self_referential_display_terminates() {
    let mut table = TypeTable::new();
    let node = table.reserve();
    let body = ObjectShape {
        properties: vec![PropertyInfo::new("next", node).optional()],
        ..ObjectShape::default()
    };
    table.define(node, TypeData::Object(body));
    let text = table.display(node);
    assert!(text.contains("..."));
}
