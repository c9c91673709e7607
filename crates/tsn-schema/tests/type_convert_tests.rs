use super::*;
use crate::options::EvaluationOptions;
use crate::{Entry, evaluate};
use tsn_host::{HostProgram, ParamInfo, ProgramBuilder, PropertyInfo, TypeTable};

fn program_with(build: impl FnOnce(&mut TypeTable) -> TypeId) -> (HostProgram, TypeId) {
    let mut b = ProgramBuilder::new();
    let ty = build(b.types());
    (b.finish(), ty)
}

fn convert(program: &HostProgram, ty: TypeId) -> SchemaNode {
    let evaluator = SchemaEvaluator::new(program.host());
    evaluator
        .convert_type(ty, None, &EvaluationContext::default())
        .unwrap()
}

fn count_errors(node: &SchemaNode) -> usize {
    let mut count = usize::from(node.is_error());
    node.for_each_child(|child| count += count_errors(child));
    count
}

#[test]
fn test_intrinsics_and_literals() {
    let (program, ty) = program_with(|t| t.literal_string("on"));
    assert_eq!(convert(&program, ty), SchemaNode::string("on"));
    assert_eq!(convert(&program, TypeId::NULL), SchemaNode::null());
    assert_eq!(convert(&program, TypeId::UNDEFINED), SchemaNode::undefined());
    assert_eq!(
        convert(&program, TypeId::NUMBER),
        SchemaNode::primitive(PrimitiveKind::Number)
    );
}

#[test]
fn test_union_of_boolean_literals_collapses() {
    let (program, ty) = program_with(|t| {
        let yes = t.literal_boolean(true);
        let no = t.literal_boolean(false);
        t.union(vec![yes, no, TypeId::NULL])
    });
    assert_eq!(
        convert(&program, ty),
        SchemaNode::Union {
            items: vec![SchemaNode::primitive(PrimitiveKind::Boolean), SchemaNode::null()]
        }
    );
}

#[test]
fn test_tuple_keeps_element_flags() {
    let (program, ty) = program_with(|t| {
        let rest = t.array(TypeId::BOOLEAN);
        t.tuple(vec![
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
            TupleElement {
                type_id: rest,
                optional: false,
                rest: true,
            },
        ])
    });
    assert_eq!(
        convert(&program, ty),
        SchemaNode::Tuple {
            items: vec![
                SchemaNode::primitive(PrimitiveKind::String),
                SchemaNode::primitive(PrimitiveKind::Number),
                SchemaNode::primitive(PrimitiveKind::Boolean),
            ],
            element_flags: vec![ElementFlag::Required, ElementFlag::Optional, ElementFlag::Rest],
        }
    );
}

#[test]
fn test_object_properties_and_index_signatures() {
    let (program, ty) = program_with(|t| {
        let param = t.type_parameter("T", None);
        t.object(ObjectShape {
            properties: vec![
                PropertyInfo::new("id", TypeId::NUMBER),
                PropertyInfo::new("label", TypeId::STRING).optional(),
                PropertyInfo::new("value", TypeId::BOOLEAN).declared_as(param),
            ],
            index_infos: vec![tsn_host::IndexInfo {
                key_type: TypeId::STRING,
                value_type: TypeId::UNKNOWN,
            }],
            ..ObjectShape::default()
        })
    });
    assert_eq!(
        convert(&program, ty),
        SchemaNode::Object {
            properties: indexmap::IndexMap::from([
                ("id".to_string(), SchemaNode::primitive(PrimitiveKind::Number)),
                (
                    "label".to_string(),
                    union([SchemaNode::primitive(PrimitiveKind::String), SchemaNode::undefined()])
                ),
                ("value".to_string(), SchemaNode::primitive(PrimitiveKind::Boolean)),
            ]),
            abstract_index_keys: vec![(SchemaNode::primitive(PrimitiveKind::String), SchemaNode::unknown())],
        }
    );
}

#[test]
fn test_callable_type_becomes_function() {
    let (program, ty) = program_with(|t| {
        t.function(
            vec![ParamInfo {
                name: "n".to_string(),
                type_id: TypeId::NUMBER,
                optional: false,
                rest: false,
            }],
            TypeId::STRING,
        )
    });
    assert_eq!(
        convert(&program, ty),
        SchemaNode::Function {
            parameters: vec![("n".to_string(), SchemaNode::primitive(PrimitiveKind::Number))],
            return_type: Box::new(SchemaNode::primitive(PrimitiveKind::String)),
        }
    );
}

#[test]
fn test_circular_interface_yields_one_error() {
    let (program, ty) = program_with(|t| {
        let node = t.reserve();
        let next = t.union(vec![node, TypeId::NULL]);
        t.define(
            node,
            TypeData::Object(ObjectShape {
                name: Some("Node".to_string()),
                properties: vec![
                    PropertyInfo::new("value", TypeId::NUMBER),
                    PropertyInfo::new("next", next),
                ],
                ..ObjectShape::default()
            }),
        );
        node
    });
    let schema = convert(&program, ty);
    assert_eq!(count_errors(&schema), 1);
    let SchemaNode::Object { properties, .. } = &schema else {
        panic!("expected object, got {schema:?}");
    };
    assert_eq!(
        properties.get("next"),
        Some(&SchemaNode::Union {
            items: vec![SchemaNode::error(CIRCULAR_TYPE), SchemaNode::null()]
        })
    );
}

#[test]
fn test_well_known_types_become_references() {
    let (program, ty) = program_with(|t| t.named_object("Date"));
    assert_eq!(convert(&program, ty), SchemaNode::well_known("Date", Vec::new()));

    let (program, ty) = program_with(|t| {
        let target = t.named_object("Promise");
        let body = t.object_with(vec![("then", TypeId::ANY)]);
        t.application("Promise", target, vec![TypeId::NUMBER], body)
    });
    assert_eq!(
        convert(&program, ty),
        SchemaNode::well_known("Promise", vec![SchemaNode::primitive(PrimitiveKind::Number)])
    );
}

#[test]
fn test_generic_application_registers_definition() {
    let (program, ty) = program_with(|t| {
        let param = t.type_parameter("T", None);
        let target = t.object_with(vec![("value", param)]);
        let body = t.object_with(vec![("value", TypeId::NUMBER)]);
        t.application("Box", target, vec![TypeId::NUMBER], body)
    });
    let ctx = EvaluationContext::default();
    let evaluator = SchemaEvaluator::new(program.host());
    let schema = evaluator.convert_type(ty, None, &ctx).unwrap();
    assert_eq!(
        schema,
        SchemaNode::Reference {
            name: "Box".to_string(),
            type_args: vec![SchemaNode::primitive(PrimitiveKind::Number)],
            stable_id: "Box<number>".to_string(),
        }
    );
    assert_eq!(ctx.definitions().borrow().pending(), vec!["Box<number>".to_string()]);

    let body = evaluator.resolve_schema(&schema, &ctx).unwrap();
    assert_eq!(
        body,
        SchemaNode::object_from([("value", SchemaNode::primitive(PrimitiveKind::Number))])
    );
    assert!(ctx.definitions().borrow().pending().is_empty());
}

#[test]
fn test_single_use_definition_is_inlined() {
    let (program, ty) = program_with(|t| {
        let target = t.reserve();
        let body = t.object_with(vec![("value", TypeId::STRING)]);
        t.application("Box", target, vec![TypeId::STRING], body)
    });
    let entry = Entry::Type { ty, node: None };

    let inlined = evaluate(program.host(), entry, &EvaluationContext::default()).unwrap();
    assert!(inlined.defs.is_empty());
    assert_eq!(
        inlined.root,
        SchemaNode::object_from([("value", SchemaNode::primitive(PrimitiveKind::String))])
    );

    let options = EvaluationOptions {
        inline_single_use_definitions: false,
        ..EvaluationOptions::default()
    };
    let kept = evaluate(program.host(), entry, &EvaluationContext::new(options)).unwrap();
    assert_eq!(kept.defs.len(), 1);
    assert!(kept.defs.contains_key("Box<string>"));
}

#[test]
fn test_recursive_application_keeps_definition() {
    let (program, ty) = program_with(|t| {
        let list = t.reserve();
        let target = t.reserve();
        let next = t.union(vec![list, TypeId::UNDEFINED]);
        let body = t.object_with(vec![("value", TypeId::NUMBER), ("next", next)]);
        t.define(
            list,
            TypeData::Application {
                name: "List".to_string(),
                target,
                args: vec![TypeId::NUMBER],
                body,
            },
        );
        list
    });
    let schema = evaluate(
        program.host(),
        Entry::Type { ty, node: None },
        &EvaluationContext::default(),
    )
    .unwrap();
    let reference = SchemaNode::Reference {
        name: "List".to_string(),
        type_args: vec![SchemaNode::primitive(PrimitiveKind::Number)],
        stable_id: "List<number>".to_string(),
    };
    assert_eq!(schema.root, reference);
    assert_eq!(
        schema.defs.get("List<number>"),
        Some(&SchemaNode::object_from([
            ("value", SchemaNode::primitive(PrimitiveKind::Number)),
            ("next", union([reference.clone(), SchemaNode::undefined()])),
        ]))
    );
}

#[test]
fn test_unregistered_reference_is_fatal_unless_well_known() {
    let program = ProgramBuilder::new().finish();
    let evaluator = SchemaEvaluator::new(program.host());
    let ctx = EvaluationContext::default();

    let date = SchemaNode::well_known("Date", Vec::new());
    assert_eq!(evaluator.resolve_schema(&date, &ctx).unwrap(), SchemaNode::unknown());

    let missing = SchemaNode::well_known("Widget", Vec::new());
    let err = evaluator.resolve_schema(&missing, &ctx).unwrap_err();
    assert!(matches!(err, EvaluationError::DefinitionNotFound { ref stable_id } if stable_id == "Widget"));
}

#[test]
fn test_node_less_conversions_are_cached() {
    let (program, ty) = program_with(|t| t.object_with(vec![("a", TypeId::NUMBER)]));
    let evaluator = SchemaEvaluator::new(program.host());
    let ctx = EvaluationContext::default();
    assert!(ctx.cached_type(ty).is_none());
    let first = evaluator.convert_type(ty, None, &ctx).unwrap();
    assert_eq!(ctx.cached_type(ty), Some(first.clone()));
    assert_eq!(evaluator.convert_type(ty, None, &ctx.child(false)).unwrap(), first);
}

#[test]
fn test_exhausted_budget_degrades_to_unknown() {
    let (program, ty) = program_with(|t| t.object_with(vec![("a", TypeId::NUMBER)]));
    let options = EvaluationOptions {
        max_depth: 0,
        ..EvaluationOptions::default()
    };
    let ctx = EvaluationContext::new(options);
    let evaluator = SchemaEvaluator::new(program.host());
    assert_eq!(evaluator.convert_type(ty, None, &ctx).unwrap(), SchemaNode::unknown());
    assert_eq!(ctx.degraded_count(), 1);
}
