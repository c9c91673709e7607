use super::*;
use crate::node::VariableKind;
use crate::program::ProgramBuilder;

#[test]
fn test_add_links_parents_and_covers_child_spans() {
    let mut arena = NodeArena::new();
    let left = arena.add(NodeData::NumericLiteral { value: 1.0 }, Span::new(0, 1));
    let right = arena.add(NodeData::NumericLiteral { value: 2.0 }, Span::new(4, 5));
    let sum = arena.add(
        NodeData::Binary {
            operator: crate::node::BinaryOperator::Add,
            left,
            right,
        },
        Span::new(2, 3),
    );

    assert_eq!(arena.parent(left), sum);
    assert_eq!(arena.parent(right), sum);
    assert!(arena.parent(sum).is_none());
    assert_eq!(arena.span(sum), Span::new(0, 5));
    assert_eq!(arena.children(sum).as_slice(), &[left, right]);
}

#[test]
fn test_missing_nodes_are_tolerated() {
    let arena = NodeArena::new();
    assert!(arena.data(NodeIndex(3)).is_none());
    assert!(arena.data(NodeIndex::NONE).is_none());
    assert_eq!(arena.kind_name(NodeIndex(3)), "<missing>");
    assert_eq!(arena.location(NodeIndex(3)).file, "<unknown>");
}

#[test]
fn test_property_name_text() {
    let mut b = ProgramBuilder::new();
    let ident = b.ident("foo");
    let string = b.string("bar baz");
    let int = b.num(3.0);
    let frac = b.num(1.5);
    let key = b.string("k");
    let computed = b.computed_name(key);
    let arena = b.arena();

    assert_eq!(arena.property_name_text(ident).as_deref(), Some("foo"));
    assert_eq!(arena.property_name_text(string).as_deref(), Some("bar baz"));
    assert_eq!(arena.property_name_text(int).as_deref(), Some("3"));
    assert_eq!(arena.property_name_text(frac).as_deref(), Some("1.5"));
    assert_eq!(arena.property_name_text(computed), None);
}

#[test]
fn test_declaration_names_and_navigation() {
    let mut b = ProgramBuilder::new();
    let p = b.param("x");
    let x = b.ident("x");
    let ret = b.ret(Some(x));
    let f = b.function_decl("outer", vec![p], vec![ret]);
    let one = b.num(1.0);
    let v = b.var(VariableKind::Const, "y", Some(one));
    let file = b.source_file("main.ts", vec![f, v]);
    let program = b.finish();
    let arena = program.arena();

    assert_eq!(arena.declaration_name(p), Some("x"));
    assert_eq!(arena.declaration_name(f), Some("outer"));
    assert_eq!(arena.enclosing_function(x), Some(f));
    assert_eq!(arena.enclosing_function(one), None);
    assert_eq!(arena.source_file_of(x), Some(file));
    assert_eq!(arena.source_file_of(file), Some(file));
    assert_eq!(arena.file_name_of(one), Some("main.ts"));
    assert!(arena.is_function_like(f));
    assert!(!arena.is_function_like(v));
    assert_eq!(arena.location(x).file, "main.ts");
}
