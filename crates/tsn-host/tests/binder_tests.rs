use super::*;
use crate::node::VariableKind;
use crate::program::ProgramBuilder;

#[test]
fn test_references_resolve_through_scope_chain() {
    let mut b = ProgramBuilder::new();
    let a = b.param("a");
    let a_ref = b.ident("a");
    let ret = b.ret(Some(a_ref));
    let f = b.function_decl("id", vec![a], vec![ret]);
    let twenty = b.num(20.0);
    let call = b.call_named("id", vec![twenty]);
    let stmt = b.expr_stmt(call);
    b.source_file("main.ts", vec![f, stmt]);
    let program = b.finish();
    let binding = program.binding();

    let param_symbol = binding.declaration_symbols[&a];
    assert_eq!(binding.node_symbols.get(&a_ref), Some(&param_symbol));

    let f_symbol = binding.declaration_symbols[&f];
    assert_eq!(binding.references[&f_symbol].len(), 1);
    assert_eq!(binding.symbol(param_symbol).map(|s| s.path.as_str()), Some("id.a"));
}

#[test]
fn test_hoisting_resolves_forward_references() {
    let mut b = ProgramBuilder::new();
    let call = b.call_named("later", vec![]);
    let stmt = b.expr_stmt(call);
    let f = b.function_decl("later", vec![], vec![]);
    b.source_file("main.ts", vec![stmt, f]);
    let program = b.finish();
    let binding = program.binding();

    let symbol = binding.declaration_symbols[&f];
    assert_eq!(binding.references.get(&symbol).map(Vec::len), Some(1));
}

#[test]
fn test_property_names_are_not_references() {
    let mut b = ProgramBuilder::new();
    let one = b.num(1.0);
    let decl = b.var(VariableKind::Const, "x", Some(one));
    let x = b.ident("x");
    let access = b.member(x, "x");
    let prop_init = b.ident("x");
    let prop = b.prop("x", prop_init);
    let obj = b.object(vec![prop]);
    let s1 = b.expr_stmt(access);
    let s2 = b.expr_stmt(obj);
    b.source_file("main.ts", vec![decl, s1, s2]);
    let program = b.finish();
    let binding = program.binding();

    let symbol = program.symbol_named("x");
    let refs = symbol.and_then(|s| binding.references.get(&s)).map(Vec::len);
    // `x.x` and `{ x: x }` each contribute one reference.
    assert_eq!(refs, Some(2));
}

#[test]
fn test_inner_scope_shadows_outer() {
    let mut b = ProgramBuilder::new();
    let outer_init = b.num(1.0);
    let outer = b.var(VariableKind::Const, "v", Some(outer_init));
    let inner_init = b.num(2.0);
    let inner = b.var(VariableKind::Const, "v", Some(inner_init));
    let v_ref = b.ident("v");
    let ret = b.ret(Some(v_ref));
    let f = b.function_decl("f", vec![], vec![inner, ret]);
    b.source_file("main.ts", vec![outer, f]);
    let program = b.finish();
    let binding = program.binding();

    let resolved = binding.node_symbols[&v_ref];
    let declaration = binding.symbol(resolved).map(|s| s.declaration);
    assert_eq!(declaration.map(|d| program.arena().parent(d)), Some(inner));
    assert_eq!(binding.symbol(resolved).map(|s| s.path.as_str()), Some("f.v"));
}
