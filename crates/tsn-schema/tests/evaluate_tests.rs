use super::*;
use crate::algebra::union;
use crate::options::EvaluationOptions;
use crate::{Entry, evaluate};
use tsn_host::{
    BinaryOperator, FunctionFlags, HostProgram, ProgramBuilder, TypeId, UnaryOperator,
};

fn eval(program: &HostProgram, node: NodeIndex) -> SchemaNode {
    SchemaEvaluator::new(program.host())
        .schema_of_node(node, &EvaluationContext::default())
        .unwrap()
}

fn number() -> SchemaNode {
    SchemaNode::primitive(PrimitiveKind::Number)
}

/// Wrap expressions into statements of one source file and bind it.
fn finish_with(mut b: ProgramBuilder, expressions: &[NodeIndex]) -> HostProgram {
    let statements = expressions.iter().map(|&e| b.expr_stmt(e)).collect();
    b.source_file("main.ts", statements);
    b.finish()
}

// =============================================================================
// Literals and operators
// =============================================================================

#[test]
fn test_literals_fold_directly() {
    let mut b = ProgramBuilder::new();
    let n = b.num(1.0);
    let big = b.bigint("0x10");
    let one = b.num(1.0);
    let template = b.template("id-", vec![(one, "!")]);
    let undefined = b.ident("undefined");
    let program = finish_with(b, &[n, big, template, undefined]);

    assert_eq!(eval(&program, n), SchemaNode::number(1.0));
    assert_eq!(eval(&program, big), SchemaNode::bigint("16"));
    assert_eq!(eval(&program, template), SchemaNode::string("id-1!"));
    assert_eq!(eval(&program, undefined), SchemaNode::undefined());
}

#[test]
fn test_conditional_on_unknown_condition_unions_into_operator() {
    // function f(flag) { return (flag ? 1 : 2) + "foo" }
    let mut b = ProgramBuilder::new();
    let p = b.param("flag");
    let flag = b.ident("flag");
    let one = b.num(1.0);
    let two = b.num(2.0);
    let cond = b.conditional(flag, one, two);
    let paren = b.paren(cond);
    let foo = b.string("foo");
    let sum = b.binary(BinaryOperator::Add, paren, foo);
    let ret = b.ret(Some(sum));
    let f = b.function_decl("f", vec![p], vec![ret]);
    b.source_file("main.ts", vec![f]);
    let program = b.finish();

    assert_eq!(
        eval(&program, sum),
        union([SchemaNode::string("1foo"), SchemaNode::string("2foo")])
    );
}

#[test]
fn test_unary_and_logical_operators() {
    let mut b = ProgramBuilder::new();
    let empty = b.object(vec![]);
    let not = b.prefix(UnaryOperator::Exclamation, empty);
    let one = b.num(1.0);
    let type_of = b.prefix(UnaryOperator::TypeOf, one);
    let obj = b.object(vec![]);
    let fallback = b.num(1.0);
    let or = b.binary(BinaryOperator::LogicalOr, obj, fallback);
    let null = b.null();
    let d = b.string("d");
    let coalesce = b.binary(BinaryOperator::NullishCoalescing, null, d);
    let program = finish_with(b, &[not, type_of, or, coalesce]);

    assert_eq!(eval(&program, not), SchemaNode::boolean(false));
    assert_eq!(eval(&program, type_of), SchemaNode::string("number"));
    assert_eq!(eval(&program, or), SchemaNode::object(Default::default()));
    assert_eq!(eval(&program, coalesce), SchemaNode::string("d"));
}

// =============================================================================
// Objects and arrays
// =============================================================================

#[test]
fn test_object_literal_with_shorthand_and_computed_key() {
    // const k = "id"; const o = { k, [k]: 2 }
    let mut b = ProgramBuilder::new();
    let id = b.string("id");
    let k_decl = b.var_decl(VariableKind::Const, "k", Some(id));
    let k_stmt = b.var_statement(vec![k_decl]);
    let short = b.shorthand("k");
    let key = b.ident("k");
    let two = b.num(2.0);
    let computed = b.prop_computed(key, two);
    let obj = b.object(vec![short, computed]);
    let stmt = b.expr_stmt(obj);
    b.source_file("main.ts", vec![k_stmt, stmt]);
    let program = b.finish();

    assert_eq!(
        eval(&program, obj),
        SchemaNode::object_from([("k", SchemaNode::string("id")), ("id", SchemaNode::number(2.0))])
    );
}

#[test]
fn test_spread_of_union_forks_alternatives() {
    // function f(flag) { const base = flag ? { a: 1 } : { b: 2 }; return { ...base, c: 3 } }
    let mut b = ProgramBuilder::new();
    let p = b.param("flag");
    let flag = b.ident("flag");
    let one = b.num(1.0);
    let a = b.prop("a", one);
    let left = b.object(vec![a]);
    let two = b.num(2.0);
    let bp = b.prop("b", two);
    let right = b.object(vec![bp]);
    let cond = b.conditional(flag, left, right);
    let base_decl = b.var_decl(VariableKind::Const, "base", Some(cond));
    let base_stmt = b.var_statement(vec![base_decl]);
    let base = b.ident("base");
    let spread = b.spread_assignment(base);
    let three = b.num(3.0);
    let c = b.prop("c", three);
    let obj = b.object(vec![spread, c]);
    let ret = b.ret(Some(obj));
    let f = b.function_decl("f", vec![p], vec![base_stmt, ret]);
    b.source_file("main.ts", vec![f]);
    let program = b.finish();

    assert_eq!(
        eval(&program, obj),
        union([
            SchemaNode::object_from([("a", SchemaNode::number(1.0)), ("c", SchemaNode::number(3.0))]),
            SchemaNode::object_from([("b", SchemaNode::number(2.0)), ("c", SchemaNode::number(3.0))]),
        ])
    );
}

#[test]
fn test_spread_of_any_becomes_any_index() {
    // function f(x) { return { a: 1, ...x } }
    let mut b = ProgramBuilder::new();
    let p = b.param("x");
    let one = b.num(1.0);
    let a = b.prop("a", one);
    let x = b.ident("x");
    let spread = b.spread_assignment(x);
    let obj = b.object(vec![a, spread]);
    let ret = b.ret(Some(obj));
    let f = b.function_decl("f", vec![p], vec![ret]);
    b.source_file("main.ts", vec![f]);
    let program = b.finish();

    assert_eq!(
        eval(&program, obj),
        SchemaNode::Object {
            properties: [("a".to_string(), SchemaNode::number(1.0))].into_iter().collect(),
            abstract_index_keys: vec![(SchemaNode::any(), SchemaNode::any())],
        }
    );
}

#[test]
fn test_spread_of_unknown_is_marked_unsupported() {
    // let u; const o = { ...u }
    let mut b = ProgramBuilder::new();
    let u_decl = b.var_decl(VariableKind::Let, "u", None);
    let u_stmt = b.var_statement(vec![u_decl]);
    let u = b.ident("u");
    let spread = b.spread_assignment(u);
    let obj = b.object(vec![spread]);
    let stmt = b.expr_stmt(obj);
    b.source_file("main.ts", vec![u_stmt, stmt]);
    let program = b.finish();

    assert_eq!(
        eval(&program, obj),
        SchemaNode::Object {
            properties: Default::default(),
            abstract_index_keys: vec![(
                SchemaNode::primitive(PrimitiveKind::String),
                SchemaNode::error("Unsupported spread")
            )],
        }
    );
}

#[test]
fn test_array_literals() {
    let mut b = ProgramBuilder::new();
    let one = b.num(1.0);
    let a = b.string("a");
    let again = b.num(1.0);
    let mixed = b.array(vec![one, a, again]);
    let empty = b.array(vec![]);
    let text = b.string("ab");
    let spread = b.spread(text);
    let chars = b.array(vec![spread]);
    let program = finish_with(b, &[mixed, empty, chars]);

    assert_eq!(
        eval(&program, mixed),
        SchemaNode::array(union([SchemaNode::number(1.0), SchemaNode::string("a")]))
    );
    assert_eq!(eval(&program, empty), SchemaNode::array(SchemaNode::never()));
    assert_eq!(
        eval(&program, chars),
        SchemaNode::array(union([SchemaNode::string("a"), SchemaNode::string("b")]))
    );
}

#[test]
fn test_property_reads() {
    // const o = { a: { b: [1, 2] } }; o.a; o.a.b.length; "héllo".length
    let mut b = ProgramBuilder::new();
    let one = b.num(1.0);
    let two = b.num(2.0);
    let list = b.array(vec![one, two]);
    let bp = b.prop("b", list);
    let inner = b.object(vec![bp]);
    let ap = b.prop("a", inner);
    let outer = b.object(vec![ap]);
    let o_decl = b.var_decl(VariableKind::Const, "o", Some(outer));
    let o_stmt = b.var_statement(vec![o_decl]);
    let o1 = b.ident("o");
    let read_a = b.member(o1, "a");
    let o2 = b.ident("o");
    let a2 = b.member(o2, "a");
    let b2 = b.member(a2, "b");
    let length = b.member(b2, "length");
    let text = b.string("héllo");
    let text_length = b.member(text, "length");
    let s1 = b.expr_stmt(read_a);
    let s2 = b.expr_stmt(length);
    let s3 = b.expr_stmt(text_length);
    b.source_file("main.ts", vec![o_stmt, s1, s2, s3]);
    let program = b.finish();

    let items = union([SchemaNode::number(1.0), SchemaNode::number(2.0)]);
    assert_eq!(
        eval(&program, read_a),
        SchemaNode::object_from([("b", SchemaNode::array(items))])
    );
    assert_eq!(eval(&program, length), number());
    assert_eq!(eval(&program, text_length), SchemaNode::number(5.0));
}

// =============================================================================
// Declarations, functions and calls
// =============================================================================

#[test]
fn test_let_uses_declared_type() {
    let mut b = ProgramBuilder::new();
    let init = b.num(1.0);
    let typed = b.var_decl(VariableKind::Let, "x", Some(init));
    b.set_type(typed, TypeId::NUMBER);
    let untyped = b.var_decl(VariableKind::Let, "y", None);
    let stmt = b.var_statement(vec![typed, untyped]);
    let x = b.ident("x");
    let y = b.ident("y");
    let sx = b.expr_stmt(x);
    let sy = b.expr_stmt(y);
    b.source_file("main.ts", vec![stmt, sx, sy]);
    let program = b.finish();

    assert_eq!(eval(&program, x), number());
    assert_eq!(eval(&program, y), SchemaNode::unknown());
}

#[test]
fn test_arrow_function_schema() {
    // (x) => x + 1
    let mut b = ProgramBuilder::new();
    let p = b.param("x");
    let x = b.ident("x");
    let one = b.num(1.0);
    let body = b.binary(BinaryOperator::Add, x, one);
    let arrow = b.arrow(vec![p], body);
    let program = finish_with(b, &[arrow]);

    assert_eq!(
        eval(&program, arrow),
        SchemaNode::Function {
            parameters: vec![("x".to_string(), SchemaNode::any())],
            return_type: Box::new(SchemaNode::binary(
                BinaryOperator::Add,
                SchemaNode::any(),
                SchemaNode::number(1.0)
            )),
        }
    );
}

#[test]
fn test_call_binds_arguments_and_defaults() {
    // function add(a, b = 10) { return a + b }  add(1); add(1, 2)
    let mut b = ProgramBuilder::new();
    let pa = b.param("a");
    let ten = b.num(10.0);
    let pb = b.param_with("b", Some(ten), false);
    let a = b.ident("a");
    let bb = b.ident("b");
    let sum = b.binary(BinaryOperator::Add, a, bb);
    let ret = b.ret(Some(sum));
    let add = b.function_decl("add", vec![pa, pb], vec![ret]);
    let one = b.num(1.0);
    let first = b.call_named("add", vec![one]);
    let one_again = b.num(1.0);
    let two = b.num(2.0);
    let second = b.call_named("add", vec![one_again, two]);
    let s1 = b.expr_stmt(first);
    let s2 = b.expr_stmt(second);
    b.source_file("main.ts", vec![add, s1, s2]);
    let program = b.finish();

    assert_eq!(eval(&program, first), SchemaNode::number(11.0));
    assert_eq!(eval(&program, second), SchemaNode::number(3.0));
}

#[test]
fn test_rest_parameter_collects_tuple() {
    // const collect = (...xs) => xs; collect(1, "b")
    let mut b = ProgramBuilder::new();
    let p = b.param_with("xs", None, true);
    let xs = b.ident("xs");
    let arrow = b.arrow(vec![p], xs);
    let decl = b.var_decl(VariableKind::Const, "collect", Some(arrow));
    let stmt = b.var_statement(vec![decl]);
    let one = b.num(1.0);
    let text = b.string("b");
    let call = b.call_named("collect", vec![one, text]);
    let s = b.expr_stmt(call);
    b.source_file("main.ts", vec![stmt, s]);
    let program = b.finish();

    assert_eq!(
        eval(&program, call),
        SchemaNode::tuple(vec![SchemaNode::number(1.0), SchemaNode::string("b")])
    );
}

#[test]
fn test_recursive_call_falls_back() {
    // function spin(n) { return spin(n) }  spin(1)
    let mut b = ProgramBuilder::new();
    let p = b.param("n");
    let n = b.ident("n");
    let inner = b.call_named("spin", vec![n]);
    let ret = b.ret(Some(inner));
    let spin = b.function_decl("spin", vec![p], vec![ret]);
    let one = b.num(1.0);
    let call = b.call_named("spin", vec![one]);
    let s = b.expr_stmt(call);
    b.source_file("main.ts", vec![spin, s]);
    let program = b.finish();

    assert_eq!(eval(&program, call), SchemaNode::unknown());
}

#[test]
fn test_async_function_and_await() {
    // async function get() { return 1 }  get(); await get()
    let mut b = ProgramBuilder::new();
    let one = b.num(1.0);
    let ret = b.ret(Some(one));
    let get = b.function_decl_with("get", vec![], vec![ret], FunctionFlags::ASYNC);
    let call = b.call_named("get", vec![]);
    let call_again = b.call_named("get", vec![]);
    let awaited = b.await_expr(call_again);
    let s1 = b.expr_stmt(call);
    let s2 = b.expr_stmt(awaited);
    b.source_file("main.ts", vec![get, s1, s2]);
    let program = b.finish();

    assert_eq!(
        eval(&program, call),
        SchemaNode::well_known("Promise", vec![SchemaNode::number(1.0)])
    );
    assert_eq!(eval(&program, awaited), SchemaNode::number(1.0));
}

#[test]
fn test_function_without_returns_is_void() {
    let mut b = ProgramBuilder::new();
    let f = b.function_decl("noop", vec![], vec![]);
    b.source_file("main.ts", vec![f]);
    let program = b.finish();

    assert_eq!(
        eval(&program, f),
        SchemaNode::Function {
            parameters: Vec::new(),
            return_type: Box::new(SchemaNode::primitive(PrimitiveKind::Void)),
        }
    );
}

// =============================================================================
// JSX
// =============================================================================

#[test]
fn test_jsx_element_and_fragment() {
    // <div id="a" hidden>{1}</div>   <>hi{2}</>
    let mut b = ProgramBuilder::new();
    let a = b.string("a");
    let id = b.jsx_attr("id", Some(a));
    let hidden = b.jsx_attr("hidden", None);
    let whitespace = b.jsx_text("\n  ");
    let one = b.num(1.0);
    let child = b.jsx_expr(Some(one));
    let div = b.jsx_element("div", vec![id, hidden], vec![whitespace, child]);
    let hi = b.jsx_text("hi");
    let two = b.num(2.0);
    let expr = b.jsx_expr(Some(two));
    let fragment = b.jsx_fragment(vec![hi, expr]);
    let program = finish_with(b, &[div, fragment]);

    assert_eq!(
        eval(&program, div),
        SchemaNode::object_from([
            ("type", SchemaNode::string("div")),
            (
                "props",
                SchemaNode::object_from([
                    ("id", SchemaNode::string("a")),
                    ("hidden", SchemaNode::boolean(true)),
                    ("children", SchemaNode::number(1.0)),
                ])
            ),
        ])
    );
    assert_eq!(
        eval(&program, fragment),
        SchemaNode::object_from([
            ("type", SchemaNode::string("Fragment")),
            (
                "props",
                SchemaNode::object_from([(
                    "children",
                    SchemaNode::tuple(vec![SchemaNode::string("hi"), SchemaNode::number(2.0)])
                )])
            ),
        ])
    );
}

// =============================================================================
// Budget, modes and entry point
// =============================================================================

#[test]
fn test_depth_budget_degrades_to_unknown() {
    let mut b = ProgramBuilder::new();
    let one = b.num(1.0);
    let inner = b.array(vec![one]);
    let middle = b.array(vec![inner]);
    let outer = b.array(vec![middle]);
    let program = finish_with(b, &[outer]);

    let ctx = EvaluationContext::new(EvaluationOptions {
        max_depth: 2,
        ..EvaluationOptions::default()
    });
    let schema = SchemaEvaluator::new(program.host())
        .schema_of_node(outer, &ctx)
        .unwrap();
    assert_eq!(schema, SchemaNode::array(SchemaNode::array(SchemaNode::unknown())));
    assert_eq!(ctx.degraded_count(), 1);
}

#[test]
fn test_unsupported_node_depends_on_mode() {
    let mut b = ProgramBuilder::new();
    let cond = b.boolean(true);
    let then = b.block(vec![]);
    let stmt = b.if_stmt(cond, then, None);
    b.source_file("main.ts", vec![stmt]);
    let program = b.finish();
    let evaluator = SchemaEvaluator::new(program.host());

    let permissive = evaluator
        .schema_of_node(stmt, &EvaluationContext::default())
        .unwrap();
    assert_eq!(permissive, SchemaNode::unknown());

    let strict = EvaluationContext::new(EvaluationOptions {
        permissive: false,
        ..EvaluationOptions::default()
    });
    let err = evaluator.schema_of_node(stmt, &strict).unwrap_err();
    assert!(err.is_contextual());
    assert!(matches!(
        err.root_cause(),
        EvaluationError::UnsupportedNode { kind: "IfStatement" }
    ));
}

#[test]
fn test_evaluation_is_idempotent() {
    let mut b = ProgramBuilder::new();
    let one = b.num(1.0);
    let a = b.prop("a", one);
    let text = b.string("x");
    let list = b.array(vec![text]);
    let l = b.prop("list", list);
    let obj = b.object(vec![a, l]);
    let program = finish_with(b, &[obj]);

    let first = evaluate(program.host(), Entry::Node(obj), &EvaluationContext::default()).unwrap();
    let ctx = EvaluationContext::default();
    let second = evaluate(program.host(), Entry::Node(obj), &ctx).unwrap();
    let third = evaluate(program.host(), Entry::Node(obj), &ctx).unwrap();
    assert_eq!(first.root, second.root);
    assert_eq!(second.root, third.root);
    assert!(first.defs.is_empty());
}
