use super::*;

#[test]
fn test_child_spends_budget_only_when_descending() {
    let ctx = EvaluationContext::new(EvaluationOptions {
        max_depth: 2,
        ..EvaluationOptions::default()
    });
    assert_eq!(ctx.child(false).remaining_depth(), 2);
    let deeper = ctx.child(true);
    assert_eq!(deeper.remaining_depth(), 1);
    let exhausted = deeper.child(true);
    assert!(exhausted.is_exhausted());
    assert!(exhausted.child(true).is_exhausted());
}

#[test]
fn test_guards_are_branch_local() {
    let ctx = EvaluationContext::default();
    let branch = ctx.with_type(TypeId(40));
    assert!(branch.is_handling_type(TypeId(40)));
    assert!(!ctx.is_handling_type(TypeId(40)));

    let call = ctx.with_function(NodeIndex(7), [(SymbolId(1), SchemaNode::number(1.0))]);
    assert!(call.is_handling_function(NodeIndex(7)));
    assert_eq!(call.binding(SymbolId(1)), Some(&SchemaNode::number(1.0)));
    assert!(!ctx.has_bindings());
    assert!(ctx.binding(SymbolId(1)).is_none());
}

#[test]
fn test_caches_are_shared_between_branches() {
    let ctx = EvaluationContext::default();
    let branch = ctx.child(true).with_type(TypeId(50));
    branch.cache_type(TypeId(12), SchemaNode::string("x"));
    assert_eq!(ctx.cached_type(TypeId(12)), Some(SchemaNode::string("x")));
    assert!(ctx.shares_session_with(&branch));
    assert!(!ctx.shares_session_with(&EvaluationContext::default()));

    branch.note_degraded();
    assert_eq!(ctx.degraded_count(), 1);

    branch
        .definitions()
        .borrow_mut()
        .register("Box", "Box<number>", TypeId(20), TypeId(21));
    assert!(ctx.definitions().borrow().contains("Box<number>"));
}

#[test]
fn test_trace_is_copied_into_children() {
    let mut ctx = EvaluationContext::default();
    ctx.push_trace(NodeIndex(3));
    let mut child = ctx.child(true);
    child.push_trace(NodeIndex(4));
    assert_eq!(ctx.trace(), &[NodeIndex(3)]);
    assert_eq!(child.trace(), &[NodeIndex(3), NodeIndex(4)]);
}

#[test]
fn test_detached_drops_guards_but_keeps_session() {
    let ctx = EvaluationContext::default();
    let branch = ctx
        .with_type(TypeId(40))
        .with_function(NodeIndex(2), [(SymbolId(0), SchemaNode::null())]);
    let detached = branch.detached();
    assert!(!detached.is_handling_type(TypeId(40)));
    assert!(!detached.is_handling_function(NodeIndex(2)));
    assert!(!detached.has_bindings());
    assert_eq!(detached.remaining_depth(), branch.remaining_depth());
    assert!(detached.shares_session_with(&ctx));
}
