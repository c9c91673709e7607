use super::*;
use tsn_common::Span;

#[test]
fn test_with_context_wraps_once() {
    let inner = EvaluationError::UnsupportedNode { kind: "Block" };
    let first = inner.with_context(SourceLocation::new("a.ts", Span::new(1, 4)), "Block");
    assert!(first.is_contextual());

    let second = first.with_context(SourceLocation::new("b.ts", Span::new(0, 9)), "Call");
    match &second {
        EvaluationError::Contextual { location, subject, .. } => {
            assert_eq!(location.file, "a.ts");
            assert_eq!(subject, "Block");
        }
        other => panic!("expected contextual error, got {other:?}"),
    }
    assert!(matches!(
        second.root_cause(),
        EvaluationError::UnsupportedNode { kind: "Block" }
    ));
}

#[test]
fn test_display_includes_location() {
    let err = EvaluationError::DefinitionNotFound {
        stable_id: "Box<number>".to_string(),
    }
    .with_context(SourceLocation::new("main.ts", Span::new(3, 7)), "Identifier");
    assert_eq!(
        err.to_string(),
        "main.ts:3..7: while evaluating Identifier: definition `Box<number>` not found"
    );
}
