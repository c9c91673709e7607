use super::*;

#[test]
fn test_defaults_come_from_limits() {
    let options = EvaluationOptions::default();
    assert_eq!(options.max_depth, limits::DEFAULT_MAX_DEPTH);
    assert_eq!(options.max_union_expansion, limits::MAX_UNION_EXPANSION);
    assert!(options.permissive);
    assert!(options.inline_single_use_definitions);
}

#[test]
fn test_from_json_fills_missing_fields() {
    let options =
        EvaluationOptions::from_json(r#"{ "maxDepth": 8, "wellKnownReferences": ["Temporal"] }"#)
            .unwrap();
    assert_eq!(options.max_depth, 8);
    assert!(options.permissive);
    assert!(options.is_well_known("Temporal"));
    assert!(options.is_well_known("Promise"));
    assert!(!options.is_well_known("Box"));
}

#[test]
fn test_from_json_rejects_bad_types() {
    assert!(EvaluationOptions::from_json(r#"{ "permissive": "yes" }"#).is_err());
}
