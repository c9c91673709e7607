use super::*;

#[test]
fn test_span_cover_and_len() {
    let a = Span::new(4, 10);
    let b = Span::new(2, 6);
    let covered = a.cover(b);
    assert_eq!(covered, Span::new(2, 10));
    assert_eq!(covered.len(), 8);
    assert!(!covered.is_empty());
    assert!(Span::at(3).is_empty());
}

#[test]
fn test_source_location_display() {
    let loc = SourceLocation::new("main.ts", Span::new(12, 20));
    assert_eq!(loc.to_string(), "main.ts:12..20");
}
