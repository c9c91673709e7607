use super::*;

#[test]
fn test_enter_leave_and_cycle() {
    let mut guard = RecursionGuard::new(4);
    assert_eq!(guard.enter(1u32), RecursionResult::Entered);
    assert_eq!(guard.enter(1u32), RecursionResult::Cycle);
    assert!(guard.is_active(&1));
    assert_eq!(guard.depth(), 1);
    guard.leave(1);
    assert_eq!(guard.depth(), 0);
    assert!(!guard.is_active(&1));
}

#[test]
fn test_depth_limit() {
    let mut guard = RecursionGuard::new(2);
    assert_eq!(guard.enter(1u32), RecursionResult::Entered);
    assert_eq!(guard.enter(2u32), RecursionResult::Entered);
    assert_eq!(guard.enter(3u32), RecursionResult::DepthExceeded);
    assert!(guard.is_exceeded());
    guard.leave(2);
    guard.leave(1);
    assert!(guard.is_exceeded());
}

#[test]
fn test_cycle_reports_closing_chain() {
    let mut guard = RecursionGuard::new(8);
    for key in [10u32, 20, 30] {
        assert_eq!(guard.enter(key), RecursionResult::Entered);
    }
    assert_eq!(guard.enter(20), RecursionResult::Cycle);
    assert_eq!(guard.cycle_from(20), &[20u32, 30][..]);
    assert!(guard.cycle_from(40).is_empty());
    for key in [30, 20, 10] {
        guard.leave(key);
    }
}
