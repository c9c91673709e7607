//! Centralized limits and thresholds for schema evaluation.
//!
//! This module provides shared constants for recursion depths and expansion
//! sizes used throughout the workspace. Centralizing these values:
//! - Prevents duplicate definitions with inconsistent values
//! - Makes it easy to tune limits in one place
//! - Documents the rationale for each limit
//!
//! All limits are defaults; `EvaluationOptions` in `tsn-schema` can override
//! the per-request ones.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Default structural descent budget for one evaluation request.
///
/// Every genuine descent (object property, array element, union member,
/// call into a function body) consumes one unit. When the budget reaches
/// zero the branch degrades to `unknown` instead of recursing further.
///
/// # TypeScript example
///
/// ```typescript
/// // Non-circular but pathologically deep generic nesting:
/// type Box<T> = { inner: T };
/// declare const deep: Box<Box<Box<Box</* ... 200 levels ... */ number>>>>;
/// //                      ~~~ tail degrades to `unknown`
/// ```
pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// Maximum nesting of call-site propagation through enclosing functions.
///
/// The call-argument propagator walks from a callee to the functions whose
/// parameters feed its arguments, then to their call sites, and so on.
///
/// # TypeScript example
///
/// ```typescript
/// function a(x) { return b(x); }
/// function b(y) { return c(y); }
/// // ... 32 levels of forwarding wrappers ...
/// a(1);
/// ```
pub const MAX_PROPAGATION_DEPTH: u32 = 32;

/// Red zone kept free on the native stack before `stacker` grows it.
pub const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each freshly allocated stack segment when `stacker` grows it.
pub const STACK_GROWTH_SIZE: usize = 1024 * 1024;

// =============================================================================
// Expansion Limits
// =============================================================================

/// Maximum number of alternatives produced by one cartesian expansion.
///
/// Binary operators, template literals and computed keys expand every
/// combination of union members. Beyond this many combinations the operation
/// stays symbolic instead of materializing the product.
///
/// # TypeScript example
///
/// ```typescript
/// declare const d: 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9;
/// const s = `${d}${d}${d}${d}`; // 10,000 combinations -> kept symbolic
/// ```
pub const MAX_UNION_EXPANSION: usize = 1_000;

/// Maximum number of alternative object shapes tracked while spreading unions
/// into an object literal.
pub const MAX_SPREAD_ALTERNATIVES: usize = 64;
