//! Common types and utilities for the tsnarrow crates.
//!
//! This crate provides foundational types used across the workspace:
//! - Centralized recursion and expansion limits
//! - Source spans (`Span`) and human-readable locations (`SourceLocation`)

// Centralized limits and thresholds
pub mod limits;

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{SourceLocation, Span};
