//! Per-request evaluation options.
//!
//! ```json
//! { "maxDepth": 32, "permissive": false, "wellKnownReferences": ["Temporal"] }
//! ```

use serde::{Deserialize, Serialize};
use tsn_common::limits;

/// Library types that always collapse to an opaque reference.
pub const WELL_KNOWN_REFERENCES: &[&str] = &[
    "Array",
    "ReadonlyArray",
    "Promise",
    "PromiseLike",
    "Date",
    "RegExp",
    "Map",
    "ReadonlyMap",
    "Set",
    "ReadonlySet",
    "WeakMap",
    "WeakSet",
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "Function",
    "Symbol",
    "ArrayBuffer",
    "Uint8Array",
    "Iterable",
    "Iterator",
    "AsyncIterable",
    "Generator",
    "AsyncGenerator",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationOptions {
    /// Structural descent budget. Exhaustion degrades to `unknown`.
    pub max_depth: u32,
    /// Fall back to the nominal type for unsupported nodes instead of failing.
    pub permissive: bool,
    /// Cap on combinations materialized by one cartesian expansion.
    pub max_union_expansion: usize,
    /// Extra names treated like the built-in well-known references.
    pub well_known_references: Vec<String>,
    pub inline_single_use_definitions: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            max_depth: limits::DEFAULT_MAX_DEPTH,
            permissive: true,
            max_union_expansion: limits::MAX_UNION_EXPANSION,
            well_known_references: Vec::new(),
            inline_single_use_definitions: true,
        }
    }
}

impl EvaluationOptions {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn is_well_known(&self, name: &str) -> bool {
        WELL_KNOWN_REFERENCES.contains(&name)
            || self.well_known_references.iter().any(|extra| extra == name)
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod options_tests;
