//! Stack guard for walking the call graph.
//!
//! The propagator resolves owner functions in post-order; an owner that is
//! already on the stack is a recursive call chain, and a stack deeper than
//! the configured limit is abandoned. The guard keeps the active path so a
//! cycle can be reported as the chain of functions that closes it.

use rustc_hash::FxHashSet;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already on the active path.
    Cycle,
    DepthExceeded,
}

pub struct RecursionGuard<K: Hash + Eq + Copy> {
    path: Vec<K>,
    on_path: FxHashSet<K>,
    max_depth: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32) -> Self {
        Self {
            path: Vec::new(),
            on_path: FxHashSet::default(),
            max_depth,
            exceeded: false,
        }
    }

    /// Push `key` onto the active path. Every [`RecursionResult::Entered`]
    /// must be matched by a [`leave`](Self::leave) of the same key.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        if self.on_path.contains(&key) {
            return RecursionResult::Cycle;
        }
        if self.depth() >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        self.on_path.insert(key);
        self.path.push(key);
        RecursionResult::Entered
    }

    /// Pop `key`, which must be the innermost entry.
    pub fn leave(&mut self, key: K) {
        let top = self.path.pop();
        debug_assert!(top == Some(key), "leave() out of order");
        self.on_path.remove(&key);
    }

    /// Keys from the first occurrence of `key` to the innermost entry; empty
    /// when `key` is not on the path.
    pub fn cycle_from(&self, key: K) -> &[K] {
        match self.path.iter().position(|&k| k == key) {
            Some(start) => &self.path[start..],
            None => &[],
        }
    }

    #[inline]
    pub fn is_active(&self, key: &K) -> bool {
        self.on_path.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.path.len() as u32
    }

    /// Whether the depth limit was hit at any point.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod recursion_tests;
