//! Grammar configuration.

use serde::Deserialize;

const DEFAULT_MAX_DEPTH: usize = 128;

/// Tunables for a [`Grammar`](crate::Grammar).
///
/// Loaded from the `[parser]` table of the application configuration; every
/// field falls back to its default when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum nesting of grammar rules before parsing gives up with a
    /// diagnostic.
    max_depth: usize,

    /// Cache `value` results by offset so nested collections parse in linear
    /// time.
    memoize: bool,
}

impl ParserConfig {
    /// Create a configuration with explicit settings.
    pub fn new(max_depth: usize, memoize: bool) -> Self {
        Self { max_depth, memoize }
    }

    /// Return a copy with a different maximum depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Return a copy with memoisation switched on or off.
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn memoize(&self) -> bool {
        self.memoize
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            memoize: true,
        }
    }
}
