//! Decoder configuration.

use serde::{Deserialize, Deserializer};

/// Default limit on array literal nesting.
pub const DEFAULT_MAX_ARRAY_DEPTH: usize = 64;

/// Settings carried by composite decoders.
///
/// Deserializable so hosts can embed it in their own settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Fail on unterminated array literals instead of returning the elements
    /// read before the input ran out.
    pub strict_literals: bool,
    /// Maximum brace nesting accepted in an array literal, at least 1
    #[serde(deserialize_with = "deserialize_depth")]
    pub max_array_depth: usize,
}

fn deserialize_depth<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    usize::deserialize(deserializer).map(|depth| depth.max(1))
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeConfig {
    /// Create a configuration with default settings.
    pub const fn new() -> Self {
        Self {
            strict_literals: true,
            max_array_depth: DEFAULT_MAX_ARRAY_DEPTH,
        }
    }

    /// Set whether unterminated literals are rejected.
    pub fn strict_literals(mut self, strict: bool) -> Self {
        self.strict_literals = strict;
        self
    }

    /// Set the maximum array nesting depth.
    pub fn max_array_depth(mut self, depth: usize) -> Self {
        self.max_array_depth = depth.max(1);
        self
    }

    /// Configuration mirroring libpq-era clients: malformed literals are
    /// truncated rather than rejected.
    pub fn lenient() -> Self {
        Self::default().strict_literals(false)
    }
}
