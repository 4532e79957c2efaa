//! Per-node encoding overrides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do when a node matches an existing store row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// Incoming row overwrites the existing one.
    #[default]
    Replace,
    /// Existing row is left untouched.
    Skip,
    /// Existing values win; incoming values only fill unset fields.
    MergeLeft,
    /// Incoming values win; existing values only fill unset fields.
    MergeRight,
}

impl MergeStrategy {
    /// Returns the stable name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Replace => "replace",
            MergeStrategy::Skip => "skip",
            MergeStrategy::MergeLeft => "mergeLeft",
            MergeStrategy::MergeRight => "mergeRight",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "replace" => Ok(MergeStrategy::Replace),
            "skip" => Ok(MergeStrategy::Skip),
            "mergeleft" => Ok(MergeStrategy::MergeLeft),
            "mergeright" => Ok(MergeStrategy::MergeRight),
            _ => Err(format!("unknown merge strategy: {s}")),
        }
    }
}

/// Encoding overrides attached to a single node.
///
/// Unset values fall back to the encoder configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvoyConfig {
    /// Skip predicate evaluated before writing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_if: Option<String>,
    /// Conflict policy for existing rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_existing: Option<MergeStrategy>,
}

impl EnvoyConfig {
    /// Sets the skip predicate.
    #[must_use]
    pub fn with_skip_if(mut self, expr: impl Into<String>) -> Self {
        self.skip_if = Some(expr.into());
        self
    }

    /// Sets the conflict policy.
    #[must_use]
    pub fn with_on_existing(mut self, strategy: MergeStrategy) -> Self {
        self.on_existing = Some(strategy);
        self
    }
}
