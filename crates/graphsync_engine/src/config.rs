//! Configuration for the decode and encode pipelines.

use graphsync_resource::{EnvoyConfig, MergeStrategy};

/// Configuration for decoding.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Page size used by filters that do not set one.
    pub default_page_size: u32,
}

impl DecoderConfig {
    /// Sets the default page size.
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            default_page_size: 1000,
        }
    }
}

/// Configuration for encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Conflict policy for nodes matching an existing row.
    pub on_existing: MergeStrategy,
    /// Skip predicate evaluated before every write.
    pub skip_if: Option<String>,
}

impl EncoderConfig {
    /// Sets the conflict policy.
    pub fn with_on_existing(mut self, strategy: MergeStrategy) -> Self {
        self.on_existing = strategy;
        self
    }

    /// Sets the skip predicate.
    pub fn with_skip_if(mut self, expr: impl Into<String>) -> Self {
        self.skip_if = Some(expr.into());
        self
    }

    /// Applies node level overrides; set node values take precedence.
    pub fn merged_with(&self, node: &EnvoyConfig) -> EncoderConfig {
        EncoderConfig {
            on_existing: node.on_existing.unwrap_or(self.on_existing),
            skip_if: node.skip_if.clone().or_else(|| self.skip_if.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_defaults() {
        assert_eq!(DecoderConfig::default().default_page_size, 1000);
        assert_eq!(
            DecoderConfig::default()
                .with_default_page_size(5)
                .default_page_size,
            5
        );
    }

    #[test]
    fn node_overrides_win() {
        let base = EncoderConfig::default()
            .with_on_existing(MergeStrategy::MergeLeft)
            .with_skip_if("missing");

        let merged = base.merged_with(&EnvoyConfig::default());
        assert_eq!(merged, base);

        let node = EnvoyConfig::default().with_on_existing(MergeStrategy::Skip);
        let merged = base.merged_with(&node);
        assert_eq!(merged.on_existing, MergeStrategy::Skip);
        assert_eq!(merged.skip_if.as_deref(), Some("missing"));

        let merged = base.merged_with(&EnvoyConfig::default().with_skip_if("exists"));
        assert_eq!(merged.skip_if.as_deref(), Some("exists"));
    }
}
