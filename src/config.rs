//! Session configuration.

use serde::{Deserialize, Serialize};

/// Order in which buffer replicas are tried when reading a variable.
///
/// Both policies return the first replica whose bytes for the variable are
/// not all zero. Neither guarantees the freshest sample: a replica can be
/// mid-write, and a variable whose true value encodes to all-zero bytes is
/// reported as [`Sample::Unknown`](crate::Sample::Unknown).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferPolicy {
    /// Header order: replica 0, then 1, then 2.
    #[default]
    FirstNonZero,
    /// Newest tick counter first, with wraparound handling.
    LatestTick,
}

/// Options applied when opening a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Replica ordering for value reads.
    pub buffer_policy: BufferPolicy,
    /// Strip control characters from the metadata document before parsing.
    pub preprocess_metadata: bool,
    /// Reject regions whose size differs from this.
    pub expected_size: Option<usize>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { buffer_policy: BufferPolicy::default(), preprocess_metadata: true, expected_size: None }
    }
}

impl SessionOptions {
    pub fn with_buffer_policy(mut self, policy: BufferPolicy) -> Self {
        self.buffer_policy = policy;
        self
    }

    pub fn with_metadata_preprocessing(mut self, enabled: bool) -> Self {
        self.preprocess_metadata = enabled;
        self
    }

    pub fn with_expected_size(mut self, size: usize) -> Self {
        self.expected_size = Some(size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_first_non_zero_heuristic() {
        let options = SessionOptions::default();
        assert_eq!(options.buffer_policy, BufferPolicy::FirstNonZero);
        assert!(options.preprocess_metadata);
        assert_eq!(options.expected_size, None);
    }

    #[test]
    fn partial_yaml_config_fills_defaults() {
        let options: SessionOptions =
            serde_yaml_ng::from_str("buffer_policy: latest_tick\nexpected_size: 798720\n").unwrap();
        assert_eq!(options.buffer_policy, BufferPolicy::LatestTick);
        assert!(options.preprocess_metadata);
        assert_eq!(options.expected_size, Some(798_720));
    }

    #[test]
    fn builder_methods_compose() {
        let options = SessionOptions::default()
            .with_buffer_policy(BufferPolicy::LatestTick)
            .with_metadata_preprocessing(false)
            .with_expected_size(4096);
        assert_eq!(options.buffer_policy, BufferPolicy::LatestTick);
        assert!(!options.preprocess_metadata);
        assert_eq!(options.expected_size, Some(4096));
    }
}
