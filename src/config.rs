//! Engine configuration

use std::time::Duration;

use crate::engine::convert::ListParsePolicy;

/// Knobs that shape how a query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on sessions running at once
    pub max_parallelism: usize,
    /// Run sessions and fields one at a time
    pub sync: bool,
    /// Per-command deadline; unbounded when `None`
    pub command_timeout: Option<Duration>,
    pub list_policy: ListParsePolicy,
}

impl EngineConfig {
    /// Sessions allowed to run concurrently for `sessions` context blocks.
    pub fn session_permits(&self, sessions: usize) -> usize {
        if self.sync {
            1
        } else {
            sessions.min(self.max_parallelism).max(1)
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallelism: default_parallelism(),
            sync: false,
            command_timeout: None,
            list_policy: ListParsePolicy::default(),
        }
    }
}

/// Logical CPU count, at least 1.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_permits() {
        let config = EngineConfig {
            max_parallelism: 4,
            ..Default::default()
        };
        assert_eq!(config.session_permits(2), 2);
        assert_eq!(config.session_permits(10), 4);
        assert_eq!(config.session_permits(0), 1);

        let sync = EngineConfig {
            sync: true,
            ..config
        };
        assert_eq!(sync.session_permits(10), 1);
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.max_parallelism >= 1);
        assert!(!config.sync);
        assert_eq!(config.command_timeout, None);
        assert_eq!(config.list_policy, ListParsePolicy::Strict);
    }
}
