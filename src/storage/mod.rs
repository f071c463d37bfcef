//! Storage layer for serena-hooks - per-session activation markers.
//!
//! Marker files live outside process memory so that every hook invocation,
//! each a fresh process, sees the same activation state for its session.

mod marker;

use std::time::Duration;

pub use marker::MarkerStore;

use crate::config::MarkerConfig;

impl MarkerStore {
    /// Build a store from the `marker` config section.
    pub fn from_config(config: &MarkerConfig) -> Self {
        Self::new(
            config.dir.clone(),
            config.prefix.clone(),
            Duration::from_millis(config.lock_retry_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_config() {
        let config = MarkerConfig {
            dir: PathBuf::from("/var/tmp/markers"),
            prefix: "m-".to_string(),
            lock_retry_ms: 5,
        };
        let store = MarkerStore::from_config(&config);
        assert_eq!(store.path("x"), PathBuf::from("/var/tmp/markers/m-x"));
    }
}
