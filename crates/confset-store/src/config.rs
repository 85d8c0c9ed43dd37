//! Cache configuration

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for [`CachingStore`](crate::CachingStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL of cached entries in both tiers, in seconds; zero disables caching
    pub shared_ttl_secs: u64,
    /// Max entries of the in-process tier
    pub local_capacity: u64,
    /// Prefix of cache keys
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shared_ttl_secs: 86_400,
            local_capacity: 64,
            key_prefix: "confset".to_string(),
        }
    }
}

impl CacheConfig {
    /// Set cache TTL
    #[must_use]
    pub fn with_shared_ttl(mut self, ttl: Duration) -> Self {
        self.shared_ttl_secs = ttl.as_secs();
        self
    }

    /// Set in-process capacity
    #[must_use]
    pub fn with_local_capacity(mut self, capacity: u64) -> Self {
        self.local_capacity = capacity;
        self
    }

    /// Set key prefix
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Cache TTL
    #[inline]
    #[must_use]
    pub fn shared_ttl(&self) -> Duration {
        Duration::from_secs(self.shared_ttl_secs)
    }

    /// Cache key for a backing location
    #[must_use]
    pub fn key_for(&self, location: &str) -> String {
        format!("{}:store:{location}", self.key_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_day() {
        let config = CacheConfig::default();
        assert_eq!(config.shared_ttl(), Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"key_prefix": "wiki"}"#).unwrap();
        assert_eq!(config.key_prefix, "wiki");
        assert_eq!(config.shared_ttl_secs, 86_400);
        assert_eq!(config.key_for("memory:a"), "wiki:store:memory:a");
    }

    #[test]
    fn builder_methods() {
        let config = CacheConfig::default()
            .with_shared_ttl(Duration::from_secs(5))
            .with_local_capacity(2)
            .with_key_prefix("x");
        assert_eq!(config.shared_ttl_secs, 5);
        assert_eq!(config.local_capacity, 2);
        assert_eq!(config.key_prefix, "x");
    }
}
