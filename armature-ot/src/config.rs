//! Configuration for the transform engine

use crate::{OtError, OtResult};
use serde::{Deserialize, Serialize};
use std::env;

/// How conflicting concurrent operations are settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConflictResolutionStrategy {
    /// The operation with the later timestamp takes precedence
    LastWriterWins,
    /// Apply the automatic transform result
    #[default]
    Merge,
    /// Conflicting results wait for explicit confirmation
    Manual,
}

impl ConflictResolutionStrategy {
    /// Parse a strategy name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lww" | "last_writer_wins" | "last-writer-wins" => Some(Self::LastWriterWins),
            "merge" => Some(Self::Merge),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizedTransformConfig {
    /// Pending-operation buffer size before forced compression
    pub max_operation_buffer: usize,

    /// Operation count that triggers compression
    pub compression_threshold: usize,

    /// Operations from one author closer together than this are grouped
    pub compression_window_ms: u64,

    /// Maximum number of memoized pairwise transforms
    pub cache_capacity: usize,

    /// Conflict resolution strategy
    pub conflict_resolution_strategy: ConflictResolutionStrategy,

    /// Track causality with vector clocks (timestamp equality otherwise)
    pub enable_vector_clocks: bool,

    /// Compress operation logs
    pub enable_compression: bool,

    /// Memoize pairwise transforms
    pub enable_caching: bool,
}

impl Default for OptimizedTransformConfig {
    fn default() -> Self {
        Self {
            max_operation_buffer: 100,
            compression_threshold: 50,
            compression_window_ms: 1000,
            cache_capacity: 1024,
            conflict_resolution_strategy: ConflictResolutionStrategy::Merge,
            enable_vector_clocks: true,
            enable_compression: true,
            enable_caching: true,
        }
    }
}

impl OptimizedTransformConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for configuration
    pub fn builder() -> OptimizedTransformConfigBuilder {
        OptimizedTransformConfigBuilder::new()
    }

    /// Load configuration from `ARMATURE_OT_*` environment variables.
    ///
    /// Unset variables keep their defaults; unparsable ones are an error.
    pub fn from_env() -> OtResult<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse("ARMATURE_OT_MAX_BUFFER")? {
            config.max_operation_buffer = v;
        }
        if let Some(v) = env_parse("ARMATURE_OT_COMPRESSION_THRESHOLD")? {
            config.compression_threshold = v;
        }
        if let Some(v) = env_parse("ARMATURE_OT_COMPRESSION_WINDOW_MS")? {
            config.compression_window_ms = v;
        }
        if let Some(v) = env_parse("ARMATURE_OT_CACHE_CAPACITY")? {
            config.cache_capacity = v;
        }
        if let Ok(s) = env::var("ARMATURE_OT_STRATEGY") {
            config.conflict_resolution_strategy = ConflictResolutionStrategy::from_str(&s)
                .ok_or_else(|| OtError::Config(format!("unknown strategy '{}'", s)))?;
        }
        if let Some(v) = env_flag("ARMATURE_OT_VECTOR_CLOCKS") {
            config.enable_vector_clocks = v;
        }
        if let Some(v) = env_flag("ARMATURE_OT_COMPRESSION") {
            config.enable_compression = v;
        }
        if let Some(v) = env_flag("ARMATURE_OT_CACHING") {
            config.enable_caching = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> OtResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> OtResult<String> {
        serde_json::to_string(self).map_err(OtError::from)
    }

    /// Check that bounds are usable
    pub fn validate(&self) -> OtResult<()> {
        if self.max_operation_buffer == 0 {
            return Err(OtError::Config("max_operation_buffer must be > 0".into()));
        }
        if self.compression_threshold == 0 {
            return Err(OtError::Config("compression_threshold must be > 0".into()));
        }
        if self.cache_capacity == 0 {
            return Err(OtError::Config("cache_capacity must be > 0".into()));
        }
        Ok(())
    }

    /// Compression grouping window as a chrono duration
    pub fn compression_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.compression_window_ms as i64)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> OtResult<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| OtError::Config(format!("{} has invalid value '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.to_lowercase() == "true")
}

/// Builder for OptimizedTransformConfig
#[derive(Debug, Clone, Default)]
pub struct OptimizedTransformConfigBuilder {
    config: OptimizedTransformConfig,
}

impl OptimizedTransformConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: OptimizedTransformConfig::default(),
        }
    }

    /// Set the pending-operation buffer size
    pub fn max_operation_buffer(mut self, size: usize) -> Self {
        self.config.max_operation_buffer = size;
        self
    }

    /// Set the compression threshold
    pub fn compression_threshold(mut self, threshold: usize) -> Self {
        self.config.compression_threshold = threshold;
        self
    }

    /// Set the compression grouping window in milliseconds
    pub fn compression_window_ms(mut self, ms: u64) -> Self {
        self.config.compression_window_ms = ms;
        self
    }

    /// Set the transform cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Set the conflict resolution strategy
    pub fn strategy(mut self, strategy: ConflictResolutionStrategy) -> Self {
        self.config.conflict_resolution_strategy = strategy;
        self
    }

    /// Enable or disable vector clocks
    pub fn vector_clocks(mut self, enabled: bool) -> Self {
        self.config.enable_vector_clocks = enabled;
        self
    }

    /// Enable or disable compression
    pub fn compression(mut self, enabled: bool) -> Self {
        self.config.enable_compression = enabled;
        self
    }

    /// Enable or disable caching
    pub fn caching(mut self, enabled: bool) -> Self {
        self.config.enable_caching = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> OptimizedTransformConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OptimizedTransformConfig::default();
        assert_eq!(config.max_operation_buffer, 100);
        assert_eq!(config.compression_threshold, 50);
        assert_eq!(config.compression_window_ms, 1000);
        assert_eq!(
            config.conflict_resolution_strategy,
            ConflictResolutionStrategy::Merge
        );
        assert!(config.enable_vector_clocks);
        assert!(config.enable_compression);
        assert!(config.enable_caching);
    }

    #[test]
    fn test_builder() {
        let config = OptimizedTransformConfig::builder()
            .compression_threshold(10)
            .strategy(ConflictResolutionStrategy::Manual)
            .vector_clocks(false)
            .build();

        assert_eq!(config.compression_threshold, 10);
        assert_eq!(
            config.conflict_resolution_strategy,
            ConflictResolutionStrategy::Manual
        );
        assert!(!config.enable_vector_clocks);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            ConflictResolutionStrategy::from_str("LWW"),
            Some(ConflictResolutionStrategy::LastWriterWins)
        );
        assert_eq!(
            ConflictResolutionStrategy::from_str("manual"),
            Some(ConflictResolutionStrategy::Manual)
        );
        assert_eq!(ConflictResolutionStrategy::from_str("vote"), None);
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config =
            OptimizedTransformConfig::from_json(r#"{"compression_threshold": 5}"#).unwrap();
        assert_eq!(config.compression_threshold, 5);
        assert_eq!(config.max_operation_buffer, 100);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = OptimizedTransformConfig::builder().cache_capacity(0).build();
        assert!(matches!(config.validate(), Err(OtError::Config(_))));
    }

    #[test]
    fn test_compression_window() {
        let config = OptimizedTransformConfig::default();
        assert_eq!(config.compression_window(), chrono::Duration::seconds(1));
    }
}
