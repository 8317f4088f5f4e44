//! Queue configuration.
//!
//! Settings can be built in code, read from `REDQUEUE_*` environment
//! variables, or filled in from the CLI.

use std::time::Duration;
use thiserror::Error;

/// Default Redis connection URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default queue name.
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Connection and naming settings for a `ReliableQueue`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueConfig {
    /// Redis connection URL.
    pub redis_url: String,
    /// Queue name; the lists live under `<name>_main` and `<name>_processing`.
    pub queue_name: String,
    /// Upper bound for a single store round-trip. `None` waits indefinitely.
    pub operation_timeout: Option<Duration>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            operation_timeout: None,
        }
    }
}

impl QueueConfig {
    /// Creates a configuration for the named queue on the default Redis URL.
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            ..Default::default()
        }
    }

    /// Sets the Redis URL.
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Sets the queue name.
    pub fn with_queue_name(mut self, name: impl Into<String>) -> Self {
        self.queue_name = name.into();
        self
    }

    /// Sets the per-operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// - `REDQUEUE_REDIS_URL`
    /// - `REDQUEUE_NAME`
    /// - `REDQUEUE_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(val) = lookup("REDQUEUE_REDIS_URL") {
            config.redis_url = val;
        }

        if let Some(val) = lookup("REDQUEUE_NAME") {
            config.queue_name = val;
        }

        if let Some(val) = lookup("REDQUEUE_TIMEOUT_MS") {
            let millis: u64 = parse_env_value(&val, "REDQUEUE_TIMEOUT_MS")?;
            config.operation_timeout = Some(Duration::from_millis(millis));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "redis_url cannot be empty".to_string(),
            ));
        }

        if self.queue_name.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "queue_name cannot be empty".to_string(),
            ));
        }

        if self.operation_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ValidationFailed(
                "operation_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.queue_name, "default");
        assert_eq!(config.operation_timeout, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = QueueConfig::new("jobs")
            .with_redis_url("redis://cache:6380/2")
            .with_operation_timeout(Duration::from_secs(5));

        assert_eq!(config.queue_name, "jobs");
        assert_eq!(config.redis_url, "redis://cache:6380/2");
        assert_eq!(config.operation_timeout, Some(Duration::from_secs(5)));

        let renamed = config.with_queue_name("emails");
        assert_eq!(renamed.queue_name, "emails");
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let config = QueueConfig::from_lookup(lookup_from(&[
            ("REDQUEUE_REDIS_URL", "redis://queue-host:6379"),
            ("REDQUEUE_NAME", "thumbnails"),
            ("REDQUEUE_TIMEOUT_MS", "1500"),
        ]))
        .expect("config should load");

        assert_eq!(config.redis_url, "redis://queue-host:6379");
        assert_eq!(config.queue_name, "thumbnails");
        assert_eq!(config.operation_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_from_lookup_defaults_when_unset() {
        let config = QueueConfig::from_lookup(lookup_from(&[])).expect("config should load");
        assert_eq!(config, QueueConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let err = QueueConfig::from_lookup(lookup_from(&[("REDQUEUE_TIMEOUT_MS", "soon")]))
            .expect_err("non-numeric timeout should fail");
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "REDQUEUE_TIMEOUT_MS"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation() {
        assert!(QueueConfig::new("").validate().is_err());
        assert!(QueueConfig::new("jobs").with_redis_url("  ").validate().is_err());
        assert!(QueueConfig::new("jobs")
            .with_operation_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(QueueConfig::new("jobs")
            .with_operation_timeout(Duration::from_millis(1))
            .validate()
            .is_ok());
    }
}
