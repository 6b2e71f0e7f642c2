//! Executor configuration.
//!
//! Loaded from a TOML file with environment-variable overrides. Environment
//! variables take precedence over file values.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the executor pool and per-query limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Bound of the per-query response channel. The executor blocks on send
    /// once the caller stops draining.
    pub channel_capacity: usize,
    /// Maximum number of idle executors kept for reuse.
    pub pool_capacity: usize,
    /// Default statement timeout in milliseconds. Zero means unbounded;
    /// a statement-level `TIMEOUT` clause always wins.
    pub default_timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            pool_capacity: 32,
            default_timeout_ms: 0,
        }
    }
}

impl ExecutorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let mut config: ExecutorConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported variables:
    /// - `QUILLDB_CHANNEL_CAPACITY`: Override channel_capacity
    /// - `QUILLDB_POOL_CAPACITY`: Override pool_capacity
    /// - `QUILLDB_DEFAULT_TIMEOUT_MS`: Override default_timeout_ms
    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        use std::env;

        if let Ok(cap) = env::var("QUILLDB_CHANNEL_CAPACITY") {
            self.channel_capacity = cap
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid QUILLDB_CHANNEL_CAPACITY value: {}", cap))?;
        }

        if let Ok(cap) = env::var("QUILLDB_POOL_CAPACITY") {
            self.pool_capacity = cap
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid QUILLDB_POOL_CAPACITY value: {}", cap))?;
        }

        if let Ok(ms) = env::var("QUILLDB_DEFAULT_TIMEOUT_MS") {
            self.default_timeout_ms = ms
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid QUILLDB_DEFAULT_TIMEOUT_MS value: {}", ms))?;
        }

        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.channel_capacity == 0 {
            return Err(anyhow::anyhow!("channel_capacity must be at least 1"));
        }
        Ok(())
    }

    /// The default statement timeout, or `None` when unbounded.
    pub fn default_timeout(&self) -> Option<Duration> {
        match self.default_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ExecutorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_timeout(), None);
    }

    #[test]
    fn loads_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_capacity = 8\ndefault_timeout_ms = 250").unwrap();

        let config = ExecutorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.default_timeout(), Some(Duration::from_millis(250)));
        // Unspecified fields keep their defaults
        assert_eq!(config.pool_capacity, ExecutorConfig::default().pool_capacity);
    }

    #[test]
    fn rejects_zero_channel_capacity() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_capacity = 0").unwrap();

        assert!(ExecutorConfig::from_file(file.path()).is_err());
    }
}
