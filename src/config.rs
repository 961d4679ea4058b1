//! Endpoint configuration.
//!
//! A queue endpoint is described by an [`EndpointConfig`], usually loaded
//! from a TOML file:
//!
//! ```toml
//! queue = "ORDERS"
//! keyed = true
//! format = "text"
//! ttl_millis = 60000
//! sweep_interval_millis = 60000
//! ```
//!
//! `keyed` defaults to `false`, `format` to `text`, and both expiry settings
//! to 60 seconds. When only `ttl_millis` is given the sweep interval follows it.

use crate::constants;
use crate::error::{Error, Result};
use crate::message::Format;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Configuration of one data queue endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Name of the data queue.
    pub queue: String,
    /// Connect to a keyed data queue.
    #[serde(default)]
    pub keyed: bool,
    /// Payload representation.
    #[serde(default)]
    pub format: Format,
    /// How long an unrefreshed search key stays registered.
    #[serde(default = "default_ttl_millis")]
    pub ttl_millis: u64,
    /// Period of the search key expiry sweep (defaults to `ttl_millis`).
    #[serde(default)]
    pub sweep_interval_millis: Option<u64>,
}

fn default_ttl_millis() -> u64 {
    constants::DEFAULT_KEY_TTL_MILLIS
}

impl EndpointConfig {
    /// Create a non-keyed text endpoint for `queue` with default expiry.
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            keyed: false,
            format: Format::default(),
            ttl_millis: constants::DEFAULT_KEY_TTL_MILLIS,
            sweep_interval_millis: None,
        }
    }

    #[must_use]
    pub fn keyed(mut self, keyed: bool) -> Self {
        self.keyed = keyed;
        self
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn ttl_millis(mut self, ttl_millis: u64) -> Self {
        self.ttl_millis = ttl_millis;
        self
    }

    #[must_use]
    pub fn sweep_interval_millis(mut self, interval_millis: u64) -> Self {
        self.sweep_interval_millis = Some(interval_millis);
        self
    }

    /// Search key time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_millis)
    }

    /// Expiry sweep period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_millis.unwrap_or(self.ttl_millis))
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or required fields are missing.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Toml {
            path: "<inline>".into(),
            source,
        })
    }

    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Required fields are missing or have invalid types
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::io(format!("reading config file {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|source| Error::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] listing every failed check:
    /// - Empty queue name
    /// - Zero TTL or sweep interval on a keyed endpoint
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.queue.trim().is_empty() {
            errors.push("queue name cannot be empty".to_string());
        }

        if self.keyed {
            if self.ttl_millis == 0 {
                errors.push("ttl_millis cannot be 0 for a keyed endpoint".to_string());
            }
            if self.sweep_interval_millis == Some(0) {
                errors.push("sweep_interval_millis cannot be 0 for a keyed endpoint".to_string());
            }

            let interval = self.sweep_interval_millis.unwrap_or(self.ttl_millis);
            if self.ttl_millis > 0 && interval > self.ttl_millis.saturating_mul(10) {
                warnings.push(format!(
                    "sweep_interval_millis {interval} is more than 10x ttl_millis {}\n  \
                     Stale keys will be probed long after they expire",
                    self.ttl_millis
                ));
            }
        } else if self.sweep_interval_millis.is_some() {
            warnings.push(
                "sweep_interval_millis has no effect on a non-keyed endpoint".to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(Error::configuration(format!(
                "endpoint '{}' validation failed:\n  - {}",
                self.queue,
                errors.join("\n  - ")
            )));
        }

        Ok(ValidationResult { warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config = EndpointConfig::from_toml_str(r#"queue = "ORDERS""#).unwrap();
        assert_eq!(config.queue, "ORDERS");
        assert!(!config.keyed);
        assert_eq!(config.format, Format::Text);
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_keyed_config() {
        let toml_str = r#"
queue = "REPLIES"
keyed = true
format = "binary"
ttl_millis = 5000
"#;
        let config = EndpointConfig::from_toml_str(toml_str).unwrap();
        assert!(config.keyed);
        assert_eq!(config.format, Format::Binary);
        assert_eq!(config.ttl(), Duration::from_secs(5));
        // Interval follows the TTL when not given.
        assert_eq!(config.sweep_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        let err = EndpointConfig::from_toml_str("queue = \"Q\"\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, Error::Toml { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "queue = \"FILEQ\"\nkeyed = true\nsweep_interval_millis = 1000").unwrap();

        let config = EndpointConfig::load_from(file.path()).unwrap();
        assert_eq!(config.queue, "FILEQ");
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EndpointConfig::load_from(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = EndpointConfig::new("ORDERS").keyed(true);
        let result = config.validate().unwrap();
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_validate_empty_queue_and_zero_ttl() {
        let config = EndpointConfig::new(" ").keyed(true).ttl_millis(0);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("queue name cannot be empty"));
        assert!(err.contains("ttl_millis cannot be 0"));
    }

    #[test]
    fn test_validate_warns_on_slow_sweep() {
        let config = EndpointConfig::new("Q")
            .keyed(true)
            .ttl_millis(1000)
            .sweep_interval_millis(60_000);
        let result = config.validate().unwrap();
        assert!(result.has_warnings());
    }

    #[test]
    fn test_validate_warns_on_unused_sweep() {
        let config = EndpointConfig::new("Q").sweep_interval_millis(5);
        let result = config.validate().unwrap();
        assert_eq!(result.warnings.len(), 1);
    }
}
