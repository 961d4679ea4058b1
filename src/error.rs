//! Error types for typed error handling.
//!
//! Three outcomes of a queue operation are kept apart: a filled result,
//! an empty result (`Ok(None)`), and a failure (`Err(Error)`). A timed-out
//! read is an empty result, never an error.

use std::path::PathBuf;

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed failure reported by a data queue implementation.
pub type StoreFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller-side misconfiguration (for example a keyed send without a key).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The underlying data queue reported a failure.
    #[error("unable to {operation} data queue: {queue}")]
    Store {
        queue: String,
        operation: &'static str,
        #[source]
        source: StoreFailure,
    },

    /// The data queue returned an entry that the configured format cannot hold.
    #[error("malformed entry on data queue '{queue}': {reason}")]
    MalformedEntry { queue: String, reason: String },

    /// The connection was closed while the operation was in flight.
    #[error("data queue '{queue}' was closed")]
    Closed { queue: String },

    /// Operation attempted on a consumer or producer that is not running.
    #[error("'{name}' is not started")]
    NotStarted { name: String },

    /// IO error with context.
    #[error("IO error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse config file {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Wrap a store failure that happened while reading.
    pub fn read(queue: impl Into<String>, source: impl Into<StoreFailure>) -> Self {
        Self::Store {
            queue: queue.into(),
            operation: "read from",
            source: source.into(),
        }
    }

    /// Wrap a store failure that happened while writing.
    pub fn write(queue: impl Into<String>, source: impl Into<StoreFailure>) -> Self {
        Self::Store {
            queue: queue.into(),
            operation: "write to",
            source: source.into(),
        }
    }

    /// Wrap a store failure that happened while connecting.
    pub fn connect(queue: impl Into<String>, source: impl Into<StoreFailure>) -> Self {
        Self::Store {
            queue: queue.into(),
            operation: "connect to",
            source: source.into(),
        }
    }

    /// Create a malformed entry error.
    pub fn malformed(queue: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            queue: queue.into(),
            reason: reason.into(),
        }
    }

    /// Create a closed error.
    pub fn closed(queue: impl Into<String>) -> Self {
        Self::Closed {
            queue: queue.into(),
        }
    }

    /// Create a not started error.
    pub fn not_started(name: impl Into<String>) -> Self {
        Self::NotStarted { name: name.into() }
    }

    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the failure came from the data queue itself.
    pub fn is_store(&self) -> bool {
        matches!(
            self,
            Self::Store { .. } | Self::MalformedEntry { .. } | Self::Closed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_names_queue() {
        let err = Error::read("ORDERS", std::io::Error::other("connection reset"));
        assert_eq!(err.to_string(), "unable to read from data queue: ORDERS");
        assert!(err.is_store());

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_configuration_is_not_store() {
        let err = Error::configuration("missing KEY header");
        assert!(!err.is_store());
        assert_eq!(err.to_string(), "configuration error: missing KEY header");
    }
}
