//! Core types for the data queue collaborator.

use crate::constants::MILLIS_PER_WAIT_SECOND;
use std::fmt;
use std::time::Duration;

/// Entry read from a data queue.
///
/// Produced by the store, never mutated here; only wrapped and forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Entry payload.
    pub data: Vec<u8>,
    /// Entry key, `None` for non-keyed queues.
    pub key: Option<Vec<u8>>,
    /// Opaque sender metadata reported by the queue.
    pub sender_information: String,
}

impl QueueEntry {
    /// Create a non-keyed entry.
    pub fn new(data: impl Into<Vec<u8>>, sender_information: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            key: None,
            sender_information: sender_information.into(),
        }
    }

    /// Create a keyed entry.
    pub fn keyed(
        key: impl Into<Vec<u8>>,
        data: impl Into<Vec<u8>>,
        sender_information: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            key: Some(key.into()),
            sender_information: sender_information.into(),
        }
    }
}

/// How long a read may wait for an entry.
///
/// Mirrors the data queue's native wait argument: `-1` blocks, `0` returns
/// immediately, a positive value waits that many seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Forever,
    NoWait,
    Seconds(u32),
}

impl Wait {
    /// Convert a receive timeout in milliseconds to the native wait.
    ///
    /// Negative timeouts block. Positive timeouts are truncated to whole
    /// seconds, so anything under one second is a zero-wait read.
    pub fn from_timeout_millis(timeout: i64) -> Self {
        if timeout < 0 {
            return Self::Forever;
        }
        match u32::try_from(timeout / MILLIS_PER_WAIT_SECOND) {
            Ok(0) => Self::NoWait,
            Ok(seconds) => Self::Seconds(seconds),
            Err(_) => Self::Seconds(u32::MAX),
        }
    }

    /// Native wait argument (`-1`, `0` or seconds).
    pub fn as_seconds(self) -> i64 {
        match self {
            Self::Forever => -1,
            Self::NoWait => 0,
            Self::Seconds(s) => i64::from(s),
        }
    }

    /// Bounded wait duration, `None` when blocking forever.
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::Forever => None,
            Self::NoWait => Some(Duration::ZERO),
            Self::Seconds(s) => Some(Duration::from_secs(u64::from(s))),
        }
    }
}

impl fmt::Display for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forever => f.write_str("no timeout"),
            Self::NoWait => f.write_str("no wait"),
            Self::Seconds(s) => write!(f, "{s}s timeout"),
        }
    }
}

/// Key comparison used by a keyed read.
///
/// An entry matches when `entry_key <op> search_key` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchType {
    #[default]
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl SearchType {
    pub fn matches(self, entry_key: &[u8], search_key: &[u8]) -> bool {
        match self {
            Self::Eq => entry_key == search_key,
            Self::Ne => entry_key != search_key,
            Self::Lt => entry_key < search_key,
            Self::Le => entry_key <= search_key,
            Self::Gt => entry_key > search_key,
            Self::Ge => entry_key >= search_key,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Gt => "GT",
            Self::Ge => "GE",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
