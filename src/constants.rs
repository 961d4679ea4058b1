//! Crate-wide constants.

/// Default time a registered search key survives without being refreshed.
///
/// Also the default sweep period, so a stale key lives at most two TTLs.
pub const DEFAULT_KEY_TTL_MILLIS: u64 = 60_000;

/// Header carrying the sender information reported by the data queue.
pub const SENDER_INFORMATION: &str = "SENDER_INFORMATION";

/// Header carrying the key of a keyed data queue entry.
pub const KEY: &str = "KEY";

/// Millis per store wait unit (the data queue counts waits in seconds).
pub const MILLIS_PER_WAIT_SECOND: i64 = 1000;
