//! Multi-key scan over a single-key keyed data queue.

use crate::error::Result;
use crate::queue::{KeyedDataQueue, QueueEntry, SearchType, Wait};
use tracing::trace;

/// Result of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    /// The search key whose probe returned the entry.
    pub key: String,
    pub entry: QueueEntry,
}

/// Emulates an "any of these keys" read with one exact-match probe per key.
///
/// Probes are zero-wait, issued in the given order, and stop at the first
/// hit. The keys are an owned snapshot; a key removed from the registry
/// mid-scan is still probed.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedScanner;

impl KeyedScanner {
    const SEARCH: SearchType = SearchType::Eq;

    /// Perform one scan pass.
    ///
    /// Returns `Ok(None)` when no key has an entry, without touching the
    /// queue if `keys` is empty.
    ///
    /// # Errors
    ///
    /// Returns the first probe failure; remaining keys are not probed.
    pub fn scan(keys: &[String], queue: &dyn KeyedDataQueue) -> Result<Option<ScanHit>> {
        for key in keys {
            trace!(queue = %queue.name(), key = %key, "Probing keyed data queue");
            if let Some(entry) = queue.read(key.as_bytes(), Wait::NoWait, Self::SEARCH)? {
                return Ok(Some(ScanHit {
                    key: key.clone(),
                    entry,
                }));
            }
        }
        Ok(None)
    }
}
