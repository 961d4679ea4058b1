//! Registry of active search keys with expiry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// A registered key's bookkeeping.
#[derive(Debug, Clone, Copy)]
struct KeyEntry {
    /// Registration order, kept across refreshes.
    seq: u64,
    last_seen_at: Instant,
}

#[derive(Debug, Default)]
struct RegistryState {
    keys: HashMap<String, KeyEntry>,
    next_seq: u64,
}

/// Thread-safe set of search keys, each stamped with when it was last added.
///
/// All operations serialize on one mutex. [`snapshot`](Self::snapshot)
/// returns an owned copy so a scan never observes concurrent mutation.
/// Keys that are not re-added within the TTL are dropped by
/// [`sweep`](Self::sweep).
///
/// `KeyRegistry` is `Clone`; clones share the same keys.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key`, or refresh its last-seen time if already present.
    pub fn add_key(&self, key: impl Into<String>) {
        self.add_key_at(key, Instant::now());
    }

    /// Register or refresh `key` as seen at `at`.
    ///
    /// The latest call wins, even if `at` is older than the stored time.
    pub fn add_key_at(&self, key: impl Into<String>, at: Instant) {
        let key = key.into();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.keys.get_mut(&key) {
            Some(entry) => entry.last_seen_at = at,
            None => {
                let seq = state.next_seq;
                state.next_seq += 1;
                trace!(key = %key, "Registered search key");
                state.keys.insert(
                    key,
                    KeyEntry {
                        seq,
                        last_seen_at: at,
                    },
                );
            },
        }
    }

    /// Unregister `key`. Returns whether it was present.
    pub fn remove_key(&self, key: &str) -> bool {
        self.state.lock().keys.remove(key).is_some()
    }

    /// Registered keys in registration order, copied at a single instant.
    pub fn snapshot(&self) -> Vec<String> {
        let mut keys: Vec<(u64, String)> = {
            let state = self.state.lock();
            state
                .keys
                .iter()
                .map(|(key, entry)| (entry.seq, key.clone()))
                .collect()
        };
        keys.sort_unstable_by_key(|(seq, _)| *seq);
        keys.into_iter().map(|(_, key)| key).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().keys.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every key. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.keys.len();
        state.keys.clear();
        count
    }

    /// Remove keys not seen for longer than `ttl`, as of now.
    pub fn sweep(&self, ttl: Duration) -> Vec<String> {
        self.sweep_at(ttl, Instant::now())
    }

    /// Remove keys with `now - last_seen_at > ttl`. Returns the removed keys.
    ///
    /// Candidates are collected under one lock acquisition and removed under
    /// a second, so a key refreshed in between survives.
    pub fn sweep_at(&self, ttl: Duration, now: Instant) -> Vec<String> {
        let expired: Vec<(String, Instant)> = {
            let state = self.state.lock();
            state
                .keys
                .iter()
                .filter(|(_, entry)| now.saturating_duration_since(entry.last_seen_at) > ttl)
                .map(|(key, entry)| (key.clone(), entry.last_seen_at))
                .collect()
        };

        if expired.is_empty() {
            trace!(ttl = ?ttl, "No search keys expired");
            return Vec::new();
        }

        let mut removed = Vec::with_capacity(expired.len());
        {
            let mut state = self.state.lock();
            for (key, seen_at) in expired {
                if state
                    .keys
                    .get(&key)
                    .is_some_and(|entry| entry.last_seen_at == seen_at)
                {
                    state.keys.remove(&key);
                    removed.push(key);
                }
            }
        }

        debug!(removed = removed.len(), ttl = ?ttl, "Expired search keys");
        removed
    }
}
