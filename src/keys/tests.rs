//! Tests for the keyed scan.

use super::*;
use crate::error::{Error, Result};
use crate::queue::{KeyedDataQueue, QueueEntry, SearchType, Wait};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keyed queue double that records every probe.
#[derive(Default)]
struct RecordingQueue {
    entries: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    probes: Mutex<Vec<(String, Wait, SearchType)>>,
    reads: AtomicUsize,
    fail_on: Option<&'static str>,
}

impl RecordingQueue {
    fn with_entry(self, key: &str, data: &str) -> Self {
        self.entries
            .lock()
            .insert(key.as_bytes().to_vec(), data.as_bytes().to_vec());
        self
    }

    fn probed_keys(&self) -> Vec<String> {
        self.probes.lock().iter().map(|(k, _, _)| k.clone()).collect()
    }
}

impl KeyedDataQueue for RecordingQueue {
    fn name(&self) -> &str {
        "RECORDING"
    }

    fn read(&self, key: &[u8], wait: Wait, search: SearchType) -> Result<Option<QueueEntry>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let key_str = String::from_utf8_lossy(key).into_owned();
        self.probes.lock().push((key_str.clone(), wait, search));
        if self.fail_on == Some(key_str.as_str()) {
            return Err(Error::read(self.name(), "connection reset"));
        }
        Ok(self
            .entries
            .lock()
            .remove(key)
            .map(|data| QueueEntry::keyed(key, data, "sender")))
    }

    fn write(&self, key: &[u8], payload: &[u8]) -> Result<()> {
        self.entries.lock().insert(key.to_vec(), payload.to_vec());
        Ok(())
    }
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_scan_empty_keys_never_probes() {
    let queue = RecordingQueue::default().with_entry("A", "data");
    let hit = KeyedScanner::scan(&[], &queue).unwrap();
    assert!(hit.is_none());
    assert_eq!(queue.reads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_scan_short_circuits_on_first_hit() {
    let queue = RecordingQueue::default().with_entry("k2", "two");
    let hit = KeyedScanner::scan(&keys(&["k1", "k2", "k3"]), &queue)
        .unwrap()
        .unwrap();

    assert_eq!(hit.key, "k2");
    assert_eq!(hit.entry.data, b"two");
    assert_eq!(queue.probed_keys(), vec!["k1", "k2"]);
    assert_eq!(queue.reads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_scan_probes_are_zero_wait_exact_match() {
    let queue = RecordingQueue::default();
    assert!(
        KeyedScanner::scan(&keys(&["a", "b"]), &queue)
            .unwrap()
            .is_none()
    );

    let probes = queue.probes.lock();
    assert_eq!(probes.len(), 2);
    assert!(
        probes
            .iter()
            .all(|(_, wait, search)| *wait == Wait::NoWait && *search == SearchType::Eq)
    );
}

#[test]
fn test_scan_respects_given_order() {
    let queue = RecordingQueue::default()
        .with_entry("x", "from x")
        .with_entry("y", "from y");

    let hit = KeyedScanner::scan(&keys(&["y", "x"]), &queue)
        .unwrap()
        .unwrap();
    assert_eq!(hit.key, "y");
}

#[test]
fn test_scan_failure_stops_pass() {
    let queue = RecordingQueue {
        fail_on: Some("b"),
        ..Default::default()
    }
    .with_entry("c", "never reached");

    let err = KeyedScanner::scan(&keys(&["a", "b", "c"]), &queue).unwrap_err();
    assert!(err.is_store());
    assert_eq!(queue.probed_keys(), vec!["a", "b"]);
}

#[test]
fn test_scan_uses_snapshot_not_live_registry() {
    let registry = KeyRegistry::new();
    registry.add_key("gone");
    registry.add_key("live");
    let snapshot = registry.snapshot();
    registry.remove_key("gone");

    let queue = RecordingQueue::default();
    KeyedScanner::scan(&snapshot, &queue).unwrap();
    assert_eq!(queue.probed_keys(), vec!["gone", "live"]);
}
