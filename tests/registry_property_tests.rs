//! Property-based tests for the search key registry.
//!
//! # Tested Invariants
//!
//! - A snapshot holds exactly the keys added and not since removed
//! - Snapshots never contain duplicates
//! - Re-adding a key never changes the cardinality
//! - A sweep removes exactly the keys older than the TTL

use keyscan::KeyRegistry;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    Remove(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16).prop_map(Op::Add),
        (0u8..16).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn snapshot_matches_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let registry = KeyRegistry::new();
        let mut model = BTreeSet::new();

        for op in ops {
            match op {
                Op::Add(k) => {
                    registry.add_key(format!("k{k}"));
                    model.insert(format!("k{k}"));
                }
                Op::Remove(k) => {
                    let removed = registry.remove_key(&format!("k{k}"));
                    prop_assert_eq!(removed, model.remove(&format!("k{k}")));
                }
            }
        }

        let snapshot = registry.snapshot();
        let unique: BTreeSet<_> = snapshot.iter().cloned().collect();
        prop_assert_eq!(unique.len(), snapshot.len());
        prop_assert_eq!(unique, model);
    }

    #[test]
    fn readding_keeps_cardinality(keys in prop::collection::vec(0u8..32, 1..64)) {
        let registry = KeyRegistry::new();
        for k in &keys {
            registry.add_key(format!("k{k}"));
        }
        let before = registry.len();
        for k in &keys {
            registry.add_key(format!("k{k}"));
        }
        prop_assert_eq!(registry.len(), before);
    }

    #[test]
    fn sweep_removes_exactly_expired(
        ages in prop::collection::vec(0u64..10_000, 1..50),
        ttl_ms in 1u64..10_000,
    ) {
        let ttl = Duration::from_millis(ttl_ms);
        let registry = KeyRegistry::new();
        let base = Instant::now();
        let now = base + Duration::from_millis(10_000);

        let mut expected_alive = BTreeSet::new();
        let mut last_age = HashMap::new();
        for (i, age) in ages.iter().enumerate() {
            let key = format!("k{}", i % 20);
            registry.add_key_at(key.clone(), now - Duration::from_millis(*age));
            last_age.insert(key, *age);
        }
        for (key, age) in &last_age {
            if Duration::from_millis(*age) <= ttl {
                expected_alive.insert(key.clone());
            }
        }

        registry.sweep_at(ttl, now);
        let alive: BTreeSet<_> = registry.snapshot().into_iter().collect();
        prop_assert_eq!(alive, expected_alive);
    }
}
