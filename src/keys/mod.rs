//! Dynamic search key registry and keyed scan.
//!
//! A keyed data queue can only be asked for one key at a time. To watch a
//! changing set of keys, consumers register keys in a [`KeyRegistry`], and
//! every poll hands a snapshot of it to [`KeyedScanner`], which probes each key
//! once and returns the first entry found. Keys that stop being refreshed
//! are expired by an [`ExpirySweeper`].
//!
//! # Example
//!
//! ```rust
//! use keyscan::keys::{KeyRegistry, KeyedScanner};
//! use keyscan::queue::{MemoryQueue, QueueEntry};
//!
//! # fn main() -> keyscan::Result<()> {
//! let queue = MemoryQueue::new("ORDERS");
//! queue.push(QueueEntry::keyed("B", "payload", "job"));
//!
//! let registry = KeyRegistry::new();
//! registry.add_key("A");
//! registry.add_key("B");
//!
//! let conn = queue.connect("job");
//! let hit = KeyedScanner::scan(&registry.snapshot(), &conn)?.unwrap();
//! assert_eq!(hit.key, "B");
//! assert_eq!(hit.entry.data, b"payload");
//! # Ok(())
//! # }
//! ```

mod registry;
mod scanner;
mod sweeper;

pub use registry::KeyRegistry;
pub use scanner::{KeyedScanner, ScanHit};
pub use sweeper::ExpirySweeper;

#[cfg(test)]
mod tests;
