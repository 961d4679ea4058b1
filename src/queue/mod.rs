//! Data queue collaborator.
//!
//! The remote queue only supports point reads: the next entry of a plain
//! queue, or the first entry of a keyed queue whose key compares to a single
//! search key. Everything above this module is built on those two primitives.
//!
//! - [`DataQueue`] / [`KeyedDataQueue`]: connection traits for the two kinds
//! - [`QueueHandle`]: an open connection of either kind
//! - [`QueueConnector`]: opens handles on endpoint start
//! - [`MemoryConnector`]: in-process implementation for tests and embedding

mod backend;
mod memory;
mod types;

pub use backend::{DataQueue, KeyedDataQueue, QueueConnector, QueueHandle};
pub use memory::{MemoryConnection, MemoryConnector, MemoryQueue};
pub use types::{QueueEntry, SearchType, Wait};
