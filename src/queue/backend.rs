//! Backend traits for data queues.
//!
//! The remote queue and its protocol live outside this crate. These traits
//! describe the point-read and write primitives the endpoints rely on, so any
//! transport can be plugged in through a [`QueueConnector`].

use super::types::{QueueEntry, SearchType, Wait};
use crate::error::Result;
use std::sync::Arc;

/// A non-keyed data queue connection.
///
/// Implementations must be thread-safe (`Send + Sync`). Errors are reported
/// through [`crate::Error`] constructors such as [`crate::Error::read`].
pub trait DataQueue: Send + Sync {
    /// Queue name used in diagnostics.
    fn name(&self) -> &str;

    /// Read and remove the next entry.
    ///
    /// Returns `Ok(None)` if the wait elapsed without an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue fails or the connection is closed.
    fn read(&self, wait: Wait) -> Result<Option<QueueEntry>>;

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue rejects the write.
    fn write(&self, payload: &[u8]) -> Result<()>;

    /// Close the connection, waking any blocked reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection could not be released cleanly.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A keyed data queue connection.
///
/// Reads select a single entry by comparing one search key; there is no
/// multi-key primitive.
pub trait KeyedDataQueue: Send + Sync {
    /// Queue name used in diagnostics.
    fn name(&self) -> &str;

    /// Read and remove the first entry whose key satisfies `search`.
    ///
    /// Returns `Ok(None)` if no entry matched within the wait.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue fails or the connection is closed.
    fn read(&self, key: &[u8], wait: Wait, search: SearchType) -> Result<Option<QueueEntry>>;

    /// Append an entry under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue rejects the write.
    fn write(&self, key: &[u8], payload: &[u8]) -> Result<()>;

    /// Close the connection, waking any blocked reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection could not be released cleanly.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// An open connection to either kind of data queue.
#[derive(Clone)]
pub enum QueueHandle {
    Plain(Arc<dyn DataQueue>),
    Keyed(Arc<dyn KeyedDataQueue>),
}

impl QueueHandle {
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(queue) => queue.name(),
            Self::Keyed(queue) => queue.name(),
        }
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, Self::Keyed(_))
    }

    /// Close the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the connection.
    pub fn close(&self) -> Result<()> {
        match self {
            Self::Plain(queue) => queue.close(),
            Self::Keyed(queue) => queue.close(),
        }
    }
}

impl std::fmt::Debug for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_keyed() { "Keyed" } else { "Plain" };
        f.debug_tuple(kind).field(&self.name()).finish()
    }
}

/// Opens data queue connections.
///
/// Called on endpoint start; the returned handle is owned by the endpoint
/// until it stops.
pub trait QueueConnector: Send + Sync {
    /// Open a connection to `queue`.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be reached.
    fn connect(&self, queue: &str, keyed: bool) -> Result<QueueHandle>;
}
