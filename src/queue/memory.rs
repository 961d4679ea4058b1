//! In-memory data queue backend.
//!
//! Provides non-persistent plain and keyed data queues for testing and
//! embedding. Blocking reads park on a condition variable and are woken by
//! writes or by closing the connection.

use super::backend::{DataQueue, KeyedDataQueue, QueueConnector, QueueHandle};
use super::types::{QueueEntry, SearchType, Wait};
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

struct Inner {
    name: String,
    entries: Mutex<VecDeque<QueueEntry>>,
    available: Condvar,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Shared storage of an in-memory data queue.
///
/// `MemoryQueue` is `Clone`; clones refer to the same entries. Plain reads
/// take entries in FIFO order, keyed reads take the oldest matching entry.
#[derive(Clone)]
pub struct MemoryQueue {
    inner: Arc<Inner>,
}

impl MemoryQueue {
    /// Create an empty queue.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                entries: Mutex::new(VecDeque::new()),
                available: Condvar::new(),
                reads: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Append an entry directly, bypassing any connection.
    pub fn push(&self, entry: QueueEntry) {
        self.inner.entries.lock().push_back(entry);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.available.notify_all();
    }

    /// Number of entries currently queued.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of reads issued against this queue.
    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of entries written to this queue.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Open a new connection to this queue.
    pub fn connect(&self, sender_information: impl Into<String>) -> MemoryConnection {
        MemoryConnection {
            queue: self.clone(),
            sender_information: sender_information.into(),
            closed: AtomicBool::new(false),
        }
    }

    /// Remove the first entry accepted by `matches`, waiting as `wait` allows.
    fn take(
        &self,
        wait: Wait,
        closed: &AtomicBool,
        matches: impl Fn(&QueueEntry) -> bool,
    ) -> Result<Option<QueueEntry>> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        let deadline = wait.duration().map(|d| Instant::now() + d);
        let mut entries = self.inner.entries.lock();

        loop {
            if closed.load(Ordering::SeqCst) {
                return Err(Error::closed(self.name()));
            }
            if let Some(pos) = entries.iter().position(&matches) {
                return Ok(entries.remove(pos));
            }
            match deadline {
                None => self.inner.available.wait(&mut entries),
                Some(deadline) => {
                    if Instant::now() >= deadline
                        || self
                            .inner
                            .available
                            .wait_until(&mut entries, deadline)
                            .timed_out()
                    {
                        if closed.load(Ordering::SeqCst) {
                            return Err(Error::closed(self.name()));
                        }
                        return Ok(entries
                            .iter()
                            .position(&matches)
                            .and_then(|pos| entries.remove(pos)));
                    }
                },
            }
        }
    }
}

impl std::fmt::Debug for MemoryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryQueue")
            .field("name", &self.inner.name)
            .field("len", &self.len())
            .finish()
    }
}

/// A connection to a [`MemoryQueue`].
///
/// Closing a connection fails its pending and future reads with
/// [`Error::Closed`] without affecting other connections to the same queue.
pub struct MemoryConnection {
    queue: MemoryQueue,
    sender_information: String,
    closed: AtomicBool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::closed(self.queue.name()));
        }
        Ok(())
    }

    fn close_connection(&self) {
        // Flag under the lock so a reader between its check and its wait
        // cannot miss the wakeup.
        let _entries = self.queue.inner.entries.lock();
        self.closed.store(true, Ordering::SeqCst);
        self.queue.inner.available.notify_all();
    }
}

impl DataQueue for MemoryConnection {
    fn name(&self) -> &str {
        self.queue.name()
    }

    fn read(&self, wait: Wait) -> Result<Option<QueueEntry>> {
        self.queue.take(wait, &self.closed, |_| true)
    }

    fn write(&self, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.queue
            .push(QueueEntry::new(payload, self.sender_information.clone()));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.close_connection();
        Ok(())
    }
}

impl KeyedDataQueue for MemoryConnection {
    fn name(&self) -> &str {
        self.queue.name()
    }

    fn read(&self, key: &[u8], wait: Wait, search: SearchType) -> Result<Option<QueueEntry>> {
        self.queue.take(wait, &self.closed, |entry| {
            entry
                .key
                .as_deref()
                .is_some_and(|entry_key| search.matches(entry_key, key))
        })
    }

    fn write(&self, key: &[u8], payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.queue.push(QueueEntry::keyed(
            key,
            payload,
            self.sender_information.clone(),
        ));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.close_connection();
        Ok(())
    }
}

/// Connector over a set of named in-memory queues.
///
/// Queues are created on first use; endpoints connecting to the same name
/// share entries.
pub struct MemoryConnector {
    queues: RwLock<HashMap<String, MemoryQueue>>,
    sender_information: String,
}

impl MemoryConnector {
    /// Create a connector that stamps written entries with `sender_information`.
    pub fn new(sender_information: impl Into<String>) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            sender_information: sender_information.into(),
        }
    }

    /// Get or create the queue named `name`.
    pub fn queue(&self, name: &str) -> MemoryQueue {
        if let Some(queue) = self.queues.read().get(name) {
            return queue.clone();
        }
        self.queues
            .write()
            .entry(name.to_string())
            .or_insert_with(|| MemoryQueue::new(name))
            .clone()
    }

    /// List all queue names.
    pub fn list_queues(&self) -> Vec<String> {
        self.queues.read().keys().cloned().collect()
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl QueueConnector for MemoryConnector {
    fn connect(&self, queue: &str, keyed: bool) -> Result<QueueHandle> {
        let connection = Arc::new(self.queue(queue).connect(self.sender_information.clone()));
        Ok(if keyed {
            QueueHandle::Keyed(connection)
        } else {
            QueueHandle::Plain(connection)
        })
    }
}
