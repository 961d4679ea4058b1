//! Polling consumer for plain and keyed data queues.

use super::service::{QueueService, ServiceState};
use crate::config::EndpointConfig;
use crate::constants::{KEY, SENDER_INFORMATION};
use crate::error::{Error, Result};
use crate::keys::{ExpirySweeper, KeyRegistry, KeyedScanner};
use crate::message::{Body, Format, HeaderValue, Message};
use crate::queue::{DataQueue, KeyedDataQueue, QueueConnector, QueueEntry, QueueHandle, Wait};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{trace, warn};

/// Receives messages from a data queue on demand.
///
/// Each [`receive`](Self::receive) is independent; an external scheduler
/// decides how often to call it and whether to retry after a failure.
///
/// A keyed consumer reads the keys in its [`KeyRegistry`]. Every receive
/// scans a snapshot of them with zero-wait probes, so keyed receives never
/// block: a blocking or bounded timeout still performs exactly one scan
/// pass. Callers wanting to wait on keyed data must poll.
///
/// A consumer built with [`new`](Self::new) owns its registry: it runs the
/// expiry sweep while started and discards the keys on stop. A registry
/// passed to [`with_registry`](Self::with_registry) belongs to the caller,
/// who schedules its sweep and decides when to clear it.
///
/// Receives may run concurrently; [`DataQueue`] and [`KeyedDataQueue`]
/// implementations are required to be thread-safe.
#[derive(Debug)]
pub struct QueuePollingConsumer {
    service: QueueService,
    registry: KeyRegistry,
    owns_registry: bool,
    sweeper: Mutex<Option<ExpirySweeper>>,
}

impl QueuePollingConsumer {
    /// Create a stopped consumer with its own key registry.
    pub fn new(config: EndpointConfig, connector: Arc<dyn QueueConnector>) -> Self {
        Self::build(config, connector, KeyRegistry::new(), true)
    }

    /// Create a stopped consumer reading keys from a caller-owned `registry`.
    ///
    /// The consumer neither sweeps nor clears `registry`, so several
    /// consumers can share it. Pair it with an [`ExpirySweeper`] to expire
    /// unrefreshed keys.
    pub fn with_registry(
        config: EndpointConfig,
        connector: Arc<dyn QueueConnector>,
        registry: KeyRegistry,
    ) -> Self {
        Self::build(config, connector, registry, false)
    }

    fn build(
        config: EndpointConfig,
        connector: Arc<dyn QueueConnector>,
        registry: KeyRegistry,
        owns_registry: bool,
    ) -> Self {
        Self {
            service: QueueService::new(config, connector),
            registry,
            owns_registry,
            sweeper: Mutex::new(None),
        }
    }

    /// The registry of keys this consumer scans.
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EndpointConfig {
        self.service.config()
    }

    pub fn state(&self) -> ServiceState {
        self.service.state()
    }

    /// Whether this consumer is currently expiring keys in its registry.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(ExpirySweeper::is_running)
    }

    /// Open the connection and, for keyed queues with an owned registry,
    /// start the expiry sweep.
    ///
    /// Must be called within a tokio runtime when the sweep is started.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the sweep cannot
    /// be scheduled, or the connection fails.
    pub fn start(&self) -> Result<()> {
        let config = self.service.config();
        let validation = config.validate()?;
        for w in &validation.warnings {
            warn!(queue = %config.queue, "{w}");
        }

        let mut sweeper = self.sweeper.lock();
        if config.keyed && self.owns_registry && sweeper.is_none() {
            *sweeper = Some(ExpirySweeper::spawn(
                self.registry.clone(),
                config.ttl(),
                config.sweep_interval(),
            )?);
        }

        if let Err(e) = self.service.start() {
            if let Some(sweeper) = sweeper.take() {
                sweeper.stop();
            }
            return Err(e);
        }
        Ok(())
    }

    /// Close the connection and, for an owned registry, stop the sweep and
    /// discard registered keys. A shared registry is left untouched.
    ///
    /// A receive blocked on the queue fails with [`Error::Closed`].
    ///
    /// # Errors
    ///
    /// Returns the error reported while closing the connection; the
    /// consumer is stopped regardless.
    pub fn stop(&self) -> Result<()> {
        // Same lock order as `start`: sweeper, then the service lifecycle.
        let mut sweeper = self.sweeper.lock();
        let closed = self.service.stop();
        if let Some(sweeper) = sweeper.take() {
            sweeper.stop();
        }
        if self.owns_registry {
            self.registry.clear();
        }
        closed
    }

    /// Blocking receive (`timeout = -1`).
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive).
    pub fn receive_blocking(&self) -> Result<Option<Message>> {
        self.receive(-1)
    }

    /// Non-blocking receive (`timeout = 0`).
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive).
    pub fn receive_no_wait(&self) -> Result<Option<Message>> {
        self.receive(0)
    }

    /// Receive at most one message.
    ///
    /// `timeout` is in milliseconds. For a plain queue a negative value
    /// blocks until an entry arrives, zero does not wait, and a positive
    /// value waits up to that many whole seconds. For a keyed queue every
    /// value performs a single non-blocking scan pass.
    ///
    /// On a hit the message carries the entry payload, the
    /// `SENDER_INFORMATION` header and, for keyed queues, the `KEY` header.
    ///
    /// Returns `Ok(None)` if nothing was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer is not started, the queue fails, or
    /// the entry cannot be represented in the configured format. Nothing is
    /// retried.
    pub fn receive(&self, timeout: i64) -> Result<Option<Message>> {
        match self.service.handle()? {
            QueueHandle::Plain(queue) => self.receive_plain(queue.as_ref(), timeout),
            QueueHandle::Keyed(queue) => self.receive_keyed(queue.as_ref(), timeout),
        }
    }

    fn receive_plain(&self, queue: &dyn DataQueue, timeout: i64) -> Result<Option<Message>> {
        let wait = Wait::from_timeout_millis(timeout);
        trace!(queue = %queue.name(), wait = %wait, "Reading from data queue");

        let Some(entry) = queue.read(wait)? else {
            return Ok(None);
        };
        self.to_message(queue.name(), entry).map(Some)
    }

    fn receive_keyed(&self, queue: &dyn KeyedDataQueue, timeout: i64) -> Result<Option<Message>> {
        let keys = self.registry.snapshot();
        trace!(
            queue = %queue.name(),
            keys = keys.len(),
            timeout,
            "Scanning keyed data queue"
        );

        let Some(hit) = KeyedScanner::scan(&keys, queue)? else {
            return Ok(None);
        };

        let key = hit.entry.key.clone().unwrap_or_else(|| hit.key.into_bytes());
        let key = match self.config().format {
            Format::Binary => HeaderValue::Bytes(key),
            Format::Text => HeaderValue::Text(String::from_utf8(key).map_err(|e| {
                Error::malformed(queue.name(), format!("entry key is not valid text: {e}"))
            })?),
        };

        let mut message = self.to_message(queue.name(), hit.entry)?;
        message.set_header(KEY, key);
        Ok(Some(message))
    }

    fn to_message(&self, queue: &str, entry: QueueEntry) -> Result<Message> {
        let body = match self.config().format {
            Format::Binary => Body::Binary(entry.data),
            Format::Text => Body::Text(String::from_utf8(entry.data).map_err(|e| {
                Error::malformed(queue, format!("entry data is not valid text: {e}"))
            })?),
        };
        Ok(Message::new(body).with_header(SENDER_INFORMATION, entry.sender_information))
    }
}

impl Drop for QueuePollingConsumer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
