//! Producer writing messages to plain and keyed data queues.

use super::service::{QueueService, ServiceState};
use crate::config::EndpointConfig;
use crate::constants::KEY;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::queue::{QueueConnector, QueueHandle};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends messages to a data queue.
///
/// The payload is written as bytes or text according to the configured
/// [`Format`](crate::Format). A keyed producer takes the entry key from the
/// message's `KEY` header, falling back to `key`.
#[derive(Debug)]
pub struct QueueProducer {
    service: QueueService,
}

impl QueueProducer {
    /// Create a stopped producer.
    pub fn new(config: EndpointConfig, connector: Arc<dyn QueueConnector>) -> Self {
        Self {
            service: QueueService::new(config, connector),
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        self.service.config()
    }

    pub fn state(&self) -> ServiceState {
        self.service.state()
    }

    /// Open the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the connection
    /// fails.
    pub fn start(&self) -> Result<()> {
        let config = self.service.config();
        let validation = config.validate()?;
        for w in &validation.warnings {
            warn!(queue = %config.queue, "{w}");
        }
        self.service.start()
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns the error reported while closing; the producer is stopped
    /// regardless.
    pub fn stop(&self) -> Result<()> {
        self.service.stop()
    }

    /// Write `message` to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a keyed producer finds no usable
    /// key header or the body does not fit the format; nothing is written
    /// in that case. Queue failures are returned as is.
    pub fn send(&self, message: &Message) -> Result<()> {
        let handle = self.service.handle()?;
        let format = self.config().format;

        match handle {
            QueueHandle::Plain(queue) => {
                let payload = message.body().payload(format)?;
                debug!(queue = %queue.name(), bytes = payload.len(), "Sending message to data queue");
                queue.write(&payload)
            },
            QueueHandle::Keyed(queue) => {
                let key = message
                    .header_any_case(KEY)
                    .map(|value| value.as_bytes())
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| {
                        Error::configuration(format!(
                            "keyed data queue '{}' requires a non-empty {KEY} header",
                            queue.name()
                        ))
                    })?;
                let payload = message.body().payload(format)?;
                debug!(
                    queue = %queue.name(),
                    key = %String::from_utf8_lossy(key),
                    bytes = payload.len(),
                    "Sending message to keyed data queue"
                );
                queue.write(key, &payload)
            },
        }
    }
}

impl Drop for QueueProducer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
