//! Connection lifecycle shared by consumers and producers.

use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::queue::{QueueConnector, QueueHandle};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle state of a queue endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// Owns the data queue connection of one endpoint.
///
/// The connection is opened on [`start`](Self::start) and closed on
/// [`stop`](Self::stop); it is never handed out beyond the owning endpoint.
pub(crate) struct QueueService {
    config: EndpointConfig,
    connector: Arc<dyn QueueConnector>,
    /// Serializes start/stop transitions.
    lifecycle: Mutex<()>,
    state: RwLock<ServiceState>,
    handle: RwLock<Option<QueueHandle>>,
}

impl QueueService {
    pub(crate) fn new(config: EndpointConfig, connector: Arc<dyn QueueConnector>) -> Self {
        Self {
            config,
            connector,
            lifecycle: Mutex::new(()),
            state: RwLock::new(ServiceState::Stopped),
            handle: RwLock::new(None),
        }
    }

    pub(crate) fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Open the connection. Starting a running service is a no-op.
    pub(crate) fn start(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        if *self.state.read() == ServiceState::Running {
            return Ok(());
        }
        *self.state.write() = ServiceState::Starting;
        debug!(queue = %self.config.queue, keyed = self.config.keyed, "Connecting to data queue");

        match self.connect() {
            Ok(handle) => {
                *self.handle.write() = Some(handle);
                *self.state.write() = ServiceState::Running;
                info!(
                    queue = %self.config.queue,
                    keyed = self.config.keyed,
                    format = %self.config.format,
                    "Data queue endpoint started"
                );
                Ok(())
            },
            Err(e) => {
                *self.state.write() = ServiceState::Stopped;
                Err(e)
            },
        }
    }

    fn connect(&self) -> Result<QueueHandle> {
        let handle = self
            .connector
            .connect(&self.config.queue, self.config.keyed)?;
        if handle.is_keyed() != self.config.keyed {
            if let Err(e) = handle.close() {
                warn!(queue = %self.config.queue, error = %e, "Failed to close mismatched connection");
            }
            return Err(Error::configuration(format!(
                "connector returned a {} connection for {} endpoint '{}'",
                if handle.is_keyed() { "keyed" } else { "plain" },
                if self.config.keyed { "keyed" } else { "plain" },
                self.config.queue
            )));
        }
        Ok(handle)
    }

    /// Close the connection, waking any blocked reader.
    ///
    /// The service ends up stopped even if closing reports an error; that
    /// error is returned afterwards.
    pub(crate) fn stop(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        if *self.state.read() == ServiceState::Stopped {
            return Ok(());
        }
        *self.state.write() = ServiceState::Stopping;

        let closed = match self.handle.write().take() {
            Some(handle) => handle.close(),
            None => Ok(()),
        };
        *self.state.write() = ServiceState::Stopped;

        match &closed {
            Ok(()) => info!(queue = %self.config.queue, "Data queue endpoint stopped"),
            Err(e) => warn!(queue = %self.config.queue, error = %e, "Data queue closed with error"),
        }
        closed
    }

    /// The open connection.
    pub(crate) fn handle(&self) -> Result<QueueHandle> {
        self.handle
            .read()
            .clone()
            .ok_or_else(|| Error::not_started(&self.config.queue))
    }
}

impl fmt::Debug for QueueService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueService")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
