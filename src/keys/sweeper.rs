//! Background expiry sweep for a [`KeyRegistry`].

use super::registry::KeyRegistry;
use crate::error::{Error, Result};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// Owned periodic task that expires stale search keys.
///
/// The task runs until [`stop`](Self::stop) is called or the sweeper is
/// dropped; either way the timer is cancelled and no task outlives it.
pub struct ExpirySweeper {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ExpirySweeper {
    /// Spawn a sweeper on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a tokio runtime or if `ttl` or
    /// `interval` is zero.
    pub fn spawn(registry: KeyRegistry, ttl: Duration, interval: Duration) -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| {
            Error::configuration(format!("expiry sweep requires a tokio runtime: {e}"))
        })?;
        Self::spawn_on(&handle, registry, ttl, interval)
    }

    /// Spawn a sweeper on `handle`.
    ///
    /// # Errors
    ///
    /// Returns an error if `ttl` or `interval` is zero.
    pub fn spawn_on(
        handle: &Handle,
        registry: KeyRegistry,
        ttl: Duration,
        interval: Duration,
    ) -> Result<Self> {
        if ttl.is_zero() || interval.is_zero() {
            return Err(Error::configuration(
                "search key TTL and sweep interval must be greater than zero",
            ));
        }

        let sweeper = Self::spawn_sweeps(handle, interval, move || registry.sweep(ttl));
        info!(ttl = ?ttl, interval = ?interval, "Started search key sweeper");
        Ok(sweeper)
    }

    fn spawn_sweeps<F>(handle: &Handle, interval: Duration, sweep: F) -> Self
    where
        F: FnMut() -> Vec<String> + Send + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = handle.spawn(run_sweeps(sweep, interval, shutdown_rx));
        Self {
            shutdown,
            task: Some(task),
        }
    }

    /// Whether the sweep task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the sweep timer.
    pub fn stop(mut self) {
        self.cancel();
    }

    /// Signal the task and wait for it to finish its current sweep.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            warn!(error = %e, "Search key sweeper ended abnormally");
        }
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.shutdown.send(true);
            task.abort();
            debug!("Stopped search key sweeper");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ExpirySweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirySweeper")
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run_sweeps<F>(mut sweep: F, period: Duration, mut shutdown: watch::Receiver<bool>)
where
    F: FnMut() -> Vec<String>,
{
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            },
            _ = ticker.tick() => sweep_once(&mut sweep),
        }
    }
}

/// Run one sweep; a panicking sweep is logged and the next one still runs.
fn sweep_once<F>(sweep: &mut F)
where
    F: FnMut() -> Vec<String>,
{
    match std::panic::catch_unwind(AssertUnwindSafe(sweep)) {
        Ok(removed) if !removed.is_empty() => trace!(keys = ?removed, "Swept search keys"),
        Ok(_) => {},
        Err(_) => warn!("Search key sweep panicked, retrying next interval"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_expires_stale_keys() {
        let registry = KeyRegistry::new();
        registry.add_key("stale");

        let sweeper = ExpirySweeper::spawn(
            registry.clone(),
            Duration::from_secs(60),
            Duration::from_secs(60),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        registry.add_key("fresh");

        // First sweep at 60s: "stale" is exactly 60s old and survives.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(registry.contains("stale"));

        // Second sweep at 120s removes it; "fresh" is 90s old by then too.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(registry.is_empty());

        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshed_key_survives_sweeps() {
        let registry = KeyRegistry::new();
        let sweeper = ExpirySweeper::spawn(
            registry.clone(),
            Duration::from_secs(10),
            Duration::from_secs(5),
        )
        .unwrap();

        for _ in 0..10 {
            registry.add_key("heartbeat");
            tokio::time::sleep(Duration::from_secs(4)).await;
        }
        assert!(registry.contains("heartbeat"));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!registry.contains("heartbeat"));
        sweeper.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer() {
        let registry = KeyRegistry::new();
        registry.add_key("k");
        let sweeper = ExpirySweeper::spawn(
            registry.clone(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(sweeper.is_running());
        sweeper.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(registry.contains("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_sweep_does_not_stop_later_sweeps() {
        let ttl = Duration::from_secs(1);
        let registry = KeyRegistry::new();
        registry.add_key("expired");

        let sweeps = Arc::new(AtomicUsize::new(0));
        let sweeper = {
            let registry = registry.clone();
            let sweeps = sweeps.clone();
            ExpirySweeper::spawn_sweeps(&Handle::current(), Duration::from_secs(2), move || {
                if sweeps.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("sweep failed");
                }
                registry.sweep(ttl)
            })
        };

        // First tick at 2s panics and leaves the key in place.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(sweeps.load(Ordering::SeqCst), 1);
        assert!(registry.contains("expired"));
        assert!(sweeper.is_running());

        // Second tick at 4s still runs and expires it.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(sweeps.load(Ordering::SeqCst), 2);
        assert!(!registry.contains("expired"));

        sweeper.shutdown().await;
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let err = ExpirySweeper::spawn(
            KeyRegistry::new(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let err = ExpirySweeper::spawn(KeyRegistry::new(), Duration::from_secs(1), Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
