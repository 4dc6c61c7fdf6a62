// src/reaper.rs

// background eviction of idle clients

// dependencies
use crate::clock::Clock;
use crate::errors::ReaperError;
use crate::store::ClientStateStore;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

// idle thresholds beyond this almost certainly mean eviction never happens
const SUSPICIOUS_IDLE_THRESHOLD: Duration = Duration::from_secs(24 * 60 * 60);

/// Handle to the background thread that evicts idle clients.
///
/// The thread sweeps the store every `cleanup_interval`, removing clients
/// whose last decision is older than `idle_threshold`. It runs until
/// [`Reaper::stop`] is called or the handle is dropped.
#[derive(Debug)]
pub struct Reaper {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    pub fn spawn<C>(
        store: Arc<ClientStateStore>,
        clock: Arc<C>,
        cleanup_interval: Duration,
        idle_threshold: Duration,
    ) -> Result<Self, ReaperError>
    where
        C: Clock + ?Sized + 'static,
    {
        if idle_threshold > SUSPICIOUS_IDLE_THRESHOLD {
            warn!(
                idle_threshold_secs = idle_threshold.as_secs(),
                "idle threshold is over a day, client state may grow without bound"
            );
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("admission-reaper".into())
            .spawn(move || {
                info!(
                    cleanup_interval_ms = cleanup_interval.as_millis() as u64,
                    idle_threshold_ms = idle_threshold.as_millis() as u64,
                    "reaper started"
                );
                loop {
                    match stop_rx.recv_timeout(cleanup_interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let evicted = store.evict_idle(clock.now(), idle_threshold);
                            debug!(evicted, remaining = store.len(), "reaper sweep complete");
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("reaper stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the thread and wait for the sweep in progress, if any, to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // the thread may already be gone; either way it is told to stop
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("reaper thread panicked");
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown();
    }
}
