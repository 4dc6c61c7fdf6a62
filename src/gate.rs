// src/gate.rs

// admission-gate: per-client admission decisions under a configured strategy

// dependencies
use crate::clock::{Clock, MonotonicClock};
use crate::config::{AdmissionConfig, StrategyKind};
use crate::errors::{ConfigError, ReaperError};
use crate::reaper::Reaper;
use crate::store::ClientStateStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Key used for callers that arrive without any usable identity.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The main AdmissionGate model.
/// C is the clock type, defaulting to MonotonicClock.
/// Client state lives in a shared [`ClientStateStore`] so a [`Reaper`]
/// started from the gate sweeps the same map decisions are made against.
#[derive(Debug)]
pub struct AdmissionGate<C = MonotonicClock>
where
    C: Clock,
{
    config: AdmissionConfig,
    store: Arc<ClientStateStore>,
    clock: Arc<C>,
}

impl AdmissionGate<MonotonicClock> {
    /// Gate on the process monotonic clock.
    pub fn new(config: AdmissionConfig) -> Result<Self, ConfigError> {
        Self::with_config(config, MonotonicClock::new())
    }
}

// methods for the AdmissionGate type
impl<C> AdmissionGate<C>
where
    C: Clock,
{
    // method to create a new gate from a config object; rejects invalid
    // configurations before any request is seen
    pub fn with_config(config: AdmissionConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(ClientStateStore::new(config.clone())),
            config,
            clock: Arc::new(clock),
        })
    }

    /// Decide whether the client may proceed right now.
    ///
    /// Never fails. Evaluation updates the client's state even when the
    /// request is denied (a fixed window counts denied requests too). A
    /// blank key is accounted under [`UNKNOWN_CLIENT`].
    pub fn decide(&self, client_key: impl AsRef<str>) -> Decision {
        let client_key = client_key.as_ref();
        let key = if client_key.trim().is_empty() {
            UNKNOWN_CLIENT
        } else {
            client_key
        };

        let decision = self
            .store
            .with_entry(key, self.clock.now(), |state, now| state.evaluate(now));
        trace!(
            client = key,
            allowed = decision.allowed,
            remaining = decision.remaining,
            "admission decision"
        );
        decision
    }

    /// Evict idle clients once, synchronously. Returns how many were removed.
    pub fn sweep_idle(&self) -> usize {
        self.store
            .evict_idle(self.clock.now(), self.config.idle_threshold)
    }

    /// Number of clients currently holding state.
    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &ClientStateStore {
        &self.store
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    // accessor method to return the configured strategy
    pub fn strategy(&self) -> StrategyKind {
        self.config.strategy
    }

    // accessor method to return the configured capacity or limit
    pub fn capacity(&self) -> u64 {
        self.config.capacity
    }
}

impl<C> AdmissionGate<C>
where
    C: Clock + 'static,
{
    /// Start the background reaper for this gate's store.
    ///
    /// The caller owns the returned handle; dropping it stops the reaper.
    pub fn start_reaper(&self) -> Result<Reaper, ReaperError> {
        Reaper::spawn(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.config.cleanup_interval,
            self.config.idle_threshold,
        )
    }
}

/// Result of an admission decision with metadata for HTTP responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request should be allowed
    pub allowed: bool,
    /// Advisory wait before the next request is expected to be admitted
    /// (only set when denied). This is the exact time left, not a whole
    /// number of seconds: a token bucket reports the time until its next
    /// token, which is at most `1 / refill_per_second` and shrinks as a
    /// partial refill accumulates. Use [`Decision::retry_after_secs`] for
    /// the `ceil`-to-seconds value.
    pub retry_after: Option<Duration>,
    /// Requests the client can still make right now without being denied
    pub remaining: u64,
}

impl Decision {
    pub(crate) fn allow(remaining: u64) -> Self {
        Self {
            allowed: true,
            retry_after: None,
            remaining,
        }
    }

    pub(crate) fn deny(retry_after_nanos: u64) -> Self {
        Self {
            allowed: false,
            retry_after: Some(Duration::from_nanos(retry_after_nanos)),
            remaining: 0,
        }
    }

    /// `retry_after` rounded up to whole seconds, as sent in a `Retry-After` header.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after
            .map(|wait| wait.as_secs() + u64::from(wait.subsec_nanos() > 0))
    }
}
