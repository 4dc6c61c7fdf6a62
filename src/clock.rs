// src/clock.rs

// clock abstraction used by the gate, the store and the reaper

// dependencies
use std::time::Instant;

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Clock trait to abstract time retrieval.
/// Implementors must be thread-safe (Send + Sync).
/// The `now` method returns the current time in nanoseconds as a u64, measured
/// from an arbitrary but fixed epoch chosen by the implementation.
/// Tests substitute a manually driven clock to get synthetic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Monotonic clock backed by [`Instant`].
/// The epoch is the moment the clock was created, so readings start near zero
/// and never go backwards.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        // u64 nanoseconds covers roughly 584 years of uptime
        self.origin.elapsed().as_nanos() as u64
    }
}
