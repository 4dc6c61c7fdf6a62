// src/config.rs

//! Configuration types for the admission gate

// dependencies
use crate::errors::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::Deserialize;

const DEFAULT_CAPACITY: u64 = 10;
const DEFAULT_REFILL_PER_SECOND: u64 = 1;
const DEFAULT_LEAK_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(60);

/// The rate limiting algorithm applied to every client of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StrategyKind {
    TokenBucket,
    LeakyBucket,
    FixedWindow,
    SlidingWindowLog,
}

impl StrategyKind {
    /// Canonical name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::TokenBucket => "token_bucket",
            StrategyKind::LeakyBucket => "leaky_bucket",
            StrategyKind::FixedWindow => "fixed_window",
            StrategyKind::SlidingWindowLog => "sliding_window_log",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    // Also accepts the compact flag spellings (`tokenbucket`, `fixedwindow`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token_bucket" | "tokenbucket" => Ok(StrategyKind::TokenBucket),
            "leaky_bucket" | "leakybucket" => Ok(StrategyKind::LeakyBucket),
            "fixed_window" | "fixedwindow" => Ok(StrategyKind::FixedWindow),
            "sliding_window_log" | "slidingwindowlog" | "sliding_window" | "slidingwindow" => {
                Ok(StrategyKind::SlidingWindowLog)
            }
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Configuration for admission gate behavior.
///
/// Which of `refill_per_second`, `leak_interval` and `window` matters depends
/// on the strategy; the others are carried but ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "ConfigDocument"))]
pub struct AdmissionConfig {
    pub(crate) strategy: StrategyKind,
    pub(crate) capacity: u64,
    pub(crate) refill_per_second: u64,
    pub(crate) leak_interval: Duration,
    pub(crate) window: Duration,
    pub(crate) cleanup_interval: Duration,
    pub(crate) idle_threshold: Duration,
}

impl AdmissionConfig {
    /// Create a new configuration for a strategy with the given capacity
    /// (bucket size for the buckets, request limit for the windows).
    pub fn new(strategy: StrategyKind, capacity: u64) -> Self {
        Self {
            strategy,
            capacity,
            refill_per_second: DEFAULT_REFILL_PER_SECOND,
            leak_interval: DEFAULT_LEAK_INTERVAL,
            window: DEFAULT_WINDOW,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
        }
    }

    pub fn token_bucket(capacity: u64, refill_per_second: u64) -> Self {
        Self::new(StrategyKind::TokenBucket, capacity).refill_per_second(refill_per_second)
    }

    pub fn leaky_bucket(capacity: u64, leak_interval: Duration) -> Self {
        Self::new(StrategyKind::LeakyBucket, capacity).leak_interval(leak_interval)
    }

    pub fn fixed_window(limit: u64, window: Duration) -> Self {
        Self::new(StrategyKind::FixedWindow, limit).window(window)
    }

    pub fn sliding_window_log(limit: u64, window: Duration) -> Self {
        Self::new(StrategyKind::SlidingWindowLog, limit).window(window)
    }

    /// Builder-style: set strategy
    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builder-style: set capacity or limit
    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builder-style: set token bucket refill rate
    pub fn refill_per_second(mut self, refill_per_second: u64) -> Self {
        self.refill_per_second = refill_per_second;
        self
    }

    /// Builder-style: set leaky bucket drain interval per slot
    pub fn leak_interval(mut self, leak_interval: Duration) -> Self {
        self.leak_interval = leak_interval;
        self
    }

    /// Builder-style: set window size for the window strategies
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Builder-style: set how often the reaper sweeps
    pub fn cleanup_interval(mut self, cleanup_interval: Duration) -> Self {
        self.cleanup_interval = cleanup_interval;
        self
    }

    /// Builder-style: set how long a client may stay idle before eviction
    pub fn idle_threshold(mut self, idle_threshold: Duration) -> Self {
        self.idle_threshold = idle_threshold;
        self
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy
    }

    pub fn capacity_value(&self) -> u64 {
        self.capacity
    }

    pub fn cleanup_interval_value(&self) -> Duration {
        self.cleanup_interval
    }

    pub fn idle_threshold_value(&self) -> Duration {
        self.idle_threshold
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        match self.strategy {
            StrategyKind::TokenBucket if self.refill_per_second == 0 => {
                return Err(ConfigError::InvalidRefillRate);
            }
            StrategyKind::LeakyBucket if as_nanos(self.leak_interval) == 0 => {
                return Err(ConfigError::InvalidLeakInterval);
            }
            StrategyKind::FixedWindow | StrategyKind::SlidingWindowLog
                if as_nanos(self.window) == 0 =>
            {
                return Err(ConfigError::InvalidWindow);
            }
            _ => {}
        }
        if self.cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidCleanupInterval);
        }
        if self.idle_threshold.is_zero() {
            return Err(ConfigError::InvalidIdleThreshold);
        }
        Ok(())
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self::new(StrategyKind::TokenBucket, DEFAULT_CAPACITY)
    }
}

// saturates at u64::MAX nanoseconds
pub(crate) fn as_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Flat, millisecond-based shape used when the configuration is loaded from a
/// document. Missing fields take the builder defaults.
#[cfg(feature = "serde")]
#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConfigDocument {
    strategy: StrategyKind,
    capacity: u64,
    refill_per_second: u64,
    leak_interval_ms: u64,
    window_ms: u64,
    cleanup_interval_ms: u64,
    idle_threshold_ms: u64,
}

#[cfg(feature = "serde")]
impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::TokenBucket,
            capacity: DEFAULT_CAPACITY,
            refill_per_second: DEFAULT_REFILL_PER_SECOND,
            leak_interval_ms: DEFAULT_LEAK_INTERVAL.as_millis() as u64,
            window_ms: DEFAULT_WINDOW.as_millis() as u64,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL.as_millis() as u64,
            idle_threshold_ms: DEFAULT_IDLE_THRESHOLD.as_millis() as u64,
        }
    }
}

#[cfg(feature = "serde")]
impl From<ConfigDocument> for AdmissionConfig {
    fn from(doc: ConfigDocument) -> Self {
        AdmissionConfig::new(doc.strategy, doc.capacity)
            .refill_per_second(doc.refill_per_second)
            .leak_interval(Duration::from_millis(doc.leak_interval_ms))
            .window(Duration::from_millis(doc.window_ms))
            .cleanup_interval(Duration::from_millis(doc.cleanup_interval_ms))
            .idle_threshold(Duration::from_millis(doc.idle_threshold_ms))
    }
}
