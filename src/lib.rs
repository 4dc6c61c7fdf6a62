// src/lib.rs

//! # Admission Gate
//!
//! Per-client request admission control with a choice of rate limiting
//! strategies: token bucket, leaky bucket, fixed window counter and sliding
//! window log.
//!
//! A gate is built once from an [`AdmissionConfig`] and shared (usually in an
//! `Arc`) between request handlers. Each call to [`AdmissionGate::decide`]
//! looks up or creates the caller's state and returns a [`Decision`]. Idle
//! client state is evicted by a [`Reaper`] the host starts and stops
//! explicitly.
//!
//! ## Quick Example
//!
//! ```rust
//! use admission_gate::{AdmissionConfig, AdmissionGate};
//!
//! let config = AdmissionConfig::token_bucket(10, 5);
//! let gate = AdmissionGate::new(config).unwrap();
//! let reaper = gate.start_reaper().unwrap();
//!
//! let decision = gate.decide("203.0.113.7");
//! if decision.allowed {
//!     println!("Request allowed");
//! } else {
//!     println!("Rate limited - retry after {}s",
//!              decision.retry_after_secs().unwrap_or(0));
//! }
//!
//! reaper.stop();
//! ```

// private modules
mod clock;
mod config;
mod errors;
mod gate;
mod reaper;
mod store;
mod strategy;

pub mod client_key;

// public API exports
pub use clock::{Clock, MonotonicClock, NANOS_PER_SECOND};
pub use client_key::{ClientIdentity, ClientKey};
pub use config::{AdmissionConfig, StrategyKind};
pub use errors::{ConfigError, ReaperError};
pub use gate::{AdmissionGate, Decision, UNKNOWN_CLIENT};
pub use reaper::Reaper;
pub use store::ClientStateStore;
pub use strategy::{FixedWindow, LeakyBucket, SlidingWindowLog, StrategyState, TokenBucket};
