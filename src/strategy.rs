// src/strategy.rs

//! Per-client rate limiting state and the decision logic for each algorithm.
//!
//! Every algorithm is a variant of the closed [`StrategyState`] enum. The
//! store owns one value per client and hands it to [`StrategyState::evaluate`]
//! under that client's lock; a strategy never keeps a reference to its state
//! between calls.
//!
//! Times are nanoseconds on the gate's clock. The store guarantees that `now`
//! never decreases for a given client, and each algorithm additionally uses
//! saturating arithmetic so a stale timestamp counts as zero elapsed time.

// dependencies
use crate::clock::NANOS_PER_SECOND;
use crate::config::{AdmissionConfig, StrategyKind, as_nanos};
use crate::gate::Decision;
use std::collections::VecDeque;

/// The algorithm-specific state of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyState {
    TokenBucket(TokenBucket),
    LeakyBucket(LeakyBucket),
    FixedWindow(FixedWindow),
    SlidingWindowLog(SlidingWindowLog),
}

impl StrategyState {
    /// Fresh state for a client first seen at `now`.
    pub fn new(config: &AdmissionConfig, now: u64) -> Self {
        match config.strategy {
            StrategyKind::TokenBucket => StrategyState::TokenBucket(TokenBucket::new(
                config.capacity,
                config.refill_per_second,
                now,
            )),
            StrategyKind::LeakyBucket => StrategyState::LeakyBucket(LeakyBucket::new(
                config.capacity,
                as_nanos(config.leak_interval),
            )),
            StrategyKind::FixedWindow => StrategyState::FixedWindow(FixedWindow::new(
                config.capacity,
                as_nanos(config.window),
                now,
            )),
            StrategyKind::SlidingWindowLog => StrategyState::SlidingWindowLog(
                SlidingWindowLog::new(config.capacity, as_nanos(config.window)),
            ),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyState::TokenBucket(_) => StrategyKind::TokenBucket,
            StrategyState::LeakyBucket(_) => StrategyKind::LeakyBucket,
            StrategyState::FixedWindow(_) => StrategyKind::FixedWindow,
            StrategyState::SlidingWindowLog(_) => StrategyKind::SlidingWindowLog,
        }
    }

    /// Decide whether one unit of work may proceed at `now`, updating the
    /// state as a side effect.
    pub fn evaluate(&mut self, now: u64) -> Decision {
        match self {
            StrategyState::TokenBucket(bucket) => bucket.evaluate(now),
            StrategyState::LeakyBucket(bucket) => bucket.evaluate(now),
            StrategyState::FixedWindow(window) => window.evaluate(now),
            StrategyState::SlidingWindowLog(log) => log.evaluate(now),
        }
    }

    /// How much traffic the state currently accounts for: held tokens for a
    /// token bucket, queued slots for a leaky bucket, the raw counter for a
    /// fixed window (denials included) and logged admissions for a sliding log.
    pub fn observed(&self) -> u64 {
        match self {
            StrategyState::TokenBucket(bucket) => bucket.tokens(),
            StrategyState::LeakyBucket(bucket) => bucket.queued(),
            StrategyState::FixedWindow(window) => window.count(),
            StrategyState::SlidingWindowLog(log) => log.logged(),
        }
    }
}

/// Token bucket: starts full, refills `refill_per_second` whole tokens per
/// second, and spends one token per admission.
///
/// A denial's `retry_after` is the time until the next whole token arrives:
/// `1s / refill_per_second` right after the bucket drains, less once part of
/// that interval has passed. Rounded up to seconds this is
/// `ceil(1 / refill_per_second)` for a freshly drained bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucket {
    capacity: u64,
    tokens: u64,
    refill_per_second: u64,
    last_refill: u64,
}

impl TokenBucket {
    pub fn new(capacity: u64, refill_per_second: u64, now: u64) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_per_second: refill_per_second.max(1),
            last_refill: now,
        }
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    pub fn evaluate(&mut self, now: u64) -> Decision {
        self.refill(now);

        if self.tokens > 0 {
            // a full bucket accrues nothing, so start counting from here
            if self.tokens == self.capacity {
                self.last_refill = self.last_refill.max(now);
            }
            self.tokens -= 1;
            Decision::allow(self.tokens)
        } else {
            Decision::deny(self.until_next_token(now))
        }
    }

    // Only whole tokens are credited. `last_refill` moves forward by exactly
    // the time those tokens represent so the fractional remainder carries
    // over to the next call.
    fn refill(&mut self, now: u64) {
        let elapsed = now.saturating_sub(self.last_refill) as u128;
        let rate = self.refill_per_second as u128;
        let accrued = elapsed * rate / NANOS_PER_SECOND as u128;
        if accrued == 0 {
            return;
        }

        let room = (self.capacity - self.tokens) as u128;
        if accrued >= room {
            self.tokens = self.capacity;
            self.last_refill = now;
        } else {
            self.tokens += accrued as u64;
            let spent = accrued * NANOS_PER_SECOND as u128 / rate;
            self.last_refill += spent as u64;
        }
    }

    fn until_next_token(&self, now: u64) -> u64 {
        let per_token = NANOS_PER_SECOND.div_ceil(self.refill_per_second);
        let elapsed = now.saturating_sub(self.last_refill);
        per_token.saturating_sub(elapsed).max(1)
    }
}

/// Leaky bucket: a bounded FIFO of admission timestamps whose head drains
/// after spending `leak_interval` at the front of the queue.
///
/// Draining is lazy: each evaluation pops every head whose interval has
/// elapsed, then admits only if a slot is free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakyBucket {
    capacity: u64,
    leak_interval: u64,
    queue: VecDeque<u64>,
    // when the current head started draining
    head_since: u64,
}

impl LeakyBucket {
    pub fn new(capacity: u64, leak_interval: u64) -> Self {
        Self {
            capacity,
            leak_interval: leak_interval.max(1),
            queue: VecDeque::with_capacity(capacity.min(1024) as usize),
            head_since: 0,
        }
    }

    pub fn queued(&self) -> u64 {
        self.queue.len() as u64
    }

    pub fn evaluate(&mut self, now: u64) -> Decision {
        self.drain(now);

        if self.queued() < self.capacity {
            if self.queue.is_empty() {
                self.head_since = now;
            }
            self.queue.push_back(now);
            Decision::allow(self.capacity - self.queued())
        } else {
            Decision::deny(self.until_head_leaks(now))
        }
    }

    fn drain(&mut self, now: u64) {
        while let Some(&arrived) = self.queue.front() {
            let started = self.head_since.max(arrived);
            if now.saturating_sub(started) < self.leak_interval {
                self.head_since = started;
                break;
            }
            self.queue.pop_front();
            self.head_since = started.saturating_add(self.leak_interval);
        }
    }

    fn until_head_leaks(&self, now: u64) -> u64 {
        let started = match self.queue.front() {
            Some(&arrived) => self.head_since.max(arrived),
            None => return 0,
        };
        started
            .saturating_add(self.leak_interval)
            .saturating_sub(now)
            .max(1)
    }
}

/// Fixed window counter.
///
/// Every evaluation increments the counter, including denied ones: a
/// rejected request still occupies a slot in the current window, so `count`
/// may exceed `limit` until the window rolls over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedWindow {
    limit: u64,
    window: u64,
    count: u64,
    window_start: u64,
}

impl FixedWindow {
    pub fn new(limit: u64, window: u64, now: u64) -> Self {
        Self {
            limit,
            window: window.max(1),
            count: 0,
            window_start: now,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn window_start(&self) -> u64 {
        self.window_start
    }

    pub fn evaluate(&mut self, now: u64) -> Decision {
        if now.saturating_sub(self.window_start) >= self.window {
            self.count = 0;
            self.window_start = now;
        }

        self.count = self.count.saturating_add(1);
        if self.count <= self.limit {
            Decision::allow(self.limit - self.count)
        } else {
            let resets_at = self.window_start.saturating_add(self.window);
            Decision::deny(resets_at.saturating_sub(now).max(1))
        }
    }
}

/// Sliding window log: remembers the timestamp of every admission made in
/// the last `window` and admits while fewer than `limit` remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindowLog {
    limit: u64,
    window: u64,
    log: VecDeque<u64>,
}

impl SlidingWindowLog {
    pub fn new(limit: u64, window: u64) -> Self {
        Self {
            limit,
            window: window.max(1),
            log: VecDeque::with_capacity(limit.min(1024) as usize),
        }
    }

    pub fn logged(&self) -> u64 {
        self.log.len() as u64
    }

    pub fn evaluate(&mut self, now: u64) -> Decision {
        // an entry is live while now - t < window, i.e. t > now - window
        while let Some(&oldest) = self.log.front() {
            if now.saturating_sub(oldest) < self.window {
                break;
            }
            self.log.pop_front();
        }

        if self.logged() < self.limit {
            self.log.push_back(now);
            Decision::allow(self.limit - self.logged())
        } else {
            let expires_at = self
                .log
                .front()
                .map_or(now, |&oldest| oldest.saturating_add(self.window));
            Decision::deny(expires_at.saturating_sub(now).max(1))
        }
    }
}
