// src/store.rs

// concurrent per-client state storage

// dependencies
use crate::config::{AdmissionConfig, as_nanos};
use crate::strategy::StrategyState;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// State of one client, guarded by its own lock.
#[derive(Debug)]
pub(crate) struct StoreEntry {
    inner: Mutex<EntryState>,
}

#[derive(Debug)]
struct EntryState {
    state: StrategyState,
    last_access: u64,
    // set under the entry lock just before the entry leaves the map
    evicted: bool,
}

impl StoreEntry {
    fn new(state: StrategyState, now: u64) -> Self {
        Self {
            inner: Mutex::new(EntryState {
                state,
                last_access: now,
                evicted: false,
            }),
        }
    }

    /// Last time a decision touched this entry, in clock nanoseconds.
    pub fn last_access(&self) -> u64 {
        self.inner.lock().last_access
    }

    /// Copy of the current algorithm state.
    pub fn snapshot(&self) -> StrategyState {
        self.inner.lock().state.clone()
    }
}

/// Concurrent map from client key to that client's strategy state.
///
/// The `DashMap` shard locks cover structural changes (insert and delete);
/// each entry's mutex covers its strategy state. Decisions for different
/// clients therefore never wait on each other's state, and decisions for the
/// same client are serialized in lock acquisition order.
///
/// Lock order is always entry first, then shard. Decisions never hold a
/// shard lock while waiting for an entry lock.
#[derive(Debug)]
pub struct ClientStateStore {
    config: AdmissionConfig,
    entries: DashMap<String, Arc<StoreEntry>>,
}

impl ClientStateStore {
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    /// Look up the entry for `key`, inserting fresh state built from the
    /// configuration if the client has not been seen before.
    ///
    /// A lookup alone does not count as activity: only [`Self::with_entry`]
    /// advances `last_access`.
    pub(crate) fn get_or_create(&self, key: &str, now: u64) -> Arc<StoreEntry> {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }

        let entry = self.entries.entry(key.to_owned()).or_insert_with(|| {
            debug!(client = key, strategy = %self.config.strategy, "tracking new client");
            Arc::new(StoreEntry::new(StrategyState::new(&self.config, now), now))
        });
        Arc::clone(entry.value())
    }

    /// Run `f` against the client's state while holding its lock.
    ///
    /// `now` is clamped so it never falls behind the entry's last access,
    /// and `last_access` is advanced before `f` runs. If the reaper evicted
    /// the entry between lookup and lock, the lookup is retried so the
    /// decision lands on the live entry.
    pub fn with_entry<R>(
        &self,
        key: &str,
        now: u64,
        f: impl FnOnce(&mut StrategyState, u64) -> R,
    ) -> R {
        loop {
            let entry = self.get_or_create(key, now);
            let mut guard = entry.inner.lock();
            if guard.evicted {
                continue;
            }

            let now = now.max(guard.last_access);
            guard.last_access = now;
            return f(&mut guard.state, now);
        }
    }

    /// Drop the client's state. Returns whether an entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        let Some(entry) = self.entry(key) else {
            return false;
        };

        let mut guard = entry.inner.lock();
        if guard.evicted {
            return false;
        }
        guard.evicted = true;
        self.entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, &entry))
            .is_some()
    }

    /// Remove the client if it has been idle for longer than `idle_nanos`.
    ///
    /// Waits for any decision in flight on the entry, then re-checks its
    /// last access before removing it.
    pub fn evict_if_idle(&self, key: &str, now: u64, idle_nanos: u64) -> bool {
        let Some(entry) = self.entry(key) else {
            return false;
        };

        let mut guard = entry.inner.lock();
        if guard.evicted || now.saturating_sub(guard.last_access) <= idle_nanos {
            return false;
        }
        guard.evicted = true;
        self.entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, &entry));
        debug!(client = key, idle_for_nanos = now - guard.last_access, "evicted idle client");
        true
    }

    /// One sweep over every tracked client. Returns how many were evicted.
    pub fn evict_idle(&self, now: u64, idle_threshold: Duration) -> usize {
        let idle_nanos = as_nanos(idle_threshold);
        self.snapshot_keys()
            .iter()
            .filter(|key| self.evict_if_idle(key, now, idle_nanos))
            .count()
    }

    pub fn snapshot_keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Copy of a client's current strategy state. Does not refresh the
    /// client's last access.
    pub fn state_of(&self, key: &str) -> Option<StrategyState> {
        self.entry(key).map(|entry| entry.snapshot())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, key: &str) -> Option<Arc<StoreEntry>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }
}
