//! Preloaded set tracking which routes have already been triggered

use crate::RouteKey;
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// State of a route with respect to preloading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreloadState {
    /// Never triggered, or evicted after a failed load
    NotPreloaded,
    /// Triggered; the load is in flight or has completed
    Preloaded,
}

/// Statistics for preload activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadStats {
    /// Loads started
    pub triggered: u64,
    /// Triggers that did nothing (unresolved path or already preloaded)
    pub suppressed: u64,
    /// Loads that completed
    pub succeeded: u64,
    /// Loads that failed and were evicted
    pub failed: u64,
}

impl PreloadStats {
    /// Loads still in flight
    pub fn in_flight(&self) -> u64 {
        self.triggered.saturating_sub(self.succeeded + self.failed)
    }

    /// Fraction of finished loads that succeeded
    pub fn success_rate(&self) -> f32 {
        let finished = self.succeeded + self.failed;
        if finished == 0 {
            0.0
        } else {
            self.succeeded as f32 / finished as f32
        }
    }
}

/// Set of route keys already triggered in this session.
///
/// Insertion is the optimistic mark taken before a load starts, so a key
/// present here is never loaded twice concurrently. Failed loads evict
/// their key; nothing else ever removes one.
#[derive(Debug, Default)]
pub struct PreloadedSet {
    keys: DashSet<RouteKey>,
    triggered: AtomicU64,
    suppressed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl PreloadedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as preloaded. Returns false if it was already present.
    pub fn try_mark(&self, key: &RouteKey) -> bool {
        let inserted = self.keys.insert(key.clone());
        if inserted {
            self.triggered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
        }
        inserted
    }

    /// Record a trigger that could not be resolved to a route
    pub fn record_unresolved(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed load. The key stays marked.
    pub fn mark_loaded(&self, key: &RouteKey) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        trace!(route = %key, "Preload complete");
    }

    /// Evict a key after a failed load so a later trigger may retry
    pub fn evict(&self, key: &RouteKey) -> bool {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.keys.remove(key).is_some()
    }

    /// Check if a key is marked
    pub fn contains(&self, key: &RouteKey) -> bool {
        self.keys.contains(key)
    }

    /// Current state of a key
    pub fn state(&self, key: &RouteKey) -> PreloadState {
        if self.contains(key) {
            PreloadState::Preloaded
        } else {
            PreloadState::NotPreloaded
        }
    }

    /// Number of marked keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no key is marked
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Marked keys, sorted
    pub fn snapshot(&self) -> Vec<RouteKey> {
        let mut keys: Vec<RouteKey> = self.keys.iter().map(|k| k.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Get preload statistics
    pub fn stats(&self) -> PreloadStats {
        PreloadStats {
            triggered: self.triggered.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
