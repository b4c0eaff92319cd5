//! Capacity-bounded shared resource pools.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque per-resource payload handed unchanged to the project simulator.
pub type ResourceData = serde_json::Value;

/// Identity of a pool: `(category, name)`, e.g. `("port", "salem")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    /// Category, which is also the project configuration field the pool fills.
    pub category: String,
    /// Resource name within the category.
    pub name: String,
}

impl PoolKey {
    /// Build a key from any string-likes.
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.name)
    }
}

/// Change signal shared between a library and the pools it owns.
///
/// Pools raise it whenever headroom may have appeared; the library consumes
/// it to decide whether a grant scan is due.
#[derive(Debug, Clone, Default)]
pub struct CapacityNotifier {
    raised: Arc<AtomicBool>,
}

impl CapacityNotifier {
    /// Create a lowered notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that capacity may be available.
    pub fn notify(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Consume the signal, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }
}

/// A named set of identical resources with a usage counter.
///
/// Invariant: `in_use <= capacity`. Capacity only grows.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    key: PoolKey,
    capacity: u32,
    in_use: u32,
    data: ResourceData,
    notifier: CapacityNotifier,
}

impl ResourcePool {
    /// Create a pool wired to its owner's notifier.
    pub fn new(key: PoolKey, capacity: u32, data: ResourceData, notifier: CapacityNotifier) -> Self {
        Self {
            key,
            capacity,
            in_use: 0,
            data,
            notifier,
        }
    }

    /// Pool identity.
    pub const fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Total units.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units currently held by granted requests.
    pub const fn in_use(&self) -> u32 {
        self.in_use
    }

    /// Units free right now.
    pub const fn available(&self) -> u32 {
        self.capacity - self.in_use
    }

    /// Static payload loaded at construction.
    pub const fn data(&self) -> &ResourceData {
        &self.data
    }

    /// Whether one more unit can be acquired.
    pub const fn has_headroom(&self) -> bool {
        self.in_use < self.capacity
    }

    /// Take one unit. Only the grant scan calls this, after checking headroom.
    pub(crate) fn acquire(&mut self) {
        debug_assert!(self.has_headroom(), "acquire on a full pool {}", self.key);
        self.in_use += 1;
    }

    /// Return one unit. Returns `false` (and changes nothing) if no unit was held.
    pub(crate) fn release(&mut self) -> bool {
        if self.in_use == 0 {
            return false;
        }
        self.in_use -= 1;
        self.notifier.notify();
        true
    }

    /// Add `delta` units of capacity.
    pub(crate) fn grow(&mut self, delta: u32) {
        self.capacity = self.capacity.saturating_add(delta);
        if delta > 0 {
            self.notifier.notify();
        }
    }
}
