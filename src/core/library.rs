//! Shared resource library and the gang grant scan.
//!
//! The library owns every [`ResourcePool`] and the list of pending
//! [`GangRequest`]s. Three events can change what is grantable:
//!
//! - a new request is submitted ([`ResourceLibrary::submit`])
//! - a granted request hands its units back ([`ResourceLibrary::release`])
//! - a pool gains capacity ([`ResourceLibrary::grow_capacity`])
//!
//! Each one re-runs the grant scan. The scan walks pending requests in
//! submission order and grants every request whose pools all have headroom.
//! A request that cannot be satisfied is skipped, not removed, so a later
//! small request may overtake an earlier large one. There is no starvation
//! protection: a request that never fits waits forever.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::gang::GrantedResources;
use crate::core::{CapacityNotifier, CoralError, GangRequest, PoolKey, ResourceData, ResourcePool};

/// A resource that was configured but left out because its data was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedResource {
    /// Pool that was not created.
    pub key: PoolKey,
    /// Where the loader looked for the data.
    pub location: String,
}

/// Owner of all shared pools and pending gang requests.
#[derive(Debug, Default)]
pub struct ResourceLibrary {
    pools: BTreeMap<PoolKey, ResourcePool>,
    pending: Vec<Arc<GangRequest>>,
    granted: usize,
    skipped: Vec<SkippedResource>,
    notifier: CapacityNotifier,
}

impl ResourceLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool. Duplicate keys are a configuration error.
    pub fn add_pool(
        &mut self,
        key: PoolKey,
        capacity: u32,
        data: ResourceData,
    ) -> Result<(), CoralError> {
        if self.pools.contains_key(&key) {
            return Err(CoralError::InvalidConfig(format!(
                "shared resource `{key}` defined twice"
            )));
        }
        tracing::debug!("registered pool {} with capacity {}", key, capacity);
        let pool = ResourcePool::new(key.clone(), capacity, data, self.notifier.clone());
        self.pools.insert(key, pool);
        Ok(())
    }

    /// Record a configured resource that could not be loaded.
    pub fn record_skipped(&mut self, skipped: SkippedResource) {
        self.skipped.push(skipped);
    }

    /// All pools, ordered by key.
    pub fn pools(&self) -> impl Iterator<Item = &ResourcePool> {
        self.pools.values()
    }

    /// Look up a pool.
    pub fn pool(&self, category: &str, name: &str) -> Option<&ResourcePool> {
        self.pools.get(&PoolKey::new(category, name))
    }

    /// Look up a pool, failing with [`CoralError::UnknownResource`].
    pub fn require(&self, key: &PoolKey) -> Result<&ResourcePool, CoralError> {
        self.pools.get(key).ok_or_else(|| CoralError::unknown(key))
    }

    /// Requests submitted but not yet granted, in submission order.
    pub fn pending(&self) -> &[Arc<GangRequest>] {
        &self.pending
    }

    /// Number of requests granted so far.
    pub const fn granted_count(&self) -> usize {
        self.granted
    }

    /// Resources dropped at construction for missing data.
    pub fn skipped(&self) -> &[SkippedResource] {
        &self.skipped
    }

    /// Units held across every pool.
    pub fn total_in_use(&self) -> u32 {
        self.pools.values().map(ResourcePool::in_use).sum()
    }

    /// Submit a request and run the grant scan. Does not block; wait on
    /// [`GangRequest::wait`] for the grant.
    pub fn submit(&mut self, request: Arc<GangRequest>) -> Result<(), CoralError> {
        for key in request.needs() {
            self.require(key)?;
        }
        if request.is_granted() {
            tracing::warn!(
                "request from {} submitted after being granted; ignoring",
                request.project()
            );
            return Ok(());
        }

        tracing::debug!(
            "request from {} submitted for {} pool(s)",
            request.project(),
            request.needs().len()
        );
        self.pending.push(request);
        self.scan();
        Ok(())
    }

    /// Hand back every unit `request` holds, then run the grant scan.
    ///
    /// Releasing a request that was never granted, or releasing twice, holds
    /// no units and changes nothing. An ungranted request stays pending.
    pub fn release(&mut self, request: &GangRequest) {
        if !request.mark_released() {
            tracing::warn!(
                "release from {} without held resources; nothing returned",
                request.project()
            );
            return;
        }

        for key in request.needs() {
            match self.pools.get_mut(key) {
                Some(pool) => {
                    if !pool.release() {
                        tracing::warn!("pool {} released below zero; ignored", key);
                    }
                }
                None => tracing::warn!("release names unknown pool {}", key),
            }
        }
        tracing::info!("{} released {} pool(s)", request.project(), request.needs().len());

        if self.notifier.take() {
            self.scan();
        }
    }

    /// Add `delta` units to a pool, then run the grant scan.
    pub fn grow_capacity(
        &mut self,
        category: &str,
        name: &str,
        delta: u32,
    ) -> Result<(), CoralError> {
        let key = PoolKey::new(category, name);
        let pool = self
            .pools
            .get_mut(&key)
            .ok_or_else(|| CoralError::unknown(&key))?;
        pool.grow(delta);
        tracing::info!("pool {} grew to capacity {}", key, pool.capacity());

        if self.notifier.take() {
            self.scan();
        }
        Ok(())
    }

    /// Grant every pending request whose pools all have headroom, in
    /// submission order. Returns the number granted by this pass.
    fn scan(&mut self) -> usize {
        let mut granted = 0;
        let mut idx = 0;

        while idx < self.pending.len() {
            if self.pending[idx].is_granted() {
                self.pending.remove(idx);
                continue;
            }
            if !self.fits(&self.pending[idx]) {
                tracing::debug!(
                    "request from {} cannot be satisfied yet",
                    self.pending[idx].project()
                );
                idx += 1;
                continue;
            }

            let request = self.pending.remove(idx);
            let mut resources = GrantedResources::new();
            for key in request.needs() {
                if let Some(pool) = self.pools.get_mut(key) {
                    pool.acquire();
                    resources.insert(key.category.clone(), pool.data().clone());
                }
            }

            if let Err(e) = request.fire(resources) {
                tracing::debug!("ignoring duplicate grant: {}", e);
            }
            granted += 1;
            self.granted += 1;
            tracing::info!("granted resources to {}", request.project());
        }

        // Acquisitions never raise the notifier; anything raised before the
        // scan has now been accounted for.
        self.notifier.take();
        granted
    }

    /// Whether every pool in the request has enough headroom, counting
    /// repeated keys.
    fn fits(&self, request: &GangRequest) -> bool {
        let mut wanted: BTreeMap<&PoolKey, u32> = BTreeMap::new();
        for key in request.needs() {
            *wanted.entry(key).or_default() += 1;
        }
        wanted.into_iter().all(|(key, count)| {
            self.pools
                .get(key)
                .is_some_and(|pool| pool.available() >= count)
        })
    }
}
