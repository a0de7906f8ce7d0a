// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per route id, so two builds of the same route never run
/// their delete + insert at the same time. Different routes do not contend.
#[derive(Default, Clone)]
pub struct RouteLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl RouteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, route_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(route_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Drops entries nobody is holding or waiting on.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
