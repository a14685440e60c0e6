// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Write-through cache for records and per-directory child-key lists.
//!
//! One instance is injected per filesystem; nothing here is global. The
//! cache never answers with data the store was not given first: mutations
//! update the store, then this cache, and a membership change invalidates
//! the affected directory's list entry.

use std::collections::HashMap;

use diagnostics::log_debug;
use tokio::sync::Mutex;

use crate::key::Key;
use crate::model::Record;

/// Counters for both cache planes. `hits`/`misses` cover record lookups,
/// the `list_` set covers child-list lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub list_hits: u64,
    pub list_misses: u64,
    pub list_sets: u64,
    pub list_deletes: u64,
}

#[derive(Default)]
pub struct EntityCache {
    entries: Mutex<HashMap<Key, Record>>,
    lists: Mutex<HashMap<Key, Vec<Key>>>,
    stats: Mutex<CacheStats>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &Key) -> Option<Record> {
        let hit = self.entries.lock().await.get(key).cloned();
        let mut stats = self.stats.lock().await;
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        hit
    }

    pub async fn set(&self, key: Key, record: Record) {
        self.entries.lock().await.insert(key, record);
        self.stats.lock().await.sets += 1;
    }

    pub async fn invalidate(&self, key: &Key) {
        self.entries.lock().await.remove(key);
        self.stats.lock().await.deletes += 1;
    }

    pub async fn get_list(&self, dir: &Key) -> Option<Vec<Key>> {
        let hit = self.lists.lock().await.get(dir).cloned();
        let mut stats = self.stats.lock().await;
        if hit.is_some() {
            stats.list_hits += 1;
        } else {
            stats.list_misses += 1;
        }
        hit
    }

    pub async fn set_list(&self, dir: &Key, children: Vec<Key>) {
        self.lists.lock().await.insert(dir.clone(), children);
        self.stats.lock().await.list_sets += 1;
    }

    pub async fn invalidate_list(&self, dir: &Key) {
        self.lists.lock().await.remove(dir);
        self.stats.lock().await.list_deletes += 1;
    }

    /// Drops all cached data and zeroes the counters.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
        self.lists.lock().await.clear();
        *self.stats.lock().await = CacheStats::default();
        log_debug!("cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        *self.stats.lock().await
    }
}
