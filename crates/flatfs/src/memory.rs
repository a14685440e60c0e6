// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory [`EntityStore`] with optional JSON snapshots.
//!
//! The backing map is ordered by key, which for flat-encoded keys already
//! matches path order within a kind. Snapshots serialize the full record
//! set as `(key, record)` pairs so a CLI run can pick up where the last
//! one left off.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use diagnostics::log_debug;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::key::Key;
use crate::model::Record;
use crate::store::{EntityStore, Filter, OrderBy, Query};

#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<BTreeMap<Key, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Writes every record to `path` as a JSON array of `(key, record)`
    /// pairs.
    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let pairs: Vec<(Key, Record)> = {
            let records = self.records.lock().await;
            records.iter().map(|(k, r)| (k.clone(), r.clone())).collect()
        };
        let json = serde_json::to_vec_pretty(&pairs)?;
        tokio::fs::write(path.as_ref(), json).await?;
        log_debug!("saved snapshot: {count} records", count: pairs.len());
        Ok(())
    }

    /// Rebuilds a store from a snapshot written by [`save_to`](Self::save_to).
    pub async fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let pairs: Vec<(Key, Record)> = serde_json::from_slice(&bytes)?;
        log_debug!("loaded snapshot: {count} records", count: pairs.len());
        Ok(Self {
            records: Arc::new(Mutex::new(pairs.into_iter().collect())),
        })
    }

    fn matches(query: &Query, key: &Key, record: &Record) -> bool {
        if key.kind != query.kind {
            return false;
        }
        match &query.filter {
            None => true,
            Some(Filter::ParentPath(parent)) => record.parent_path() == Some(parent.as_str()),
            Some(Filter::File(file)) => {
                record.as_chunk().is_some_and(|c| c.file == file.id)
            }
        }
    }

    async fn run_query(&self, query: &Query) -> Vec<(Key, Record)> {
        let records = self.records.lock().await;
        let mut hits: Vec<(Key, Record)> = records
            .iter()
            .filter(|(k, r)| Self::matches(query, k, r))
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect();
        match query.order {
            Some(OrderBy::Path) => {
                hits.sort_by(|(ak, a), (bk, b)| match (a.path(), b.path()) {
                    (Some(ap), Some(bp)) => ap.cmp(bp),
                    _ => ak.cmp(bk),
                });
            }
            Some(OrderBy::Offset) => {
                hits.sort_by_key(|(_, r)| r.as_chunk().map_or(0, |c| c.offset));
            }
            None => {}
        }
        let hits = hits.into_iter().skip(query.offset);
        match query.limit {
            Some(n) => hits.take(n).collect(),
            None => hits.collect(),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, key: &Key) -> Result<Option<Record>> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &Key, record: Record) -> Result<()> {
        self.records.lock().await.insert(key.clone(), record);
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.records.lock().await.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[Key]) -> Result<()> {
        let mut records = self.records.lock().await;
        for key in keys {
            records.remove(key);
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<(Key, Record)>> {
        Ok(self.run_query(query).await)
    }

    async fn query_keys(&self, query: &Query) -> Result<Vec<Key>> {
        Ok(self.run_query(query).await.into_iter().map(|(k, _)| k).collect())
    }
}
