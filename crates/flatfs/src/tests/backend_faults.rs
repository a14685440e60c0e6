// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! A backend that starts failing mid-flight. Failures must reach the
//! caller unmodified, never collapse into empty reads or silently
//! dropped writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::cache::EntityCache;
use crate::error::{Error, Result};
use crate::fs::FlatFs;
use crate::key::Key;
use crate::memory::MemoryStore;
use crate::model::Record;
use crate::store::{EntityStore, Query};
use crate::stream::OpenMode;

use super::write_file;

const OUTAGE: &str = "store offline";

/// Delegates to a [`MemoryStore`] until [`fail_now`](Self::fail_now),
/// after which every store call reports the same backend failure.
struct FaultyStore {
    inner: MemoryStore,
    fail: AtomicBool,
}

impl FaultyStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            fail: AtomicBool::new(false),
        })
    }

    fn fail_now(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn gate(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::backend(OUTAGE));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for FaultyStore {
    async fn get(&self, key: &Key) -> Result<Option<Record>> {
        self.gate()?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &Key, record: Record) -> Result<()> {
        self.gate()?;
        self.inner.put(key, record).await
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.gate()?;
        self.inner.delete(key).await
    }

    async fn delete_many(&self, keys: &[Key]) -> Result<()> {
        self.gate()?;
        self.inner.delete_many(keys).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<(Key, Record)>> {
        self.gate()?;
        self.inner.query(query).await
    }

    async fn query_keys(&self, query: &Query) -> Result<Vec<Key>> {
        self.gate()?;
        self.inner.query_keys(query).await
    }
}

#[tokio::test]
async fn test_backend_error_reaches_stream_reads() -> Result<()> {
    let store = FaultyStore::new();
    let fs = FlatFs::new(store.clone(), Arc::new(EntityCache::new())).await?;
    write_file(&fs, "/f", b"payload").await?;

    let mut reader = fs.open("/f", OpenMode::Read).await?;
    store.fail_now();
    // reads must go back to the store, not be answered from cache
    fs.reset_cache().await;

    let err = reader.read(8).await.unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
    assert_eq!(err.to_string(), "backend unavailable: store offline");

    assert!(matches!(
        fs.listdir("/").await,
        Err(Error::Backend { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_backend_error_reaches_stream_writes() -> Result<()> {
    let store = FaultyStore::new();
    let fs = FlatFs::new(store.clone(), Arc::new(EntityCache::new())).await?;

    let mut writer = fs.open("/f", OpenMode::Write).await?;
    writer.write(b"first").await?;
    store.fail_now();

    let err = writer.write(b"more").await.unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
    assert_eq!(err.to_string(), "backend unavailable: store offline");
    // the failed write advanced nothing
    assert_eq!(writer.position(), 5);
    assert_eq!(writer.len(), 5);

    // closing still has a size to persist, so it fails too
    assert!(matches!(writer.close().await, Err(Error::Backend { .. })));
    Ok(())
}
