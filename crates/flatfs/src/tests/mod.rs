// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Scenario tests over a memory-backed filesystem, plus shared helpers.

mod backend_faults;
mod fs_scenarios;

use std::sync::Arc;

use crate::cache::EntityCache;
use crate::error::Result;
use crate::fs::FlatFs;
use crate::key::{FlatKeys, Key, Kind, ParentLinkStrategy};
use crate::memory::MemoryStore;
use crate::store::{EntityStore, Filter, OrderBy, Query};
use crate::stream::OpenMode;

/// A fresh filesystem plus a handle on its backing store, for direct
/// inspection or deliberate corruption.
pub(crate) async fn test_fs() -> Result<(FlatFs, Arc<MemoryStore>)> {
    let store = Arc::new(MemoryStore::new());
    let fs = FlatFs::new(store.clone(), Arc::new(EntityCache::new())).await?;
    Ok((fs, store))
}

/// Deterministic non-repeating content of a given length.
pub(crate) fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + 7) % 251) as u8).collect()
}

pub(crate) async fn write_file(fs: &FlatFs, path: &str, data: &[u8]) -> Result<()> {
    let mut stream = fs.open(path, OpenMode::Write).await?;
    if !data.is_empty() {
        stream.write(data).await?;
    }
    stream.close().await
}

pub(crate) async fn read_file(fs: &FlatFs, path: &str) -> Result<Vec<u8>> {
    let mut stream = fs.open(path, OpenMode::Read).await?;
    let data = stream.read_to_end().await?;
    stream.close().await?;
    Ok(data)
}

/// Chunk keys of a file as the store holds them, offset order.
pub(crate) async fn chunk_keys_of(store: &MemoryStore, path: &str) -> Result<Vec<Key>> {
    let file = FlatKeys.file_key(path);
    store
        .query_keys(
            &Query::kind(Kind::Chunk)
                .filter(Filter::File(file))
                .order(OrderBy::Offset),
        )
        .await
}
