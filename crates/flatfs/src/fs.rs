// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The filesystem facade: POSIX-shaped calls over the entity model.
//!
//! Every operation takes a caller-supplied path, normalizes it, and
//! dispatches through [`State`]. The facade owns the injected store and
//! cache; nothing here is process-global, so two filesystems over two
//! stores coexist in one process.

use std::sync::Arc;

use crate::cache::{CacheStats, EntityCache};
use crate::check::Checker;
use crate::error::{Error, Result};
use crate::key::{FlatKeys, Kind, ParentLinkStrategy};
use crate::model::{DirRecord, MAX_CHUNK_SIZE, Record, State};
use crate::path;
use crate::store::EntityStore;
use crate::stream::{FileStream, OpenMode};

/// What `stat` reports. Directory sizes are not aggregated; a Dir always
/// stats as zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub kind: Kind,
    pub size: u64,
    pub created_at: i64,
    pub modified_at: i64,
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub meta: Metadata,
}

fn metadata_of(record: &Record) -> Option<Metadata> {
    match record {
        Record::Dir(d) => Some(Metadata {
            kind: Kind::Dir,
            size: 0,
            created_at: d.created_at,
            modified_at: d.modified_at,
        }),
        Record::File(f) => Some(Metadata {
            kind: Kind::File,
            size: f.size,
            created_at: f.created_at,
            modified_at: f.modified_at,
        }),
        Record::Chunk(_) => None,
    }
}

pub struct FlatFs {
    state: Arc<State>,
}

impl FlatFs {
    /// Builds a filesystem over `store` with the flat key encoding and
    /// creates the root directory if the store does not have one yet.
    pub async fn new(store: Arc<dyn EntityStore>, cache: Arc<EntityCache>) -> Result<Self> {
        Self::with_strategy(store, cache, Arc::new(FlatKeys)).await
    }

    pub async fn with_strategy(
        store: Arc<dyn EntityStore>,
        cache: Arc<EntityCache>,
        strategy: Arc<dyn ParentLinkStrategy>,
    ) -> Result<Self> {
        let state = Arc::new(State::new(store, cache, strategy));
        state.ensure_root().await?;
        Ok(Self { state })
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        self.state.store()
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        let path = path::normalize(path)?;
        Ok(self.state.get_node(&path).await?.is_some())
    }

    pub async fn isdir(&self, path: &str) -> Result<bool> {
        let path = path::normalize(path)?;
        Ok(self.state.get_dir(&path).await?.is_some())
    }

    pub async fn isfile(&self, path: &str) -> Result<bool> {
        let path = path::normalize(path)?;
        Ok(self.state.get_file(&path).await?.is_some())
    }

    pub async fn stat(&self, path: &str) -> Result<Metadata> {
        let path = path::normalize(path)?;
        let Some(record) = self.state.get_node(&path).await? else {
            return Err(Error::not_found(path));
        };
        metadata_of(&record).ok_or_else(|| Error::not_found(path))
    }

    pub async fn mkdir(&self, path: &str) -> Result<()> {
        let path = path::normalize(path)?;
        self.state.create_dir(&path).await?;
        Ok(())
    }

    /// Removes a directory. Non-empty directories require `recursive`;
    /// root is never removable.
    pub async fn rmdir(&self, path: &str, recursive: bool) -> Result<()> {
        let path = path::normalize(path)?;
        self.state.delete_dir(&path, recursive).await
    }

    async fn require_dir(&self, path: &str) -> Result<DirRecord> {
        match self.state.get_dir(path).await? {
            Some(dir) => Ok(dir),
            None => {
                if self.state.get_file(path).await?.is_some() {
                    Err(Error::directory_expected(path))
                } else {
                    Err(Error::not_found(path))
                }
            }
        }
    }

    /// Child names in path order.
    pub async fn listdir(&self, path: &str) -> Result<Vec<String>> {
        let entries = self.list_entries(path, None, 0).await?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    /// Child entries in path order, with `limit`/`offset` slicing the
    /// sequence before any record payload is fetched.
    pub async fn list_entries(
        &self,
        path: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<DirEntry>> {
        let path = path::normalize(path)?;
        self.require_dir(&path).await?;
        let records = self.state.list_children(&path, limit, offset).await?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let (Some(child_path), Some(meta)) = (record.path(), metadata_of(&record)) else {
                continue;
            };
            let Some(name) = path::basename(child_path) else {
                continue;
            };
            entries.push(DirEntry {
                name: name.to_string(),
                path: child_path.to_string(),
                meta,
            });
        }
        Ok(entries)
    }

    pub async fn open(&self, path: &str, mode: OpenMode) -> Result<FileStream> {
        let path = path::normalize(path)?;
        FileStream::open(self.state.clone(), &path, mode).await
    }

    /// Removes a file and its chunks.
    pub async fn unlink(&self, path: &str) -> Result<()> {
        let path = path::normalize(path)?;
        if self.state.get_dir(&path).await?.is_some() {
            return Err(Error::file_expected(path));
        }
        self.state.delete_file(&path).await
    }

    /// Streams `src` into `dst` without materializing the whole file,
    /// overwriting `dst` if present. Returns the number of bytes copied.
    pub async fn copyfile(&self, src: &str, dst: &str) -> Result<u64> {
        let src = path::normalize(src)?;
        let dst = path::normalize(dst)?;
        if src == dst {
            // opening dst for write would truncate src before the first read
            return Err(Error::already_exists(dst));
        }
        let mut reader = self.open(&src, OpenMode::Read).await?;
        let mut writer = self.open(&dst, OpenMode::Write).await?;
        let mut copied = 0u64;
        loop {
            let buf = reader.read(MAX_CHUNK_SIZE).await?;
            if buf.is_empty() {
                break;
            }
            copied += writer.write(&buf).await? as u64;
        }
        writer.close().await?;
        reader.close().await?;
        Ok(copied)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.state.cache().stats().await
    }

    /// Drops everything cached and zeroes the counters. The store is
    /// untouched.
    pub async fn reset_cache(&self) {
        self.state.cache().clear().await;
    }

    /// A checker over this filesystem's store. It reads the store
    /// directly; after a repair, call [`reset_cache`](Self::reset_cache)
    /// so cached records of repaired keys cannot be served.
    pub fn checker(&self) -> Checker {
        Checker::new(self.state.store().clone(), self.state.strategy().clone())
    }
}
