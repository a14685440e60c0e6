// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The Dir/File/Chunk entity model.
//!
//! Three record types, one per stored kind, plus [`State`]: the operation
//! layer that reads and writes them through the store with the write-through
//! cache consulted on every access. Dirs do not own their children
//! structurally (children are derived by parent-path query); a File owns its
//! Chunks, and File deletion removes the Chunks before the File record so a
//! crash mid-delete leaves harmless orphan Chunks rather than a File record
//! claiming data that is gone.

use std::sync::Arc;

use diagnostics::log_debug;
use serde::{Deserialize, Serialize};

use crate::cache::EntityCache;
use crate::error::{Error, Result};
use crate::key::{Key, Kind, ParentLinkStrategy};
use crate::path;
use crate::store::{EntityStore, Filter, MAX_DOCUMENT_SIZE, OrderBy, Query};

/// Fixed upper bound on one Chunk's payload, kept under the backend's
/// per-document ceiling. Writes are split at multiples of this size, so
/// every chunk of a file sits at offset `i * MAX_CHUNK_SIZE`.
pub const MAX_CHUNK_SIZE: usize = 800 * 1024;

const _: () = assert!(MAX_CHUNK_SIZE <= MAX_DOCUMENT_SIZE);

/// Microseconds since the Unix epoch.
pub fn now_micros() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

#[inline]
pub(crate) fn chunk_index_of(pos: u64) -> u64 {
    pos / MAX_CHUNK_SIZE as u64
}

#[inline]
pub(crate) fn within_chunk_offset(pos: u64) -> u64 {
    pos % MAX_CHUNK_SIZE as u64
}

#[inline]
pub(crate) fn chunk_start(index: u64) -> u64 {
    index * MAX_CHUNK_SIZE as u64
}

/// A directory. Children are not stored here; they are found by querying
/// for records whose `parent_path` equals `path`. No aggregate size or
/// child count is maintained; both are recomputed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirRecord {
    pub path: String,
    /// `None` only for root.
    pub parent_path: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
}

impl DirRecord {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let now = now_micros();
        Self {
            parent_path: path::parent_path(&path),
            path,
            created_at: now,
            modified_at: now,
        }
    }
}

/// A file. `size` is authoritative for reads: it never exceeds the bytes
/// committed in Chunks, because it is written only after the chunk writes
/// of an operation complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub parent_path: String,
    pub size: u64,
    pub created_at: i64,
    pub modified_at: i64,
}

impl FileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let now = now_micros();
        Self {
            parent_path: path::parent_path(&path).unwrap_or_else(|| path::ROOT.to_string()),
            path,
            size: 0,
            created_at: now,
            modified_at: now,
        }
    }
}

/// One bounded slice of a file's content. `file` is the parent File key id;
/// chunks of one file have non-overlapping offsets at multiples of
/// [`MAX_CHUNK_SIZE`], and content is the concatenation in offset order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub file: String,
    pub offset: u64,
    pub size: u64,
    pub data: Vec<u8>,
}

impl ChunkRecord {
    pub fn new(file: &Key, offset: u64, data: Vec<u8>) -> Self {
        Self {
            file: file.id.clone(),
            offset,
            size: data.len() as u64,
            data,
        }
    }
}

/// Closed dispatch over the stored kinds. Doubles as the generic browsing
/// representation (`flatfs show` walks these without caring which).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Dir(DirRecord),
    File(FileRecord),
    Chunk(ChunkRecord),
}

impl Record {
    pub fn kind(&self) -> Kind {
        match self {
            Record::Dir(_) => Kind::Dir,
            Record::File(_) => Kind::File,
            Record::Chunk(_) => Kind::Chunk,
        }
    }

    /// The path this record sits at; `None` for Chunks.
    pub fn path(&self) -> Option<&str> {
        match self {
            Record::Dir(d) => Some(&d.path),
            Record::File(f) => Some(&f.path),
            Record::Chunk(_) => None,
        }
    }

    pub fn parent_path(&self) -> Option<&str> {
        match self {
            Record::Dir(d) => d.parent_path.as_deref(),
            Record::File(f) => Some(&f.parent_path),
            Record::Chunk(_) => None,
        }
    }

    pub fn as_dir(&self) -> Option<&DirRecord> {
        match self {
            Record::Dir(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileRecord> {
        match self {
            Record::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_chunk(&self) -> Option<&ChunkRecord> {
        match self {
            Record::Chunk(c) => Some(c),
            _ => None,
        }
    }
}

/// Store, cache, and key strategy bundled behind the filesystem surface.
///
/// Every read goes cache-first; every mutation writes the store first and
/// then updates the cache, invalidating the parent directory's child list
/// when membership can have changed.
pub struct State {
    store: Arc<dyn EntityStore>,
    cache: Arc<EntityCache>,
    strategy: Arc<dyn ParentLinkStrategy>,
}

impl State {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: Arc<EntityCache>,
        strategy: Arc<dyn ParentLinkStrategy>,
    ) -> Self {
        Self {
            store,
            cache,
            strategy,
        }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    pub fn strategy(&self) -> &Arc<dyn ParentLinkStrategy> {
        &self.strategy
    }

    /// Cache-first point lookup.
    pub async fn get_record(&self, key: &Key) -> Result<Option<Record>> {
        if let Some(hit) = self.cache.get(key).await {
            return Ok(Some(hit));
        }
        match self.store.get(key).await? {
            Some(record) => {
                self.cache.set(key.clone(), record.clone()).await;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Write-through put. `parent` is the containing directory when this
    /// put can change that directory's membership.
    async fn put_record(&self, key: &Key, record: Record, parent: Option<&str>) -> Result<()> {
        self.store.put(key, record.clone()).await?;
        self.cache.set(key.clone(), record).await;
        if let Some(parent) = parent {
            self.cache.invalidate_list(&self.strategy.dir_key(parent)).await;
        }
        Ok(())
    }

    async fn delete_record(&self, key: &Key, parent: Option<&str>) -> Result<()> {
        self.store.delete(key).await?;
        self.cache.invalidate(key).await;
        if let Some(parent) = parent {
            self.cache.invalidate_list(&self.strategy.dir_key(parent)).await;
        }
        Ok(())
    }

    pub async fn get_dir(&self, path: &str) -> Result<Option<DirRecord>> {
        let record = self.get_record(&self.strategy.dir_key(path)).await?;
        Ok(record.and_then(|r| match r {
            Record::Dir(d) => Some(d),
            _ => None,
        }))
    }

    pub async fn get_file(&self, path: &str) -> Result<Option<FileRecord>> {
        let record = self.get_record(&self.strategy.file_key(path)).await?;
        Ok(record.and_then(|r| match r {
            Record::File(f) => Some(f),
            _ => None,
        }))
    }

    /// Whatever sits at a path, Dir taking precedence over File.
    pub async fn get_node(&self, path: &str) -> Result<Option<Record>> {
        if let Some(record) = self.get_record(&self.strategy.dir_key(path)).await? {
            return Ok(Some(record));
        }
        self.get_record(&self.strategy.file_key(path)).await
    }

    /// The parent of `path` must exist and be a Dir.
    async fn check_parent_dir(&self, path: &str) -> Result<()> {
        let Some(parent) = path::parent_path(path) else {
            return Ok(());
        };
        if self.get_dir(&parent).await?.is_some() {
            return Ok(());
        }
        if self.get_file(&parent).await?.is_some() {
            return Err(Error::directory_expected(parent));
        }
        Err(Error::not_found(parent))
    }

    pub async fn create_dir(&self, path: &str) -> Result<DirRecord> {
        if self.get_node(path).await?.is_some() {
            return Err(Error::already_exists(path));
        }
        self.check_parent_dir(path).await?;
        let record = DirRecord::new(path);
        let key = self.strategy.dir_key(path);
        self.put_record(&key, Record::Dir(record.clone()), record.parent_path.as_deref())
            .await?;
        log_debug!("created dir: {path}", path: path);
        Ok(record)
    }

    /// Creates a File record. With `recreate`, an existing File at the path
    /// is returned as-is (content handling is the caller's concern); without
    /// it, an existing File is `AlreadyExists`. A Dir at the path is always
    /// `FileExpected`.
    pub async fn create_file(&self, path: &str, recreate: bool) -> Result<FileRecord> {
        if self.get_dir(path).await?.is_some() {
            return Err(Error::file_expected(path));
        }
        if let Some(existing) = self.get_file(path).await? {
            if recreate {
                return Ok(existing);
            }
            return Err(Error::already_exists(path));
        }
        self.check_parent_dir(path).await?;
        let record = FileRecord::new(path);
        let key = self.strategy.file_key(path);
        self.put_record(&key, Record::File(record.clone()), Some(&record.parent_path))
            .await?;
        log_debug!("created file: {path}", path: path);
        Ok(record)
    }

    /// Ordered child keys of a directory, list-cache backed.
    async fn child_keys(&self, dir_path: &str) -> Result<Vec<Key>> {
        let dir_key = self.strategy.dir_key(dir_path);
        if let Some(keys) = self.cache.get_list(&dir_key).await {
            return Ok(keys);
        }
        let parent = Filter::ParentPath(dir_path.to_string());
        let mut keys = self
            .store
            .query_keys(&Query::kind(Kind::Dir).filter(parent.clone()).order(OrderBy::Path))
            .await?;
        keys.extend(
            self.store
                .query_keys(&Query::kind(Kind::File).filter(parent).order(OrderBy::Path))
                .await?,
        );
        keys.sort_by_cached_key(|k| self.strategy.path_of(k).unwrap_or_default());
        self.cache.set_list(&dir_key, keys.clone()).await;
        Ok(keys)
    }

    /// Children of a directory in path order. `limit`/`offset` paginate over
    /// the merged Dir+File sequence; record payloads are fetched only for
    /// the requested page (the key list itself is the projection).
    ///
    /// A child key whose record has vanished is skipped, not raised.
    pub async fn list_children(
        &self,
        dir_path: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Record>> {
        let keys = self.child_keys(dir_path).await?;
        let page = keys.into_iter().skip(offset);
        let page: Vec<Key> = match limit {
            Some(n) => page.take(n).collect(),
            None => page.collect(),
        };
        let mut records = Vec::with_capacity(page.len());
        for key in &page {
            if let Some(record) = self.get_record(key).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Removes a File: its Chunks first, then the record, so interruption
    /// cannot leave a record claiming missing data.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let key = self.strategy.file_key(path);
        if self.get_record(&key).await?.is_none() {
            return Err(Error::not_found(path));
        }
        self.delete_chunks(&key).await?;
        self.delete_record(&key, path::parent_path(path).as_deref()).await?;
        log_debug!("deleted file: {path}", path: path);
        Ok(())
    }

    /// Removes a Dir. Non-empty directories are refused unless `recursive`;
    /// root is never removable.
    pub async fn delete_dir(&self, path: &str, recursive: bool) -> Result<()> {
        if path == path::ROOT {
            return Err(Error::RootProtected);
        }
        if self.get_dir(path).await?.is_none() {
            if self.get_file(path).await?.is_some() {
                return Err(Error::directory_expected(path));
            }
            return Err(Error::not_found(path));
        }
        let children = self.list_children(path, None, 0).await?;
        if !children.is_empty() {
            if !recursive {
                return Err(Error::directory_not_empty(path));
            }
            for child in children {
                match child {
                    Record::Dir(d) => Box::pin(self.delete_dir(&d.path, true)).await?,
                    Record::File(f) => self.delete_file(&f.path).await?,
                    Record::Chunk(_) => {}
                }
            }
        }
        self.delete_record(&self.strategy.dir_key(path), path::parent_path(path).as_deref())
            .await?;
        log_debug!("deleted dir: {path}", path: path);
        Ok(())
    }

    /// All chunk keys of a file, offset order.
    pub async fn chunk_keys(&self, file: &Key) -> Result<Vec<Key>> {
        self.store
            .query_keys(
                &Query::kind(Kind::Chunk)
                    .filter(Filter::File(file.clone()))
                    .order(OrderBy::Offset),
            )
            .await
    }

    pub async fn get_chunk(&self, file: &Key, offset: u64) -> Result<Option<ChunkRecord>> {
        let key = self.strategy.chunk_key(file, offset);
        let record = self.get_record(&key).await?;
        Ok(record.and_then(|r| match r {
            Record::Chunk(c) => Some(c),
            _ => None,
        }))
    }

    pub async fn put_chunk(&self, file: &Key, chunk: ChunkRecord) -> Result<()> {
        debug_assert!(chunk.data.len() <= MAX_CHUNK_SIZE);
        let key = self.strategy.chunk_key(file, chunk.offset);
        self.put_record(&key, Record::Chunk(chunk), None).await
    }

    async fn delete_chunks(&self, file: &Key) -> Result<()> {
        let keys = self.chunk_keys(file).await?;
        self.store.delete_many(&keys).await?;
        for key in &keys {
            self.cache.invalidate(key).await;
        }
        Ok(())
    }

    /// Shrinks a file's chunk set to `new_len` bytes: whole chunks at or
    /// past the cut are deleted (strays included, since the chunk list
    /// comes from a query rather than the recorded size), and the chunk
    /// straddling the cut is trimmed in place.
    pub async fn truncate_chunks(&self, file: &Key, new_len: u64) -> Result<()> {
        let keys = self.chunk_keys(file).await?;
        let mut doomed = Vec::new();
        for key in keys {
            match self.strategy.chunk_offset(&key) {
                Some(offset) if offset < new_len => {}
                Some(_) => doomed.push(key),
                None => {}
            }
        }
        self.store.delete_many(&doomed).await?;
        for key in &doomed {
            self.cache.invalidate(key).await;
        }
        if new_len > 0 {
            let tail_offset = chunk_start(chunk_index_of(new_len - 1));
            if let Some(mut tail) = self.get_chunk(file, tail_offset).await? {
                if tail.offset + tail.size > new_len {
                    let keep = (new_len - tail.offset) as usize;
                    tail.data.truncate(keep);
                    tail.size = keep as u64;
                    self.put_chunk(file, tail).await?;
                }
            }
        }
        Ok(())
    }

    /// Persists a file's size and bumps `modified_at`. Called once per
    /// completed write operation, after the chunk writes. Membership of the
    /// parent directory is unchanged, so its child list stays cached.
    pub async fn update_file_size(&self, path: &str, size: u64) -> Result<()> {
        let key = self.strategy.file_key(path);
        let Some(Record::File(mut record)) = self.get_record(&key).await? else {
            return Err(Error::not_found(path));
        };
        record.size = size;
        record.modified_at = now_micros();
        self.put_record(&key, Record::File(record), None).await
    }

    /// Idempotent root bootstrap.
    pub async fn ensure_root(&self) -> Result<()> {
        if self.get_dir(path::ROOT).await?.is_none() {
            let record = DirRecord::new(path::ROOT);
            self.put_record(&self.strategy.dir_key(path::ROOT), Record::Dir(record), None)
                .await?;
            log_debug!("created root dir");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::FlatKeys;
    use crate::memory::MemoryStore;

    fn test_state() -> State {
        State::new(
            Arc::new(MemoryStore::new()),
            Arc::new(EntityCache::new()),
            Arc::new(FlatKeys),
        )
    }

    #[tokio::test]
    async fn test_create_requires_parent_dir() -> Result<()> {
        let state = test_state();
        state.ensure_root().await?;

        assert!(matches!(
            state.create_dir("/missing/child").await,
            Err(Error::NotFound(p)) if p == "/missing"
        ));

        state.create_dir("/a").await?;
        state.create_file("/a/f.txt", false).await?;

        // a file cannot be a parent
        assert!(matches!(
            state.create_dir("/a/f.txt/sub").await,
            Err(Error::DirectoryExpected(p)) if p == "/a/f.txt"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_file_recreate() -> Result<()> {
        let state = test_state();
        state.ensure_root().await?;

        let first = state.create_file("/f", false).await?;
        assert!(matches!(
            state.create_file("/f", false).await,
            Err(Error::AlreadyExists(_))
        ));
        let again = state.create_file("/f", true).await?;
        assert_eq!(first.created_at, again.created_at);

        state.create_dir("/d").await?;
        assert!(matches!(
            state.create_file("/d", true).await,
            Err(Error::FileExpected(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_children_pagination() -> Result<()> {
        let state = test_state();
        state.ensure_root().await?;
        for name in ["a", "b", "c", "d"] {
            state.create_dir(&format!("/{name}")).await?;
        }
        state.create_file("/e", false).await?;

        let all = state.list_children("/", None, 0).await?;
        let names: Vec<_> = all.iter().filter_map(|r| r.path()).collect();
        assert_eq!(names, vec!["/a", "/b", "/c", "/d", "/e"]);

        let page = state.list_children("/", Some(2), 1).await?;
        let names: Vec<_> = page.iter().filter_map(|r| r.path()).collect();
        assert_eq!(names, vec!["/b", "/c"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_dir_refuses_nonempty_and_root() -> Result<()> {
        let state = test_state();
        state.ensure_root().await?;
        state.create_dir("/a").await?;
        state.create_file("/a/f", false).await?;

        let before = state.list_children("/a", None, 0).await?;
        assert!(matches!(
            state.delete_dir("/a", false).await,
            Err(Error::DirectoryNotEmpty(_))
        ));
        // the refusal leaves the children exactly as they were
        assert_eq!(state.list_children("/a", None, 0).await?, before);
        assert!(matches!(
            state.delete_dir("/", true).await,
            Err(Error::RootProtected)
        ));

        state.delete_dir("/a", true).await?;
        assert!(state.get_dir("/a").await?.is_none());
        assert!(state.get_file("/a/f").await?.is_none());
        Ok(())
    }

    #[test]
    fn test_chunk_math() {
        let max = MAX_CHUNK_SIZE as u64;
        assert_eq!(chunk_index_of(0), 0);
        assert_eq!(chunk_index_of(max - 1), 0);
        assert_eq!(chunk_index_of(max), 1);
        assert_eq!(within_chunk_offset(max + 7), 7);
        assert_eq!(chunk_start(2), 2 * max);
    }
}
