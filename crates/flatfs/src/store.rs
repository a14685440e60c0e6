// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The flat document store contract.
//!
//! Everything the filesystem knows about its backend fits in
//! [`EntityStore`]: point lookups, puts, deletes, and filtered queries over
//! size-bounded records. The store sees opaque records; paths, parent
//! linkage, and referential integrity live a layer up. There are no
//! multi-key transactions and no cascading deletes.

use async_trait::async_trait;

use crate::error::Result;
use crate::key::{Key, Kind};
use crate::model::Record;

/// Per-document payload ceiling imposed by the backing store.
pub const MAX_DOCUMENT_SIZE: usize = 1 << 20;

/// Field predicate for [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Dir/File records whose `parent_path` equals the given path.
    ParentPath(String),
    /// Chunk records belonging to the given File key.
    File(Key),
}

/// Result ordering for [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// Dir/File records by path.
    Path,
    /// Chunk records by offset.
    Offset,
}

/// A filtered, ordered, paginated scan over one kind.
#[derive(Debug, Clone)]
pub struct Query {
    pub kind: Kind,
    pub filter: Option<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Query {
    pub fn kind(kind: Kind) -> Self {
        Self {
            kind,
            filter: None,
            order: None,
            limit: None,
            offset: 0,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Flat key/document storage behind the filesystem.
///
/// Callers treat every operation as a blocking step; implementations carry
/// no retry or timeout policy of their own, and backend failures surface
/// unmodified.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, key: &Key) -> Result<Option<Record>>;

    async fn put(&self, key: &Key, record: Record) -> Result<()>;

    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &Key) -> Result<()>;

    async fn delete_many(&self, keys: &[Key]) -> Result<()>;

    async fn query(&self, query: &Query) -> Result<Vec<(Key, Record)>>;

    /// Keys-only variant of `query` for scans that do not need payloads.
    async fn query_keys(&self, query: &Query) -> Result<Vec<Key>>;
}
