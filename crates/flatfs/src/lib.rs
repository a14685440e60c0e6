// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! FlatFS: a POSIX-like filesystem mapped onto a flat key-document store.
//!
//! The backend stores uniform, size-bounded documents under unique keys
//! and answers simple property queries. Everything hierarchical about a
//! filesystem (paths, directories, arbitrarily large files) is built here:
//! paths encode deterministically into keys, directory membership is a
//! parent-path query rather than stored child lists, and file content is
//! split across fixed-size Chunk records streamed through [`FileStream`].
//!
//! [`FlatFs`] is the entry point. It owns an injected [`EntityStore`] and
//! [`EntityCache`], so independent filesystems over independent stores can
//! share a process. [`Checker`] finds and removes records whose parents
//! are gone.
//!
//! ## Environment variables
//!
//! - `FLATFS_LOG`: diagnostic verbosity (`off` by default; `debug`,
//!   `info`, `warn`, `error`).

pub mod cache; // write-through record and child-list caching
pub mod check; // orphan scan and repair
pub mod error; // the error taxonomy shared by every layer
pub mod fs; // the filesystem facade
pub mod key; // path-to-key codec and parent linkage
pub mod memory; // in-memory store with JSON snapshots
pub mod model; // Dir/File/Chunk records and the operation layer
pub mod path; // path normalization helpers
pub mod store; // the entity store trait and its query types
pub mod stream; // chunked stream I/O

pub use cache::{CacheStats, EntityCache};
pub use check::{CheckState, Checker, DEFAULT_PAGE_LIMIT, ScanReport};
pub use error::{Error, Result};
pub use fs::{DirEntry, FlatFs, Metadata};
pub use key::{FlatKeys, Key, Kind, ParentLinkStrategy};
pub use memory::MemoryStore;
pub use model::{ChunkRecord, DirRecord, FileRecord, MAX_CHUNK_SIZE, Record, State};
pub use store::{EntityStore, Filter, MAX_DOCUMENT_SIZE, OrderBy, Query};
pub use stream::{FileStream, OpenMode};

#[cfg(test)]
mod tests;
