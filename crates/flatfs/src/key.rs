// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Path ⇄ key translation.
//!
//! The store addresses documents by `(kind, id)` keys with no notion of
//! hierarchy. `ParentLinkStrategy` is the seam where a hierarchy encoding
//! plugs in; `FlatKeys` is the one shipped encoding: a path becomes a flat
//! id by substituting `/` with `:` (root `/` is `:`), and a chunk id embeds
//! its parent File id plus the chunk offset, so parent linkage is
//! recoverable from the key alone.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The closed set of entity kinds stored behind the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Dir,
    File,
    Chunk,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Dir => "dir",
            Kind::File => "file",
            Kind::Chunk => "chunk",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one stored document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    pub kind: Kind,
    pub id: String,
}

impl Key {
    pub fn new(kind: Kind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Encodes how entities reference their parents in store keys.
///
/// Chosen once at filesystem construction. Exactly one implementation ships
/// ([`FlatKeys`]); the trait marks where an alternate backend encoding
/// (ancestor keys, subcollections) would attach.
pub trait ParentLinkStrategy: Send + Sync {
    /// Key of the Dir record at a normalized path.
    fn dir_key(&self, path: &str) -> Key;

    /// Key of the File record at a normalized path.
    fn file_key(&self, path: &str) -> Key;

    /// Key of the Chunk record of `file` at an aligned byte offset.
    fn chunk_key(&self, file: &Key, offset: u64) -> Key;

    /// Inverse of `dir_key`/`file_key`: recovers the path a key names.
    fn path_of(&self, key: &Key) -> Result<String>;

    /// The parent File key a Chunk key carries; `None` if undecodable.
    fn chunk_parent(&self, key: &Key) -> Option<Key>;

    /// The byte offset a Chunk key carries; `None` if undecodable.
    fn chunk_offset(&self, key: &Key) -> Option<u64>;
}

/// Width of the zero-padded offset suffix in chunk ids. 20 decimal digits
/// hold any u64, so suffix order equals numeric order.
const OFFSET_DIGITS: usize = 20;

/// The flat hierarchy encoding: one id namespace per kind, `/` → `:`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatKeys;

impl FlatKeys {
    /// Escapes separator syntax, then substitutes `/` with `:`.
    ///
    /// `%`, `:` and `@` collide with the escape, path-separator and
    /// chunk-offset syntax respectively, so they are percent-escaped first.
    fn encode(path: &str) -> String {
        path.replace('%', "%25")
            .replace(':', "%3A")
            .replace('@', "%40")
            .replace('/', ":")
    }

    /// Inverse of `encode`; substitutions undone in reverse order.
    fn decode(id: &str) -> String {
        id.replace(':', "/")
            .replace("%40", "@")
            .replace("%3A", ":")
            .replace("%25", "%")
    }

    fn split_chunk_id(id: &str) -> Option<(&str, u64)> {
        let (file_id, digits) = id.rsplit_once('@')?;
        if digits.len() != OFFSET_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let offset = digits.parse().ok()?;
        Some((file_id, offset))
    }
}

impl ParentLinkStrategy for FlatKeys {
    fn dir_key(&self, path: &str) -> Key {
        Key::new(Kind::Dir, Self::encode(path))
    }

    fn file_key(&self, path: &str) -> Key {
        Key::new(Kind::File, Self::encode(path))
    }

    fn chunk_key(&self, file: &Key, offset: u64) -> Key {
        Key::new(Kind::Chunk, format!("{}@{:020}", file.id, offset))
    }

    fn path_of(&self, key: &Key) -> Result<String> {
        match key.kind {
            Kind::Dir | Kind::File => Ok(Self::decode(&key.id)),
            Kind::Chunk => Err(Error::path_format(&key.id, "chunk keys do not name a path")),
        }
    }

    fn chunk_parent(&self, key: &Key) -> Option<Key> {
        if key.kind != Kind::Chunk {
            return None;
        }
        Self::split_chunk_id(&key.id).map(|(file_id, _)| Key::new(Kind::File, file_id))
    }

    fn chunk_offset(&self, key: &Key) -> Option<u64> {
        if key.kind != Kind::Chunk {
            return None;
        }
        Self::split_chunk_id(&key.id).map(|(_, offset)| offset)
    }
}
