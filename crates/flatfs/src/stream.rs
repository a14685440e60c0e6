// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Chunked stream I/O over a file's Chunk records.
//!
//! A [`FileStream`] reads and writes through [`State`] without ever
//! materializing the whole file: reads fetch only the chunk slots the
//! request touches, writes split at [`MAX_CHUNK_SIZE`] boundaries. The
//! recorded file size is persisted once, at [`close`](FileStream::close),
//! not per write; [`truncate`](FileStream::truncate) persists immediately.

use std::sync::Arc;

use diagnostics::{log_debug, log_warn};

use crate::error::{Error, Result};
use crate::key::Key;
use crate::model::{
    ChunkRecord, MAX_CHUNK_SIZE, State, chunk_index_of, chunk_start, within_chunk_offset,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, position 0. Reads only.
    Read,
    /// Create or overwrite: existing content is discarded at open.
    Write,
    /// Create if absent; every write lands at the end of the file.
    Append,
    /// Existing file, position 0, reads and writes.
    ReadWrite,
    /// Create; fails if anything already sits at the path.
    ExclusiveCreate,
}

impl OpenMode {
    pub fn readable(self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadWrite)
    }

    pub fn writable(self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

/// An open handle on one file. Not a shared object: concurrent streams on
/// the same path see each other's chunk writes but race on the recorded
/// size, last close winning.
pub struct FileStream {
    state: Arc<State>,
    path: String,
    file_key: Key,
    mode: OpenMode,
    pos: u64,
    len: u64,
    dirty: bool,
    closed: bool,
}

impl FileStream {
    /// Opens `path` (already normalized) in `mode`.
    pub async fn open(state: Arc<State>, path: &str, mode: OpenMode) -> Result<Self> {
        let record = match mode {
            OpenMode::Read | OpenMode::ReadWrite => {
                if state.get_dir(path).await?.is_some() {
                    return Err(Error::file_expected(path));
                }
                match state.get_file(path).await? {
                    Some(record) => record,
                    None => return Err(Error::not_found(path)),
                }
            }
            OpenMode::Write => {
                let record = state.create_file(path, true).await?;
                // discard previous content, stray chunks included
                let key = state.strategy().file_key(path);
                state.truncate_chunks(&key, 0).await?;
                if record.size != 0 {
                    state.update_file_size(path, 0).await?;
                }
                record
            }
            OpenMode::Append => state.create_file(path, true).await?,
            OpenMode::ExclusiveCreate => {
                if state.get_node(path).await?.is_some() {
                    return Err(Error::already_exists(path));
                }
                state.create_file(path, false).await?
            }
        };
        let len = match mode {
            OpenMode::Write | OpenMode::ExclusiveCreate => 0,
            _ => record.size,
        };
        let pos = match mode {
            OpenMode::Append => len,
            _ => 0,
        };
        log_debug!("opened stream: {path}", path: path);
        Ok(Self {
            file_key: state.strategy().file_key(path),
            state,
            path: path.to_string(),
            mode,
            pos,
            len,
            dirty: false,
            closed: false,
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::stream_closed(&self.path));
        }
        Ok(())
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Moves the position. Positions past the end are legal; a later write
    /// there leaves a hole that reads back as zeros.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.check_open()?;
        self.pos = pos;
        Ok(())
    }

    /// Reads up to `n` bytes from the current position, clamped to the
    /// recorded length. Chunk slots with no record (holes) and bytes past
    /// a short chunk's payload read as zeros.
    pub async fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        self.check_open()?;
        if !self.mode.readable() {
            return Err(Error::stream_not_readable(&self.path));
        }
        if self.pos >= self.len || n == 0 {
            return Ok(Vec::new());
        }
        let end = self.len.min(self.pos.saturating_add(n as u64));
        let mut out = vec![0u8; (end - self.pos) as usize];
        let mut filled = 0;
        while self.pos < end {
            let start = chunk_start(chunk_index_of(self.pos));
            let take = (start.saturating_add(MAX_CHUNK_SIZE as u64).min(end) - self.pos) as usize;
            if let Some(chunk) = self.state.get_chunk(&self.file_key, start).await? {
                let skip = (self.pos - start) as usize;
                if skip < chunk.data.len() {
                    let have = take.min(chunk.data.len() - skip);
                    out[filled..filled + have].copy_from_slice(&chunk.data[skip..skip + have]);
                }
            }
            filled += take;
            self.pos += take as u64;
        }
        Ok(out)
    }

    /// Reads from the current position through the end of the file.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let remaining = self.len.saturating_sub(self.pos) as usize;
        self.read(remaining).await
    }

    /// Writes the whole buffer at the current position (at the end of the
    /// file in `Append` mode), splitting across chunk boundaries. A write
    /// covering a full chunk slot replaces the record outright; partial
    /// coverage read-modify-writes the one affected chunk. A write that
    /// would run past the largest representable offset fails with
    /// [`Error::OffsetOverflow`] before any chunk is touched.
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.check_open()?;
        if !self.mode.writable() {
            return Err(Error::stream_not_writable(&self.path));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if self.mode == OpenMode::Append {
            self.pos = self.len;
        }
        if self.pos.checked_add(buf.len() as u64).is_none() {
            return Err(Error::offset_overflow(&self.path));
        }
        let mut written = 0;
        while written < buf.len() {
            let start = chunk_start(chunk_index_of(self.pos));
            let within = within_chunk_offset(self.pos) as usize;
            let n = (MAX_CHUNK_SIZE - within).min(buf.len() - written);
            let piece = &buf[written..written + n];
            let chunk = if within == 0 && n == MAX_CHUNK_SIZE {
                ChunkRecord::new(&self.file_key, start, piece.to_vec())
            } else {
                let mut data = match self.state.get_chunk(&self.file_key, start).await? {
                    Some(existing) => existing.data,
                    None => Vec::new(),
                };
                if data.len() < within + n {
                    data.resize(within + n, 0);
                }
                data[within..within + n].copy_from_slice(piece);
                ChunkRecord::new(&self.file_key, start, data)
            };
            self.state.put_chunk(&self.file_key, chunk).await?;
            self.pos += n as u64;
            written += n;
        }
        self.len = self.len.max(self.pos);
        self.dirty = true;
        Ok(buf.len())
    }

    /// Cuts the file to `n` bytes and persists the new size immediately.
    /// The position is left where it was, even if now past the end.
    pub async fn truncate(&mut self, n: u64) -> Result<()> {
        self.check_open()?;
        if !self.mode.writable() {
            return Err(Error::stream_not_writable(&self.path));
        }
        self.state.truncate_chunks(&self.file_key, n).await?;
        self.state.update_file_size(&self.path, n).await?;
        self.len = n;
        self.dirty = false;
        Ok(())
    }

    /// Persists the recorded size if any write happened, then closes.
    /// Safe to call more than once; later calls are no-ops.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.dirty {
            self.state.update_file_size(&self.path, self.len).await?;
            self.dirty = false;
        }
        self.closed = true;
        log_debug!("closed stream: {path}", path: self.path.as_str());
        Ok(())
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        if self.dirty && !self.closed {
            log_warn!(
                "stream dropped without close, recorded size is stale: {path}",
                path: self.path.as_str()
            );
        }
    }
}
