// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

// Error types for flatfs operations

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed path ({reason}): {path:?}")]
    PathFormat { path: String, reason: &'static str },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("expected a file: {0}")]
    FileExpected(String),

    #[error("expected a directory: {0}")]
    DirectoryExpected(String),

    #[error("stream is closed: {0}")]
    StreamClosed(String),

    #[error("stream not open for reading: {0}")]
    StreamNotReadable(String),

    #[error("stream not open for writing: {0}")]
    StreamNotWritable(String),

    #[error("write past the largest supported offset: {0}")]
    OffsetOverflow(String),

    #[error("the root directory cannot be removed")]
    RootProtected,

    #[error("backend unavailable: {message}")]
    Backend { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn path_format(path: impl Into<String>, reason: &'static str) -> Self {
        Error::PathFormat {
            path: path.into(),
            reason,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound(path.into())
    }

    pub fn already_exists(path: impl Into<String>) -> Self {
        Error::AlreadyExists(path.into())
    }

    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Error::DirectoryNotEmpty(path.into())
    }

    pub fn file_expected(path: impl Into<String>) -> Self {
        Error::FileExpected(path.into())
    }

    pub fn directory_expected(path: impl Into<String>) -> Self {
        Error::DirectoryExpected(path.into())
    }

    pub fn stream_closed(path: impl Into<String>) -> Self {
        Error::StreamClosed(path.into())
    }

    pub fn stream_not_readable(path: impl Into<String>) -> Self {
        Error::StreamNotReadable(path.into())
    }

    pub fn stream_not_writable(path: impl Into<String>) -> Self {
        Error::StreamNotWritable(path.into())
    }

    pub fn offset_overflow(path: impl Into<String>) -> Self {
        Error::OffsetOverflow(path.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }
}
