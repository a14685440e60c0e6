// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Path string handling.
//!
//! Paths here are store identifiers, not host filesystem paths: always
//! absolute, `/`-separated, with `/` itself as the root. They stay `&str`
//! end to end so the key codec can reason about their exact bytes.

use crate::error::{Error, Result};

/// The root directory path.
pub const ROOT: &str = "/";

/// Canonicalizes a path: strips trailing slashes (except for root itself)
/// and rejects anything that cannot name a node.
///
/// Rejected inputs: the empty string, relative paths, embedded NUL bytes,
/// empty interior segments (`/a//b`), and `.`/`..` segments. A path made of
/// nothing but slashes normalizes to `/`.
pub fn normalize(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(Error::path_format(path, "empty path"));
    }
    if path.contains('\0') {
        return Err(Error::path_format(path, "embedded NUL"));
    }
    if !path.starts_with('/') {
        return Err(Error::path_format(path, "not absolute"));
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(ROOT.to_string());
    }
    for segment in trimmed[1..].split('/') {
        if segment.is_empty() {
            return Err(Error::path_format(path, "empty segment"));
        }
        if segment == "." || segment == ".." {
            return Err(Error::path_format(path, "dot segment"));
        }
    }
    Ok(trimmed.to_string())
}

/// Extracts the final component of a normalized path; `None` for root.
pub fn basename(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Extracts the parent directory of a normalized path; `None` for root.
pub fn parent_path(path: &str) -> Option<String> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT.to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

/// Joins a directory path and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}
