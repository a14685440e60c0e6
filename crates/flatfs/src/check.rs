// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Consistency checker: finds and removes orphaned records.
//!
//! Classification runs in one pass, strictly Dir then File then Chunk, so
//! each stage cascades from the previous stage's orphan set without
//! re-scanning. A Dir whose parent is itself an orphan (but present) is
//! not flagged this round; repeated scan/repair rounds converge.
//!
//! The checker talks to the store directly, never through the cache, so a
//! repair can leave a live filesystem's cache stale. Clear the cache after
//! repairing if the two share a process.

use std::collections::HashSet;
use std::sync::Arc;

use diagnostics::{log_info, log_warn};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::key::{Key, Kind, ParentLinkStrategy};
use crate::path;
use crate::store::{EntityStore, OrderBy, Query};

/// Records fetched per kind in one scan. Stores holding more than this
/// are scanned incompletely; the report says so.
pub const DEFAULT_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Idle,
    Scanning,
    Reporting,
    Repairing,
}

/// Outcome of one scan: counts, the three orphan key lists, and a textual
/// report. Finding orphans is a result, not an error.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub dirs_scanned: usize,
    pub files_scanned: usize,
    pub chunks_scanned: usize,
    pub orphan_dirs: Vec<Key>,
    pub orphan_files: Vec<Key>,
    pub orphan_chunks: Vec<Key>,
    /// At least one kind hit the page limit; results may be incomplete.
    pub truncated: bool,
    lines: Vec<String>,
}

impl ScanReport {
    pub fn orphan_count(&self) -> usize {
        self.orphan_dirs.len() + self.orphan_files.len() + self.orphan_chunks.len()
    }

    pub fn is_clean(&self) -> bool {
        self.orphan_count() == 0
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn compose(&mut self, strategy: &dyn ParentLinkStrategy, page_limit: usize) {
        self.lines.push(format!(
            "scanned {} dirs, {} files, {} chunks",
            self.dirs_scanned, self.files_scanned, self.chunks_scanned
        ));
        for key in &self.orphan_dirs {
            self.lines.push(format!("orphan dir: {}", display_path(strategy, key)));
        }
        for key in &self.orphan_files {
            self.lines.push(format!("orphan file: {}", display_path(strategy, key)));
        }
        for key in &self.orphan_chunks {
            self.lines.push(format!("orphan chunk: {key}"));
        }
        if self.truncated {
            self.lines.push(format!(
                "scan stopped at {page_limit} records per kind; results may be incomplete"
            ));
        }
        if self.is_clean() {
            self.lines.push("no orphans found".to_string());
        } else {
            self.lines.push(format!("total orphans: {}", self.orphan_count()));
        }
    }
}

fn display_path(strategy: &dyn ParentLinkStrategy, key: &Key) -> String {
    strategy.path_of(key).unwrap_or_else(|_| key.to_string())
}

/// One scan/repair driver over a store. Runs serialize on an internal
/// lock; the phase is observable from other tasks via [`state`](Self::state).
pub struct Checker {
    store: Arc<dyn EntityStore>,
    strategy: Arc<dyn ParentLinkStrategy>,
    page_limit: usize,
    run: Mutex<()>,
    state: Mutex<CheckState>,
}

impl Checker {
    pub fn new(store: Arc<dyn EntityStore>, strategy: Arc<dyn ParentLinkStrategy>) -> Self {
        Self {
            store,
            strategy,
            page_limit: DEFAULT_PAGE_LIMIT,
            run: Mutex::new(()),
            state: Mutex::new(CheckState::Idle),
        }
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub async fn state(&self) -> CheckState {
        *self.state.lock().await
    }

    async fn set_state(&self, next: CheckState) {
        *self.state.lock().await = next;
    }

    /// Scans up to the page limit per kind and classifies orphans.
    pub async fn scan(&self) -> Result<ScanReport> {
        let _run = self.run.lock().await;
        self.set_state(CheckState::Scanning).await;
        let result = self.scan_inner().await;
        self.set_state(CheckState::Idle).await;
        result
    }

    async fn scan_inner(&self) -> Result<ScanReport> {
        let probe = self.page_limit.saturating_add(1);
        let mut report = ScanReport::default();

        // one record past the limit distinguishes "full page" from "done"
        let mut dirs = self
            .store
            .query(&Query::kind(Kind::Dir).order(OrderBy::Path).limit(probe))
            .await?;
        if dirs.len() > self.page_limit {
            dirs.truncate(self.page_limit);
            report.truncated = true;
        }
        report.dirs_scanned = dirs.len();

        let dir_paths: HashSet<&str> = dirs.iter().filter_map(|(_, r)| r.path()).collect();
        let mut orphan_dir_paths: HashSet<String> = HashSet::new();
        for (key, record) in &dirs {
            let Some(dir) = record.as_dir() else { continue };
            let orphan = match dir.parent_path.as_deref() {
                None => dir.path != path::ROOT,
                Some(parent) => !dir_paths.contains(parent),
            };
            if orphan {
                orphan_dir_paths.insert(dir.path.clone());
                report.orphan_dirs.push(key.clone());
            }
        }

        let mut files = self
            .store
            .query(&Query::kind(Kind::File).order(OrderBy::Path).limit(probe))
            .await?;
        if files.len() > self.page_limit {
            files.truncate(self.page_limit);
            report.truncated = true;
        }
        report.files_scanned = files.len();

        let file_ids: HashSet<&str> = files.iter().map(|(k, _)| k.id.as_str()).collect();
        let mut orphan_file_ids: HashSet<String> = HashSet::new();
        for (key, record) in &files {
            let Some(file) = record.as_file() else { continue };
            let orphan = !dir_paths.contains(file.parent_path.as_str())
                || orphan_dir_paths.contains(&file.parent_path);
            if orphan {
                orphan_file_ids.insert(key.id.clone());
                report.orphan_files.push(key.clone());
            }
        }

        // keys only: the chunk key already names its file and offset
        let mut chunk_keys = self
            .store
            .query_keys(&Query::kind(Kind::Chunk).limit(probe))
            .await?;
        if chunk_keys.len() > self.page_limit {
            chunk_keys.truncate(self.page_limit);
            report.truncated = true;
        }
        report.chunks_scanned = chunk_keys.len();

        for key in &chunk_keys {
            let orphan = match self.strategy.chunk_parent(key) {
                Some(parent) => {
                    !file_ids.contains(parent.id.as_str()) || orphan_file_ids.contains(&parent.id)
                }
                None => true,
            };
            if orphan {
                report.orphan_chunks.push(key.clone());
            }
        }

        self.set_state(CheckState::Reporting).await;
        report.compose(self.strategy.as_ref(), self.page_limit);
        if report.is_clean() {
            log_info!("scan clean");
        } else {
            log_warn!("scan found {count} orphans", count: report.orphan_count());
        }
        Ok(report)
    }

    /// Deletes exactly the keys a scan reported, children before parents:
    /// chunks, then files, then dirs. Re-running against a repaired store
    /// finds nothing new unless something else has drifted since.
    pub async fn repair(&self, report: &ScanReport) -> Result<usize> {
        let _run = self.run.lock().await;
        self.set_state(CheckState::Repairing).await;
        let result = self.repair_inner(report).await;
        self.set_state(CheckState::Idle).await;
        result
    }

    async fn repair_inner(&self, report: &ScanReport) -> Result<usize> {
        self.store.delete_many(&report.orphan_chunks).await?;
        self.store.delete_many(&report.orphan_files).await?;
        self.store.delete_many(&report.orphan_dirs).await?;
        let count = report.orphan_count();
        log_info!("repair removed {count} records", count: count);
        Ok(count)
    }
}
