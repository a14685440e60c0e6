// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Shared command plumbing: store location, load/save, output helpers.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use flatfs::{EntityCache, FlatFs, MemoryStore};

/// Everything a subcommand needs besides its own arguments: where the
/// store snapshot lives and whether to print cache counters afterwards.
pub struct CliContext {
    store_path: PathBuf,
    verbose: bool,
}

impl CliContext {
    /// The `--store` flag wins; otherwise the `FLATFS_STORE` environment
    /// variable names the snapshot file.
    pub fn new(store: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let store_path = match store {
            Some(path) => path,
            None => env::var("FLATFS_STORE")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("no store given: pass --store or set FLATFS_STORE"))?,
        };
        Ok(Self {
            store_path,
            verbose,
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Opens a filesystem over the existing snapshot.
    pub async fn load(&self) -> Result<(FlatFs, Arc<MemoryStore>)> {
        if !tokio::fs::try_exists(&self.store_path).await? {
            return Err(anyhow!(
                "no store at {}; run 'flatfs init' first",
                self.store_path.display()
            ));
        }
        let store = Arc::new(MemoryStore::load_from(&self.store_path).await?);
        let fs = FlatFs::new(store.clone(), Arc::new(EntityCache::new())).await?;
        Ok((fs, store))
    }

    /// Creates a fresh filesystem for `init`. Refuses to clobber an
    /// existing snapshot.
    pub async fn create(&self) -> Result<(FlatFs, Arc<MemoryStore>)> {
        if tokio::fs::try_exists(&self.store_path).await? {
            return Err(anyhow!(
                "store already exists at {}",
                self.store_path.display()
            ));
        }
        let store = Arc::new(MemoryStore::new());
        let fs = FlatFs::new(store.clone(), Arc::new(EntityCache::new())).await?;
        Ok((fs, store))
    }

    pub async fn save(&self, store: &MemoryStore) -> Result<()> {
        store.save_to(&self.store_path).await?;
        Ok(())
    }

    /// With `--verbose`, prints the cache counters to stderr so they do
    /// not mix with command output.
    pub async fn print_stats(&self, fs: &FlatFs) {
        if !self.verbose {
            return;
        }
        let stats = fs.cache_stats().await;
        eprintln!(
            "cache: {} hits, {} misses, {} sets, {} deletes",
            stats.hits, stats.misses, stats.sets, stats.deletes
        );
        eprintln!(
            "lists: {} hits, {} misses, {} sets, {} deletes",
            stats.list_hits, stats.list_misses, stats.list_sets, stats.list_deletes
        );
    }
}

/// Human-readable byte count, binary units.
pub fn format_file_size(size: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    if size >= GIB {
        format!("{:.1} GiB", size as f64 / GIB as f64)
    } else if size >= MIB {
        format!("{:.1} MiB", size as f64 / MIB as f64)
    } else if size >= KIB {
        format!("{:.1} KiB", size as f64 / KIB as f64)
    } else {
        format!("{size} B")
    }
}

/// Microsecond timestamp rendered for listings; the raw number if it
/// does not parse.
pub fn format_timestamp(micros: i64) -> String {
    match chrono::DateTime::from_timestamp_micros(micros) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => micros.to_string(),
    }
}
