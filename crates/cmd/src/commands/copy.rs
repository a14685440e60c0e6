// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::{Result, anyhow};
use diagnostics::log_info;
use flatfs::{MAX_CHUNK_SIZE, OpenMode};
use tokio::io::AsyncReadExt;

use crate::common::CliContext;

/// Imports a host file into the store, one chunk-sized read at a time.
pub async fn copy_command(ctx: &CliContext, source: &Path, dest: &str) -> Result<()> {
    let (fs, store) = ctx.load().await?;
    let mut host = tokio::fs::File::open(source)
        .await
        .map_err(|e| anyhow!("failed to read '{}': {}", source.display(), e))?;

    let mut stream = fs.open(dest, OpenMode::Write).await?;
    let mut buf = vec![0u8; MAX_CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        let n = host.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        stream.write(&buf[..n]).await?;
        copied += n as u64;
    }
    stream.close().await?;
    ctx.save(&store).await?;

    log_info!(
        "copied {bytes} bytes from {source} to {dest}",
        bytes: copied,
        source: source.display().to_string(),
        dest: dest
    );
    ctx.print_stats(&fs).await;
    Ok(())
}
