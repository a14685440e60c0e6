// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::Result;
use flatfs::{MAX_CHUNK_SIZE, OpenMode};

use crate::common::CliContext;

/// Streams a file to stdout one chunk at a time; the whole file is never
/// held in memory.
pub async fn cat_command(ctx: &CliContext, path: &str) -> Result<()> {
    let (fs, _store) = ctx.load().await?;
    let mut stream = fs.open(path, OpenMode::Read).await?;

    let mut stdout = std::io::stdout().lock();
    loop {
        let buf = stream.read(MAX_CHUNK_SIZE).await?;
        if buf.is_empty() {
            break;
        }
        stdout.write_all(&buf)?;
    }
    stdout.flush()?;
    stream.close().await?;

    ctx.print_stats(&fs).await;
    Ok(())
}
