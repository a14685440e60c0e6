// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use diagnostics::log_info;

use crate::common::CliContext;

/// Removes a file, or a directory when `recursive` allows it. Empty
/// directories go without the flag.
pub async fn remove_command(ctx: &CliContext, path: &str, recursive: bool) -> Result<()> {
    let (fs, store) = ctx.load().await?;
    if fs.isdir(path).await? {
        fs.rmdir(path, recursive).await?;
    } else {
        fs.unlink(path).await?;
    }
    ctx.save(&store).await?;

    log_info!("removed: {path}", path: path);
    ctx.print_stats(&fs).await;
    Ok(())
}
