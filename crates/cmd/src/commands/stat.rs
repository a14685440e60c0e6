// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use flatfs::Kind;

use crate::common::{CliContext, format_file_size, format_timestamp};

pub async fn stat_command(ctx: &CliContext, path: &str) -> Result<()> {
    let (fs, _store) = ctx.load().await?;
    let meta = fs.stat(path).await?;

    println!("path:     {path}");
    println!("kind:     {}", meta.kind);
    if meta.kind == Kind::File {
        println!("size:     {} ({})", meta.size, format_file_size(meta.size));
    }
    println!("created:  {}", format_timestamp(meta.created_at));
    println!("modified: {}", format_timestamp(meta.modified_at));

    ctx.print_stats(&fs).await;
    Ok(())
}
