// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use diagnostics::log_debug;
use flatfs::Kind;

use crate::common::{CliContext, format_file_size, format_timestamp};

pub async fn list_command(ctx: &CliContext, path: &str, long: bool) -> Result<()> {
    let (fs, _store) = ctx.load().await?;
    let entries = fs.list_entries(path, None, 0).await?;

    for entry in &entries {
        if long {
            let size = match entry.meta.kind {
                Kind::File => format_file_size(entry.meta.size),
                _ => "-".to_string(),
            };
            println!(
                "{:<5} {:>10}  {}  {}",
                entry.meta.kind.as_str(),
                size,
                format_timestamp(entry.meta.modified_at),
                entry.name
            );
        } else {
            println!("{}", entry.name);
        }
    }

    log_debug!("listed {count} entries under {path}", count: entries.len(), path: path);
    ctx.print_stats(&fs).await;
    Ok(())
}
