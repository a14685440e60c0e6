// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, anyhow};
use flatfs::{Kind, OrderBy, Query, Record};

use crate::common::{CliContext, format_timestamp};

/// Dumps raw store records, bypassing the filesystem view. Useful for
/// inspecting what a scan would see, orphans included.
pub async fn show_command(ctx: &CliContext, kind: Option<&str>, limit: Option<usize>) -> Result<()> {
    let kinds = match kind {
        None => vec![Kind::Dir, Kind::File, Kind::Chunk],
        Some("dir") => vec![Kind::Dir],
        Some("file") => vec![Kind::File],
        Some("chunk") => vec![Kind::Chunk],
        Some(other) => {
            return Err(anyhow!("unknown kind {other:?}: expected dir, file, or chunk"));
        }
    };

    let (fs, _store) = ctx.load().await?;
    let mut budget = limit.unwrap_or(usize::MAX);
    for k in kinds {
        if budget == 0 {
            break;
        }
        let mut query = Query::kind(k).limit(budget);
        if k != Kind::Chunk {
            // chunk keys already sort by file and offset
            query = query.order(OrderBy::Path);
        }
        let rows = fs.store().query(&query).await?;
        budget -= rows.len();
        for (key, record) in rows {
            match record {
                Record::Dir(d) => {
                    println!("dir    {}  modified {}", d.path, format_timestamp(d.modified_at));
                }
                Record::File(f) => {
                    println!("file   {}  {} bytes", f.path, f.size);
                }
                Record::Chunk(c) => {
                    println!("chunk  {key}  {} bytes at offset {}", c.size, c.offset);
                }
            }
        }
    }

    ctx.print_stats(&fs).await;
    Ok(())
}
