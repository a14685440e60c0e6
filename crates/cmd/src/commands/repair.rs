// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use diagnostics::log_info;

use crate::common::CliContext;

pub async fn repair_command(ctx: &CliContext) -> Result<()> {
    let (fs, store) = ctx.load().await?;
    let checker = fs.checker();
    let report = checker.scan().await?;
    println!("{}", report.text());

    if report.is_clean() {
        ctx.print_stats(&fs).await;
        return Ok(());
    }

    let removed = checker.repair(&report).await?;
    fs.reset_cache().await;
    ctx.save(&store).await?;

    println!("removed {removed} orphaned records");
    log_info!("repair removed {count} records", count: removed);
    ctx.print_stats(&fs).await;
    Ok(())
}
