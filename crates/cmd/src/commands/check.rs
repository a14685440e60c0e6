// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;

use crate::common::CliContext;

/// Scans the store for orphaned records and prints the report. Read-only;
/// use `repair` to delete what a scan finds.
pub async fn check_command(ctx: &CliContext) -> Result<()> {
    let (fs, _store) = ctx.load().await?;
    let report = fs.checker().scan().await?;
    println!("{}", report.text());

    ctx.print_stats(&fs).await;
    Ok(())
}
