// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use diagnostics::log_info;

use crate::common::CliContext;

pub async fn init_command(ctx: &CliContext) -> Result<()> {
    let (fs, store) = ctx.create().await?;
    ctx.save(&store).await?;

    println!("initialized empty store at {}", ctx.store_path().display());
    log_info!("store initialized");
    ctx.print_stats(&fs).await;
    Ok(())
}
