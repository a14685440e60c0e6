// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, anyhow};
use diagnostics::{log_debug, log_info};
use flatfs::{Error, path};

use crate::common::CliContext;

pub async fn mkdir_command(ctx: &CliContext, raw_path: &str, parents: bool) -> Result<()> {
    let target = path::normalize(raw_path)?;
    log_debug!("creating directory: {path}", path: target.as_str());

    let (fs, store) = ctx.load().await?;
    if parents {
        for ancestor in ancestor_chain(&target) {
            match fs.mkdir(&ancestor).await {
                Ok(()) | Err(Error::AlreadyExists(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        // AlreadyExists was forgiven above; make sure it was a directory
        if !fs.isdir(&target).await? {
            return Err(anyhow!("exists but is not a directory: {target}"));
        }
    } else {
        fs.mkdir(&target).await?;
    }
    ctx.save(&store).await?;

    log_info!("created directory: {path}", path: target.as_str());
    ctx.print_stats(&fs).await;
    Ok(())
}

/// The path and every ancestor below root, outermost first.
fn ancestor_chain(normalized: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut cursor = Some(normalized.to_string());
    while let Some(current) = cursor {
        if current == path::ROOT {
            break;
        }
        cursor = path::parent_path(&current);
        chain.push(current);
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestor_chain_is_outermost_first() {
        assert_eq!(ancestor_chain("/a/b/c"), vec!["/a", "/a/b", "/a/b/c"]);
        assert_eq!(ancestor_chain("/a"), vec!["/a"]);
        assert!(ancestor_chain("/").is_empty());
    }
}
