// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cmd::commands::{
    cat_command, check_command, copy_command, init_command, list_command, mkdir_command,
    remove_command, repair_command, show_command, stat_command,
};
use cmd::common::CliContext;

#[derive(Parser)]
#[command(author, version, about = "A hierarchical filesystem over a flat document store")]
#[command(name = "flatfs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store snapshot file (defaults to the FLATFS_STORE environment variable)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose output, including cache counters
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty store
    Init,
    /// Create a directory
    Mkdir {
        /// Directory path to create
        path: String,
        /// Create missing parent directories as needed
        #[arg(short, long)]
        parents: bool,
    },
    /// List the children of a directory
    List {
        /// Directory to list (defaults to the root)
        path: Option<String>,
        /// Long format: kind, size, and modification time
        #[arg(short, long)]
        long: bool,
    },
    /// Write a file's content to stdout
    Cat {
        /// File path to read
        path: String,
    },
    /// Copy a host file into the store
    Copy {
        /// Source file on the host filesystem
        source: PathBuf,
        /// Destination path in the store
        dest: String,
    },
    /// Remove a file or directory
    Remove {
        /// Path to remove
        path: String,
        /// Remove non-empty directories and their contents
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print metadata for a path
    Stat {
        /// Path to inspect
        path: String,
    },
    /// Scan for orphaned records and print a report
    Check,
    /// Scan for orphaned records and delete them
    Repair,
    /// Dump raw store records
    Show {
        /// Restrict to one kind: dir, file, or chunk
        #[arg(short, long)]
        kind: Option<String>,
        /// Limit the number of records printed
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let ctx = CliContext::new(cli.store.clone(), cli.verbose)?;

    match &cli.command {
        Commands::Init => init_command(&ctx).await,
        Commands::Mkdir { path, parents } => mkdir_command(&ctx, path, *parents).await,
        Commands::List { path, long } => {
            list_command(&ctx, path.as_deref().unwrap_or("/"), *long).await
        }
        Commands::Cat { path } => cat_command(&ctx, path).await,
        Commands::Copy { source, dest } => copy_command(&ctx, source, dest).await,
        Commands::Remove { path, recursive } => remove_command(&ctx, path, *recursive).await,
        Commands::Stat { path } => stat_command(&ctx, path).await,
        Commands::Check => check_command(&ctx).await,
        Commands::Repair => repair_command(&ctx).await,
        Commands::Show { kind, limit } => show_command(&ctx, kind.as_deref(), *limit).await,
    }
}
