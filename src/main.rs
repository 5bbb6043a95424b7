//! # strata-backup
//!
//! An incremental, content-deduplicating directory backup tool. Every
//! backup diffs the source tree against a chained snapshot index stored at
//! the remote, uploads only new content, and appends a link to the chain.
//! Restores stream matching blobs straight from the remote into a fresh
//! destination directory.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────┐
//!                    │   CLI (clap) │
//!                    └──────┬──────┘
//!                           │
//!              ┌────────────┼────────────┐
//!              ▼            ▼            ▼
//!         ┌────────┐  ┌───────────┐  ┌─────────┐
//!         │ Backup │  │   List    │  │ Restore │
//!         └───┬────┘  └─────┬─────┘  └────┬────┘
//!             │             │             │
//!             └─────────────┼─────────────┘
//!                           ▼
//!                  ┌─────────────────┐
//!                  │  SnapshotIndex  │
//!                  │ (chain + dedup) │
//!                  └────────┬────────┘
//!                           │
//!                  ┌────────┴────────┐
//!                  ▼                 ▼
//!            ┌──────────┐     ┌─────────────┐
//!            │  Hasher  │     │ RemoteStore │
//!            │  (MD5)   │     │ (keyed blobs)│
//!            └──────────┘     └─────────────┘
//! ```

mod backup;
mod diff;
mod error;
mod glob;
mod hasher;
mod index;
mod local_fs;
mod path_filter;
mod remote_store;
mod remote_uri;
mod restore;
mod snapshot;

use clap::{Parser, Subcommand};
use crate::local_fs::{DiskLocalSink, DiskLocalSource};
use crate::remote_store::LocalDiskStore;
use crate::remote_uri::RemoteUri;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// strata-backup — an incremental, content-deduplicating directory backup tool
#[derive(Parser, Debug)]
#[command(
    name = "strata-backup",
    version,
    about = "An incremental, content-deduplicating directory backup tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Back up a local directory tree to a remote
    Backup {
        /// Local directory to back up
        #[arg(long)]
        source: PathBuf,

        /// Remote URI (bucket[/prefix]) to back up into
        #[arg(long)]
        remote: String,

        /// Commit a snapshot link after this many registered items
        #[arg(long, default_value_t = backup::DEFAULT_FLUSH_AFTER)]
        flush_after: usize,
    },

    /// List live paths in a remote's snapshot chain
    List {
        /// Remote URI (bucket[/prefix]) to list
        #[arg(long)]
        remote: String,

        /// Glob pattern restricting which paths are printed (default: all)
        #[arg(long, default_value = "*")]
        glob: String,
    },

    /// Restore matching files from a remote into a fresh directory
    Restore {
        /// Remote URI (bucket[/prefix]) to restore from
        #[arg(long)]
        remote: String,

        /// Destination directory; must not already exist
        #[arg(long)]
        destination: PathBuf,

        /// Glob pattern restricting which paths are restored (default: all)
        #[arg(long, default_value = "*")]
        glob: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", colored::Colorize::red("error:"), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Backup {
            source,
            remote,
            flush_after,
        } => cmd_backup(source, remote, *flush_after, cli.verbose),
        Command::List { remote, glob } => cmd_list(remote, glob),
        Command::Restore {
            remote,
            destination,
            glob,
        } => cmd_restore(remote, destination, glob),
    }
}

// ─── Command Implementations ────────────────────────────────────────────────

fn cmd_backup(source: &std::path::Path, remote: &str, flush_after: usize, verbose: bool) -> anyhow::Result<()> {
    let flush_after = NonZeroUsize::new(flush_after).ok_or(error::Error::InvalidFlushAfter)?;
    let local = DiskLocalSource::new(source);
    let store = LocalDiskStore::new(RemoteUri::parse(remote)?.as_path());

    let stats = backup::run_backup(&local, &store, flush_after, verbose)?;

    eprintln!(
        "{} {} items ({} uploaded, {} deduplicated, {} deleted, {} flush{})",
        colored::Colorize::green("done:"),
        stats.items,
        stats.uploaded,
        stats.deduplicated,
        stats.deleted,
        stats.flushes,
        if stats.flushes == 1 { "" } else { "es" },
    );

    Ok(())
}

fn cmd_list(remote: &str, glob: &str) -> anyhow::Result<()> {
    let store = LocalDiskStore::new(RemoteUri::parse(remote)?.as_path());
    for path in restore::run_list(&store, glob)? {
        println!("{path}");
    }
    Ok(())
}

fn cmd_restore(remote: &str, destination: &std::path::Path, glob: &str) -> anyhow::Result<()> {
    let store = LocalDiskStore::new(RemoteUri::parse(remote)?.as_path());
    let sink = DiskLocalSink::new(destination);

    match restore::run_restore(&store, &sink, glob) {
        Ok(stats) => {
            eprintln!(
                "{} restored {} file(s)",
                colored::Colorize::green("done:"),
                stats.files_restored,
            );
            Ok(())
        }
        Err(error::Error::DestinationExists) => {
            eprintln!("Destination already exists");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
