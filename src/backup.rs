//! # Backup Command
//!
//! Implements incremental, content-addressable backup with cross-snapshot
//! deduplication.
//!
//! ## Algorithm
//!
//! 1. Diff the local tree (minus excluded paths) against the snapshot
//!    index's logical view.
//! 2. For each diff item, register it with the index — a dedup hit reuses
//!    an existing `object_id` and skips the upload; everything else mints a
//!    fresh one.
//! 3. Upload new content to `obj/<object_id>`.
//! 4. Flush the index every `flush_after` registrations, plus once more at
//!    the end if anything is still pending. A run with no diff items never
//!    flushes at all.

use crate::diff::{self, DiffItem};
use crate::error::{Error, Result};
use crate::index::SnapshotIndex;
use crate::local_fs::LocalSource;
use crate::remote_store::RemoteStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::num::NonZeroUsize;

pub const DEFAULT_FLUSH_AFTER: usize = 50;

#[derive(Debug, Default)]
pub struct BackupStats {
    pub items: usize,
    pub uploaded: usize,
    pub deduplicated: usize,
    pub deleted: usize,
    pub flushes: usize,
}

pub fn run_backup<L, R>(
    local: &L,
    remote: &R,
    flush_after: NonZeroUsize,
    verbose: bool,
) -> Result<BackupStats>
where
    L: LocalSource,
    R: RemoteStore,
{
    let flush_after = flush_after.get();
    if flush_after == 0 {
        return Err(Error::InvalidFlushAfter);
    }

    let mut index = SnapshotIndex::new(remote);
    let items = diff::diff_tree(local, &mut index)?;

    let pb = create_progress_bar(items.len() as u64);
    let mut stats = BackupStats::default();
    let mut pending_since_flush = 0usize;

    for item in &items {
        apply_item(local, remote, &mut index, item, verbose, &mut stats)?;
        pb.inc(1);

        pending_since_flush += 1;
        if pending_since_flush % flush_after == 0 {
            index.flush()?;
            stats.flushes += 1;
            pending_since_flush = 0;
        }
    }

    pb.finish_and_clear();

    if pending_since_flush > 0 {
        index.flush()?;
        stats.flushes += 1;
    }

    Ok(stats)
}

fn apply_item<L, R>(
    local: &L,
    remote: &R,
    index: &mut SnapshotIndex<'_, R>,
    item: &DiffItem,
    verbose: bool,
    stats: &mut BackupStats,
) -> Result<()>
where
    L: LocalSource,
    R: RemoteStore,
{
    stats.items += 1;

    let (object_id, must_upload) = index.register(&item.path, &item.digest)?;

    if item.is_tombstone() {
        stats.deleted += 1;
        return Ok(());
    }

    if must_upload {
        if verbose {
            eprintln!("{} {}...", colored::Colorize::green("Copying"), item.path);
        }
        let mut reader = local.open_reader(&item.path)?;
        remote
            .stream_write(&format!("obj/{object_id}"), &mut *reader)
            .map_err(|_| Error::Transport(format!("failed to upload obj/{object_id}")))?;
        stats.uploaded += 1;
    } else {
        stats.deduplicated += 1;
    }

    Ok(())
}

fn create_progress_bar(total: u64) -> ProgressBar {
    if total == 0 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} backup [{bar:30.cyan/dim}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─"),
    );
    pb
}
