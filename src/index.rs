//! # SnapshotIndex
//!
//! The core of the engine. Owns the append-only snapshot chain, the logical
//! `path -> FileEntry` view obtained by replaying it in order, and the
//! `digest -> FileEntry` content index used for cross-snapshot
//! deduplication. The whole chain lives in one gzip-compressed JSON array
//! at `snapshot.json.gz` — there is no per-snapshot file.
//!
//! `register` reproduces the original's dedup bookkeeping exactly,
//! including two details that look like bugs but are not: the content
//! index is updated on every registration, dedup hit or not, and even for
//! the empty-string tombstone digest; and every tombstone mints a brand
//! new, never-uploaded `object_id`. Changing either would silently alter
//! what gets deduplicated on a later backup — so they are kept as observed.

use crate::error::{Error, Result};
use crate::glob;
use crate::remote_store::RemoteStore;
use crate::snapshot::{FileEntry, Snapshot};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const INDEX_KEY: &str = "snapshot.json.gz";

pub struct SnapshotIndex<'a, R: RemoteStore> {
    remote: &'a R,
    loaded: bool,
    chain: Vec<Snapshot>,
    pending: Vec<FileEntry>,
    last_snapshot_id: Option<String>,
    view_order: Vec<String>,
    view_map: HashMap<String, FileEntry>,
    content_index: HashMap<String, FileEntry>,
}

impl<'a, R: RemoteStore> SnapshotIndex<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            loaded: false,
            chain: Vec::new(),
            pending: Vec::new(),
            last_snapshot_id: None,
            view_order: Vec::new(),
            view_map: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;

        let gzipped = match self.remote.read_blob(INDEX_KEY)? {
            Some(bytes) => bytes,
            None => return Ok(()),
        };

        let mut decoder = GzDecoder::new(&gzipped[..]);
        let mut json = String::new();
        decoder.read_to_string(&mut json)?;
        let snapshots: Vec<Snapshot> = serde_json::from_str(&json)?;

        for snapshot in &snapshots {
            if snapshot.prev_snapshot_id != self.last_snapshot_id {
                return Err(Error::CorruptChain(format!(
                    "snapshot {} expected prev_snapshot_id {:?}, found {:?}",
                    snapshot.snapshot_id, self.last_snapshot_id, snapshot.prev_snapshot_id
                )));
            }
            for entry in &snapshot.files {
                self.apply_entry(entry.clone());
            }
            self.last_snapshot_id = Some(snapshot.snapshot_id.clone());
        }
        self.chain = snapshots;
        Ok(())
    }

    /// Applies one historical entry to the logical view and content index,
    /// during chain replay.
    fn apply_entry(&mut self, entry: FileEntry) {
        if !self.view_map.contains_key(&entry.path) {
            self.view_order.push(entry.path.clone());
        }
        self.content_index.insert(entry.digest.clone(), entry.clone());
        self.view_map.insert(entry.path.clone(), entry);
    }

    /// Registers a diff item (`path`, `digest`) for the in-progress backup.
    /// `digest` is `""` for a deletion. Returns `(object_id, must_upload)`:
    /// `must_upload` is true iff the caller still needs to push bytes to
    /// `obj/<object_id>`.
    pub fn register(&mut self, path: &str, digest: &str) -> Result<(String, bool)> {
        self.ensure_loaded()?;

        let (object_id, must_upload) = if !digest.is_empty() {
            if let Some(existing) = self.content_index.get(digest) {
                (existing.object_id.clone(), false)
            } else {
                (Uuid::new_v4().to_string(), true)
            }
        } else {
            (Uuid::new_v4().to_string(), false)
        };

        let entry = FileEntry {
            object_id: object_id.clone(),
            path: path.to_string(),
            digest: digest.to_string(),
        };

        self.pending.push(entry.clone());
        self.apply_entry(entry);

        Ok((object_id, must_upload))
    }

    /// True once at least one registration is pending a flush.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Wraps pending entries into a new `Snapshot`, appends it to the
    /// chain, and rewrites the whole chain as gzipped JSON. Does nothing
    /// useful if called with no pending entries other than add an empty
    /// snapshot link — callers should check `has_pending()` first if they
    /// want to skip that (the engine itself never flushes on a zero-diff
    /// run; see `Commands::backup`).
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_loaded()?;

        let backup_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        let snapshot = Snapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            backup_time,
            prev_snapshot_id: self.last_snapshot_id.clone(),
            files: std::mem::take(&mut self.pending),
        };

        self.last_snapshot_id = Some(snapshot.snapshot_id.clone());
        self.chain.push(snapshot);

        let json = serde_json::to_vec(&self.chain)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        let gzipped = encoder.finish()?;

        self.remote
            .stream_write(INDEX_KEY, &mut &gzipped[..])
            .map_err(|_| Error::Transport(format!("failed to write {INDEX_KEY}")))?;

        Ok(())
    }

    /// Live (non-tombstone) entries matching `glob`, in logical-view
    /// insertion order.
    pub fn list(&mut self, pattern: &str) -> Result<Vec<FileEntry>> {
        self.ensure_loaded()?;

        let re = glob::to_regex(pattern)?;
        Ok(self
            .view_order
            .iter()
            .filter_map(|path| self.view_map.get(path))
            .filter(|entry| !entry.is_tombstone() && re.is_match(&entry.path))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
impl<'a, R: RemoteStore> SnapshotIndex<'a, R> {
    pub(crate) fn ensure_loaded_for_test(&mut self) {
        self.ensure_loaded().unwrap();
    }

    pub(crate) fn chain_sizes_for_test(&self) -> Vec<usize> {
        self.chain.iter().map(|s| s.files.len()).collect()
    }
}
