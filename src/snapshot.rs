//! # Snapshot Wire Types
//!
//! `FileEntry` and `Snapshot` are the on-wire shape of `snapshot.json.gz` —
//! a single gzip-compressed JSON array, the whole chain in one object. Field
//! names are normative and independent of the idiomatic Rust names used
//! internally (`object_id` on the wire is `file_id`; `digest` on the wire is
//! `md5`).

use serde::{Deserialize, Serialize};

/// One file's state as of the snapshot it was registered in. A `digest` of
/// `""` marks a tombstone (the path was deleted).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    #[serde(rename = "file_id")]
    pub object_id: String,
    pub path: String,
    #[serde(rename = "md5")]
    pub digest: String,
}

impl FileEntry {
    pub fn is_tombstone(&self) -> bool {
        self.digest.is_empty()
    }
}

/// One link in the chain. `prev_snapshot_id` is `None` only for the first
/// snapshot ever written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub backup_time: f64,
    pub prev_snapshot_id: Option<String>,
    pub files: Vec<FileEntry>,
}
