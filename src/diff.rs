//! # DiffEngine
//!
//! Compares the local tree (after `PathFilter`) against the snapshot
//! index's logical view and produces the list of work items a backup needs
//! to apply. Tombstones — paths the index still thinks are live but no
//! longer exist locally — are always emitted before add/modify items,
//! mirroring the original's `diff()`.

use crate::error::Result;
use crate::hasher;
use crate::local_fs::LocalSource;
use crate::path_filter;
use crate::remote_store::RemoteStore;
use crate::index::SnapshotIndex;
use std::collections::{HashMap, HashSet};

/// One unit of backup work. `digest == ""` means "delete this path".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffItem {
    pub path: String,
    pub digest: String,
}

impl DiffItem {
    pub fn is_tombstone(&self) -> bool {
        self.digest.is_empty()
    }
}

pub fn diff_tree<L, R>(local: &L, index: &mut SnapshotIndex<'_, R>) -> Result<Vec<DiffItem>>
where
    L: LocalSource,
    R: RemoteStore,
{
    let local_paths: Vec<String> = local
        .list_files()?
        .into_iter()
        .filter(|path| !path_filter::is_excluded(path))
        .collect();
    let local_set: HashSet<&str> = local_paths.iter().map(String::as_str).collect();

    let remote_entries = index.list("*")?;
    let remote_digest_by_path: HashMap<&str, &str> = remote_entries
        .iter()
        .map(|e| (e.path.as_str(), e.digest.as_str()))
        .collect();

    let mut items = Vec::new();

    for entry in &remote_entries {
        if !local_set.contains(entry.path.as_str()) {
            items.push(DiffItem {
                path: entry.path.clone(),
                digest: String::new(),
            });
        }
    }

    for path in &local_paths {
        let mut reader = local.open_reader(path)?;
        let digest = hasher::hash_reader(&mut *reader)?;
        if remote_digest_by_path.get(path.as_str()) != Some(&digest.as_str()) {
            items.push(DiffItem {
                path: path.clone(),
                digest,
            });
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_fs::MemoryLocalSource;
    use crate::remote_store::MemoryStore;

    #[test]
    fn first_backup_diffs_every_file() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        local.set_file("b.txt", b"bbb".to_vec());
        let store = MemoryStore::new();
        let mut index = SnapshotIndex::new(&store);

        let items = diff_tree(&local, &mut index).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| !i.is_tombstone()));
    }

    #[test]
    fn excluded_paths_never_appear() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        local.set_file("node_modules/pkg/index.js", b"x".to_vec());
        let store = MemoryStore::new();
        let mut index = SnapshotIndex::new(&store);

        let items = diff_tree(&local, &mut index).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, "a.txt");
    }

    #[test]
    fn deleted_path_produces_tombstone_before_adds() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        let store = MemoryStore::new();
        let mut index = SnapshotIndex::new(&store);
        {
            let items = diff_tree(&local, &mut index).unwrap();
            for item in &items {
                index.register(&item.path, &item.digest).unwrap();
            }
            index.flush().unwrap();
        }

        local.remove_file("a.txt");
        local.set_file("b.txt", b"bbb".to_vec());

        let items = diff_tree(&local, &mut index).unwrap();
        assert_eq!(items[0].path, "a.txt");
        assert!(items[0].is_tombstone());
        assert_eq!(items[1].path, "b.txt");
    }

    #[test]
    fn unchanged_file_produces_no_diff() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        let store = MemoryStore::new();
        let mut index = SnapshotIndex::new(&store);
        let items = diff_tree(&local, &mut index).unwrap();
        for item in &items {
            index.register(&item.path, &item.digest).unwrap();
        }
        index.flush().unwrap();

        let items = diff_tree(&local, &mut index).unwrap();
        assert!(items.is_empty());
    }
}
