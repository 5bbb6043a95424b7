//! # List & Restore Commands
//!
//! `run_list` prints the live paths in the snapshot index's logical view
//! that match a glob. `run_restore` refuses a pre-existing destination
//! directory, then streams every matching live entry's blob straight from
//! the remote into a freshly created local file.

use crate::error::{Error, Result};
use crate::index::SnapshotIndex;
use crate::local_fs::LocalSink;
use crate::remote_store::RemoteStore;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct RestoreStats {
    pub files_restored: usize,
}

pub fn run_list<R: RemoteStore>(remote: &R, glob: &str) -> Result<Vec<String>> {
    let mut index = SnapshotIndex::new(remote);
    let entries = index.list(glob)?;
    Ok(entries.into_iter().map(|e| e.path).collect())
}

pub fn run_restore<S, R>(remote: &R, sink: &S, glob: &str) -> Result<RestoreStats>
where
    S: LocalSink,
    R: RemoteStore,
{
    if !sink.ensure_dir(None)? {
        return Err(Error::DestinationExists);
    }

    let mut index = SnapshotIndex::new(remote);
    let entries = index.list(glob)?;

    let mut stats = RestoreStats::default();
    let mut ensured_dirs: HashSet<String> = HashSet::new();

    for entry in &entries {
        let dir = match entry.path.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        };
        if ensured_dirs.insert(dir.clone()) {
            sink.ensure_dir(Some(&dir))?;
        }

        let mut writer = sink.create_writer(&entry.path)?;
        remote
            .stream_read(&format!("obj/{}", entry.object_id), &mut *writer)
            .map_err(|_| Error::Transport(format!("failed to fetch obj/{}", entry.object_id)))?;

        stats.files_restored += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_fs::{MemoryLocalSink, MemoryLocalSource};
    use crate::remote_store::MemoryStore;
    use std::num::NonZeroUsize;

    fn seed_backup(local: &MemoryLocalSource, remote: &MemoryStore) {
        crate::backup::run_backup(local, remote, NonZeroUsize::new(50).unwrap(), false).unwrap();
    }

    #[test]
    fn list_returns_matching_live_paths() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        local.set_file("b.rs", b"bbb".to_vec());
        let remote = MemoryStore::new();
        seed_backup(&local, &remote);

        let mut txt = run_list(&remote, "*.txt").unwrap();
        txt.sort();
        assert_eq!(txt, vec!["a.txt".to_string()]);

        let mut all = run_list(&remote, "*").unwrap();
        all.sort();
        assert_eq!(all, vec!["a.txt".to_string(), "b.rs".to_string()]);
    }

    #[test]
    fn restore_rejects_existing_destination() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        let remote = MemoryStore::new();
        seed_backup(&local, &remote);

        let sink = MemoryLocalSink::new();
        sink.ensure_dir(None).unwrap(); // simulate destination already existing

        let err = run_restore(&remote, &sink, "*").unwrap_err();
        assert!(matches!(err, Error::DestinationExists));
    }

    #[test]
    fn restore_all_writes_every_live_file() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        local.set_file("dir/b.txt", b"bbb".to_vec());
        let remote = MemoryStore::new();
        seed_backup(&local, &remote);

        let sink = MemoryLocalSink::new();
        let stats = run_restore(&remote, &sink, "*").unwrap();
        assert_eq!(stats.files_restored, 2);
        assert_eq!(sink.get_file("a.txt"), Some(b"aaa".to_vec()));
        assert_eq!(sink.get_file("dir/b.txt"), Some(b"bbb".to_vec()));
    }

    #[test]
    fn restore_partial_respects_glob() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        local.set_file("b.rs", b"bbb".to_vec());
        let remote = MemoryStore::new();
        seed_backup(&local, &remote);

        let sink = MemoryLocalSink::new();
        let stats = run_restore(&remote, &sink, "*.txt").unwrap();
        assert_eq!(stats.files_restored, 1);
        assert_eq!(sink.get_file("a.txt"), Some(b"aaa".to_vec()));
        assert_eq!(sink.get_file("b.rs"), None);
    }

    #[test]
    fn restore_skips_deleted_paths() {
        let local = MemoryLocalSource::new();
        local.set_file("a.txt", b"aaa".to_vec());
        let remote = MemoryStore::new();
        seed_backup(&local, &remote);

        local.remove_file("a.txt");
        seed_backup(&local, &remote);

        let sink = MemoryLocalSink::new();
        let stats = run_restore(&remote, &sink, "*").unwrap();
        assert_eq!(stats.files_restored, 0);
    }
}
