//! # LocalSource / LocalSink
//!
//! `LocalSource` enumerates and reads the directory tree being backed up.
//! `LocalSink` materializes a restore into a fresh destination directory.
//! Each has a disk-backed implementation and an in-memory fake for tests,
//! mirroring the split the original draws between `DiskLocalFS` and
//! `MemoryLocalFS`.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Read access to the tree being backed up.
pub trait LocalSource {
    /// All file paths under the tree, root-relative and forward-slash
    /// normalized. Order is deterministic given deterministic input, not
    /// contractually sorted.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Opens `relpath` for streaming reads.
    fn open_reader(&self, relpath: &str) -> Result<Box<dyn Read + '_>>;
}

/// Write access to a fresh restore destination.
pub trait LocalSink {
    /// `ensure_dir(None)` creates the destination root, returning `false`
    /// iff it already existed. `ensure_dir(Some(relpath))` creates an
    /// arbitrary relative subdirectory, idempotently.
    fn ensure_dir(&self, relpath: Option<&str>) -> Result<bool>;

    /// Creates `relpath` for writing. Fails if the file already exists.
    fn create_writer(&self, relpath: &str) -> Result<Box<dyn Write + '_>>;
}

/// Disk-backed `LocalSource` rooted at an existing directory.
pub struct DiskLocalSource {
    root: PathBuf,
}

impl DiskLocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LocalSource for DiskLocalSource {
    fn list_files(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path());
            let normalized: String = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            paths.push(normalized);
        }
        paths.sort();
        Ok(paths)
    }

    fn open_reader(&self, relpath: &str) -> Result<Box<dyn Read + '_>> {
        let full = self.root.join(relpath);
        Ok(Box::new(File::open(full)?))
    }
}

/// Disk-backed `LocalSink` rooted at a destination that does not yet exist.
pub struct DiskLocalSink {
    root: PathBuf,
}

impl DiskLocalSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LocalSink for DiskLocalSink {
    fn ensure_dir(&self, relpath: Option<&str>) -> Result<bool> {
        match relpath {
            None => match fs::create_dir(&self.root) {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
                Err(e) => Err(e.into()),
            },
            Some(rel) => {
                let full = self.root.join(rel);
                let existed = full.exists();
                fs::create_dir_all(&full)?;
                Ok(!existed)
            }
        }
    }

    fn create_writer(&self, relpath: &str) -> Result<Box<dyn Write + '_>> {
        let full = self.root.join(relpath);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    Error::LocalFileExists(relpath.to_string())
                } else {
                    Error::Io(e)
                }
            })?;
        Ok(Box::new(file))
    }
}

/// In-memory `LocalSource` fake for tests.
#[derive(Default)]
pub struct MemoryLocalSource {
    files: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryLocalSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file(&self, relpath: &str, content: impl Into<Vec<u8>>) {
        self.files
            .borrow_mut()
            .insert(relpath.to_string(), content.into());
    }

    pub fn remove_file(&self, relpath: &str) {
        self.files.borrow_mut().remove(relpath);
    }
}

impl LocalSource for MemoryLocalSource {
    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.borrow().keys().cloned().collect())
    }

    fn open_reader(&self, relpath: &str) -> Result<Box<dyn Read + '_>> {
        let data = self
            .files
            .borrow()
            .get(relpath)
            .cloned()
            .ok_or_else(|| Error::LocalPathNotFound(relpath.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }
}

/// In-memory `LocalSink` fake for tests. Mirrors the original's
/// `MemoryLocalFS`: `create_writer` requires the file's exact parent
/// directory string to have been registered via `ensure_dir` first — no
/// implicit recursive parent creation.
#[derive(Default)]
pub struct MemoryLocalSink {
    dirs: RefCell<HashSet<String>>,
    files: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryLocalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_file(&self, relpath: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(relpath).cloned()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }
}

fn dirname(relpath: &str) -> String {
    match relpath.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    }
}

impl LocalSink for MemoryLocalSink {
    fn ensure_dir(&self, relpath: Option<&str>) -> Result<bool> {
        let key = relpath.unwrap_or("").to_string();
        let mut dirs = self.dirs.borrow_mut();
        if dirs.contains(&key) {
            Ok(false)
        } else {
            dirs.insert(key);
            Ok(true)
        }
    }

    fn create_writer(&self, relpath: &str) -> Result<Box<dyn Write + '_>> {
        let dir = dirname(relpath);
        if !self.dirs.borrow().contains(&dir) {
            return Err(Error::LocalPathNotFound(format!(
                "directory not created before write: {relpath}"
            )));
        }
        if self.files.borrow().contains_key(relpath) {
            return Err(Error::LocalFileExists(relpath.to_string()));
        }
        Ok(Box::new(MemoryFileWriter {
            sink: self,
            relpath: relpath.to_string(),
            buf: Vec::new(),
        }))
    }
}

struct MemoryFileWriter<'a> {
    sink: &'a MemoryLocalSink,
    relpath: String,
    buf: Vec<u8>,
}

impl Write for MemoryFileWriter<'_> {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryFileWriter<'_> {
    fn drop(&mut self) {
        self.sink
            .files
            .borrow_mut()
            .insert(self.relpath.clone(), std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_round_trip() {
        let src = MemoryLocalSource::new();
        src.set_file("a/b.txt", b"hello".to_vec());
        assert_eq!(src.list_files().unwrap(), vec!["a/b.txt".to_string()]);
        let mut reader = src.open_reader("a/b.txt").unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn memory_source_missing_file_errors() {
        let src = MemoryLocalSource::new();
        assert!(src.open_reader("nope.txt").is_err());
    }

    #[test]
    fn memory_sink_requires_dir_registration() {
        let sink = MemoryLocalSink::new();
        assert!(sink.create_writer("a/b.txt").is_err());
        assert!(sink.ensure_dir(None).unwrap());
        assert!(sink.ensure_dir(Some("a")).unwrap());
        let mut w = sink.create_writer("a/b.txt").unwrap();
        w.write_all(b"data").unwrap();
        drop(w);
        assert_eq!(sink.get_file("a/b.txt"), Some(b"data".to_vec()));
    }

    #[test]
    fn memory_sink_rejects_duplicate_write() {
        let sink = MemoryLocalSink::new();
        sink.ensure_dir(None).unwrap();
        sink.ensure_dir(Some("")).unwrap();
        let mut w = sink.create_writer("top.txt").unwrap();
        w.write_all(b"x").unwrap();
        drop(w);
        assert!(sink.create_writer("top.txt").is_err());
    }

    #[test]
    fn ensure_dir_root_reports_existed() {
        let sink = MemoryLocalSink::new();
        assert!(sink.ensure_dir(None).unwrap());
        assert!(!sink.ensure_dir(None).unwrap());
    }

    #[test]
    fn disk_source_lists_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        std::fs::write(tmp.path().join("sub/b.txt"), b"b").unwrap();

        let source = DiskLocalSource::new(tmp.path());
        let mut files = source.list_files().unwrap();
        files.sort();
        assert_eq!(files, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }

    #[test]
    fn disk_sink_reports_root_already_existed() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let sink = DiskLocalSink::new(&dest);
        assert!(sink.ensure_dir(None).unwrap());
        let sink2 = DiskLocalSink::new(&dest);
        assert!(!sink2.ensure_dir(None).unwrap());
    }

    #[test]
    fn disk_sink_create_writer_fails_if_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let sink = DiskLocalSink::new(&dest);
        sink.ensure_dir(None).unwrap();
        let mut w = sink.create_writer("a.txt").unwrap();
        w.write_all(b"x").unwrap();
        drop(w);
        assert!(sink.create_writer("a.txt").is_err());
    }
}
