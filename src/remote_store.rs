//! # RemoteStore
//!
//! A keyed blob store, standing in for "any S3-like remote" — the original
//! distinguishes `RemoteFS`/`MemoryRemoteFS`/`S3RemoteFS`; this crate ships a
//! concrete disk-backed store plus an in-memory fake for tests. Absence of
//! a key is a first-class, non-error result (`read_blob` returns `None`),
//! matching the original's `read_file`.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

pub trait RemoteStore {
    /// Reads an entire blob into memory. Returns `Ok(None)` if the key does
    /// not exist; this is normal (e.g. the very first `snapshot.json.gz`
    /// load), not an error.
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Streams an existing blob's bytes into `writer`. Errors if the key
    /// does not exist.
    fn stream_read(&self, key: &str, writer: &mut dyn Write) -> Result<()>;

    /// Streams `reader` to EOF into the blob named `key`, creating or
    /// overwriting it.
    fn stream_write(&self, key: &str, reader: &mut dyn Read) -> Result<()>;
}

/// Disk-backed `RemoteStore` rooted at an arbitrary directory (the joined
/// bucket + prefix from a `RemoteUri`).
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl RemoteStore for LocalDiskStore {
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn stream_read(&self, key: &str, writer: &mut dyn Write) -> Result<()> {
        let path = self.path_for(key);
        let mut file = File::open(&path)
            .map_err(|_| Error::Transport(format!("remote key not found: {key}")))?;
        std::io::copy(&mut file, writer)?;
        Ok(())
    }

    fn stream_write(&self, key: &str, reader: &mut dyn Read) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&path)?;
        std::io::copy(reader, &mut file)?;
        Ok(())
    }
}

/// In-memory `RemoteStore` fake for tests. The map is only reachable
/// through these scoped methods, not exposed as a raw field.
#[derive(Default)]
pub struct MemoryStore {
    blobs: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RemoteStore for MemoryStore {
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn stream_read(&self, key: &str, writer: &mut dyn Write) -> Result<()> {
        let blobs = self.blobs.borrow();
        let data = blobs
            .get(key)
            .ok_or_else(|| Error::Transport(format!("remote key not found: {key}")))?;
        writer.write_all(data)?;
        Ok(())
    }

    fn stream_write(&self, key: &str, reader: &mut dyn Read) -> Result<()> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.blobs.borrow_mut().insert(key.to_string(), buf);
        Ok(())
    }
}
