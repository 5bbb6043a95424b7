//! # Content Hashing
//!
//! Uses MD5-128 as the content-identity digest. This is not a security
//! boundary — the digest only has to agree when two byte streams are equal,
//! and the wire format (`files[].md5`) is fixed by the on-disk snapshot
//! chain, so the algorithm cannot be swapped for something stronger without
//! breaking compatibility with existing chains.

use crate::error::Result;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Size of the read buffer for streaming hash computation (64 KiB).
const BUF_SIZE: usize = 64 * 1024;

/// Hashes an arbitrary `Read` stream, consuming it to EOF.
pub fn hash_reader(reader: &mut dyn Read) -> Result<String> {
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; BUF_SIZE];

    loop {
        let bytes_read = reader.read(&mut buf)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buf[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Computes the MD5 hash of a file's contents, returning a hex string.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    hash_reader(&mut file)
}

/// Computes the MD5 hash of in-memory data.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn hash_deterministic() {
        let dir = std::env::temp_dir().join("strata-backup-test-hash");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.txt");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"hello world").unwrap();
        drop(f);

        let h1 = hash_file(&path).unwrap();
        let h2 = hash_file(&path).unwrap();
        assert_eq!(h1, h2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn hash_bytes_consistent() {
        let h1 = hash_bytes(b"test data");
        let h2 = hash_bytes(b"test data");
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_bytes_different_inputs() {
        let h1 = hash_bytes(b"data A");
        let h2 = hash_bytes(b"data B");
        assert_ne!(h1, h2);
    }

    #[test]
    fn empty_content_has_well_known_md5() {
        // d41d8cd98f00b204e9800998ecf8427e is the MD5 of the empty string,
        // which is what an empty (but present) file must hash to. Only
        // actual deletions use the empty-string tombstone digest.
        assert_eq!(hash_bytes(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn hash_reader_matches_hash_bytes() {
        let data = b"streamed content spanning more than one buffer chunk";
        let mut cursor = std::io::Cursor::new(&data[..]);
        assert_eq!(hash_reader(&mut cursor).unwrap(), hash_bytes(data));
    }
}
