//! # Remote URI
//!
//! Splits a `--remote URI` CLI value into a bucket segment and an optional
//! key-prefix segment, the way the original's `S3RemoteFS` splits its
//! `base_path` on the first path separator. All keys this system writes
//! (`snapshot.json.gz`, `obj/<file_id>`) are prefixed with the resulting
//! path.

use crate::error::{Error, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUri {
    pub bucket: String,
    pub prefix: Option<String>,
}

impl RemoteUri {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::InvalidRemoteUri(raw.to_string()));
        }

        match trimmed.split_once('/') {
            Some((bucket, prefix)) if !bucket.is_empty() => Ok(Self {
                bucket: bucket.to_string(),
                prefix: Some(prefix.to_string()),
            }),
            Some(_) => Err(Error::InvalidRemoteUri(raw.to_string())),
            None => Ok(Self {
                bucket: trimmed.to_string(),
                prefix: None,
            }),
        }
    }

    /// The filesystem path a `LocalDiskStore` should root itself at:
    /// bucket joined with the optional prefix.
    pub fn as_path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.bucket);
        if let Some(prefix) = &self.prefix {
            path.push(prefix);
        }
        path
    }
}
