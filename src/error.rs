//! # Error Types
//!
//! Defines a structured error hierarchy for the backup engine using `thiserror`.
//! Each error variant carries enough context for meaningful diagnostics without
//! exposing internal implementation details to the caller. `anyhow` is kept
//! only at the CLI edge (`main.rs`); every error that can cross a library
//! boundary is typed here.

use thiserror::Error;

/// Top-level error type for every operation this crate exposes.
#[derive(Error, Debug)]
pub enum Error {
    /// A read or write against the remote store failed, or the remote
    /// refused a key we expected to exist.
    #[error("transport error: {0}")]
    Transport(String),

    /// `prev_snapshot_id` linkage broke during chain replay. Fatal —
    /// the system refuses to proceed rather than silently fork the chain.
    #[error("corrupt snapshot chain: {0}")]
    CorruptChain(String),

    /// `--remote URI` could not be split into bucket + prefix.
    #[error("invalid remote URI: {0}")]
    InvalidRemoteUri(String),

    /// `restore` found a pre-existing destination directory.
    #[error("Destination already exists")]
    DestinationExists,

    /// A local path was requested that the `LocalSource`/`LocalSink`
    /// implementation does not know about.
    #[error("local path not found: {0}")]
    LocalPathNotFound(String),

    /// `LocalSink::create_writer` was asked to create a file that already
    /// exists (mirrors the original's exclusive-create file mode).
    #[error("local file already exists: {0}")]
    LocalFileExists(String),

    /// `backup(flush_after = 0)` — a programmer error, not a runtime one.
    #[error("flush_after must be greater than zero")]
    InvalidFlushAfter,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
