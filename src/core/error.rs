//! Error types shared across trond.
//!
//! Orchestration code works in `anyhow::Result` and adds context; the variants
//! here are the failures callers (and tests) need to tell apart.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the snapshot pipeline and node tooling.
#[derive(Error, Debug)]
pub enum TrondError {
    // ---- configuration ----
    #[error("domain '{0}' is not supported, run `trond snapshot source` to see available sources")]
    UnsupportedDomain(String),

    #[error("node type '{0}' is not supported, available: full, lite")]
    UnsupportedNodeType(String),

    #[error("node profile '{0}' is not supported, available: full-main, full-nile, witness-private")]
    UnsupportedProfile(String),

    #[error("invalid backup name '{0}', expected backupYYYYMMDD")]
    InvalidBackup(String),

    #[error("no backups available from {0}")]
    NoBackups(String),

    #[error("file not found or not a regular file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error(
        "database already exists at {}, delete it if you want to download again",
        .0.display()
    )]
    DatabaseExists(PathBuf),

    #[error("no valid authentication method available for {0}")]
    NoAuthMethod(String),

    #[error("invalid layout file {}: {reason}", .path.display())]
    InvalidLayout { path: PathBuf, reason: String },

    // ---- network ----
    #[error("bad status from {url}: {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("unable to determine file size for {0} (no content-length)")]
    MissingContentLength(String),

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    // ---- integrity ----
    #[error("cannot derive a file name from URL: {0}")]
    NoFileName(String),

    #[error("filename mismatch: expected {expected}, got {actual}")]
    FilenameMismatch { expected: String, actual: String },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("malformed checksum file {}: expected '<hash> <filename>'", .0.display())]
    MalformedChecksum(PathBuf),

    #[error("archive contains unsafe entry: {0}")]
    UnsafeEntry(String),

    #[error("expected extracted directory {} is missing", .0.display())]
    MissingExtractedData(PathBuf),

    // ---- external commands ----
    #[error("command failed: {cmd} (exit code: {code:?})")]
    CommandFailed { cmd: String, code: Option<i32> },

    #[error("command failed: {cmd}\noutput: {output}")]
    CommandFailedWithOutput { cmd: String, output: String },

    #[error("required tool not found in PATH: {0}")]
    ToolMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = TrondError> = std::result::Result<T, E>;
