//! Error types for dependency resolution.
//!
//! Apart from configuration mistakes, none of these abort a resolution run.
//! Workers log them and give up on the single coordinate involved.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors talking to the remote repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The repository has no document at this URL (HTTP 404).
    #[error("not found: {url}")]
    NotFound { url: String },

    /// Request failed before a response was received.
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// Server answered with a non-success status other than 404.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Network timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// Writing a downloaded body to disk failed.
    #[error("failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Errors that can occur while resolving a single coordinate or setting up
/// a resolution run.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Failed to read a cached file.
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a cached file.
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a cache directory.
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Metadata document is not well-formed.
    #[error("failed to parse metadata of {coordinate}: {reason}")]
    MetadataParse { coordinate: String, reason: String },

    /// Dependency string is not `group:artifact[:version]`.
    #[error("invalid dependency coordinate '{0}', expected group:artifact[:version]")]
    InvalidCoordinate(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker thread could not be started.
    #[error("failed to spawn resolution worker: {0}")]
    WorkerSpawn(io::Error),
}
