//! HTTP client abstraction for repository access.
//!
//! Workers only see the [`HttpClient`] trait, which keeps them testable with
//! an in-memory repository. [`ReqwestClient`] is the real implementation.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;

use super::error::RepositoryError;

/// Buffer size for streaming binaries to disk (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Suffix of a download that has not finished yet.
const PARTIAL_SUFFIX: &str = "part";

/// Trait for HTTP operations against the repository.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the body.
    ///
    /// A 404 must be reported as [`RepositoryError::NotFound`].
    fn get(&self, url: &str) -> Result<Vec<u8>, RepositoryError>;

    /// Downloads `url` to `dest`, returning the number of bytes written.
    ///
    /// The parent directory of `dest` must exist. The default implementation
    /// buffers the whole body; implementations may stream instead.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, RepositoryError> {
        let body = self.get(url)?;
        write_atomically(dest, &body)?;
        Ok(body.len() as u64)
    }
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug)]
pub struct ReqwestClient {
    client: Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new client with the given request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, RepositoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pottery/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepositoryError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn send(&self, url: &str) -> Result<Response, RepositoryError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                RepositoryError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                RepositoryError::Http {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RepositoryError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RepositoryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, RepositoryError> {
        self.send(url)?
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| RepositoryError::Http {
                url: url.to_string(),
                reason: format!("failed to read response: {}", e),
            })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, RepositoryError> {
        let mut response = self.send(url)?;

        let partial = partial_path(dest);
        let file = File::create(&partial).map_err(|e| io_error(&partial, e))?;
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| RepositoryError::Http {
                    url: url.to_string(),
                    reason: format!("read error: {}", e),
                })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| io_error(&partial, e))?;
            downloaded += bytes_read as u64;
        }

        writer.flush().map_err(|e| io_error(&partial, e))?;
        drop(writer);
        fs::rename(&partial, dest).map_err(|e| io_error(dest, e))?;

        Ok(downloaded)
    }
}

/// Write `contents` next to `dest` and move it into place.
pub(crate) fn write_atomically(dest: &Path, contents: &[u8]) -> Result<(), RepositoryError> {
    let partial = partial_path(dest);
    fs::write(&partial, contents).map_err(|e| io_error(&partial, e))?;
    fs::rename(&partial, dest).map_err(|e| io_error(dest, e))
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> RepositoryError {
    RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}
