//! Configuration for a resolution run.

use std::path::PathBuf;
use std::time::Duration;

/// Default remote repository.
pub const DEFAULT_REPOSITORY_URL: &str = "https://repo1.maven.org/maven2";

/// Default cache root, relative to the project directory.
pub const DEFAULT_CACHE_DIR: &str = ".pottery/m2";

/// Default number of resolution workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default bound on how often a coordinate waits for its parent.
pub const DEFAULT_MAX_PARENT_REQUEUES: u32 = 64;

/// Configuration for the dependency resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base URL of the remote repository.
    pub repository_url: String,

    /// Root of the local artifact cache.
    pub cache_dir: PathBuf,

    /// Number of concurrent resolution workers.
    pub workers: usize,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Whether directly declared test dependencies are fetched.
    ///
    /// Off for packaging runs, on for test runs. Test dependencies never
    /// propagate transitively either way.
    pub include_test_dependencies: bool,

    /// How many times a coordinate may be requeued while its parent
    /// metadata is still being resolved.
    pub max_parent_requeues: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            workers: DEFAULT_WORKERS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            include_test_dependencies: false,
            max_parent_requeues: DEFAULT_MAX_PARENT_REQUEUES,
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration with the given cache root.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Default::default()
        }
    }

    /// Set the remote repository base URL.
    pub fn with_repository(mut self, url: impl Into<String>) -> Self {
        self.repository_url = url.into();
        self
    }

    /// Set the number of workers (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Include or exclude directly declared test dependencies.
    pub fn with_test_dependencies(mut self, include: bool) -> Self {
        self.include_test_dependencies = include;
        self
    }

    /// Set the parent requeue bound.
    pub fn with_max_parent_requeues(mut self, max: u32) -> Self {
        self.max_parent_requeues = max;
        self
    }
}
