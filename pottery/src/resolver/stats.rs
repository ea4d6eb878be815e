//! Counters for a resolution run.
//!
//! Workers bump lock-free atomic counters as they go; a [`StatsSnapshot`]
//! is a point-in-time copy for logging and display.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Shared counters for one resolution run.
#[derive(Debug, Default)]
pub struct ResolutionStats {
    metadata_downloaded: AtomicU64,
    metadata_cached: AtomicU64,
    artifacts_downloaded: AtomicU64,
    artifacts_cached: AtomicU64,
    bytes_downloaded: AtomicU64,
    failures: AtomicU64,
    requeues: AtomicU64,
    version_conflicts: AtomicU64,
}

/// Point-in-time copy of [`ResolutionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub metadata_downloaded: u64,
    pub metadata_cached: u64,
    pub artifacts_downloaded: u64,
    pub artifacts_cached: u64,
    pub bytes_downloaded: u64,
    pub failures: u64,
    pub requeues: u64,
    pub version_conflicts: u64,
}

impl ResolutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata_downloaded(&self) {
        self.metadata_downloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn metadata_cached(&self) {
        self.metadata_cached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn artifact_downloaded(&self, bytes: u64) {
        self.artifacts_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn artifact_cached(&self) {
        self.artifacts_cached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requeued(&self) {
        self.requeues.fetch_add(1, Ordering::Relaxed);
    }

    pub fn version_conflict(&self) {
        self.version_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            metadata_downloaded: self.metadata_downloaded.load(Ordering::Relaxed),
            metadata_cached: self.metadata_cached.load(Ordering::Relaxed),
            artifacts_downloaded: self.artifacts_downloaded.load(Ordering::Relaxed),
            artifacts_cached: self.artifacts_cached.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            requeues: self.requeues.load(Ordering::Relaxed),
            version_conflicts: self.version_conflicts.load(Ordering::Relaxed),
        }
    }
}
