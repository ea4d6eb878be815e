//! Resolution orchestrator.
//!
//! Entry point of a resolution run: seeds the queue with the project's
//! direct dependencies, starts the worker pool and collects the result.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use super::config::ResolverConfig;
use super::context::ContextRegistry;
use super::coordinator::{DownloadCoordinator, ResolvedArtifact, TrackOutcome};
use super::error::{ResolveError, ResolveResult};
use super::http::{HttpClient, ReqwestClient};
use super::repository::RepositoryLayout;
use super::stats::StatsSnapshot;
use super::worker::ResolutionWorker;
use crate::cache::CacheLayout;
use crate::coordinate::DirectDependency;

/// Result of a resolution run.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// One winning coordinate per qualified name, with its cache path.
    pub artifacts: Vec<ResolvedArtifact>,
    pub stats: StatsSnapshot,
}

/// Resolves a project's dependency graph into the local cache.
///
/// Every call to [`DependencyResolver::resolve`] is an independent run
/// with fresh queue, version index and contexts.
pub struct DependencyResolver {
    config: ResolverConfig,
    client: Arc<dyn HttpClient>,
}

impl DependencyResolver {
    pub fn new(config: ResolverConfig, client: Arc<dyn HttpClient>) -> Self {
        Self { config, client }
    }

    /// Create a resolver talking HTTP through reqwest.
    pub fn with_reqwest(config: ResolverConfig) -> ResolveResult<Self> {
        let client = ReqwestClient::with_timeout(config.timeout)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `dependencies` and everything they pull in.
    ///
    /// Blocks until every worker has drained the queue. Failures on single
    /// coordinates are logged and counted in the returned stats; only
    /// malformed input or failing to start workers is an error.
    pub fn resolve(&self, dependencies: &[DirectDependency]) -> ResolveResult<Resolution> {
        let coordinates = dependencies
            .iter()
            .map(DirectDependency::to_coordinate)
            .collect::<ResolveResult<Vec<_>>>()?;

        let started = Instant::now();
        let workers = self.config.workers.max(1);
        let registry = Arc::new(ContextRegistry::new());
        let coordinator = Arc::new(DownloadCoordinator::new(
            Arc::clone(&registry),
            CacheLayout::new(&self.config.cache_dir),
            workers,
            self.config.include_test_dependencies,
        ));

        let queued = coordinates
            .into_iter()
            .map(|c| coordinator.track_dependency(c))
            .filter(|outcome| *outcome == TrackOutcome::Queued)
            .count();

        info!(
            direct = dependencies.len(),
            queued,
            workers,
            repository = %self.config.repository_url,
            cache = %self.config.cache_dir.display(),
            "Resolving dependencies"
        );

        let repository = RepositoryLayout::new(&self.config.repository_url);
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let worker = ResolutionWorker::new(
                id,
                Arc::clone(&coordinator),
                Arc::clone(&registry),
                Arc::clone(&self.client),
                repository.clone(),
                self.config.max_parent_requeues,
            );

            let spawned = thread::Builder::new()
                .name(format!("dependency-worker-{}", id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Workers never started still count towards the barrier.
                    for _ in id..workers {
                        coordinator.finished();
                    }
                    join_all(handles);
                    return Err(ResolveError::WorkerSpawn(e));
                }
            }
        }

        let artifacts = coordinator.resolved_artifacts();
        join_all(handles);

        let stats = coordinator.stats().snapshot();
        info!(
            artifacts = artifacts.len(),
            metadata_downloaded = stats.metadata_downloaded,
            metadata_cached = stats.metadata_cached,
            downloaded = stats.artifacts_downloaded,
            cached = stats.artifacts_cached,
            failures = stats.failures,
            conflicts = stats.version_conflicts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Resolution complete"
        );

        Ok(Resolution { artifacts, stats })
    }
}

fn join_all(handles: Vec<thread::JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            error!("Resolution worker terminated abnormally");
        }
    }
}
