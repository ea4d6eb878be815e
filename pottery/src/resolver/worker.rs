//! Resolution worker.
//!
//! Each worker drains the shared queue until it finds it empty:
//!
//! ```text
//! next() ──► fetch metadata ──► parent complete? ──no──► track parent, requeue
//!                                      │                  (wait while another
//!                                      │                   worker processes it)
//!                                     yes
//!                                      ▼
//!            register context ──► properties ──► default versions ──► dependencies
//!                                      │
//!                                      ▼
//!                              download artifact
//! ```
//!
//! Nothing that goes wrong for one coordinate stops the worker. A missing
//! metadata document marks a leaf; any other failure is logged and the
//! coordinate is abandoned.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::context::{context_id, ContextRegistry};
use super::coordinator::{DownloadCoordinator, ParentStatus, ResolutionState, WorkItem};
use super::error::{ResolveError, ResolveResult};
use super::http::{write_atomically, HttpClient};
use super::metadata::{DeclaredDependency, MetadataDocument, ParentRef};
use super::repository::RepositoryLayout;
use crate::coordinate::{Coordinate, Scope, DEFAULT_PACKAGING};

/// Longest wait for a parent another worker is processing before the
/// waiting item is looked at again.
const PARENT_WAIT: Duration = Duration::from_millis(250);

/// Calls [`DownloadCoordinator::finished`] when dropped, so the run
/// completes even if the worker panics.
struct FinishGuard<'a> {
    coordinator: &'a DownloadCoordinator,
    worker: usize,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!(worker = self.worker, "Resolution worker panicked");
        }
        self.coordinator.finished();
    }
}

/// Where a coordinate's metadata came from.
enum MetadataSource {
    Cache,
    Network,
}

/// One pool slot of a resolution run.
pub struct ResolutionWorker {
    id: usize,
    coordinator: Arc<DownloadCoordinator>,
    registry: Arc<ContextRegistry>,
    client: Arc<dyn HttpClient>,
    repository: RepositoryLayout,
    max_parent_requeues: u32,
}

impl ResolutionWorker {
    pub fn new(
        id: usize,
        coordinator: Arc<DownloadCoordinator>,
        registry: Arc<ContextRegistry>,
        client: Arc<dyn HttpClient>,
        repository: RepositoryLayout,
        max_parent_requeues: u32,
    ) -> Self {
        Self {
            id,
            coordinator,
            registry,
            client,
            repository,
            max_parent_requeues,
        }
    }

    /// Process queue items until the queue is observed empty.
    pub fn run(self) {
        let _guard = FinishGuard {
            coordinator: &self.coordinator,
            worker: self.id,
        };

        while let Some(item) = self.coordinator.next() {
            self.process(item);
        }

        debug!(worker = self.id, "Queue empty, worker done");
    }

    fn process(&self, mut item: WorkItem) {
        let coordinate = item.coordinate.clone();

        let document = match self.load_metadata(&coordinate) {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!(worker = self.id, coordinate = %coordinate, "No metadata, treating as leaf");
                self.register_empty_context(&coordinate);
                self.fetch_artifact(&coordinate);
                return;
            }
            Err(e) => {
                warn!(
                    worker = self.id,
                    coordinate = %coordinate,
                    error = %e,
                    "Abandoning dependency"
                );
                self.coordinator.stats().failure();
                self.register_empty_context(&coordinate);
                return;
            }
        };

        if let Some(parent) = &document.parent {
            let parent_id = context_id(&parent.group, &parent.artifact, &parent.version);
            if !self.registry.is_complete(&parent_id)
                && !self.await_parent(&mut item, parent, &parent_id)
            {
                return;
            }
        }

        self.apply_metadata(&coordinate, &document);
        self.fetch_artifact(&coordinate);

        item.state = ResolutionState::Resolved;
        debug!(worker = self.id, coordinate = %coordinate, state = ?item.state, "Processed");
    }

    /// Make sure the parent gets processed, then decide what to do with
    /// `item`. Returns true if the item should be processed without waiting
    /// any longer.
    ///
    /// Requeues only count against the bound while nothing tracked can
    /// complete the parent, so siblings waiting on a slow parent never use
    /// up their budget.
    fn await_parent(&self, item: &mut WorkItem, parent: &ParentRef, parent_id: &str) -> bool {
        let parent_coordinate = Coordinate::metadata(&parent.group, &parent.artifact, &parent.version)
            .with_scope(Scope::Runtime);
        self.coordinator.track_transitive_dependency(parent_coordinate);

        let requeues = item.requeues();
        let status = self.coordinator.parent_status(&item.coordinate, parent_id);
        let requeues = match status {
            ParentStatus::Complete => return true,
            ParentStatus::InProgress => requeues,
            ParentStatus::Stalled if requeues < self.max_parent_requeues => requeues + 1,
            ParentStatus::Stalled => {
                warn!(
                    worker = self.id,
                    coordinate = %item.coordinate,
                    parent = %parent_id,
                    requeues,
                    "Parent never resolved, continuing without it"
                );
                return true;
            }
        };

        debug!(
            worker = self.id,
            coordinate = %item.coordinate,
            parent = %parent_id,
            status = ?status,
            "Waiting for parent metadata"
        );

        item.state = ResolutionState::AwaitingParent {
            parent: parent_id.to_string(),
            requeues,
        };
        self.coordinator.requeue(item.clone());

        if status == ParentStatus::InProgress {
            self.coordinator.wait_for_parent(parent_id, PARENT_WAIT);
        }
        false
    }

    /// Fetch and parse the metadata document.
    ///
    /// `Ok(None)` means the repository has no document for the coordinate.
    fn load_metadata(&self, coordinate: &Coordinate) -> ResolveResult<Option<MetadataDocument>> {
        let (bytes, source) = match self.read_metadata(coordinate) {
            Ok(found) => found,
            Err(ResolveError::Repository(e)) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        match source {
            MetadataSource::Cache => self.coordinator.stats().metadata_cached(),
            MetadataSource::Network => self.coordinator.stats().metadata_downloaded(),
        }

        let text = String::from_utf8_lossy(&bytes);
        MetadataDocument::parse(&text)
            .map(Some)
            .map_err(|e| ResolveError::MetadataParse {
                coordinate: coordinate.to_string(),
                reason: e.to_string(),
            })
    }

    /// Read metadata from the cache, or download and cache it.
    ///
    /// Snapshot metadata is always downloaded again.
    fn read_metadata(&self, coordinate: &Coordinate) -> ResolveResult<(Vec<u8>, MetadataSource)> {
        let path = self.coordinator.layout().metadata_path(coordinate);

        if path.exists() && !coordinate.is_snapshot() {
            let bytes = fs::read(&path).map_err(|source| ResolveError::ReadFailed {
                path: path.clone(),
                source,
            })?;
            return Ok((bytes, MetadataSource::Cache));
        }

        let url = self.repository.metadata_url(coordinate);
        let bytes = self.client.get(&url)?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ResolveError::CreateDirFailed {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        write_atomically(&path, &bytes)?;

        debug!(worker = self.id, url = %url, "Fetched metadata");
        Ok((bytes, MetadataSource::Network))
    }

    fn register_empty_context(&self, coordinate: &Coordinate) {
        let version = coordinate.version().unwrap_or_default();
        let id = self
            .registry
            .register(coordinate.group(), coordinate.artifact(), version);
        self.registry.mark_complete(&id);
        self.coordinator.complete(coordinate);
    }

    /// Register the document's context and track what it declares.
    ///
    /// The context is keyed by the identity the document declares, falling
    /// back to its parent's group and version and then to the requested
    /// coordinate.
    fn apply_metadata(&self, coordinate: &Coordinate, document: &MetadataDocument) {
        let requested_version = coordinate.version().unwrap_or_default();
        let group = document.effective_group().unwrap_or(coordinate.group());
        let artifact = document.artifact.as_deref().unwrap_or(coordinate.artifact());
        let version = document.effective_version().unwrap_or(requested_version);

        let id = match &document.parent {
            Some(parent) => self.registry.register_from_parent(
                &parent.group,
                &parent.artifact,
                &parent.version,
                group,
                artifact,
                version,
            ),
            None => self.registry.register(group, artifact, version),
        };

        for (key, value) in &document.properties {
            self.registry.add_parameter(&id, key.as_str(), value.as_str());
        }

        for managed in &document.managed_dependencies {
            let (Some(group), Some(artifact), Some(managed_version)) =
                (&managed.group, &managed.artifact, &managed.version)
            else {
                continue;
            };
            let qualified_name = format!(
                "{}:{}",
                self.registry.resolve_expression(&id, group),
                self.registry.resolve_expression(&id, artifact)
            );
            self.registry
                .add_version_suggestion(&id, &qualified_name, managed_version);
        }

        for declared in &document.dependencies {
            match self.interpolate(&id, declared) {
                Some(dependency) => {
                    self.coordinator.track_transitive_dependency(dependency);
                }
                None => debug!(
                    worker = self.id,
                    coordinate = %coordinate,
                    "Skipping dependency without group or artifact"
                ),
            }
        }

        self.registry.mark_complete(&id);

        // Children refer to their parent by the coordinate that was requested.
        let requested = context_id(coordinate.group(), coordinate.artifact(), requested_version);
        if requested != id {
            debug!(
                worker = self.id,
                coordinate = %coordinate,
                declared = %id,
                "Metadata declares a different identity"
            );
            let alias = self.registry.register_from_parent(
                group,
                artifact,
                version,
                coordinate.group(),
                coordinate.artifact(),
                requested_version,
            );
            self.registry.mark_complete(&alias);
        }

        self.coordinator.complete(coordinate);
    }

    fn interpolate(&self, id: &str, declared: &DeclaredDependency) -> Option<Coordinate> {
        let resolve = |value: &String| self.registry.resolve_expression(id, value);

        let group = resolve(declared.group.as_ref()?);
        let artifact = resolve(declared.artifact.as_ref()?);
        let version = declared.version.as_ref().map(resolve);
        let scope = declared
            .scope
            .as_deref()
            .map_or(Scope::Runtime, Scope::from_token);
        let packaging = declared
            .packaging
            .as_ref()
            .map(resolve)
            .unwrap_or_else(|| DEFAULT_PACKAGING.to_string());

        Some(
            Coordinate::new(group, artifact, version)
                .with_scope(scope)
                .with_packaging(packaging)
                .with_classifier(declared.classifier.as_ref().map(resolve)),
        )
    }

    fn should_download(&self, coordinate: &Coordinate) -> bool {
        if coordinate.is_metadata_only() {
            return false;
        }
        if coordinate.is_snapshot() {
            return true;
        }
        !self.coordinator.layout().artifact_path(coordinate).exists()
    }

    fn fetch_artifact(&self, coordinate: &Coordinate) {
        if !self.should_download(coordinate) {
            if !coordinate.is_metadata_only() {
                self.coordinator.stats().artifact_cached();
            }
            return;
        }

        if let Err(e) = self.download_artifact(coordinate) {
            warn!(
                worker = self.id,
                coordinate = %coordinate,
                error = %e,
                "Artifact download failed"
            );
            self.coordinator.stats().failure();
        }
    }

    fn download_artifact(&self, coordinate: &Coordinate) -> ResolveResult<()> {
        let path = self.coordinator.layout().artifact_path(coordinate);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ResolveError::CreateDirFailed {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let url = self.repository.artifact_url(coordinate);
        let started = Instant::now();
        let bytes = self.client.download(&url, &path)?;
        self.coordinator.stats().artifact_downloaded(bytes);

        info!(
            worker = self.id,
            coordinate = %coordinate,
            reason = coordinate.scope().reason(),
            bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Downloaded"
        );
        Ok(())
    }
}
