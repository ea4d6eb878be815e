//! Download coordinator.
//!
//! The coordinator owns everything workers share besides the context
//! registry: the work queue, the version index (`group:artifact` → every
//! version seen), and the completion barrier. Workers never touch these
//! maps directly; every mutation goes through one of the methods below.
//!
//! # Enqueue routine
//!
//! ```text
//! track_dependency ──────────┐ (drop TEST unless tests are included)
//!                            ├──► fill version from defaults ──► dedupe ──► queue
//! track_transitive_dependency┘ (always drop TEST)
//! ```
//!
//! The whole routine runs under the index lock, so checking for a
//! `(qualified name, version)` pair and recording it is a single step.
//!
//! # Parent tracking
//!
//! Besides the queue itself the coordinator knows what every tracked
//! coordinate is doing: queued, being processed, or waiting for a parent.
//! [`DownloadCoordinator::parent_status`] walks that chain to tell a
//! worker whether a missing parent can still be completed by someone.
//! Only when it cannot is a requeue counted against the bound.
//!
//! # Completion
//!
//! Each worker calls [`DownloadCoordinator::finished`] once when it sees the
//! queue empty. [`DownloadCoordinator::resolved_artifacts`] blocks until all
//! expected workers have done so, then reduces every qualified name's
//! versions to a single winner.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{debug, warn};

use super::context::{context_id, ContextRegistry, MAX_CONTEXT_DEPTH};
use super::stats::ResolutionStats;
use crate::cache::CacheLayout;
use crate::coordinate::{Coordinate, Scope};

/// Where a queued coordinate stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    /// Not processed yet.
    Pending,
    /// Its metadata declares a parent whose context is not complete yet.
    /// `requeues` only counts requeues while nothing could complete the parent.
    AwaitingParent { parent: String, requeues: u32 },
    /// Metadata processed and artifact handled.
    Resolved,
}

/// One entry of the work queue.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub coordinate: Coordinate,
    pub state: ResolutionState,
}

impl WorkItem {
    fn pending(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            state: ResolutionState::Pending,
        }
    }

    /// Requeues counted against the parent bound so far.
    pub fn requeues(&self) -> u32 {
        match self.state {
            ResolutionState::AwaitingParent { requeues, .. } => requeues,
            _ => 0,
        }
    }
}

/// What happened to a tracked dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Recorded and pushed onto the queue.
    Queued,
    /// The same `group:artifact:version` was recorded before.
    AlreadyTracked,
    /// No version and no default version suggestion.
    Unversioned,
    /// Scope excluded from this run.
    Excluded,
}

/// Whether a parent context is complete or can still become complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentStatus {
    Complete,
    /// The parent, or an ancestor it waits on, is queued or being processed.
    InProgress,
    /// Nothing tracked can complete the parent: it is unknown, already
    /// processed under another identity, or part of a parent cycle.
    Stalled,
}

/// What a tracked coordinate is currently doing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Activity {
    Queued,
    Processing,
    AwaitingParent(String),
}

#[derive(Debug, Default)]
struct WorkQueue {
    items: VecDeque<WorkItem>,
    /// Keyed by context id; removed once the coordinate is done.
    active: HashMap<String, Activity>,
}

fn activity_key(coordinate: &Coordinate) -> String {
    context_id(
        coordinate.group(),
        coordinate.artifact(),
        coordinate.version().unwrap_or_default(),
    )
}

/// A winning coordinate and its location in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifact {
    pub coordinate: Coordinate,
    pub path: PathBuf,
}

/// Shared state of one resolution run.
#[derive(Debug)]
pub struct DownloadCoordinator {
    queue: Mutex<WorkQueue>,
    /// Signalled whenever a coordinate is done or goes back on the queue.
    progress: Condvar,
    index: Mutex<BTreeMap<String, Vec<Coordinate>>>,
    registry: Arc<ContextRegistry>,
    layout: CacheLayout,
    stats: ResolutionStats,
    include_test_dependencies: bool,
    expected_workers: usize,
    finished_workers: Mutex<usize>,
    all_finished: Condvar,
}

impl DownloadCoordinator {
    pub fn new(
        registry: Arc<ContextRegistry>,
        layout: CacheLayout,
        expected_workers: usize,
        include_test_dependencies: bool,
    ) -> Self {
        Self {
            queue: Mutex::new(WorkQueue::default()),
            progress: Condvar::new(),
            index: Mutex::new(BTreeMap::new()),
            registry,
            layout,
            stats: ResolutionStats::new(),
            include_test_dependencies,
            expected_workers,
            finished_workers: Mutex::new(0),
            all_finished: Condvar::new(),
        }
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    /// Track a dependency declared directly by the project.
    pub fn track_dependency(&self, dependency: Coordinate) -> TrackOutcome {
        if dependency.scope() == Scope::Test && !self.include_test_dependencies {
            debug!(dependency = %dependency, "Skipping test dependency");
            return TrackOutcome::Excluded;
        }

        self.enqueue(dependency)
    }

    /// Track a dependency found in another artifact's metadata.
    ///
    /// Test dependencies never propagate to dependents.
    pub fn track_transitive_dependency(&self, dependency: Coordinate) -> TrackOutcome {
        if !dependency.scope().propagates() {
            return TrackOutcome::Excluded;
        }

        self.enqueue(dependency)
    }

    fn enqueue(&self, dependency: Coordinate) -> TrackOutcome {
        let qualified_name = dependency.qualified_name();
        let mut index = self.index.lock();

        let dependency = if dependency.is_not_versioned() {
            let default = self.registry.resolve_default_version(&qualified_name);
            dependency.with_version_if_unspecified(default.as_deref())
        } else {
            dependency
        };

        if dependency.is_not_versioned() {
            debug!(dependency = %qualified_name, "No version available, dropping");
            return TrackOutcome::Unversioned;
        }

        let dependency = dependency.pinned();
        let versions = index.entry(qualified_name).or_default();

        if versions.iter().any(|v| v.version() == dependency.version()) {
            return TrackOutcome::AlreadyTracked;
        }

        if !versions.is_empty() {
            self.stats.version_conflict();
            warn!(
                dependency = %dependency.qualified_name(),
                seen = ?versions.iter().filter_map(Coordinate::version).collect::<Vec<_>>(),
                adding = dependency.version().unwrap_or_default(),
                "Using multiple versions"
            );
        }

        versions.push(dependency.clone());
        debug!(dependency = %dependency, scope = %dependency.scope(), "Queued");
        let mut queue = self.queue.lock();
        queue.active.insert(activity_key(&dependency), Activity::Queued);
        queue.items.push_back(WorkItem::pending(dependency));

        TrackOutcome::Queued
    }

    /// Take the next item off the queue without blocking.
    pub fn next(&self) -> Option<WorkItem> {
        let mut queue = self.queue.lock();
        let item = queue.items.pop_front()?;
        queue
            .active
            .insert(activity_key(&item.coordinate), Activity::Processing);
        Some(item)
    }

    /// Put an item waiting for its parent back at the end of the queue.
    ///
    /// This bypasses deduplication: the coordinate is already recorded.
    pub fn requeue(&self, item: WorkItem) {
        self.stats.requeued();
        debug!(dependency = %item.coordinate, requeues = item.requeues(), "Requeued");

        let activity = match &item.state {
            ResolutionState::AwaitingParent { parent, .. } => Activity::AwaitingParent(parent.clone()),
            _ => Activity::Queued,
        };
        let mut queue = self.queue.lock();
        queue.active.insert(activity_key(&item.coordinate), activity);
        queue.items.push_back(item);
        self.progress.notify_all();
    }

    /// Record that a dequeued coordinate's context is complete.
    pub fn complete(&self, coordinate: &Coordinate) {
        let mut queue = self.queue.lock();
        queue.active.remove(&activity_key(coordinate));
        self.progress.notify_all();
    }

    /// Mark `waiting` as awaiting `parent_id` and report whether that
    /// parent can still be completed.
    ///
    /// The parent chain is followed through coordinates that are themselves
    /// awaiting a parent; a chain that does not end in a queued or
    /// processing coordinate within [`MAX_CONTEXT_DEPTH`] steps is stalled.
    pub fn parent_status(&self, waiting: &Coordinate, parent_id: &str) -> ParentStatus {
        let mut queue = self.queue.lock();
        let key = activity_key(waiting);

        if self.registry.is_complete(parent_id) {
            queue.active.insert(key, Activity::Processing);
            return ParentStatus::Complete;
        }
        queue
            .active
            .insert(key, Activity::AwaitingParent(parent_id.to_string()));

        let mut current = parent_id.to_string();
        for _ in 0..MAX_CONTEXT_DEPTH {
            if self.registry.is_complete(&current) {
                return ParentStatus::InProgress;
            }
            match queue.active.get(&current) {
                Some(Activity::Queued | Activity::Processing) => return ParentStatus::InProgress,
                Some(Activity::AwaitingParent(next)) => current = next.clone(),
                None => return ParentStatus::Stalled,
            }
        }

        ParentStatus::Stalled
    }

    /// Block while `parent_id` is being processed by another worker, for at
    /// most `timeout`.
    pub fn wait_for_parent(&self, parent_id: &str, timeout: Duration) {
        let mut queue = self.queue.lock();
        let processing = queue.active.get(parent_id) == Some(&Activity::Processing);
        if processing && !self.registry.is_complete(parent_id) {
            self.progress.wait_for(&mut queue, timeout);
        }
    }

    /// Number of items currently queued.
    pub fn pending(&self) -> usize {
        self.queue.lock().items.len()
    }

    /// Called once by each worker after it observed an empty queue.
    pub fn finished(&self) {
        let mut finished = self.finished_workers.lock();
        *finished += 1;
        debug!(finished = *finished, expected = self.expected_workers, "Worker finished");
        self.all_finished.notify_all();
    }

    /// Block until every expected worker has called [`Self::finished`].
    pub fn wait_for_workers(&self) {
        let mut finished = self.finished_workers.lock();
        while *finished < self.expected_workers {
            self.all_finished.wait(&mut finished);
        }
    }

    /// Wait for all workers, then reduce the version index to one winner
    /// per qualified name and map each to its cache path.
    ///
    /// Versions are folded in the order they were first seen; metadata-only
    /// winners are left out since they have nothing to put on a classpath.
    pub fn resolved_artifacts(&self) -> Vec<ResolvedArtifact> {
        self.wait_for_workers();

        let index = self.index.lock();
        index
            .values()
            .filter_map(|versions| {
                let (first, rest) = versions.split_first()?;
                let winner = rest.iter().fold(first, |best, candidate| {
                    if !best.is_compatible_with(candidate) {
                        warn!(
                            kept = %best,
                            ignored = %candidate,
                            "Incompatible versions, keeping first seen"
                        );
                    }
                    best.max(candidate)
                });
                Some(winner)
            })
            .filter(|winner| !winner.is_metadata_only())
            .map(|winner| ResolvedArtifact {
                coordinate: winner.clone(),
                path: self.layout.artifact_path(winner),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn coordinator(include_tests: bool) -> DownloadCoordinator {
        DownloadCoordinator::new(
            Arc::new(ContextRegistry::new()),
            CacheLayout::new("/cache"),
            1,
            include_tests,
        )
    }

    fn dep(artifact: &str, version: Option<&str>) -> Coordinate {
        Coordinate::new("io.example", artifact, version)
    }

    #[test]
    fn test_track_queues_once() {
        let c = coordinator(false);
        assert_eq!(c.track_dependency(dep("lib", Some("1.0.0"))), TrackOutcome::Queued);
        assert_eq!(
            c.track_transitive_dependency(dep("lib", Some("1.0.0"))),
            TrackOutcome::AlreadyTracked
        );
        assert_eq!(c.pending(), 1);
    }

    #[test]
    fn test_direct_test_dependency_respects_flag() {
        let excluded = coordinator(false);
        let test_dep = dep("junit", Some("4.13.2")).with_scope(Scope::Test);
        assert_eq!(excluded.track_dependency(test_dep.clone()), TrackOutcome::Excluded);

        let included = coordinator(true);
        assert_eq!(included.track_dependency(test_dep), TrackOutcome::Queued);
    }

    #[test]
    fn test_transitive_test_dependency_never_propagates() {
        let c = coordinator(true);
        let test_dep = dep("junit", Some("4.13.2")).with_scope(Scope::Test);
        assert_eq!(c.track_transitive_dependency(test_dep), TrackOutcome::Excluded);
        assert_eq!(c.pending(), 0);
    }

    #[test]
    fn test_unversioned_filled_from_defaults() {
        let registry = Arc::new(ContextRegistry::new());
        let id = registry.register("io.example", "bom", "1.0.0");
        registry.add_version_suggestion(&id, "io.example:lib", "3.1.0");

        let c = DownloadCoordinator::new(registry, CacheLayout::new("/cache"), 1, false);
        assert_eq!(c.track_dependency(dep("lib", None)), TrackOutcome::Queued);
        assert_eq!(c.next().unwrap().coordinate.version(), Some("3.1.0"));
    }

    #[test]
    fn test_unversioned_without_default_is_dropped() {
        let c = coordinator(false);
        assert_eq!(c.track_dependency(dep("lib", None)), TrackOutcome::Unversioned);
        assert!(c.next().is_none());
    }

    #[test]
    fn test_range_is_pinned_on_enqueue() {
        let c = coordinator(false);
        c.track_dependency(dep("lib", Some("[1,2)")));
        assert_eq!(
            c.track_dependency(dep("lib", Some("2"))),
            TrackOutcome::AlreadyTracked
        );
        assert_eq!(c.next().unwrap().coordinate.version(), Some("2"));
    }

    #[test]
    fn test_second_version_counts_as_conflict() {
        let c = coordinator(false);
        c.track_dependency(dep("lib", Some("1.0.0")));
        c.track_transitive_dependency(dep("lib", Some("1.0.1")));
        assert_eq!(c.pending(), 2);
        assert_eq!(c.stats().snapshot().version_conflicts, 1);
    }

    #[test]
    fn test_requeue_keeps_state() {
        let c = coordinator(false);
        c.track_dependency(dep("lib", Some("1.0.0")));
        let mut item = c.next().unwrap();
        item.state = ResolutionState::AwaitingParent {
            parent: "io.example:parent:1".to_string(),
            requeues: 1,
        };
        c.requeue(item);

        let again = c.next().unwrap();
        assert_eq!(again.requeues(), 1);
        assert_eq!(c.stats().snapshot().requeues, 1);
    }

    #[test]
    fn test_parent_status_follows_queue() {
        let registry = Arc::new(ContextRegistry::new());
        let c = DownloadCoordinator::new(Arc::clone(&registry), CacheLayout::new("/cache"), 2, false);
        let parent = Coordinate::metadata("io.example", "parent-pom", "1.0.0");
        let parent_id = "io.example:parent-pom:1.0.0";

        c.track_dependency(dep("a", Some("1.0.0")));
        let child = c.next().unwrap().coordinate;
        assert_eq!(c.parent_status(&child, parent_id), ParentStatus::Stalled);

        c.track_transitive_dependency(parent.clone());
        assert_eq!(c.parent_status(&child, parent_id), ParentStatus::InProgress);

        let in_flight = c.next().unwrap();
        assert_eq!(in_flight.coordinate, parent);
        assert_eq!(c.parent_status(&child, parent_id), ParentStatus::InProgress);

        let id = registry.register("io.example", "parent-pom", "1.0.0");
        registry.mark_complete(&id);
        c.complete(&parent);
        assert_eq!(c.parent_status(&child, parent_id), ParentStatus::Complete);
    }

    #[test]
    fn test_sibling_waits_on_parent_do_not_stall() {
        let c = coordinator(false);
        c.track_transitive_dependency(Coordinate::metadata("io.example", "parent-pom", "1.0.0"));
        c.track_dependency(dep("a", Some("1.0.0")));
        c.track_dependency(dep("b", Some("1.0.0")));

        let _parent = c.next().unwrap();
        let a = c.next().unwrap().coordinate;
        let b = c.next().unwrap().coordinate;

        assert_eq!(c.parent_status(&a, "io.example:parent-pom:1.0.0"), ParentStatus::InProgress);
        assert_eq!(c.parent_status(&b, "io.example:parent-pom:1.0.0"), ParentStatus::InProgress);
    }

    #[test]
    fn test_parent_cycle_is_stalled() {
        let c = coordinator(false);
        c.track_dependency(dep("a", Some("1.0.0")));
        c.track_dependency(dep("b", Some("1.0.0")));
        let a = c.next().unwrap().coordinate;
        let b = c.next().unwrap().coordinate;

        // a waits on b while b is still processing.
        assert_eq!(c.parent_status(&a, "io.example:b:1.0.0"), ParentStatus::InProgress);
        assert_eq!(c.parent_status(&b, "io.example:a:1.0.0"), ParentStatus::Stalled);
        assert_eq!(c.parent_status(&a, "io.example:b:1.0.0"), ParentStatus::Stalled);
    }

    #[test]
    fn test_wait_for_parent_wakes_on_complete() {
        let registry = Arc::new(ContextRegistry::new());
        let c = Arc::new(DownloadCoordinator::new(
            Arc::clone(&registry),
            CacheLayout::new("/cache"),
            2,
            false,
        ));
        let parent = Coordinate::metadata("io.example", "parent-pom", "1.0.0");
        c.track_dependency(parent.clone());
        c.next().unwrap();

        let completer = {
            let c = Arc::clone(&c);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                let id = registry.register("io.example", "parent-pom", "1.0.0");
                registry.mark_complete(&id);
                c.complete(&parent);
            })
        };

        let started = std::time::Instant::now();
        c.wait_for_parent("io.example:parent-pom:1.0.0", Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(5));
        completer.join().unwrap();
    }

    #[test]
    fn test_wait_for_parent_returns_when_not_processing() {
        let c = coordinator(false);
        let started = std::time::Instant::now();
        c.wait_for_parent("io.example:parent-pom:1.0.0", Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_resolved_artifacts_picks_highest_patch() {
        let c = coordinator(false);
        c.track_dependency(dep("lib", Some("1.2.3")));
        c.track_transitive_dependency(dep("lib", Some("1.2.7")));
        c.track_transitive_dependency(dep("lib", Some("1.2.5")));
        c.finished();

        let resolved = c.resolved_artifacts();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].coordinate.version(), Some("1.2.7"));
        assert_eq!(
            resolved[0].path,
            PathBuf::from("/cache/io/example/lib/1.2.7/lib-1.2.7.jar")
        );
    }

    #[test]
    fn test_resolved_artifacts_keeps_first_seen_when_incompatible() {
        let c = coordinator(false);
        c.track_dependency(dep("lib", Some("1.0.0")));
        c.track_transitive_dependency(dep("lib", Some("2.0.0")));
        c.finished();

        let resolved = c.resolved_artifacts();
        assert_eq!(resolved[0].coordinate.version(), Some("1.0.0"));
    }

    #[test]
    fn test_resolved_artifacts_skips_metadata_only() {
        let c = coordinator(false);
        c.track_transitive_dependency(Coordinate::metadata("io.example", "parent-pom", "1.0.0"));
        c.track_dependency(dep("lib", Some("1.0.0")));
        c.finished();

        let resolved = c.resolved_artifacts();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].coordinate.artifact(), "lib");
    }

    #[test]
    fn test_resolved_artifacts_waits_for_all_workers() {
        let c = Arc::new(DownloadCoordinator::new(
            Arc::new(ContextRegistry::new()),
            CacheLayout::new("/cache"),
            3,
            false,
        ));
        c.track_dependency(dep("lib", Some("1.0.0")));

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(10 * i));
                    c.finished();
                })
            })
            .collect();

        let resolved = c.resolved_artifacts();
        assert_eq!(resolved.len(), 1);

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
