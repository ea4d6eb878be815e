//! Concurrent dependency resolution.
//!
//! This module turns a project's direct dependencies into a flat list of
//! artifacts in the local cache, including:
//! - Repository access behind a trait (`http`) and its URL layout (`repository`)
//! - Metadata document parsing (`metadata`)
//! - Property contexts and default versions (`context`)
//! - The shared queue and version index (`coordinator`)
//! - Pool workers (`worker`) and the run entry point (`orchestrator`)
//!
//! # Architecture
//!
//! ```text
//! DependencyResolver (orchestrator)
//!         │
//!         ├── DownloadCoordinator (queue, version index, completion barrier)
//!         │
//!         ├── ContextRegistry (properties, parent chains, default versions)
//!         │
//!         └── ResolutionWorker × N
//!                 ├── HttpClient (trait)
//!                 │       └── ReqwestClient
//!                 └── MetadataDocument
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pottery::coordinate::DirectDependency;
//! use pottery::resolver::{DependencyResolver, ResolverConfig};
//!
//! let resolver = DependencyResolver::with_reqwest(ResolverConfig::new(".pottery/m2"))?;
//! let resolution = resolver.resolve(&[DirectDependency::production("io.example:lib:1.0.0")])?;
//!
//! for artifact in &resolution.artifacts {
//!     println!("{} -> {}", artifact.coordinate, artifact.path.display());
//! }
//! ```

mod config;
mod context;
mod coordinator;
mod error;
mod http;
mod metadata;
mod orchestrator;
mod repository;
mod stats;
mod worker;

pub use config::{
    ResolverConfig, DEFAULT_CACHE_DIR, DEFAULT_MAX_PARENT_REQUEUES, DEFAULT_REPOSITORY_URL,
    DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS,
};
pub use context::{context_id, ContextRegistry, MAX_CONTEXT_DEPTH, MAX_INTERPOLATION_PASSES};
pub use coordinator::{
    DownloadCoordinator, ParentStatus, ResolutionState, ResolvedArtifact, TrackOutcome, WorkItem,
};
pub use error::{RepositoryError, ResolveError, ResolveResult};
pub use http::{HttpClient, ReqwestClient};
pub use metadata::{DeclaredDependency, MetadataDocument, ParentRef};
pub use orchestrator::{DependencyResolver, Resolution};
pub use repository::RepositoryLayout;
pub use stats::{ResolutionStats, StatsSnapshot};
pub use worker::ResolutionWorker;
