//! Pottery - dependency resolution for JVM projects
//!
//! This library resolves a project's declared dependencies against a
//! Maven-layout repository, downloads the winning artifacts into a local
//! cache and reports where each one lives.

pub mod cache;
pub mod config;
pub mod coordinate;
pub mod logging;
pub mod resolver;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
