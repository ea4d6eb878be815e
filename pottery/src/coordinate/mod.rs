//! Dependency coordinates.
//!
//! A [`Coordinate`] identifies one artifact in a remote repository
//! (`group:artifact:version`) together with the packaging, scope and
//! classifier needed to fetch and classify it. Coordinates are immutable
//! values: every transformation returns a new one.
//!
//! # Version comparison
//!
//! Conflict resolution is deliberately simple. Two coordinates are
//! *compatible* when their versions are textually equal or share the same
//! `major.minor` line; among compatible coordinates the higher patch wins.
//! Incompatible coordinates are never merged: [`Coordinate::max`] keeps the
//! receiver.

mod direct;
mod version;

pub use direct::{DeclaredScope, DirectDependency};
pub use version::{decide, is_range, VersionParts, SNAPSHOT_SUFFIX};

use std::fmt;

use serde::Serialize;

/// Packaging type used when none is declared.
pub const DEFAULT_PACKAGING: &str = "jar";

/// Packaging type of metadata-only artifacts (parents, bills of materials).
pub const METADATA_PACKAGING: &str = "pom";

/// Propagation and inclusion class of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Compile,
    Runtime,
    Provided,
    Import,
    Test,
}

impl Scope {
    /// Map a metadata `<scope>` token to a scope.
    ///
    /// Matching is case-insensitive. `system` is treated as `provided`;
    /// unknown tokens fall back to `runtime`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "compile" => Scope::Compile,
            "runtime" => Scope::Runtime,
            "provided" | "system" => Scope::Provided,
            "import" => Scope::Import,
            "test" => Scope::Test,
            other => {
                tracing::debug!(token = other, "Unknown dependency scope, using runtime");
                Scope::Runtime
            }
        }
    }

    /// Whether a dependency in this scope is passed on to dependents.
    pub fn propagates(&self) -> bool {
        !matches!(self, Scope::Test)
    }

    /// Why an artifact in this scope is being fetched, for log output.
    pub fn reason(&self) -> &'static str {
        match self {
            Scope::Compile | Scope::Runtime => "packaging",
            Scope::Provided | Scope::Import => "provided",
            Scope::Test => "testing",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Provided => "provided",
            Scope::Import => "import",
            Scope::Test => "test",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One artifact coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    group: String,
    artifact: String,
    version: Option<String>,
    packaging: String,
    scope: Scope,
    classifier: Option<String>,
}

impl Coordinate {
    /// Create a compile-scoped `jar` coordinate.
    ///
    /// A blank version is stored as unspecified.
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: Option<impl Into<String>>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: normalize(version.map(Into::into)),
            packaging: DEFAULT_PACKAGING.to_string(),
            scope: Scope::Compile,
            classifier: None,
        }
    }

    /// Create a metadata-only coordinate, as used for parent documents.
    pub fn metadata(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::new(group, artifact, Some(version)).with_packaging(METADATA_PACKAGING)
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_packaging(mut self, packaging: impl Into<String>) -> Self {
        self.packaging = packaging.into();
        self
    }

    pub fn with_classifier(mut self, classifier: Option<impl Into<String>>) -> Self {
        self.classifier = normalize(classifier.map(Into::into));
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn packaging(&self) -> &str {
        &self.packaging
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// `group:artifact`, the key used for deduplication and conflicts.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Returns a copy carrying `version` if this coordinate has none.
    pub fn with_version_if_unspecified(&self, version: Option<&str>) -> Self {
        match version {
            Some(v) if self.is_not_versioned() && !v.trim().is_empty() => Self {
                version: Some(v.to_string()),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// The version to fetch: a range's upper bound, otherwise the version.
    pub fn decided_version(&self) -> Option<&str> {
        self.version.as_deref().map(decide)
    }

    /// Returns a copy whose version is replaced by [`Self::decided_version`].
    pub fn pinned(&self) -> Self {
        Self {
            version: self.decided_version().map(str::to_string),
            ..self.clone()
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.version
            .as_deref()
            .is_some_and(|v| v.ends_with(SNAPSHOT_SUFFIX))
    }

    pub fn is_not_versioned(&self) -> bool {
        self.version.as_deref().map_or(true, |v| v.trim().is_empty())
    }

    /// Metadata-only artifacts have no binary to download.
    pub fn is_metadata_only(&self) -> bool {
        self.packaging == METADATA_PACKAGING
    }

    /// True if the versions are textually equal or on the same
    /// `major.minor` line.
    pub fn is_compatible_with(&self, other: &Coordinate) -> bool {
        if self.version == other.version {
            return true;
        }

        match (self.version_parts(), other.version_parts()) {
            (Some(a), Some(b)) => a.same_line(&b),
            _ => false,
        }
    }

    /// Pick the newer of two compatible coordinates.
    ///
    /// Incompatible coordinates are not comparable; the receiver is kept so
    /// that reducing a list keeps the first-seen version. Callers must not
    /// read this as a real resolution across major versions.
    pub fn max<'a>(&'a self, other: &'a Coordinate) -> &'a Coordinate {
        if !self.is_compatible_with(other) {
            return self;
        }

        match (self.version_parts(), other.version_parts()) {
            (Some(a), Some(b)) if a.patch > b.patch => self,
            (Some(_), Some(_)) => other,
            _ => self,
        }
    }

    /// `<artifact>-<version>[-<classifier>].<extension>`
    pub fn file_name(&self, extension: &str) -> String {
        let version = self.decided_version().unwrap_or_default();
        match &self.classifier {
            Some(classifier) => {
                format!("{}-{}-{}.{}", self.artifact, version, classifier, extension)
            }
            None => format!("{}-{}.{}", self.artifact, version, extension),
        }
    }

    fn version_parts(&self) -> Option<VersionParts> {
        self.version.as_deref().and_then(VersionParts::parse)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group,
            self.artifact,
            self.version.as_deref().unwrap_or("?")
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
