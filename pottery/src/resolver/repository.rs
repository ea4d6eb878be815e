//! Remote repository URL layout.

use crate::cache::METADATA_EXTENSION;
use crate::coordinate::Coordinate;

/// Builds metadata and artifact URLs under a repository base URL.
///
/// ```text
/// {base}/{group with slashes}/{artifact}/{version}/{artifact}-{version}.pom
/// {base}/{group with slashes}/{artifact}/{version}/{artifact}-{version}[-{classifier}].{packaging}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    base_url: String,
}

impl RepositoryLayout {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn metadata_url(&self, coordinate: &Coordinate) -> String {
        let version = coordinate.decided_version().unwrap_or_default();
        format!(
            "{}/{}-{}.{}",
            self.version_url(coordinate),
            coordinate.artifact(),
            version,
            METADATA_EXTENSION
        )
    }

    pub fn artifact_url(&self, coordinate: &Coordinate) -> String {
        format!(
            "{}/{}",
            self.version_url(coordinate),
            coordinate.file_name(coordinate.packaging())
        )
    }

    fn version_url(&self, coordinate: &Coordinate) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            coordinate.group().replace('.', "/"),
            coordinate.artifact(),
            coordinate.decided_version().unwrap_or_default()
        )
    }
}
