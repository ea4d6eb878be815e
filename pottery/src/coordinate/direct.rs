//! Dependencies declared directly by a project.

use std::str::FromStr;

use super::{Coordinate, Scope};
use crate::resolver::ResolveError;

/// Scope as written in a project descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredScope {
    /// Needed to build and run the project.
    Production,
    /// Only needed to run the project's tests.
    Test,
}

impl DeclaredScope {
    pub fn to_scope(self) -> Scope {
        match self {
            DeclaredScope::Production => Scope::Compile,
            DeclaredScope::Test => Scope::Test,
        }
    }
}

/// A `(scope, group:artifact[:version])` pair from the project descriptor.
///
/// Expressions in the qualified name are expected to be resolved already.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDependency {
    pub scope: DeclaredScope,
    pub qualified_name: String,
}

impl DirectDependency {
    pub fn production(qualified_name: impl Into<String>) -> Self {
        Self {
            scope: DeclaredScope::Production,
            qualified_name: qualified_name.into(),
        }
    }

    pub fn test(qualified_name: impl Into<String>) -> Self {
        Self {
            scope: DeclaredScope::Test,
            qualified_name: qualified_name.into(),
        }
    }

    /// Convert to a `jar` coordinate.
    ///
    /// The version segment is optional; an unversioned dependency is filled
    /// from the default version table when it is tracked.
    pub fn to_coordinate(&self) -> Result<Coordinate, ResolveError> {
        let parts: Vec<&str> = self.qualified_name.trim().split(':').collect();
        let (group, artifact, version) = match parts.as_slice() {
            [group, artifact] => (*group, *artifact, None),
            [group, artifact, version] => (*group, *artifact, Some(*version)),
            _ => return Err(ResolveError::InvalidCoordinate(self.qualified_name.clone())),
        };

        if group.is_empty() || artifact.is_empty() {
            return Err(ResolveError::InvalidCoordinate(self.qualified_name.clone()));
        }

        Ok(Coordinate::new(group, artifact, version).with_scope(self.scope.to_scope()))
    }
}

impl FromStr for DirectDependency {
    type Err = ResolveError;

    /// Parses `group:artifact[:version]` as a production dependency.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dependency = DirectDependency::production(s);
        dependency.to_coordinate()?;
        Ok(dependency)
    }
}
