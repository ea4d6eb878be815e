//! Metadata contexts and default versions.
//!
//! Every processed metadata document gets a context keyed by
//! `group:artifact:version`. A context holds the document's properties and
//! points at its parent's context, mirroring the parent chain declared in
//! the repository. `${key}` expressions are interpolated by walking that
//! chain from the child upwards, with the child's properties taking
//! precedence, and finally the default version table.
//!
//! The registry is shared by all workers. Each context is written only by
//! the worker that processes its document; a context becomes visible to the
//! parent-before-child check once that worker marks it complete.

use std::collections::HashMap;

use dashmap::DashMap;
use tracing::debug;

/// Maximum interpolation passes over one expression.
///
/// Placeholders nested deeper than this stay unresolved.
pub const MAX_INTERPOLATION_PASSES: usize = 3;

/// Maximum number of contexts visited when walking up a parent chain.
pub const MAX_CONTEXT_DEPTH: usize = 16;

/// Build the id of the context for `group:artifact:version`.
pub fn context_id(group: &str, artifact: &str, version: &str) -> String {
    format!("{}:{}:{}", group, artifact, version)
}

#[derive(Debug, Default)]
struct MetadataContext {
    parent: Option<String>,
    properties: HashMap<String, String>,
    complete: bool,
}

impl MetadataContext {
    fn seeded(group: &str, artifact: &str, version: &str, parent: Option<String>) -> Self {
        let properties = HashMap::from([
            ("project.groupId".to_string(), group.to_string()),
            ("project.artifactId".to_string(), artifact.to_string()),
            ("project.version".to_string(), version.to_string()),
        ]);
        Self {
            parent,
            properties,
            complete: false,
        }
    }
}

/// Registry of metadata contexts plus the default version table.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: DashMap<String, MetadataContext>,
    default_versions: DashMap<String, String>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root context seeded with the `project.*` properties.
    pub fn register(&self, group: &str, artifact: &str, version: &str) -> String {
        let id = context_id(group, artifact, version);
        self.contexts.insert(
            id.clone(),
            MetadataContext::seeded(group, artifact, version, None),
        );
        id
    }

    /// Register a context whose parent is `parent_group:parent_artifact:parent_version`.
    ///
    /// An empty, incomplete context is created for the parent if none exists
    /// yet. The child's own `project.*` properties shadow the parent's.
    pub fn register_from_parent(
        &self,
        parent_group: &str,
        parent_artifact: &str,
        parent_version: &str,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> String {
        let parent_id = context_id(parent_group, parent_artifact, parent_version);
        self.contexts.entry(parent_id.clone()).or_default();

        let id = context_id(group, artifact, version);
        self.contexts.insert(
            id.clone(),
            MetadataContext::seeded(group, artifact, version, Some(parent_id)),
        );
        id
    }

    /// Set one property. The last write for a key wins.
    pub fn add_parameter(&self, id: &str, key: impl Into<String>, value: impl Into<String>) {
        match self.contexts.get_mut(id) {
            Some(mut context) => {
                context.properties.insert(key.into(), value.into());
            }
            None => debug!(context = id, "Ignoring property for unknown context"),
        }
    }

    /// Mark a context as fully populated.
    pub fn mark_complete(&self, id: &str) {
        if let Some(mut context) = self.contexts.get_mut(id) {
            context.complete = true;
        }
    }

    pub fn has_context(&self, id: &str) -> bool {
        self.contexts.contains_key(id)
    }

    /// True once the context exists and its document has been processed.
    pub fn is_complete(&self, id: &str) -> bool {
        self.contexts.get(id).is_some_and(|c| c.complete)
    }

    /// Look a property up along the parent chain.
    pub fn property(&self, id: &str, key: &str) -> Option<String> {
        let mut current = Some(id.to_string());

        for _ in 0..MAX_CONTEXT_DEPTH {
            let Some(current_id) = current else {
                break;
            };
            let context = self.contexts.get(&current_id)?;
            if let Some(value) = context.properties.get(key) {
                return Some(value.clone());
            }
            current = context.parent.clone();
        }

        None
    }

    /// Interpolate every `${key}` in `text`.
    ///
    /// Keys are looked up along the context's parent chain, then in the
    /// default version table. Unresolved placeholders are left intact.
    pub fn resolve_expression(&self, id: &str, text: &str) -> String {
        let mut result = text.to_string();

        for _ in 0..MAX_INTERPOLATION_PASSES {
            if !(result.contains("${") && result.contains('}')) {
                break;
            }
            result = self.interpolate_once(id, &result);
        }

        result
    }

    /// Record a default version for `qualified_name`, interpolated against
    /// the context. The last suggestion registered wins.
    pub fn add_version_suggestion(&self, id: &str, qualified_name: &str, version: &str) {
        let resolved = self.resolve_expression(id, version);
        if let Some(previous) = self
            .default_versions
            .insert(qualified_name.to_string(), resolved.clone())
        {
            if previous != resolved {
                debug!(
                    dependency = qualified_name,
                    previous = %previous,
                    version = %resolved,
                    "Default version replaced"
                );
            }
        }
    }

    pub fn resolve_default_version(&self, qualified_name: &str) -> Option<String> {
        self.default_versions
            .get(qualified_name)
            .map(|v| v.value().clone())
    }

    /// The whole parent chain is searched before the default version table,
    /// so a property anywhere up the chain shadows a suggestion.
    fn lookup(&self, id: &str, key: &str) -> Option<String> {
        self.property(id, key)
            .or_else(|| self.resolve_default_version(key))
    }

    fn interpolate_once(&self, id: &str, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };

            let key = &after[..end];
            match self.lookup(id, key) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push_str("${");
                    out.push_str(key);
                    out.push('}');
                }
            }
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        out
    }
}
