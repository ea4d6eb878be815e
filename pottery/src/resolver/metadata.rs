//! Metadata document (POM) reader.
//!
//! Only the elements that matter for resolution are extracted: the
//! document's own identity, its parent, properties, the
//! dependency-management section and the direct dependencies. Values are
//! returned raw; `${...}` expressions are interpolated later against the
//! document's context.

use roxmltree::{Document, Node, ParsingOptions};

/// Parent declaration of a metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

/// One `<dependency>` entry, before interpolation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub classifier: Option<String>,
    pub packaging: Option<String>,
}

/// The parts of a metadata document the resolver needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataDocument {
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub parent: Option<ParentRef>,
    /// Properties in document order.
    pub properties: Vec<(String, String)>,
    /// Default versions from `dependencyManagement/dependencies`.
    pub managed_dependencies: Vec<DeclaredDependency>,
    pub dependencies: Vec<DeclaredDependency>,
}

impl MetadataDocument {
    /// Parse a metadata document.
    ///
    /// Element names are matched by local name, so the usual default
    /// namespace on `<project>` is irrelevant.
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document = Document::parse_with_options(text.trim_start_matches('\u{feff}'), options)?;
        let project = document.root_element();

        let mut metadata = MetadataDocument::default();

        for node in project.children().filter(Node::is_element) {
            match node.tag_name().name() {
                "groupId" => metadata.group = text_of(node),
                "artifactId" => metadata.artifact = text_of(node),
                "version" => metadata.version = text_of(node),
                "parent" => metadata.parent = parse_parent(node),
                "properties" => {
                    metadata.properties = node
                        .children()
                        .filter(Node::is_element)
                        .map(|p| {
                            (
                                p.tag_name().name().to_string(),
                                text_of(p).unwrap_or_default(),
                            )
                        })
                        .collect();
                }
                "dependencyManagement" => {
                    if let Some(deps) = child(node, "dependencies") {
                        metadata.managed_dependencies = parse_dependencies(deps);
                    }
                }
                "dependencies" => metadata.dependencies = parse_dependencies(node),
                _ => {}
            }
        }

        Ok(metadata)
    }

    /// Own group id, inherited from the parent when omitted.
    pub fn effective_group(&self) -> Option<&str> {
        self.group
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group.as_str()))
    }

    /// Own version, inherited from the parent when omitted.
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.version.as_str()))
    }
}

fn text_of(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn parse_parent(node: Node) -> Option<ParentRef> {
    Some(ParentRef {
        group: child(node, "groupId").and_then(text_of)?,
        artifact: child(node, "artifactId").and_then(text_of)?,
        version: child(node, "version").and_then(text_of)?,
    })
}

fn parse_dependencies(node: Node) -> Vec<DeclaredDependency> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name() == "dependency")
        .map(|dep| {
            let mut declared = DeclaredDependency::default();
            for field in dep.children().filter(Node::is_element) {
                match field.tag_name().name() {
                    "groupId" => declared.group = text_of(field),
                    "artifactId" => declared.artifact = text_of(field),
                    "version" => declared.version = text_of(field),
                    "scope" => declared.scope = text_of(field),
                    "classifier" => declared.classifier = text_of(field),
                    "type" => declared.packaging = text_of(field),
                    _ => {}
                }
            }
            declared
        })
        .collect()
}
