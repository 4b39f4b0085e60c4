//! Dependency report types

use serde::{Deserialize, Serialize};

/// One discovered model dependency
///
/// Read back from the persisted dependency records of a model; `exists` is
/// computed against the workspace at read time, so a dependency whose
/// materialization failed shows up with a resolved path and `exists == false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Resolved workspace path; absent for references that could not be
    /// resolved (absolute references, currently)
    pub path: Option<String>,
    /// Whether a node exists at the resolved path
    pub exists: bool,
    /// Raw references that produced this record, in discovery order
    pub source_references: Vec<String>,
}

impl Dependency {
    /// Create a dependency with no source references yet
    pub fn new(path: Option<String>, exists: bool) -> Self {
        Self { path, exists, source_references: Vec::new() }
    }

    /// Append a raw source reference
    pub fn add_source_reference(&mut self, reference: impl Into<String>) {
        self.source_references.push(reference.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_dependency_has_no_references() {
        let dep = Dependency::new(Some("/models/Foo.xsd".to_string()), true);
        assert!(dep.source_references.is_empty());
        assert!(dep.exists);
        assert_eq!(dep.path.as_deref(), Some("/models/Foo.xsd"));
    }

    #[test]
    fn test_references_keep_discovery_order() {
        let mut dep = Dependency::new(None, false);
        dep.add_source_reference("./a.xsd");
        dep.add_source_reference("./b.xsd");
        assert_eq!(dep.source_references, vec!["./a.xsd", "./b.xsd"]);
    }

    #[test]
    fn test_unresolved_dependency() {
        let dep = Dependency::new(None, false);
        assert!(dep.path.is_none());
        assert!(!dep.exists);
    }
}
