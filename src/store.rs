//! Hierarchical workspace store
//!
//! Imported artifacts and generated models live in one navigable tree of
//! named, typed nodes. Nodes are addressed through [`NodeId`] handles into an
//! arena, so traversal never hands out references that could dangle across a
//! save. A file-backed workspace persists as a format-versioned JSON snapshot;
//! `save()` is the single commit point of a session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ModelerError, Result};

/// Snapshot format version; bump the major on incompatible layout changes
const SNAPSHOT_FORMAT: &str = "1.0.0";

/// Well-known node property names
pub mod property {
    /// Raw document text of an imported artifact
    pub const CONTENT: &str = "content";
    /// SHA-256 hex digest of the imported content
    pub const CHECKSUM: &str = "contentChecksum";
    /// UTC timestamp of the import
    pub const CREATED_AT: &str = "createdAt";
    /// Absolute URL an artifact was originally fetched from
    pub const EXTERNAL_LOCATION: &str = "externalLocation";
    /// Model type id a model was generated with
    pub const MODEL_TYPE: &str = "modelType";
    /// Raw reference text naming an external document
    pub const LOCATION: &str = "locationReference";
    /// Namespace named by an import directive
    pub const NAMESPACE: &str = "namespace";
    /// Target namespace of a schema document
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    /// Raw references that produced a dependency record
    pub const SOURCE_REFERENCES: &str = "sourceReferences";
    /// Resolved workspace path of a dependency record
    pub const PATH: &str = "path";
}

/// Node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Plain container
    Folder,
    /// Imported document
    Artifact,
    /// Structural root of a parsed schema document
    SchemaDocument,
    /// `import` directive of a schema document
    Import,
    /// `include` directive of a schema document
    Include,
    /// `redefine` directive of a schema document
    Redefine,
    /// Container for the dependency records of a model
    Dependencies,
    /// One recorded external reference
    Dependency,
}

impl NodeKind {
    /// True for the directive kinds that name an external document
    pub fn is_dependency(&self) -> bool {
        matches!(self, NodeKind::Import | NodeKind::Include | NodeKind::Redefine)
    }
}

/// Handle to a node in a [`Workspace`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeEntry {
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: BTreeMap<String, serde_json::Value>,
}

/// Serialized tree form of one node
#[derive(Serialize, Deserialize)]
struct SnapshotNode {
    name: String,
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<SnapshotNode>,
}

/// Persisted workspace session
#[derive(Serialize, Deserialize)]
struct Snapshot {
    format: String,
    saved_at: DateTime<Utc>,
    root: SnapshotNode,
}

/// The hierarchical workspace
pub struct Workspace {
    nodes: Vec<NodeEntry>,
    backing: Option<PathBuf>,
}

impl Workspace {
    /// Create an empty workspace with no persistence
    pub fn in_memory() -> Self {
        Self {
            nodes: vec![NodeEntry {
                name: String::new(),
                kind: NodeKind::Folder,
                parent: None,
                children: Vec::new(),
                properties: BTreeMap::new(),
            }],
            backing: None,
        }
    }

    /// Open a file-backed workspace, loading the snapshot if one exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut workspace = Self::in_memory();
        workspace.backing = Some(path.clone());

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let snapshot: Snapshot = serde_json::from_str(&content)?;
            let found = Version::parse(&snapshot.format)?;
            let supported = Version::parse(SNAPSHOT_FORMAT)?;
            if found.major != supported.major {
                return Err(ModelerError::IncompatibleSnapshot {
                    found: snapshot.format,
                    supported: SNAPSHOT_FORMAT.to_string(),
                });
            }
            workspace.nodes.clear();
            workspace.attach(None, snapshot.root);
        }

        Ok(workspace)
    }

    /// The root node; its path is `/` and its depth is 0
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node name (empty for the root)
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Node kind
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    /// Parent node, `None` for the root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children in creation order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Number of ancestors between this node and the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(node) = current {
            depth += 1;
            current = self.nodes[node.0].parent;
        }
        depth
    }

    /// Absolute `/`-rooted path of a node
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let entry = &self.nodes[node.0];
            if entry.parent.is_some() {
                segments.push(entry.name.as_str());
            }
            current = entry.parent;
        }
        if segments.is_empty() {
            return "/".to_string();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Create a child node. Sibling names need not be unique.
    pub fn create_child(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            name: name.to_string(),
            kind,
            parent: Some(parent),
            children: Vec::new(),
            properties: BTreeMap::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// First child with the given name
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].name == name)
    }

    /// First child of the given kind
    pub fn child_of_kind(&self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].kind == kind)
    }

    /// Detach all children of a node
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Descendant reached by walking a relative path of name segments
    pub fn descendant_at(&self, node: NodeId, relative_path: &str) -> Option<NodeId> {
        let mut current = node;
        for segment in relative_path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_named(current, segment)?;
        }
        Some(current)
    }

    /// Whether a descendant exists at a relative path below a node
    pub fn has_child_at_path(&self, node: NodeId, relative_path: &str) -> bool {
        self.descendant_at(node, relative_path).is_some()
    }

    /// Node at an absolute `/`-rooted path
    pub fn node_at_path(&self, path: &str) -> Option<NodeId> {
        self.descendant_at(self.root(), path)
    }

    /// Walk an absolute path, creating folder nodes for missing segments
    pub fn ensure_folders(&mut self, path: &str) -> NodeId {
        let mut current = self.root();
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        for segment in segments {
            current = match self.child_named(current, &segment) {
                Some(child) => child,
                None => self.create_child(current, &segment, NodeKind::Folder),
            };
        }
        current
    }

    /// String property value
    pub fn string_property(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].properties.get(name).and_then(|v| v.as_str())
    }

    /// String-list property value
    pub fn string_list_property(&self, id: NodeId, name: &str) -> Option<Vec<String>> {
        self.nodes[id.0].properties.get(name).and_then(|v| v.as_array()).map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }

    /// Set a property value
    pub fn set_property(&mut self, id: NodeId, name: &str, value: serde_json::Value) {
        self.nodes[id.0].properties.insert(name.to_string(), value);
    }

    /// Remove a property; missing properties are ignored
    pub fn remove_property(&mut self, id: NodeId, name: &str) {
        self.nodes[id.0].properties.remove(name);
    }

    /// Commit the session. File-backed workspaces write the snapshot;
    /// in-memory workspaces have nothing to persist.
    pub fn save(&self) -> Result<()> {
        let Some(backing) = &self.backing else {
            return Ok(());
        };
        let snapshot = Snapshot {
            format: SNAPSHOT_FORMAT.to_string(),
            saved_at: Utc::now(),
            root: self.snapshot_node(self.root()),
        };
        fs::write(backing, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }

    fn snapshot_node(&self, id: NodeId) -> SnapshotNode {
        let entry = &self.nodes[id.0];
        SnapshotNode {
            name: entry.name.clone(),
            kind: entry.kind,
            properties: entry.properties.clone(),
            children: entry.children.iter().map(|&child| self.snapshot_node(child)).collect(),
        }
    }

    fn attach(&mut self, parent: Option<NodeId>, snapshot: SnapshotNode) -> NodeId {
        let SnapshotNode { name, kind, properties, children } = snapshot;
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry { name, kind, parent, children: Vec::new(), properties });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        for child in children {
            self.attach(Some(id), child);
        }
        id
    }
}

/// SHA-256 hex digest of imported content
pub fn content_checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
