//! Modeler facade
//!
//! Owns the workspace, the artifact fetcher, and the registered model
//! generators. Artifacts enter the workspace through the import methods;
//! [`Modeler::generate_model`] builds the structural model for an artifact and
//! is also the recursive entry point used while materializing missing
//! dependencies.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

use crate::dependency::Dependency;
use crate::error::{ModelerError, Result};
use crate::fetch::ArtifactFetcher;
use crate::store::{content_checksum, property, NodeId, NodeKind, Workspace};

/// Generates the structural model node for one artifact
///
/// Implementations parse the artifact text and build the model node (and its
/// directive children) under `parent`. Dependency discovery runs afterwards
/// and only consumes the tree; generators never fetch.
pub trait ModelGenerator {
    /// Model type id the generator is looked up by
    fn id(&self) -> &str;

    /// Build the model node named `name` under `parent` from `text`
    fn generate(
        &self,
        workspace: &mut Workspace,
        parent: NodeId,
        name: &str,
        text: &str,
    ) -> Result<NodeId>;
}

/// The modeler
pub struct Modeler {
    pub(crate) workspace: Workspace,
    pub(crate) fetcher: Box<dyn ArtifactFetcher>,
    generators: HashMap<String, Arc<dyn ModelGenerator>>,
    in_progress: HashSet<String>,
}

impl Modeler {
    /// Create a modeler over a workspace
    pub fn new(workspace: Workspace, fetcher: Box<dyn ArtifactFetcher>) -> Self {
        Self { workspace, fetcher, generators: HashMap::new(), in_progress: HashSet::new() }
    }

    /// The underlying workspace
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Mutable access to the underlying workspace
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Register a model generator under its type id
    pub fn register_generator(&mut self, generator: Arc<dyn ModelGenerator>) {
        self.generators.insert(generator.id().to_string(), generator);
    }

    /// Commit the workspace session
    pub fn save(&self) -> Result<()> {
        self.workspace.save()
    }

    /// Import document bytes at a workspace path, creating intermediate
    /// folders. Re-importing an existing path replaces its content.
    pub fn import_artifact(&mut self, bytes: &[u8], path: &str, origin: Option<&Url>) -> Result<String> {
        let path = absolute(path);
        let (parent_path, name) = split_path(&path)?;
        let parent = self.workspace.ensure_folders(&parent_path);
        let node = match self.workspace.child_named(parent, &name) {
            Some(existing) => existing,
            None => self.workspace.create_child(parent, &name, NodeKind::Artifact),
        };

        let text = String::from_utf8_lossy(bytes).into_owned();
        self.workspace.set_property(node, property::CONTENT, text.into());
        self.workspace.set_property(node, property::CHECKSUM, content_checksum(bytes).into());
        self.workspace.set_property(node, property::CREATED_AT, Utc::now().to_rfc3339().into());
        if let Some(origin) = origin {
            self.workspace.set_property(node, property::EXTERNAL_LOCATION, origin.as_str().into());
        }

        debug!(path = %path, "imported artifact");
        Ok(path)
    }

    /// Import a local file under `workspace_parent` (the root when absent)
    pub fn import_file(&mut self, file: &Path, workspace_parent: Option<&str>) -> Result<String> {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ModelerError::InvalidPath(file.display().to_string()))?;
        let bytes = fs::read(file)?;
        self.import_artifact(&bytes, &child_path(workspace_parent, name), None)
    }

    /// Fetch a URL and import it under `workspace_parent`, recording the URL
    /// as the artifact's external location
    pub fn import_url(&mut self, url: &Url, workspace_parent: Option<&str>) -> Result<String> {
        let name = url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ModelerError::InvalidPath(url.to_string()))?
            .to_string();
        let bytes = self.fetcher.fetch(url)?;
        self.import_artifact(&bytes, &child_path(workspace_parent, &name), Some(url))
    }

    /// Import every file of a local directory tree under `workspace_parent`,
    /// preserving the relative layout. Returns the imported workspace paths.
    pub fn seed_directory(&mut self, dir: &Path, workspace_parent: Option<&str>) -> Result<Vec<String>> {
        let mut imported = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(|_| ModelerError::InvalidPath(entry.path().display().to_string()))?;
            let relative = relative.to_string_lossy().replace('\\', "/");
            let bytes = fs::read(entry.path())?;
            imported.push(self.import_artifact(&bytes, &child_path(workspace_parent, &relative), None)?);
        }
        Ok(imported)
    }

    /// Generate the structural model for an artifact.
    ///
    /// Returns the existing node when the model path is already populated, so
    /// repeated requests (including the ones issued while materializing a
    /// dependency cycle) never regenerate. A request for a path whose
    /// generation is still in flight is refused instead of recursing.
    pub fn generate_model(
        &mut self,
        artifact_path: &str,
        model_path: &str,
        model_type: &str,
        persist_artifacts: bool,
    ) -> Result<NodeId> {
        let model_path = absolute(model_path);
        if let Some(existing) = self.workspace.node_at_path(&model_path) {
            debug!(path = %model_path, "model already exists, skipping generation");
            return Ok(existing);
        }
        if self.in_progress.contains(&model_path) {
            return Err(ModelerError::GenerationInProgress { path: model_path });
        }

        self.in_progress.insert(model_path.clone());
        let outcome = self.generate_model_inner(artifact_path, &model_path, model_type, persist_artifacts);
        self.in_progress.remove(&model_path);
        outcome
    }

    fn generate_model_inner(
        &mut self,
        artifact_path: &str,
        model_path: &str,
        model_type: &str,
        persist_artifacts: bool,
    ) -> Result<NodeId> {
        let artifact_path = absolute(artifact_path);
        let artifact = self
            .workspace
            .node_at_path(&artifact_path)
            .ok_or_else(|| ModelerError::NodeNotFound { path: artifact_path.clone() })?;
        let text = self
            .workspace
            .string_property(artifact, property::CONTENT)
            .ok_or_else(|| ModelerError::PropertyNotFound {
                path: artifact_path.clone(),
                property: property::CONTENT.to_string(),
            })?
            .to_string();
        let origin = self
            .workspace
            .string_property(artifact, property::EXTERNAL_LOCATION)
            .map(str::to_string);

        let generator = self
            .generators
            .get(model_type)
            .cloned()
            .ok_or_else(|| ModelerError::UnknownModelType(model_type.to_string()))?;

        let (parent_path, name) = split_path(model_path)?;
        let parent = self.workspace.ensure_folders(&parent_path);

        debug!(artifact = %artifact_path, model = %model_path, "generating model");
        let model = generator.generate(&mut self.workspace, parent, &name, &text)?;
        self.workspace.set_property(model, property::MODEL_TYPE, model_type.into());
        if let Some(origin) = origin {
            self.workspace.set_property(model, property::EXTERNAL_LOCATION, origin.into());
        }

        self.process_dependencies(&artifact_path, model, persist_artifacts)?;
        Ok(model)
    }

    /// Dependency report for a model, read back from its persisted records
    pub fn dependencies_of(&self, model: NodeId) -> Vec<Dependency> {
        let Some(container) = self.workspace.child_of_kind(model, NodeKind::Dependencies) else {
            return Vec::new();
        };
        self.workspace
            .children(container)
            .iter()
            .copied()
            .filter(|&record| self.workspace.kind(record) == NodeKind::Dependency)
            .map(|record| {
                let path = self.workspace.string_property(record, property::PATH).map(str::to_string);
                let exists = path
                    .as_deref()
                    .map(|p| self.workspace.node_at_path(p).is_some())
                    .unwrap_or(false);
                let mut dependency = Dependency::new(path, exists);
                for reference in self
                    .workspace
                    .string_list_property(record, property::SOURCE_REFERENCES)
                    .unwrap_or_default()
                {
                    dependency.add_source_reference(reference);
                }
                dependency
            })
            .collect()
    }
}

/// Ensure a path is `/`-rooted
pub(crate) fn absolute(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Split an absolute path into parent path and final name
pub(crate) fn split_path(path: &str) -> Result<(String, String)> {
    let trimmed = path.trim_end_matches('/');
    let index = trimmed.rfind('/').ok_or_else(|| ModelerError::InvalidPath(path.to_string()))?;
    let name = &trimmed[index + 1..];
    if name.is_empty() {
        return Err(ModelerError::InvalidPath(path.to_string()));
    }
    let parent = if index == 0 { "/" } else { &trimmed[..index] };
    Ok((parent.to_string(), name.to_string()))
}

fn child_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{}/{}", absolute(parent).trim_end_matches('/'), name),
        None => format!("/{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use crate::scanner::XsdScanner;

    fn modeler() -> Modeler {
        let mut modeler = Modeler::new(Workspace::in_memory(), Box::new(StaticFetcher::new()));
        modeler.register_generator(Arc::new(XsdScanner));
        modeler
    }

    #[test]
    fn test_import_artifact_records_provenance() {
        let mut m = modeler();
        let path = m.import_artifact(b"<schema/>", "artifacts/books/Books.xsd", None).unwrap();
        assert_eq!(path, "/artifacts/books/Books.xsd");

        let ws = m.workspace();
        let node = ws.node_at_path(&path).unwrap();
        assert_eq!(ws.kind(node), NodeKind::Artifact);
        assert_eq!(ws.string_property(node, property::CONTENT), Some("<schema/>"));
        assert_eq!(
            ws.string_property(node, property::CHECKSUM).map(str::to_string),
            Some(content_checksum(b"<schema/>"))
        );
        assert!(ws.string_property(node, property::CREATED_AT).is_some());
        assert_eq!(ws.string_property(node, property::EXTERNAL_LOCATION), None);
    }

    #[test]
    fn test_reimport_replaces_content() {
        let mut m = modeler();
        m.import_artifact(b"one", "/a/Doc.xsd", None).unwrap();
        m.import_artifact(b"two", "/a/Doc.xsd", None).unwrap();

        let ws = m.workspace();
        let parent = ws.node_at_path("/a").unwrap();
        assert_eq!(ws.children(parent).len(), 1);
        let node = ws.node_at_path("/a/Doc.xsd").unwrap();
        assert_eq!(ws.string_property(node, property::CONTENT), Some("two"));
    }

    #[test]
    fn test_import_url_records_external_location() {
        let mut fetcher = StaticFetcher::new();
        fetcher.insert("http://example.test/schemas/Books.xsd", b"<schema/>".to_vec());
        let mut m = Modeler::new(Workspace::in_memory(), Box::new(fetcher));

        let url = Url::parse("http://example.test/schemas/Books.xsd").unwrap();
        let path = m.import_url(&url, Some("/artifacts")).unwrap();
        assert_eq!(path, "/artifacts/Books.xsd");

        let node = m.workspace().node_at_path(&path).unwrap();
        assert_eq!(
            m.workspace().string_property(node, property::EXTERNAL_LOCATION),
            Some("http://example.test/schemas/Books.xsd")
        );
    }

    #[test]
    fn test_generate_model_requires_known_type() {
        let mut m = modeler();
        m.import_artifact(b"<schema/>", "/artifacts/Books.xsd", None).unwrap();
        let result = m.generate_model("/artifacts/Books.xsd", "/models/Books.xsd", "dtd", true);
        assert!(matches!(result, Err(ModelerError::UnknownModelType(_))));
    }

    #[test]
    fn test_generate_model_requires_artifact() {
        let mut m = modeler();
        let result = m.generate_model("/artifacts/Missing.xsd", "/models/Missing.xsd", "xsd", true);
        assert!(matches!(result, Err(ModelerError::NodeNotFound { .. })));
    }

    #[test]
    fn test_generate_model_is_idempotent_per_path() {
        let mut m = modeler();
        m.import_artifact(b"<xsd:schema xmlns:xsd=\"s\"/>", "/artifacts/Books.xsd", None).unwrap();
        let first = m.generate_model("/artifacts/Books.xsd", "/models/Books.xsd", "xsd", true).unwrap();
        let second = m.generate_model("/artifacts/Books.xsd", "/models/Books.xsd", "xsd", true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/a/b/c.xsd").unwrap(), ("/a/b".to_string(), "c.xsd".to_string()));
        assert_eq!(split_path("/c.xsd").unwrap(), ("/".to_string(), "c.xsd".to_string()));
        assert!(split_path("/").is_err());
        assert!(split_path("plain").is_err());
    }

    #[test]
    fn test_seed_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data/types")).unwrap();
        fs::write(dir.path().join("Books.xsd"), "<schema/>").unwrap();
        fs::write(dir.path().join("data/types/BookDatatypes.xsd"), "<schema/>").unwrap();

        let mut m = modeler();
        let mut imported = m.seed_directory(dir.path(), Some("/artifacts/books")).unwrap();
        imported.sort();
        assert_eq!(
            imported,
            vec![
                "/artifacts/books/Books.xsd".to_string(),
                "/artifacts/books/data/types/BookDatatypes.xsd".to_string(),
            ]
        );
    }
}
