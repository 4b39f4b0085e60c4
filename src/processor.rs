//! Dependency processing
//!
//! Discovers the external references of a generated model, records them as
//! dependency nodes, and materializes the ones whose targets are not in the
//! workspace yet. A pass is best-effort: only a missing schema document node
//! is fatal. Unusable references (malformed, climbing above the workspace
//! root, or naming no document) are skipped with a warning, and a failed
//! fetch/import/generation is logged per dependency without aborting the
//! remaining ones.

use serde_json::json;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{ModelerError, Result};
use crate::modeler::{absolute, Modeler};
use crate::reference;
use crate::resolve::{join_path, resolve_relative};
use crate::store::{property, NodeId, NodeKind};

/// Name of the dependencies container node
pub(crate) const DEPENDENCIES_NODE: &str = "dependencies";
/// Name of each dependency record node
pub(crate) const DEPENDENCY_NODE: &str = "dependency";

/// Bookkeeping for one reference whose target is not in the workspace yet.
/// Built during the scan, consumed by materialization, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MissingDependency {
    /// Reference tail after the parent segments were consumed
    relative_path: String,
    /// Number of parent segments consumed during resolution
    parent_hops: usize,
    /// Workspace path of the ancestor the tail was resolved beneath
    model_parent_path: String,
}

impl Modeler {
    /// Process the dependencies of a generated model.
    ///
    /// Scans the model's schema document for import/include/redefine
    /// directives, records one dependency node per directive under a lazily
    /// created `dependencies` container, and afterwards fetches, imports, and
    /// generates models for the recorded targets that do not exist yet.
    /// Materialization requires the model to carry both an external location
    /// and a model type; without them the missing records are left as they
    /// are. Returns the container path, or `None` when the schema document
    /// has no directives (nothing is created or saved in that case).
    pub fn process_dependencies(
        &mut self,
        artifact_path: &str,
        model: NodeId,
        persist_artifacts: bool,
    ) -> Result<Option<String>> {
        let artifact_path = absolute(artifact_path);
        let model_name = self.workspace.name(model).to_string();
        debug!(model = %model_name, "processing model dependencies");

        let schema = self
            .schema_node(model)
            .ok_or_else(|| ModelerError::SchemaNodeNotFound { model: model_name.clone() })?;

        // resolution starts at the model node's parent
        let start = self.workspace.parent(model).unwrap_or_else(|| self.workspace.root());

        let mut container: Option<NodeId> = None;
        let mut missing: Vec<MissingDependency> = Vec::new();

        for child in self.workspace.children(schema).to_vec() {
            if !self.workspace.kind(child).is_dependency() {
                continue;
            }

            let Some(raw) = self.workspace.string_property(child, property::LOCATION).map(str::to_string)
            else {
                warn!(model = %model_name, "directive carries no location reference, skipping");
                continue;
            };
            debug!(model = %model_name, reference = %raw, "processing dependency directive");

            let normalized = match reference::normalize(&raw) {
                Ok(normalized) => normalized,
                Err(e) => {
                    warn!(model = %model_name, reference = %raw, error = %e, "skipping malformed reference");
                    continue;
                }
            };
            let relative = match reference::is_relative(&normalized) {
                Ok(relative) => relative,
                Err(e) => {
                    warn!(model = %model_name, reference = %raw, error = %e, "skipping malformed reference");
                    continue;
                }
            };

            let mut resolved_path = None;
            let mut missing_entry = None;

            if relative {
                let Some(resolved) = resolve_relative(&self.workspace, start, &normalized) else {
                    warn!(model = %model_name, reference = %raw, "reference climbs above the workspace root, skipping");
                    continue;
                };
                if resolved.remainder.is_empty() {
                    warn!(model = %model_name, reference = %raw, "reference names no document, skipping");
                    continue;
                }
                let parent_path = self.workspace.path(resolved.ancestor);
                if !self.workspace.has_child_at_path(resolved.ancestor, &resolved.remainder) {
                    missing_entry = Some(MissingDependency {
                        relative_path: resolved.remainder.clone(),
                        parent_hops: resolved.hops,
                        model_parent_path: parent_path.clone(),
                    });
                }
                resolved_path = Some(join_path(&parent_path, &resolved.remainder));
            } else {
                // absolute references are recorded but not resolved into the workspace yet
                debug!(model = %model_name, reference = %raw, "absolute reference recorded without resolution");
            }

            let container_id = match container {
                Some(id) => id,
                None => {
                    let id = self.dependencies_container(model);
                    container = Some(id);
                    id
                }
            };
            let record = self.workspace.create_child(container_id, DEPENDENCY_NODE, NodeKind::Dependency);
            self.workspace.set_property(record, property::SOURCE_REFERENCES, json!([raw]));
            if let Some(path) = &resolved_path {
                self.workspace.set_property(record, property::PATH, json!(path));
                debug!(model = %model_name, path = %path, "recorded dependency");
            }
            if let Some(entry) = missing_entry {
                missing.push(entry);
            }
        }

        let Some(container) = container else {
            return Ok(None);
        };

        if !missing.is_empty() {
            self.materialize_missing(&artifact_path, model, &missing, persist_artifacts);
        }

        self.workspace.save()?;
        Ok(Some(self.workspace.path(container)))
    }

    /// The schema document node of a model: the model node itself when it is
    /// of schema-document kind, otherwise the first such sibling.
    fn schema_node(&self, model: NodeId) -> Option<NodeId> {
        if self.workspace.kind(model) == NodeKind::SchemaDocument {
            return Some(model);
        }
        let parent = self.workspace.parent(model)?;
        self.workspace
            .children(parent)
            .iter()
            .copied()
            .find(|&sibling| self.workspace.kind(sibling) == NodeKind::SchemaDocument)
    }

    /// The model's dependencies container. An existing container is reused
    /// with its records cleared, so reprocessing never creates a second one.
    fn dependencies_container(&mut self, model: NodeId) -> NodeId {
        if let Some(existing) = self.workspace.child_of_kind(model, NodeKind::Dependencies) {
            self.workspace.clear_children(existing);
            return existing;
        }
        let container = self.workspace.create_child(model, DEPENDENCIES_NODE, NodeKind::Dependencies);
        debug!(path = %self.workspace.path(container), "created dependencies container");
        container
    }

    /// Fetch, import, and generate models for the missing dependencies.
    ///
    /// The external location and the artifact storage directory are walked
    /// upward in lockstep, one trailing segment per hop consumed during
    /// resolution; the two trees are assumed to mirror each other's nesting.
    fn materialize_missing(
        &mut self,
        artifact_path: &str,
        model: NodeId,
        missing: &[MissingDependency],
        persist_artifacts: bool,
    ) {
        let external = self
            .workspace
            .string_property(model, property::EXTERNAL_LOCATION)
            .map(str::to_string);
        let model_type = self.workspace.string_property(model, property::MODEL_TYPE).map(str::to_string);
        let (Some(external), Some(model_type)) = (external, model_type) else {
            debug!(
                model = %self.workspace.name(model),
                "model carries no external location or model type, leaving missing dependencies unmaterialized"
            );
            return;
        };

        let model_name = self.workspace.name(model).to_string();
        let external_dir = parent_directory(&external);
        let artifact_dir = parent_directory(artifact_path);

        for entry in missing {
            let mut location = external_dir;
            let mut artifact_location = artifact_dir;
            for _ in 0..entry.parent_hops {
                location = parent_directory(location);
                artifact_location = parent_directory(artifact_location);
            }

            let fetch_url = join_path(location, &entry.relative_path);
            let dependency_artifact = join_path(artifact_location, &entry.relative_path);
            let dependency_model = join_path(&entry.model_parent_path, &entry.relative_path);

            if let Err(e) = self.materialize_one(
                &fetch_url,
                &dependency_artifact,
                &dependency_model,
                &model_type,
                persist_artifacts,
            ) {
                error!(url = %fetch_url, model = %model_name, error = %e, "failed to materialize missing dependency");
            }
        }
    }

    fn materialize_one(
        &mut self,
        fetch_url: &str,
        artifact_path: &str,
        model_path: &str,
        model_type: &str,
        persist_artifacts: bool,
    ) -> Result<()> {
        let url = Url::parse(fetch_url).map_err(|e| ModelerError::MalformedReference {
            reference: fetch_url.to_string(),
            reason: e.to_string(),
        })?;

        debug!(url = %url, artifact = %artifact_path, "importing missing dependency");
        let bytes = self.fetcher.fetch(&url)?;
        let stored = self.import_artifact(&bytes, artifact_path, Some(&url))?;

        debug!(model = %model_path, "generating model for missing dependency");
        self.generate_model(&stored, model_path, model_type, persist_artifacts)?;

        if !persist_artifacts {
            if let Some(node) = self.workspace.node_at_path(&stored) {
                self.workspace.remove_property(node, property::CONTENT);
            }
        }
        Ok(())
    }
}

/// Path with its last `/`-separated segment removed
fn parent_directory(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    }
}
