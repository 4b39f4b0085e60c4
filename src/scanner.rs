//! Bundled XSD directive scanner
//!
//! A minimal model generator for XSD documents: builds the schema document
//! node and one child per `import`/`include`/`redefine` directive, carrying
//! the directive's `schemaLocation` (and, for imports, `namespace`). The
//! scanner extracts only what dependency processing needs; it does not
//! validate the document.

use regex::Regex;

use crate::error::Result;
use crate::modeler::ModelGenerator;
use crate::store::{property, NodeId, NodeKind, Workspace};

/// Model type id the scanner registers under
pub const XSD_MODEL_TYPE: &str = "xsd";

const DIRECTIVE_PATTERN: &str = r"<(?:[A-Za-z_][\w.\-]*:)?(import|include|redefine)\b([^>]*)>";

/// Generates schema document models from XSD text
pub struct XsdScanner;

impl ModelGenerator for XsdScanner {
    fn id(&self) -> &str {
        XSD_MODEL_TYPE
    }

    fn generate(
        &self,
        workspace: &mut Workspace,
        parent: NodeId,
        name: &str,
        text: &str,
    ) -> Result<NodeId> {
        let model = workspace.create_child(parent, name, NodeKind::SchemaDocument);

        if let Some(target) = attribute(text, "targetNamespace") {
            workspace.set_property(model, property::TARGET_NAMESPACE, target.into());
        }

        let Ok(directive_re) = Regex::new(DIRECTIVE_PATTERN) else {
            return Ok(model);
        };

        for captures in directive_re.captures_iter(text) {
            let keyword = captures.get(1).map_or("", |m| m.as_str());
            let attributes = captures.get(2).map_or("", |m| m.as_str());

            let kind = match keyword {
                "import" => NodeKind::Import,
                "include" => NodeKind::Include,
                _ => NodeKind::Redefine,
            };
            let directive = workspace.create_child(model, keyword, kind);

            if let Some(location) = attribute(attributes, "schemaLocation") {
                workspace.set_property(directive, property::LOCATION, location.into());
            }
            if kind == NodeKind::Import {
                if let Some(namespace) = attribute(attributes, "namespace") {
                    workspace.set_property(directive, property::NAMESPACE, namespace.into());
                }
            }
        }

        Ok(model)
    }
}

/// Value of the first `name="..."` (or single-quoted) attribute in `text`
fn attribute(text: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"\b{name}\s*=\s*(?:"([^"]*)"|'([^']*)')"#)).ok()?;
    let captures = re.captures(text)?;
    captures.get(1).or_else(|| captures.get(2)).map(|m| m.as_str().to_string())
}
