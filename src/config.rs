//! Configuration for the modeler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-modeler.toml)
//! - Environment variables (SCHEMA_MODELER_*)
//!
//! ## Example config file (schema-modeler.toml):
//! ```toml
//! [workspace]
//! path = "./workspace.json"
//! artifact_root = "/artifacts"
//! model_root = "/models"
//!
//! [fetch]
//! timeout_secs = 30
//!
//! [generation]
//! default_model_type = "xsd"
//! persist_artifacts = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the modeler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Workspace settings
    #[serde(default)]
    pub workspace: WorkspaceSettings,

    /// Fetch settings
    #[serde(default)]
    pub fetch: FetchSettings,

    /// Model generation settings
    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Workspace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Path to the workspace snapshot file
    #[serde(default = "default_workspace_path")]
    pub path: PathBuf,

    /// Workspace folder artifacts are imported under
    #[serde(default = "default_artifact_root")]
    pub artifact_root: String,

    /// Workspace folder models are generated under
    #[serde(default = "default_model_root")]
    pub model_root: String,
}

/// Fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Model generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Model type used when none is given on the command line
    #[serde(default = "default_model_type")]
    pub default_model_type: String,

    /// Whether fetched dependency artifacts keep their content
    #[serde(default = "default_true")]
    pub persist_artifacts: bool,
}

// Default value functions
fn default_workspace_path() -> PathBuf {
    PathBuf::from("workspace.json")
}

fn default_artifact_root() -> String {
    "/artifacts".to_string()
}

fn default_model_root() -> String {
    "/models".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("schema-modeler/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_model_type() -> String {
    "xsd".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            path: default_workspace_path(),
            artifact_root: default_artifact_root(),
            model_root: default_model_root(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self { timeout_secs: default_timeout_secs(), user_agent: default_user_agent() }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { default_model_type: default_model_type(), persist_artifacts: true }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: WorkspaceSettings::default(),
            fetch: FetchSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl Settings {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["schema-modeler.toml", ".schema-modeler.toml", "config/schema-modeler.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "modelspace", "schema-modeler") {
            let xdg_config = config_dir.config_dir().join("schema-modeler.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (SCHEMA_MODELER_*)
        builder = builder
            .add_source(Environment::with_prefix("SCHEMA_MODELER").separator("__").try_parsing(true));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the workspace snapshot path (resolves relative paths)
    pub fn workspace_path(&self) -> PathBuf {
        if self.workspace.path.is_absolute() {
            self.workspace.path.clone()
        } else {
            std::env::current_dir().unwrap_or_default().join(&self.workspace.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.workspace.artifact_root, "/artifacts");
        assert_eq!(settings.workspace.model_root, "/models");
        assert_eq!(settings.generation.default_model_type, "xsd");
        assert!(settings.generation.persist_artifacts);
        assert_eq!(settings.fetch.timeout_secs, 30);
    }

    #[test]
    fn test_serialize_settings() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        assert!(toml_str.contains("[workspace]"));
        assert!(toml_str.contains("[fetch]"));
        assert!(toml_str.contains("[generation]"));
    }
}
