//! Error types for the modeler

use thiserror::Error;

/// Result type for modeler operations
pub type Result<T> = std::result::Result<T, ModelerError>;

/// Modeler errors
#[derive(Error, Debug)]
pub enum ModelerError {
    #[error("Malformed location reference '{reference}': {reason}")]
    MalformedReference { reference: String, reason: String },

    #[error("No schema document node found for model '{model}'")]
    SchemaNodeNotFound { model: String },

    #[error("No node at workspace path '{path}'")]
    NodeNotFound { path: String },

    #[error("Node '{path}' has no '{property}' property")]
    PropertyNotFound { path: String, property: String },

    #[error("Invalid workspace path: {0}")]
    InvalidPath(String),

    #[error("Unknown model type: {0}")]
    UnknownModelType(String),

    #[error("Model generation already in progress for '{path}'")]
    GenerationInProgress { path: String },

    #[error("Unsupported URL scheme '{scheme}' in '{url}'")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("No fetch entry for '{0}'")]
    FetchEntryMissing(String),

    #[error("Workspace snapshot format {found} is incompatible with {supported}")]
    IncompatibleSnapshot { found: String, supported: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}
