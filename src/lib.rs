//! Schema Modeler
//!
//! Dependency discovery and materialization for schema documents stored in a
//! hierarchical model workspace.
//!
//! ## Features
//!
//! - **Hierarchical workspace**: imported artifacts and generated models live
//!   in one navigable tree of typed nodes
//! - **Dependency records**: every import/include/redefine reference of a
//!   schema document is persisted with its resolved workspace path
//! - **Best-effort materialization**: targets missing from the workspace are
//!   fetched, imported, and modeled recursively; a failing dependency never
//!   aborts the pass
//! - **Session snapshots**: file-backed workspaces persist as a
//!   format-versioned JSON snapshot, committed once per processing pass
//!
//! ## Workspace layout
//!
//! ```text
//! /
//! ├── artifacts/
//! │   └── books/
//! │       ├── Books.xsd                     (artifact)
//! │       └── data/types/BookDatatypes.xsd  (artifact)
//! └── models/
//!     └── books/
//!         └── Books.xsd                     (schema document)
//!             ├── include                   (directive)
//!             └── dependencies/
//!                 └── dependency            (resolved reference record)
//! ```

pub mod config;
pub mod dependency;
pub mod error;
pub mod fetch;
pub mod modeler;
mod processor;
pub mod reference;
pub mod resolve;
pub mod scanner;
pub mod store;

pub use config::Settings;
pub use dependency::Dependency;
pub use error::{ModelerError, Result};
pub use fetch::{ArtifactFetcher, HttpFetcher, StaticFetcher};
pub use modeler::{ModelGenerator, Modeler};
pub use resolve::ResolvedReference;
pub use scanner::XsdScanner;
pub use store::{NodeId, NodeKind, Workspace};
