//! Schema Modeler CLI
//!
//! Imports a schema document (file or URL) into the workspace, generates its
//! structural model, processes its dependencies, and prints the dependency
//! report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use schema_modeler::{HttpFetcher, Modeler, Settings, Workspace, XsdScanner};

#[derive(Parser)]
#[command(name = "schema-modeler")]
#[command(about = "Generate a schema model and process its dependencies")]
struct Cli {
    /// Schema document to import (file path or http/https/file URL)
    source: String,

    /// Workspace snapshot file
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Workspace folder artifacts are imported under
    #[arg(long)]
    artifact_root: Option<String>,

    /// Workspace folder models are generated under
    #[arg(long)]
    model_root: Option<String>,

    /// Model type to generate with
    #[arg(short, long)]
    model_type: Option<String>,

    /// Directory of additional documents to seed into the artifact root
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Discard fetched dependency artifact content after generation
    #[arg(long)]
    discard_artifacts: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load_from(cli.config.as_deref())?;
    let workspace_file = cli.workspace.unwrap_or_else(|| settings.workspace_path());
    let artifact_root = cli.artifact_root.unwrap_or_else(|| settings.workspace.artifact_root.clone());
    let model_root = cli.model_root.unwrap_or_else(|| settings.workspace.model_root.clone());
    let model_type = cli.model_type.unwrap_or_else(|| settings.generation.default_model_type.clone());
    let persist_artifacts = settings.generation.persist_artifacts && !cli.discard_artifacts;

    let workspace = Workspace::open(&workspace_file)?;
    let fetcher = HttpFetcher::new(&settings.fetch)?;
    let mut modeler = Modeler::new(workspace, Box::new(fetcher));
    modeler.register_generator(Arc::new(XsdScanner));

    if let Some(seed) = &cli.seed {
        let imported = modeler.seed_directory(seed, Some(&artifact_root))?;
        println!("Seeded {} documents from {}", imported.len(), seed.display());
    }

    let artifact_path = match Url::parse(&cli.source) {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "file") => {
            modeler.import_url(&url, Some(&artifact_root))?
        }
        _ => modeler.import_file(Path::new(&cli.source), Some(&artifact_root))?,
    };
    let name = artifact_path.rsplit('/').next().unwrap_or_default();
    let model_path = format!("{}/{}", model_root.trim_end_matches('/'), name);

    let model = modeler.generate_model(&artifact_path, &model_path, &model_type, persist_artifacts)?;
    let report = modeler.dependencies_of(model);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("📦 {model_path}");
        if report.is_empty() {
            println!("  no dependencies");
        }
        for dependency in &report {
            let status = if dependency.exists { "ok" } else { "missing" };
            println!(
                "  [{status}] {} <- {}",
                dependency.path.as_deref().unwrap_or("(unresolved)"),
                dependency.source_references.join(", ")
            );
        }
    }

    modeler.save()?;
    Ok(())
}
