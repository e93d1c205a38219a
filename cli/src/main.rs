mod widgets;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mountguard::{
    ConfigError, DiagnosticsReport, LoadAttempt, LoadOutcome, LoaderConfig, ManifestError, MemoryHost, PageContext,
    PageManifest, RegistryError,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "mountguard", about = "Render page manifests through the resilient component loader")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every target of a manifest and print the resulting containers.
    Render(RenderArgs),
    /// List the built-in demo widgets.
    Widgets,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long)]
    manifest: PathBuf,

    /// Loader config JSON; overrides the manifest's embedded config and `MOUNTGUARD_*` variables.
    #[arg(long, env = "MOUNTGUARD_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Json,
}

#[derive(Debug, Serialize)]
struct ContainerOutput {
    container_id: String,
    component: String,
    outcome: &'static str,
    html: String,
    attempts: Vec<LoadAttempt>,
}

#[derive(Debug, Serialize)]
struct RenderOutput {
    containers: Vec<ContainerOutput>,
    report: DiagnosticsReport,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    // Widget panics are contained and recorded; keep the default hook quiet.
    std::panic::set_hook(Box::new(|info| tracing::debug!(%info, "widget panicked")));

    let cli = Cli::parse();
    match cli.command {
        Command::Render(args) => run_render(args).await,
        Command::Widgets => {
            run_widgets();
            Ok(())
        }
    }
}

async fn run_render(args: RenderArgs) -> Result<(), CliError> {
    let manifest = PageManifest::from_json(&read(&args.manifest)?)?;
    let config = match (&args.config, &manifest.config) {
        (Some(path), _) => LoaderConfig::from_json(&read(path)?)?,
        (None, Some(embedded)) => embedded.clone(),
        (None, None) => LoaderConfig::from_env()?,
    };

    let host = Rc::new(MemoryHost::with_containers(manifest.container_ids()));
    let page = PageContext::with_tokio(host.clone(), config);
    for widget in widgets::demo_widgets() {
        page.register(widget)?;
    }

    let outcomes = page.mount_manifest(&manifest).await;
    let containers = manifest
        .targets
        .iter()
        .zip(outcomes)
        .map(|(target, outcome)| ContainerOutput {
            container_id: target.container_id.clone(),
            component: target.component_name.clone(),
            outcome: outcome_label(&outcome),
            html: host.html(&target.container_id),
            attempts: page.loader().attempts(&target.container_id),
        })
        .collect::<Vec<_>>();
    let output = RenderOutput { containers, report: page.report() };

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        Format::Html => print_html(&output)?,
    }
    Ok(())
}

fn run_widgets() {
    for (name, services, description) in widgets::CATALOG {
        let services = if services.is_empty() { "-".to_owned() } else { services.join(",") };
        println!("{name:<10} requires={services:<6} {description}");
    }
}

fn print_html(output: &RenderOutput) -> Result<(), CliError> {
    for container in &output.containers {
        println!("<!-- {} ({}): {} -->", container.container_id, container.component, container.outcome);
        println!("{}", container.html);
    }
    eprintln!("{}", serde_json::to_string_pretty(&output.report)?);
    Ok(())
}

fn outcome_label(outcome: &LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Mounted(_) => "Mounted",
        LoadOutcome::FallenBack(_) => "FallenBack",
        LoadOutcome::Superseded => "Superseded",
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
}
