//! apitool CLI entrypoint
//! Parses command-line arguments and dispatches to the core converter.

// Internal imports (std, crate)
use std::path::{Path, PathBuf};

// External imports (alphabetized)
use anyhow::Context;
use apitool_core::openapi::{extract_operations, resolver};
use apitool_core::{naming, Converter, ConverterConfig, Document, SpecSource, TargetFormat};
use clap::Parser;
use tokio::fs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apitool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Convert an OpenAPI spec into OpenAI functions or MCP tools
    Convert {
        /// Path to OpenAPI schema (YAML or JSON)
        ///
        /// Example: --schema-path path/to/schema.yaml
        #[arg(long)]
        schema_path: PathBuf,
        /// Output format (overrides the config file)
        #[arg(long, value_enum)]
        target: Option<TargetFormat>,
        /// Converter configuration file (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output file for the JSON array (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Convert what can be converted and report the operations that failed
        #[arg(long)]
        best_effort: bool,
    },
    /// Write the spec with every local $ref inlined
    Dereference {
        /// Path to OpenAPI schema (YAML or JSON)
        #[arg(long)]
        schema_path: PathBuf,
        /// Output file, JSON when it ends in .json and YAML otherwise (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a summary of the spec and its operations
    Inspect {
        /// Path to OpenAPI schema (YAML or JSON)
        #[arg(long)]
        schema_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Convert {
            schema_path,
            target,
            config,
            output,
            best_effort,
        } => convert(&schema_path, target, config.as_deref(), output.as_deref(), best_effort).await,
        Commands::Dereference {
            schema_path,
            output,
        } => dereference(&schema_path, output.as_deref()).await,
        Commands::Inspect { schema_path } => inspect(&schema_path).await,
    }
}

async fn load_document(schema_path: &Path) -> anyhow::Result<Document> {
    tracing::info!("Loading OpenAPI schema from: {}", schema_path.display());
    Document::load(SpecSource::Path(schema_path.to_path_buf()))
        .await
        .with_context(|| format!("Failed to load OpenAPI schema {}", schema_path.display()))
}

async fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

async fn convert(
    schema_path: &Path,
    target: Option<TargetFormat>,
    config_path: Option<&Path>,
    output: Option<&Path>,
    best_effort: bool,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => ConverterConfig::from_file(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConverterConfig::default(),
    };
    if let Some(target) = target {
        config.target = target;
    }

    let document = load_document(schema_path).await?;
    let converter = Converter::new(document, config)?;
    tracing::info!("Converting to {} definitions", converter.config().target);

    if !best_effort {
        let (descriptors, json) = converter.convert()?;
        write_output(output, &json).await?;
        tracing::info!("Converted {} operations", descriptors.len());
        return Ok(());
    }

    let report = converter.convert_report()?;
    write_output(output, &report.to_json()?).await?;
    for failure in &report.failures {
        eprintln!("{}: {}", failure.label, failure.error);
    }
    if !report.is_complete() {
        anyhow::bail!(
            "{} of {} operations could not be converted",
            report.failures.len(),
            report.failures.len() + report.descriptors.len()
        );
    }
    tracing::info!("Converted {} operations", report.descriptors.len());
    Ok(())
}

async fn dereference(schema_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let document = load_document(schema_path).await?;
    let resolved = resolver::dereference(&document)?;
    let as_json = output
        .and_then(Path::extension)
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    let content = if as_json {
        serde_json::to_string_pretty(&resolved)?
    } else {
        serde_yaml::to_string(&resolved)?
    };
    write_output(output, &content).await
}

async fn inspect(schema_path: &Path) -> anyhow::Result<()> {
    let document = load_document(schema_path).await?;
    println!("Title:    {}", document.title().unwrap_or("(untitled)"));
    println!("Version:  {}", document.api_version().unwrap_or("(unversioned)"));
    println!("OpenAPI:  {}", document.spec_version());
    match document.base_url() {
        Some(url) => println!("Base URL: {url}"),
        None => println!("Base URL: (none)"),
    }

    let operations = extract_operations(&document)?;
    println!("Operations ({}):", operations.len());
    for op in &operations {
        let deprecated = if op.deprecated { " [deprecated]" } else { "" };
        println!(
            "  {:<40} {}{}",
            op.label(),
            naming::function_name(op),
            deprecated
        );
    }
    Ok(())
}
