//! Waymark CLI - inspect placeholder paths and resolve them against a snapshot
//!
//! Usage:
//!   waymark parse <path>
//!   waymark placeholders <template>
//!   waymark resolve --snapshot <world.json> --entity <Type> --id <id> (--path <p>... | --template <t>)
//!   waymark cycle --edges <edges.json> --field <id> --depends-on <id>
//!
//! Examples:
//!   waymark parse "{Town.Districts.Count}"
//!   waymark resolve --snapshot world.json --entity District --id 1 --template "{Name} lies in {Town.Name}" --known Name=North

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use waymark::config::Settings;
use waymark::dependency::{CycleDetector, DependencyEdge, FieldId};
use waymark::path::parse_with_max_depth;
use waymark::resolution::{
    extract_placeholders, interpolate, PlaceholderResolver, ResolutionRequest,
};
use waymark::snapshot::Snapshot;
use waymark::{logging, WaymarkError};

#[derive(Parser)]
#[command(name = "waymark")]
#[command(about = "Waymark - layered placeholder resolution for dynamic forms")]
#[command(version)]
struct Cli {
    /// Path to a waymark.toml (defaults to the usual search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a placeholder path and show its classification
    Parse {
        /// Path, with or without braces
        path: String,
    },

    /// List the placeholders of a message template
    Placeholders {
        template: String,
    },

    /// Resolve paths rooted at one entity of a snapshot
    Resolve {
        /// Snapshot file (defaults to [snapshot].path from the config)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Root entity type
        #[arg(short, long)]
        entity: String,

        /// Root entity id
        #[arg(short, long)]
        id: String,

        /// Paths to resolve
        #[arg(short, long = "path", conflicts_with = "template")]
        paths: Vec<String>,

        /// Template whose placeholders are resolved and substituted
        #[arg(short, long)]
        template: Option<String>,

        /// Direct values as key=value
        #[arg(short, long = "known", value_parser = parse_key_value)]
        known: Vec<(String, String)>,
    },

    /// Check whether a new dependency edge would close a cycle
    Cycle {
        /// JSON file with existing edges: [{"fieldId": 1, "dependsOnFieldId": 2}, ...]
        #[arg(long)]
        edges: PathBuf,

        #[arg(long)]
        field: FieldId,

        #[arg(long)]
        depends_on: FieldId,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Text,
    /// JSON output
    Json,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.logging);

    let result = match cli.command {
        Commands::Parse { path } => cmd_parse(&path, &settings, cli.output),
        Commands::Placeholders { template } => cmd_placeholders(&template, cli.output),
        Commands::Resolve {
            snapshot,
            entity,
            id,
            paths,
            template,
            known,
        } => {
            cmd_resolve(
                snapshot,
                entity,
                id,
                paths,
                template,
                known,
                &settings,
                cli.output,
            )
            .await
        }
        Commands::Cycle {
            edges,
            field,
            depends_on,
        } => cmd_cycle(edges, field, depends_on, cli.output).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_parse(raw: &str, settings: &Settings, output: OutputFormat) -> Result<ExitCode, WaymarkError> {
    let path = parse_with_max_depth(raw, settings.resolution.max_depth)?;

    match output {
        OutputFormat::Json => {
            let value = json!({
                "fullPath": path.full_path(),
                "segments": path.segments(),
                "depth": path.depth(),
                "layer": path.layer().number(),
                "aggregate": path.aggregate_operator().map(|op| op.as_str()),
                "prefetchChains": path.prefetch_chains(),
            });
            println!("{}", value);
        }
        OutputFormat::Text => {
            println!("Path:      {}", path.full_path());
            println!("Segments:  {}", path.segments().join(", "));
            println!("Depth:     {}", path.depth());
            println!("Layer:     {} ({:?})", path.layer().number(), path.layer());
            if let Some(op) = path.aggregate_operator() {
                println!("Aggregate: {}", op);
            }
            let chains = path.prefetch_chains();
            if !chains.is_empty() {
                println!("Prefetch:  {}", chains.join(", "));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_placeholders(template: &str, output: OutputFormat) -> Result<ExitCode, WaymarkError> {
    let placeholders = extract_placeholders(template);
    match output {
        OutputFormat::Json => println!("{}", json!(placeholders)),
        OutputFormat::Text => {
            for placeholder in &placeholders {
                println!("{}", placeholder);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_resolve(
    snapshot: Option<PathBuf>,
    entity: String,
    id: String,
    paths: Vec<String>,
    template: Option<String>,
    known: Vec<(String, String)>,
    settings: &Settings,
    output: OutputFormat,
) -> Result<ExitCode, WaymarkError> {
    let snapshot_path = match snapshot {
        Some(path) => path,
        None => match settings.snapshot.resolved_path()? {
            Some(path) => path,
            None => {
                eprintln!("No snapshot given: pass --snapshot or set [snapshot].path");
                return Ok(ExitCode::FAILURE);
            }
        },
    };
    let parts = Snapshot::from_file(&snapshot_path)?.into_parts();
    let resolver = PlaceholderResolver::new(Arc::new(parts.registry), Arc::new(parts.store))
        .with_settings(settings.resolution.clone());

    let paths = match &template {
        Some(template) => extract_placeholders(template),
        None => paths,
    };
    let known: BTreeMap<String, String> = known.into_iter().collect();
    let request = ResolutionRequest::new(entity, id)
        .with_paths(paths)
        .with_known_values(known);

    let result = resolver.resolve_all(&request).await?;
    let rendered = template
        .as_deref()
        .filter(|_| result.is_complete())
        .map(|template| interpolate(template, &result.values))
        .transpose()?;

    match output {
        OutputFormat::Json => {
            let value = json!({
                "values": result.values,
                "errors": result.errors,
                "rendered": rendered,
            });
            println!("{}", value);
        }
        OutputFormat::Text => {
            for (path, value) in &result.values {
                println!("{} = {}", path, value);
            }
            for error in &result.errors {
                println!("{} ! {}: {}", error.path, error.kind, error.detail);
            }
            if let Some(rendered) = &rendered {
                println!();
                println!("{}", rendered);
            }
        }
    }

    Ok(if result.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn cmd_cycle(
    edges: PathBuf,
    field: FieldId,
    depends_on: FieldId,
    output: OutputFormat,
) -> Result<ExitCode, WaymarkError> {
    let content = match fs::read_to_string(&edges) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", edges.display(), e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let edges: Vec<DependencyEdge> = match serde_json::from_str(&content) {
        Ok(edges) => edges,
        Err(e) => {
            eprintln!("Error parsing edges: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let detector = CycleDetector::new(edges);
    let chain = detector.find_cycle(field, depends_on).await?;

    match output {
        OutputFormat::Json => println!("{}", json!({ "cycle": chain })),
        OutputFormat::Text => match &chain {
            Some(chain) => {
                let chain: Vec<String> = chain.iter().map(|id| id.to_string()).collect();
                println!("Cycle: {}", chain.join(" -> "));
            }
            None => println!("No cycle"),
        },
    }

    Ok(if chain.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
