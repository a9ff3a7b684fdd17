//! taskgraph CLI - command-line front end for the scheduling engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskgraph_core::{
    auto_schedule, check_capacity, compute_dependency_path, recalculate_schedule,
    validate_duration, Dependency, Feature, FeatureUpdate, PositionMap, SchedulingRule,
};

#[derive(Parser)]
#[command(name = "taskgraph")]
#[command(author, version, about = "Project-schedule propagation engine", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recalculate every feature's dates from scratch
    Recalc {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Move one feature and propagate the change through its dependents
    Move {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Id of the feature being moved
        #[arg(long)]
        feature: String,

        /// New start date, YYYY-MM-DD
        #[arg(long)]
        start: chrono::NaiveDate,

        /// New end date, YYYY-MM-DD
        #[arg(long)]
        end: chrono::NaiveDate,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate feature durations and report capacity warnings
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Compute dependency arrow paths against a pixel position map
    Route {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON file mapping feature id to its rendered box
        #[arg(long)]
        positions: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

/// The on-disk shape a host application hands the CLI: a flat snapshot of
/// the three inputs every scheduling operation needs.
#[derive(serde::Deserialize)]
struct ProjectFile {
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
    #[serde(default)]
    rules: Vec<SchedulingRule>,
}

fn load_project(path: &Path) -> Result<ProjectFile> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse '{}' as a project file", path.display()))
}

fn load_positions(path: &Path) -> Result<PositionMap> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse '{}' as a position map", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recalc { file, format } => cmd_recalc(&file, &format),
        Commands::Move {
            file,
            feature,
            start,
            end,
            format,
        } => cmd_move(&file, &feature, start, end, &format),
        Commands::Check { file, format } => cmd_check(&file, &format),
        Commands::Route {
            file,
            positions,
            format,
        } => cmd_route(&file, &positions, &format),
    }
}

fn cmd_recalc(file: &Path, format: &str) -> Result<()> {
    let project = load_project(file)?;
    let updates = recalculate_schedule(&project.features, &project.dependencies, &project.rules);
    tracing::info!(updated = updates.len(), "recalculated schedule");
    print_updates(&updates, format)
}

fn cmd_move(
    file: &Path,
    feature_id: &str,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
    format: &str,
) -> Result<()> {
    let project = load_project(file)?;
    let updates = auto_schedule(feature_id, (start, end), &project.features, &project.dependencies);
    tracing::info!(feature = feature_id, updated = updates.len(), "moved feature");
    print_updates(&updates, format)
}

fn cmd_check(file: &Path, format: &str) -> Result<()> {
    let project = load_project(file)?;

    let violations: Vec<(String, String)> = project
        .features
        .iter()
        .filter_map(|feature| {
            let result = validate_duration(feature, &project.rules);
            (!result.valid).then(|| (feature.id.clone(), result.message.unwrap_or_default()))
        })
        .collect();
    let warnings = check_capacity(&project.features, &project.rules);

    if format == "json" {
        let payload = serde_json::json!({
            "duration_violations": violations.iter().map(|(id, message)| {
                serde_json::json!({ "feature_id": id, "message": message })
            }).collect::<Vec<_>>(),
            "capacity_warnings": warnings,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for (id, message) in &violations {
            println!("duration violation: {id}: {message}");
        }
        for warning in &warnings {
            println!(
                "capacity warning: {} has {} concurrent feature(s), limit is {}",
                warning.resource_id, warning.actual, warning.max_concurrent
            );
        }
        if violations.is_empty() && warnings.is_empty() {
            println!("no violations or capacity warnings");
        }
    }

    if !violations.is_empty() {
        anyhow::bail!("{} duration violation(s) found", violations.len());
    }
    Ok(())
}

fn cmd_route(file: &Path, positions_file: &Path, format: &str) -> Result<()> {
    let project = load_project(file)?;
    let positions: PositionMap = load_positions(positions_file)?;

    let results: Vec<(String, Option<String>)> = project
        .dependencies
        .iter()
        .map(|dep| (dep.id.clone(), compute_dependency_path(dep, &positions)))
        .collect();

    if format == "json" {
        let payload: Vec<_> = results
            .iter()
            .map(|(id, path)| serde_json::json!({ "dependency_id": id, "path": path }))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for (id, path) in &results {
            match path {
                Some(p) => println!("{id}: {p}"),
                None => println!("{id}: no path (missing feature position)"),
            }
        }
    }
    Ok(())
}

fn print_updates(updates: &[FeatureUpdate], format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(updates)?);
    } else if updates.is_empty() {
        println!("no changes");
    } else {
        for update in updates {
            println!("{}: {} -> {}", update.id, update.start_at, update.end_at);
        }
    }
    Ok(())
}
