mod compile;
mod error;

use clap::{Parser, Subcommand};
use error::CliResult;
use sf_mission::MissionError;
use sf_results::{ResultStore, RunManifest, compute_run_id};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "Segflow CLI - Aircraft mission segment solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate mission file syntax and structure
    Validate {
        /// Path to the mission YAML file
        mission_path: PathBuf,
    },
    /// Solve every segment of a mission and store the results
    Run {
        /// Path to the mission YAML file
        mission_path: PathBuf,
        /// Result store directory
        #[arg(long, default_value = ".segflow/runs")]
        store: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs for a mission
    Runs {
        /// Result store directory
        store: PathBuf,
        /// Mission name
        mission: String,
    },
    /// Show details of a stored run
    Show {
        /// Result store directory
        store: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export one stored condition array as CSV
    Export {
        /// Result store directory
        store: PathBuf,
        /// Run ID
        run_id: String,
        /// Segment name
        segment: String,
        /// Condition path (e.g., weights.total_mass, frames.inertial.position)
        path: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { mission_path } => cmd_validate(&mission_path),
        Commands::Run {
            mission_path,
            store,
            no_cache,
        } => cmd_run(&mission_path, store, !no_cache),
        Commands::Runs { store, mission } => cmd_runs(store, &mission),
        Commands::Show { store, run_id } => cmd_show(store, &run_id),
        Commands::Export {
            store,
            run_id,
            segment,
            path,
            output,
        } => cmd_export(store, &run_id, &segment, &path, output.as_deref()),
    }
}

fn cmd_validate(mission_path: &Path) -> CliResult<()> {
    println!("Validating mission: {}", mission_path.display());
    let def = sf_project::load_yaml(mission_path)?;
    let mission = compile::compile_mission(&def)?;
    println!(
        "✓ Mission '{}' is valid ({} segments)",
        mission.name(),
        mission.len()
    );
    Ok(())
}

fn cmd_run(mission_path: &Path, store: PathBuf, use_cache: bool) -> CliResult<()> {
    let def = sf_project::load_yaml(mission_path)?;
    let store = ResultStore::new(store)?;
    let run_id = compute_run_id(&def, SOLVER_VERSION)?;

    if use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        println!("✓ Loaded from cache: {}", run_id);
        print_manifest(&manifest);
        return Ok(());
    }

    println!("Running mission: {}", def.name);
    let mission = compile::compile_mission(&def)?;

    let start = Instant::now();
    let results = match mission.evaluate() {
        Ok(results) => results,
        Err(err) => {
            report_failure(&err);
            return Err(err.into());
        }
    };
    let solve_time = start.elapsed().as_secs_f64();

    let manifest = store.save_mission(&run_id, &results, SOLVER_VERSION)?;
    if manifest.all_converged() {
        println!("✓ Mission completed: {}", run_id);
    } else {
        println!("⚠ Mission completed with failed segments: {}", run_id);
    }
    println!("  Solve time: {:.3}s", solve_time);
    print_manifest(&manifest);
    Ok(())
}

fn report_failure(err: &MissionError) {
    match err {
        MissionError::SegmentFailed {
            segment,
            residual_norm,
            iterations,
            reason,
        } => {
            eprintln!("✗ Segment '{}' failed to converge", segment);
            eprintln!("  Reason:        {}", reason);
            eprintln!("  Residual norm: {:.3e}", residual_norm);
            eprintln!("  Iterations:    {}", iterations);
        }
        other => eprintln!("✗ {}", other),
    }
}

fn cmd_runs(store: PathBuf, mission: &str) -> CliResult<()> {
    let store = ResultStore::new(store)?;
    let runs = store.list_runs(mission)?;

    if runs.is_empty() {
        println!("No stored runs found for mission: {}", mission);
    } else {
        println!("Stored runs for mission '{}':", mission);
        for manifest in runs {
            let status = if manifest.all_converged() {
                "converged"
            } else {
                "failed"
            };
            println!(
                "  {} - {} ({} segments, {})",
                manifest.run_id,
                manifest.timestamp,
                manifest.segments.len(),
                status
            );
        }
    }
    Ok(())
}

fn cmd_show(store: PathBuf, run_id: &str) -> CliResult<()> {
    let store = ResultStore::new(store)?;
    let manifest = store.load_manifest(run_id)?;
    println!("Run: {}", manifest.run_id);
    println!("  Mission: {}", manifest.mission);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Solver version: {}", manifest.solver_version);
    println!("  Content digest: {}", manifest.content_digest);
    print_manifest(&manifest);
    Ok(())
}

fn print_manifest(manifest: &RunManifest) {
    println!("\nSegments:");
    for segment in &manifest.segments {
        let iterations = segment
            .iterations
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".to_string());
        let residual = segment
            .residual_norm
            .map(|r| format!("{:.3e}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<16} {:<10} {:<14} iterations={:<4} residual={}",
            segment.name, segment.kind, segment.status, iterations, residual
        );
    }
}

fn cmd_export(
    store: PathBuf,
    run_id: &str,
    segment: &str,
    path: &str,
    output: Option<&Path>,
) -> CliResult<()> {
    let store = ResultStore::new(store)?;
    let archive = store.load_segment(run_id, segment)?;
    let conditions = archive.to_conditions()?;
    let array = conditions.get(path).map_err(sf_results::ResultsError::from)?;

    let mut csv = String::new();
    let header: Vec<String> = (0..array.ncols()).map(|c| format!("{path}[{c}]")).collect();
    csv.push_str(&header.join(","));
    csv.push('\n');
    for row in array.row_iter() {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        csv.push_str(&values.join(","));
        csv.push('\n');
    }

    match output {
        Some(out) => {
            std::fs::write(out, csv)?;
            println!("✓ Exported {} rows to {}", array.nrows(), out.display());
        }
        None => {
            std::io::stdout().write_all(csv.as_bytes())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_with_defaults() {
        let cli = Cli::try_parse_from(["sf-cli", "run", "mission.yaml"]).unwrap();
        match cli.command {
            Commands::Run {
                mission_path,
                store,
                no_cache,
            } => {
                assert_eq!(mission_path, PathBuf::from("mission.yaml"));
                assert_eq!(store, PathBuf::from(".segflow/runs"));
                assert!(!no_cache);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_then_show_through_store() {
        let store = std::env::temp_dir().join(format!("sf_cli_run_{}", std::process::id()));
        let mission = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/hop.yaml");

        cmd_run(&mission, store.clone(), true).unwrap();
        let runs = ResultStore::new(store.clone())
            .unwrap()
            .list_runs("hop")
            .unwrap();
        assert_eq!(runs.len(), 1);
        let run_id = runs[0].run_id.clone();

        cmd_show(store.clone(), &run_id).unwrap();
        let out = store.join("mass.csv");
        cmd_export(
            store.clone(),
            &run_id,
            "cruise",
            "weights.total_mass",
            Some(&out),
        )
        .unwrap();
        let csv = std::fs::read_to_string(&out).unwrap();
        assert!(csv.starts_with("weights.total_mass[0]\n"));
        assert_eq!(csv.lines().count(), 9);

        // Second run is served from the cache.
        cmd_run(&mission, store.clone(), true).unwrap();
        assert_eq!(
            ResultStore::new(store.clone())
                .unwrap()
                .list_runs("hop")
                .unwrap()
                .len(),
            1
        );
        std::fs::remove_dir_all(&store).ok();
    }

    #[test]
    fn starved_mission_reports_segment() {
        let mut def = sf_project::load_yaml(
            &PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/hop.yaml"),
        )
        .unwrap();
        def.numerics.solver.max_iterations = Some(1);
        let err = compile::compile_mission(&def).unwrap().evaluate().unwrap_err();
        assert!(matches!(
            err,
            MissionError::SegmentFailed { ref segment, iterations: 1, .. } if segment == "climb"
        ));
        report_failure(&err);
        let cli_err: crate::error::CliError = err.into();
        assert!(cli_err.to_string().contains("climb"));
    }
}
