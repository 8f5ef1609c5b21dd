// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod extract;
pub mod fs;
pub mod logging;
pub mod registry;
pub mod runner;
pub mod types;

use std::time::Duration;

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, BenchConfig, SubExperiment};
use crate::errors::{BenchgridError, Result};
use crate::exec::ProcessExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::runner::{ExperimentRunner, RunSettings};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - experiment-group selection
/// - the process executor and the runner
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let subs = select_group(&cfg, &args.group)?;

    let settings = RunSettings::from_config(
        &cfg,
        args.timeout.map(Duration::from_secs),
        args.output_dir.clone(),
    );
    let executor = ProcessExecutor::new(
        Duration::from_secs(cfg.settings().kill_grace_secs),
        Duration::from_millis(cfg.settings().sample_interval_ms),
    );
    let mut runner = ExperimentRunner::new(executor, RealFileSystem, settings);

    if args.dry_run {
        print_dry_run(&args.group, subs, &runner);
        return Ok(());
    }

    info!(
        group = %args.group,
        sub_experiments = subs.len(),
        "running experiment group"
    );

    tokio::select! {
        res = runner.run_group(subs) => {
            let reports = res?;
            for report in &reports {
                info!(
                    sub_experiment = %report.name,
                    path = %report.output_path.display(),
                    "results for sub-experiment written"
                );
            }
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; stopping before remaining runs");
            Err(BenchgridError::Other(anyhow::anyhow!("interrupted by Ctrl-C")))
        }
    }
}

/// Look up a group by name; an unknown name is fatal before any work starts.
pub fn select_group<'a>(cfg: &'a BenchConfig, name: &str) -> Result<&'a [SubExperiment]> {
    cfg.group(name).ok_or_else(|| BenchgridError::UnknownGroup {
        name: name.to_string(),
        known: cfg.group_names().map(str::to_string).collect(),
    })
}

/// Print the resolved plan: sub-experiments, tools, directories, run counts.
fn print_dry_run<E, F>(group: &str, subs: &[SubExperiment], runner: &ExperimentRunner<E, F>)
where
    E: crate::exec::ToolExecutor,
    F: FileSystem,
{
    let settings = runner.settings();
    println!("benchgrid dry-run");
    println!("  group = {group}");
    println!("  base_dir = {}", settings.base_dir.display());
    println!("  output_dir = {}", settings.output_dir.display());
    println!();

    for sub in subs {
        let requests = runner.plan(sub);
        println!("sub-experiment {}:", sub.name);
        println!("    output: {}", sub.output_file_name());
        println!("    record: {}", sub.measurements);
        println!("    timeout: {}s", settings.timeout_for(sub).as_secs());
        if let Some(ref base) = sub.base_dir {
            println!("    base_dir: {}", base.display());
        }
        println!("    dirs: {:?}", sub.dirs);
        for tool in &sub.tools {
            let runs = requests.iter().filter(|r| r.tool_id() == tool.id()).count();
            println!("    - {} ({} inputs)", tool.id(), runs);
            println!("        cmd: {}", tool.command_template());
            println!("        input_folder: {}", tool.input_folder());
            if !tool.skip_patterns().is_empty() {
                println!("        skip: {:?}", tool.skip_patterns());
            }
        }
    }

    tracing::debug!("dry-run complete (no execution)");
}
