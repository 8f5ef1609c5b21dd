// tests/supervisor_process.rs
//
// These tests spawn real shell processes.

#![cfg(unix)]

mod common;

use std::time::{Duration, Instant};

use benchgrid::config::BenchConfig;
use benchgrid::errors::BenchgridError;
use benchgrid::exec::process_tree;
use benchgrid::exec::{supervise, ProcessExecutor, SupervisorOptions, Termination};
use benchgrid::fs::{FileSystem, RealFileSystem};
use benchgrid::runner::{ExperimentRunner, RunSettings};
use benchgrid::select_group;
use benchgrid::types::Measurement;
use benchgrid_test_utils::builders::{BenchConfigBuilder, SubExperimentBuilder, ToolConfigBuilder};
use sysinfo::Pid;
use tempfile::tempdir;

use crate::common::{init_tracing, with_timeout, TestResult};

fn quick_options(timeout: Duration) -> SupervisorOptions {
    SupervisorOptions {
        timeout,
        kill_grace: Duration::from_millis(500),
        sample_interval: Duration::from_millis(50),
        measure_memory: false,
    }
}

#[tokio::test]
async fn captures_both_streams_and_elapsed_time() -> TestResult {
    init_tracing();

    let run = with_timeout(supervise(
        "echo hello; echo oops 1>&2",
        &quick_options(Duration::from_secs(10)),
    ))
    .await?;

    assert_eq!(run.termination, Termination::Exited(Some(0)));
    assert_eq!(String::from_utf8_lossy(&run.stdout), "hello\n");
    assert_eq!(String::from_utf8_lossy(&run.stderr), "oops\n");
    assert_eq!(run.combined_output(), "hello\n\noops\n");
    assert!(run.elapsed.is_some());
    assert!(run.output_complete);
    assert_eq!(run.peak_memory, None);
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_still_a_result() -> TestResult {
    init_tracing();

    let run = with_timeout(supervise(
        "echo partial; exit 3",
        &quick_options(Duration::from_secs(10)),
    ))
    .await?;

    assert_eq!(run.exit_code(), Some(3));
    assert!(!run.timed_out());
    assert!(run.elapsed.is_some());
    assert_eq!(String::from_utf8_lossy(&run.stdout), "partial\n");
    Ok(())
}

#[tokio::test]
async fn missing_binary_is_a_launch_failure() -> TestResult {
    init_tracing();

    let result = with_timeout(supervise(
        "benchgrid-definitely-not-installed-tool --help",
        &quick_options(Duration::from_secs(10)),
    ))
    .await;

    match result {
        Err(BenchgridError::LaunchFailure { command, source }) => {
            assert!(command.starts_with("benchgrid-definitely-not-installed-tool"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        Err(e) => panic!("Expected LaunchFailure, got: {e:?}"),
        Ok(run) => panic!("Expected LaunchFailure, got a run: {run:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn non_executable_file_is_a_launch_failure() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let script = dir.path().join("not-executable.sh");
    RealFileSystem.write(&script, b"#!/bin/sh\necho never\n")?;

    let result = with_timeout(supervise(
        &script.display().to_string(),
        &quick_options(Duration::from_secs(10)),
    ))
    .await;

    match result {
        Err(BenchgridError::LaunchFailure { source, .. }) => {
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
        }
        Err(e) => panic!("Expected LaunchFailure, got: {e:?}"),
        Ok(run) => panic!("Expected LaunchFailure, got a run: {run:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn missing_tool_binary_yields_all_empty_row() -> TestResult {
    init_tracing();

    let data = tempdir()?;
    let out = tempdir()?;
    let fs = RealFileSystem;
    fs.write(&data.path().join("ds1/text/h1.txt"), b"history")?;

    let cfg: BenchConfig = BenchConfigBuilder::new()
        .base_dir(data.path())
        .output_dir(out.path())
        .with_tool(
            "ghost",
            ToolConfigBuilder::new("/nonexistent/benchgrid-ghost-tool {input_path}", "text").build(),
        )
        .with_sub_experiment(
            "missing",
            SubExperimentBuilder::new("missing")
                .dir("ds1")
                .tool("ghost")
                .record(Measurement::Time)
                .record(Measurement::Memory)
                .build(),
        )
        .build();

    let executor = ProcessExecutor::new(Duration::from_millis(500), Duration::from_millis(50));
    let settings = RunSettings::from_config(&cfg, Some(Duration::from_secs(10)), None);
    let mut runner = ExperimentRunner::new(executor, RealFileSystem, settings);

    let reports = with_timeout(runner.run_group(select_group(&cfg, "missing")?)).await?;
    let result = &reports[0].results[0];
    assert_eq!(result.elapsed_secs, None);
    assert_eq!(result.peak_memory_bytes, None);
    assert_eq!(result.exit_code, None);

    let csv = fs.read_to_string(&reports[0].output_path)?;
    let row = csv.lines().nth(1).ok_or("missing data row")?;
    assert!(row.starts_with("ghost,"));
    assert!(row.ends_with(",,"), "row: {row}");
    Ok(())
}

#[tokio::test]
async fn timeout_kills_the_whole_tree() -> TestResult {
    init_tracing();

    let started = Instant::now();
    let run = with_timeout(supervise(
        "sleep 30 & echo $!; wait",
        &quick_options(Duration::from_millis(300)),
    ))
    .await?;

    assert!(run.timed_out());
    assert_eq!(run.elapsed, None);
    assert!(started.elapsed() < Duration::from_secs(10));

    let grandchild: u32 = String::from_utf8_lossy(&run.stdout).trim().parse()?;

    // Give the reaper a moment; a zombie counts as dead.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let system = process_tree::snapshot();
    assert!(
        !process_tree::is_alive(&system, Pid::from_u32(grandchild)),
        "background sleep {grandchild} outlived its timed-out parent"
    );
    Ok(())
}

#[tokio::test]
async fn memory_sampling_reports_a_peak() -> TestResult {
    init_tracing();

    let mut options = quick_options(Duration::from_secs(10));
    options.measure_memory = true;

    let run = with_timeout(supervise("sleep 1", &options)).await?;

    assert_eq!(run.exit_code(), Some(0));
    let peak = run.peak_memory.ok_or("expected a memory sample")?;
    assert!(peak > 0);
    Ok(())
}

#[tokio::test]
async fn instant_command_still_reports_memory() -> TestResult {
    init_tracing();

    let mut options = quick_options(Duration::from_secs(10));
    options.measure_memory = true;

    for _ in 0..10 {
        let run = with_timeout(supervise("echo Construction: 5ms", &options)).await?;
        assert_eq!(run.exit_code(), Some(0));
        assert!(run.peak_memory.is_some(), "memory requested but missing");
    }
    Ok(())
}

#[tokio::test]
async fn memory_is_absent_when_not_requested() -> TestResult {
    init_tracing();

    let run = with_timeout(supervise("sleep 0.2", &quick_options(Duration::from_secs(10)))).await?;
    assert_eq!(run.peak_memory, None);
    Ok(())
}

#[tokio::test]
async fn end_to_end_grid_on_real_directories() -> TestResult {
    init_tracing();

    let data = tempdir()?;
    let out = tempdir()?;
    let fs = RealFileSystem;
    fs.write(&data.path().join("ds1/text/h1.txt"), b"Construction: 1200ms\n")?;
    fs.write(&data.path().join("ds1/text/h2.txt"), b"Construction: 300ms\n")?;

    let cfg: BenchConfig = BenchConfigBuilder::new()
        .base_dir(data.path())
        .output_dir(out.path())
        .with_tool(
            "cat",
            ToolConfigBuilder::new("cat {input_path}", "text")
                .stage("construction", r"Construction: (\d+)ms")
                .build(),
        )
        .with_sub_experiment(
            "e2e",
            SubExperimentBuilder::new("e2e")
                .dir("ds1")
                .dir("absent")
                .tool("cat")
                .record(Measurement::Time)
                .record(Measurement::Memory)
                .record(Measurement::Stages)
                .build(),
        )
        .build();

    let executor = ProcessExecutor::new(Duration::from_millis(500), Duration::from_millis(50));
    let settings = RunSettings::from_config(&cfg, Some(Duration::from_secs(10)), None);
    let mut runner = ExperimentRunner::new(executor, RealFileSystem, settings);

    let reports = with_timeout(runner.run_group(select_group(&cfg, "e2e")?)).await?;
    assert_eq!(reports[0].results.len(), 2);
    assert_eq!(reports[0].output_path, out.path().join("e2e_results.csv"));

    let csv = fs.read_to_string(&reports[0].output_path)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "tool,input_path,max_memory_usage_mb,elapsed_time_s,construction"
    );
    assert_eq!(lines.len(), 3);
    for row in &lines[1..] {
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells[0], "cat");
        assert!(!cells[2].is_empty(), "memory cell empty in row: {row}");
        assert!(!cells[3].is_empty(), "elapsed cell empty in row: {row}");
    }
    assert!(lines[1].ends_with(",1.2"), "row: {}", lines[1]);
    assert!(lines[2].ends_with(",0.3"), "row: {}", lines[2]);
    Ok(())
}
