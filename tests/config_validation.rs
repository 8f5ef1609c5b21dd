// tests/config_validation.rs

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use benchgrid::config::{load_and_validate, DEFAULT_TIMEOUT_SECS};
use benchgrid::errors::BenchgridError;
use benchgrid::select_group;
use benchgrid::types::OutputFormat;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[test]
fn minimal_grid_gets_defaults() {
    let file = write_config(
        r#"
[tool.echo]
command = "echo {input_path}"
input_folder = "text"

[[group.smoke]]
name = "smoke"
dirs = ["ds1"]
tools = ["echo"]
record = ["time"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.settings().timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(cfg.settings().sample_interval_ms, 500);
    assert_eq!(cfg.settings().base_dir, PathBuf::from("."));

    let subs = select_group(&cfg, "smoke").unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].format, OutputFormat::Csv);
    assert_eq!(subs[0].output_file_name(), "smoke_results.csv");
    assert!(subs[0].measurements.elapsed_time);
    assert!(!subs[0].measurements.peak_memory);
    assert_eq!(subs[0].timeout, None);
}

#[test]
fn unknown_tool_reference_is_config_error() {
    let file = write_config(
        r#"
[tool.echo]
command = "echo {input_path}"
input_folder = "text"

[[group.smoke]]
name = "smoke"
dirs = ["ds1"]
tools = ["echo", "ghost"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(BenchgridError::ConfigError(msg)) => {
            assert!(msg.contains("unknown tool"), "message: {msg}");
            assert!(msg.contains("ghost"), "message: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_stage_regex_is_reported_with_tool_name() {
    let file = write_config(
        r#"
[tool.broken]
command = "run {input_path}"
input_folder = "text"
stages = [{ name = "construction", pattern = 'Construction: (\d+ms' }]

[[group.smoke]]
name = "smoke"
dirs = ["ds1"]
tools = ["broken"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(BenchgridError::InvalidPattern { tool, pattern, .. }) => {
            assert_eq!(tool, "broken");
            assert!(pattern.starts_with("Construction"));
        }
        Err(e) => panic!("Expected InvalidPattern, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn command_without_placeholder_is_rejected() {
    let file = write_config(
        r#"
[tool.noinput]
command = "run --everything"
input_folder = "text"

[[group.smoke]]
name = "smoke"
dirs = ["ds1"]
tools = ["noinput"]
"#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, BenchgridError::ConfigError(ref m) if m.contains("exactly one")));
}

#[test]
fn unknown_measurement_name_fails_to_parse() {
    let file = write_config(
        r#"
[tool.echo]
command = "echo {input_path}"
input_folder = "text"

[[group.smoke]]
name = "smoke"
dirs = ["ds1"]
tools = ["echo"]
record = ["throughput"]
"#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, BenchgridError::TomlError(_)), "got: {err:?}");
}

#[test]
fn stage_named_like_fixed_column_is_rejected() {
    let file = write_config(
        r#"
[config]
counter_column = "dfs_count"

[tool.clash]
command = "run {input_path}"
input_folder = "text"
stages = [{ name = "dfs_count", pattern = 'count: (\d+)' }]

[[group.smoke]]
name = "smoke"
dirs = ["ds1"]
tools = ["clash"]
"#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, BenchgridError::ConfigError(ref m) if m.contains("collides")));
}

#[test]
fn unknown_group_lists_known_groups() {
    let cfg = load_and_validate(demo("plume-figures.toml")).unwrap();

    match select_group(&cfg, "fig99") {
        Err(BenchgridError::UnknownGroup { name, known }) => {
            assert_eq!(name, "fig99");
            assert!(known.contains(&"fig8".to_string()));
            assert!(known.contains(&"fig13".to_string()));
        }
        Err(e) => panic!("Expected UnknownGroup, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn figure_demo_config_resolves_every_group() {
    let cfg = load_and_validate(demo("plume-figures.toml")).unwrap();

    let names: Vec<&str> = cfg.group_names().collect();
    assert_eq!(names, ["fig10", "fig11", "fig12", "fig13", "fig8", "fig9"]);

    let fig8 = select_group(&cfg, "fig8").unwrap();
    assert_eq!(fig8.len(), 5);
    assert_eq!(fig8[0].name, "fig8a");
    assert_eq!(fig8[0].tools.len(), 6);

    let fig12 = select_group(&cfg, "fig12").unwrap();
    assert!(fig12[1].measurements.counter);
    assert!(!fig12[1].measurements.elapsed_time);

    let plume = cfg.registry().get("Plume_TCC").unwrap();
    assert_eq!(plume.stages().len(), 2);
    assert!(plume.counter().is_some());
}

#[test]
fn table5_demo_config_is_json_with_skip_rules() {
    let cfg = load_and_validate(demo("plume-table5.toml")).unwrap();
    assert_eq!(cfg.settings().timeout_secs, 10);

    let subs = select_group(&cfg, "table5").unwrap();
    assert_eq!(subs[0].format, OutputFormat::Json);
    assert_eq!(subs[0].output_file_name(), "table5_results.json");

    let ra = cfg.registry().get("dbcop_RA").unwrap();
    assert!(ra.skips("history-tap-m"));
    assert!(!ra.skips("history-tap-a"));

    let rc = cfg.registry().get("Elle_0.1.9_RC").unwrap();
    assert!(rc.skips("tap-h"));
    assert!(!rc.skips("tap-g"));
}

#[test]
fn sub_experiment_timeout_is_resolved() {
    let file = write_config(
        r#"
[config]
timeout_secs = 120

[tool.echo]
command = "echo {input_path}"
input_folder = "text"

[[group.smoke]]
name = "quick"
dirs = ["ds1"]
tools = ["echo"]
timeout_secs = 5
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let subs = select_group(&cfg, "smoke").unwrap();
    assert_eq!(subs[0].timeout, Some(Duration::from_secs(5)));
}
