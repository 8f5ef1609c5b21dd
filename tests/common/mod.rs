#![allow(dead_code)]

use std::path::{Path, PathBuf};

use benchgrid::config::BenchConfig;
use benchgrid::fs::mock::MockFileSystem;
use benchgrid::runner::{ExperimentRunner, RunSettings};
use benchgrid_test_utils::fake_executor::FakeExecutor;

pub use benchgrid_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Base directory used by the mock-filesystem grids.
pub fn base() -> PathBuf {
    PathBuf::from("/data")
}

/// Output directory used by the mock-filesystem grids.
pub fn out() -> PathBuf {
    PathBuf::from("/out")
}

/// Runner over a mock filesystem with settings taken from `cfg`.
pub fn mock_runner(
    cfg: &BenchConfig,
    executor: FakeExecutor,
    fs: MockFileSystem,
) -> ExperimentRunner<FakeExecutor, MockFileSystem> {
    let settings = RunSettings::from_config(cfg, None, None);
    ExperimentRunner::new(executor, fs, settings)
}

/// Add one input entry (a directory) per name under `dir`.
pub fn add_inputs(fs: &MockFileSystem, dir: &Path, names: &[&str]) {
    for name in names {
        fs.add_dir(dir.join(name));
    }
}
