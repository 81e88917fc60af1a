//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch directory holding manifests for one test.
pub struct TestFixture {
    dir: TempDir,
}

/// Exit status and captured streams of one `cf-discover` run.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    fn from_output(output: Output) -> Self {
        RunResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Parse stdout as JSON, panicking with stderr on failure.
    pub fn json(&self) -> Value {
        assert!(self.success, "cf-discover failed: {}", self.stderr);
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        TestFixture {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture parent");
        }
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    /// Run the binary with a clean logging environment.
    pub fn run<I, S>(&self, args: I) -> RunResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let output = Command::new(env!("CARGO_BIN_EXE_cf-discover"))
            .args(args)
            .env_remove("CF_DISCOVER_LOG")
            .env("CF_HOME", self.dir.path())
            .current_dir(self.dir.path())
            .output()
            .expect("spawn cf-discover");
        RunResult::from_output(output)
    }
}
