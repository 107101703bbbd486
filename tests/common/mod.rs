// Shared test helpers for integration tests
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::{tempdir, TempDir};

use channel_runner::core::config::{IntegrationConfig, IntegrationOptions};
use channel_runner::infra::command::{Captured, CommandRunner, Invocation};

/// Creates a minimal project root containing a version declaration file.
pub fn sample_project(version: &str) -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    fs::write(
        temp_dir.path().join("version.sbt"),
        format!("ThisBuild / version := \"{version}\"\n"),
    )
    .expect("Failed to write version.sbt");
    temp_dir
}

/// Populates the Python example directory with empty test scripts.
pub fn with_python_examples(root: &Path, files: &[&str]) {
    let dir = root.join("examples").join("python");
    fs::create_dir_all(&dir).expect("Failed to create examples/python");
    for file in files {
        fs::write(dir.join(file), "print('ok')\n").expect("Failed to write example script");
    }
}

/// Populates the Scala example source directory with empty example classes.
pub fn with_scala_examples(root: &Path, files: &[&str]) {
    let dir = root
        .join("examples")
        .join("scala")
        .join("src")
        .join("main")
        .join("scala")
        .join("example");
    fs::create_dir_all(&dir).expect("Failed to create the Scala example sources");
    for file in files {
        fs::write(dir.join(file), "object Example\n").expect("Failed to write example class");
    }
}

/// Populates the storage backend integration test directory.
pub fn with_storage_tests(root: &Path, files: &[&str]) {
    let dir = root.join("storage-s3-dynamodb").join("integration_tests");
    fs::create_dir_all(&dir).expect("Failed to create the storage test directory");
    for file in files {
        fs::write(dir.join(file), "print('ok')\n").expect("Failed to write storage test");
    }
}

/// A resolved configuration with default options and the given version.
pub fn test_config(version: &str) -> IntegrationConfig {
    IntegrationConfig::resolve(IntegrationOptions::default(), version.to_string())
        .expect("Default options must validate")
}

/// A `CommandRunner` that never spawns anything. It records every invocation
/// and answers with a scripted queue of exit codes, defaulting to success
/// once the queue is exhausted.
pub struct ScriptedRunner {
    codes: Mutex<VecDeque<i32>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn with_codes(codes: &[i32]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().copied().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn all_zero() -> Self {
        Self::with_codes(&[])
    }

    /// The recorded invocations, in execution order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// The recorded command lines, in execution order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.command_line()).collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn stream(&self, invocation: &Invocation) -> Result<i32> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok(self.codes.lock().unwrap().pop_front().unwrap_or(0))
    }

    async fn capture(&self, invocation: &Invocation) -> Result<Captured> {
        let code = self.stream(invocation).await?;
        Ok(Captured {
            code,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
