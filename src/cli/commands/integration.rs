//! # Integration Command Module / 集成命令模块
//!
//! This module implements the `integration` command, which validates the run
//! configuration and dispatches the selected test channels in order. Every
//! validation happens before the first side effect; a failing channel aborts
//! the channels after it, but the summary and the optional JSON report are
//! still produced so the failing target remains identifiable.
//!
//! 此模块实现 `integration` 命令：验证运行配置并按顺序调度选定的测试通道。
//! 所有验证都发生在第一个副作用之前；某个通道失败会中止其后的通道，
//! 但摘要和可选的 JSON 报告仍会生成，以便定位失败的目标。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::*;

use crate::core::channels;
use crate::core::config::{IntegrationConfig, IntegrationOptions};
use crate::core::models::RunReport;
use crate::infra::command::{CommandRunner, SystemRunner};
use crate::infra::fs::{read_project_version, ArtifactCaches};
use crate::infra::t;
use crate::reporting::{console, summary};

/// Executes the integration command with the provided arguments.
///
/// # Arguments
/// * `options` - The raw integration flags as parsed
/// * `project_dir` - Root directory of the project under test
/// * `report_path` - Optional path for the JSON run report
///
/// # Returns
/// A Result carrying the first channel failure, if any
pub async fn execute(
    options: IntegrationOptions,
    project_dir: PathBuf,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let root = fs::canonicalize(&project_dir).with_context(|| {
        t!("run.project_dir_not_found", path = project_dir.display()).to_string()
    })?;

    let default_version = read_project_version(&root)?;
    let config = IntegrationConfig::resolve(options, default_version)?;
    println!("{}", t!("run.version_resolved", version = &config.version));

    let caches = ArtifactCaches::resolve();
    let runner = SystemRunner;
    let mut report = RunReport::new(&config.version);

    let outcome = dispatch(&config, &root, &caches, &runner, &mut report).await;
    report.finish();

    console::print_summary(&report);

    if let Some(path) = &report_path {
        match summary::write_report(path, &report) {
            Ok(()) => println!("{}", t!("report.written", path = path.display())),
            Err(e) => eprintln!("{} {}", t!("report.write_failed").red(), e),
        }
    }

    if outcome.is_ok() {
        println!("\n{}", t!("run.all_passed").green().bold());
    }
    outcome
}

/// Runs the channels the configuration selected, in the fixed order. The
/// storage channel is exclusive: when selected, nothing else runs.
async fn dispatch(
    config: &IntegrationConfig,
    root: &Path,
    caches: &ArtifactCaches,
    runner: &dyn CommandRunner,
    report: &mut RunReport,
) -> Result<()> {
    if config.storage_integration {
        return channels::run_storage_dynamodb(config, root, caches, runner, report).await;
    }

    if config.run_scala {
        channels::run_scala(config, root, caches, runner, report).await?;
    }
    if config.run_python {
        channels::run_python(config, root, caches, runner, report).await?;
        channels::run_missing_storage_jar(config, root, caches, runner, report).await?;
    }
    if config.run_pip {
        channels::run_pip(config, root, caches, runner, report).await?;
    }
    Ok(())
}
