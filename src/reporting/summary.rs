//! # Run Report Module / 运行报告模块
//!
//! Persists the run record as pretty-printed JSON for CI consumers.
//!
//! 将运行记录以带缩进的 JSON 形式持久化，供 CI 消费。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::models::RunReport;

pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json =
        serde_json::to_string_pretty(report).context("Failed to serialize the run report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write the run report to {}", path.display()))?;
    Ok(())
}
