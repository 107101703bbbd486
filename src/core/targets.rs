//! # Target Discovery Module / 目标发现模块
//!
//! Enumerates the candidate test targets of a channel from its test
//! directory. Discovery is a pure directory listing with three exclusions:
//! wrong extension, a leading underscore (private helper files) and an
//! explicit per-channel skip list. The optional name filter is applied later,
//! at dispatch time, so skipped targets can still be logged.
//!
//! 从通道的测试目录枚举候选测试目标。发现过程是纯目录列举，
//! 带三种排除：扩展名不符、前导下划线（私有辅助文件）和通道显式跳过列表。
//! 可选的名称过滤器在之后的调度阶段应用，因此被跳过的目标仍可被记录。

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A single discovered test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Full path of the test file.
    pub path: PathBuf,
    /// File name including the extension.
    pub name: String,
    /// File name with the extension removed; for Scala targets this is the
    /// class name to run.
    /// 去掉扩展名的文件名；对 Scala 目标而言即要运行的类名。
    pub stem: String,
}

impl Target {
    /// Substring match of the filter against the target path. `None` matches
    /// every target.
    pub fn matches(&self, filter: Option<&str>) -> bool {
        match filter {
            None => true,
            Some(needle) => self.path.to_string_lossy().contains(needle),
        }
    }
}

/// Lists the test targets of `dir`: plain files with the given extension,
/// excluding names with a leading underscore and skip-list members. The
/// result is sorted by path so runs are reproducible.
///
/// 列举 `dir` 中的测试目标：具有给定扩展名的普通文件，
/// 排除前导下划线的名称和跳过列表成员。结果按路径排序以保证运行可复现。
pub fn discover(dir: &Path, extension: &str, skip_list: &HashSet<&str>) -> Result<Vec<Target>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list test directory {}", dir.display()))?;

    let mut targets = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read an entry of {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(extension) || name.starts_with('_') || skip_list.contains(name) {
            continue;
        }
        let stem = name[..name.len() - extension.len()].to_string();
        targets.push(Target {
            path: path.clone(),
            name: name.to_string(),
            stem,
        });
    }

    targets.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(targets)
}
