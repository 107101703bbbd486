//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations around a test
//! run: idempotent deletion of dependency caches and resolution of the
//! project version from the version declaration file.
//!
//! 此模块提供测试运行相关的文件系统操作：
//! 幂等删除依赖缓存，以及从版本声明文件解析项目版本。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::infra::t;

/// Recursively deletes a path if it exists, logging the deletion. An absent
/// path is a silent no-op, so a run never fails because a cache was already
/// clean.
///
/// 如果路径存在则递归删除并记录日志。路径不存在时静默跳过，
/// 因此缓存已干净时运行不会失败。
pub fn delete_if_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if path.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to delete directory {}", path.display()))?;
    } else {
        fs::remove_file(path)
            .with_context(|| format!("Failed to delete file {}", path.display()))?;
    }
    println!("{}", t!("fs.deleted", path = path.display()));
    Ok(())
}

/// The well-known local dependency caches that must be cleared before a test
/// dispatch so every run resolves its artifacts fresh: the ivy2 resolution
/// cache, the ivy2 local publish area and the shared m2 repository.
///
/// 测试调度前必须清除的本地依赖缓存：ivy2 解析缓存、ivy2 本地发布区
/// 和共享的 m2 仓库，确保每次运行都重新解析产物。
#[derive(Debug, Clone)]
pub struct ArtifactCaches {
    pub ivy_cache: PathBuf,
    pub ivy_local: PathBuf,
    pub m2_repository: PathBuf,
}

impl ArtifactCaches {
    /// Resolves the cache locations under the current user's home directory.
    pub fn resolve() -> Self {
        Self {
            ivy_cache: expand_home("~/.ivy2/cache/io.delta"),
            ivy_local: expand_home("~/.ivy2/local/io.delta"),
            m2_repository: expand_home("~/.m2/repository/io/delta"),
        }
    }

    /// Resolves the cache locations under an explicit home directory.
    pub fn with_home(home: &Path) -> Self {
        Self {
            ivy_cache: home.join(".ivy2").join("cache").join("io.delta"),
            ivy_local: home.join(".ivy2").join("local").join("io.delta"),
            m2_repository: home.join(".m2").join("repository").join("io").join("delta"),
        }
    }

    /// Idempotently removes all three cache directories.
    pub fn clear(&self) -> Result<()> {
        println!("{}", t!("fs.clearing_cache"));
        delete_if_exists(&self.ivy_cache)?;
        delete_if_exists(&self.ivy_local)?;
        delete_if_exists(&self.m2_repository)?;
        Ok(())
    }

    /// The cache locations of one published artifact, in all three caches.
    pub fn artifact_dirs(&self, artifact_id: &str) -> [PathBuf; 3] {
        [
            self.m2_repository.join(artifact_id),
            self.ivy_cache.join(artifact_id),
            self.ivy_local.join(artifact_id),
        ]
    }

    /// The path of a locally published jar in the m2 repository.
    pub fn m2_jar(&self, artifact_id: &str, version: &str) -> PathBuf {
        self.m2_repository
            .join(artifact_id)
            .join(version)
            .join(format!("{artifact_id}-{version}.jar"))
    }
}

fn expand_home(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Reads the default project version from `version.sbt` in the project root.
/// The version is the text between the first pair of double quotes on the
/// first line, e.g. `ThisBuild / version := "2.3.0-SNAPSHOT"`.
///
/// 从项目根目录的 `version.sbt` 读取默认项目版本。
/// 版本号是第一行第一对双引号之间的文本。
pub fn read_project_version(root: &Path) -> Result<String> {
    let path = root.join("version.sbt");
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read version file {}", path.display()))?;
    let first_line = content.lines().next().unwrap_or_default();
    parse_version_line(first_line)
        .with_context(|| format!("No quoted version found in {}", path.display()))
}

/// Extracts the quoted version from a `version.sbt` line.
pub fn parse_version_line(line: &str) -> Option<String> {
    let version = line.split('"').nth(1)?;
    if version.is_empty() {
        return None;
    }
    Some(version.to_string())
}
