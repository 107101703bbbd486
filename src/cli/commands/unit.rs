//! # Unit Command Module / 单元命令模块
//!
//! This module implements the `unit` command. Natively it runs the SBT suite
//! and then the Python suite; with `USE_DOCKER` set it first prepares the
//! test environment image through the image cache and re-invokes itself
//! inside a container made from it.
//!
//! 此模块实现 `unit` 命令。原生模式下先运行 SBT 套件再运行 Python 套件；
//! 设置了 `USE_DOCKER` 时，先通过镜像缓存准备测试环境镜像，
//! 然后在由其创建的容器内重新调用自身。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::infra::command::{CommandRunner, Invocation, SystemRunner};
use crate::infra::docker::{self, ImageCache};
use crate::infra::t;

/// Executes the unit command.
///
/// # Arguments
/// * `project_dir` - Root directory of the project under test
pub async fn execute(project_dir: PathBuf) -> Result<()> {
    let root = fs::canonicalize(&project_dir).with_context(|| {
        t!("run.project_dir_not_found", path = project_dir.display()).to_string()
    })?;
    let runner = SystemRunner;

    if env::var_os("USE_DOCKER").is_some() {
        let image = ImageCache::from_env().prepare(&root, &runner).await?;
        return docker::run_in_container(&image.tag, &root, &runner).await;
    }

    let scala_version = env::var("SCALA_VERSION").ok().filter(|v| !v.is_empty());
    run_sbt_tests(&root, scala_version.as_deref(), &runner).await?;

    // The Python bindings are not released for Scala 2.13, so that suite only
    // runs for the default cross-build.
    // Python 绑定未针对 Scala 2.13 发布，因此该套件只在默认交叉构建下运行。
    match &scala_version {
        Some(v) if !v.starts_with("2.12") => {
            println!("{}", t!("unit.skip_python", version = v));
        }
        _ => run_python_tests(&root, &runner).await?,
    }
    Ok(())
}

/// Runs the full SBT suite, cross-building when a binding version is pinned.
async fn run_sbt_tests(
    root: &Path,
    scala_version: Option<&str>,
    runner: &dyn CommandRunner,
) -> Result<()> {
    println!("{}", t!("unit.sbt_banner"));
    let sbt = root.join("build").join("sbt");
    let argv = match scala_version {
        None => vec![
            sbt.display().to_string(),
            "clean".to_string(),
            "+test".to_string(),
        ],
        Some(version) => vec![
            sbt.display().to_string(),
            "clean".to_string(),
            format!("++ {version} test"),
        ],
    };
    Invocation::new(argv).current_dir(root).run(runner).await
}

/// Delegates to the Python test driver shipped with the bindings.
async fn run_python_tests(root: &Path, runner: &dyn CommandRunner) -> Result<()> {
    println!("{}", t!("unit.python_banner"));
    let script = root.join("python").join("run-tests.py");
    println!("{}", t!("unit.python_script", path = script.display()));
    Invocation::new(["python".to_string(), script.display().to_string()])
        .current_dir(root)
        .run(runner)
        .await
}
