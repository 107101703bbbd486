//! # Channel Dispatch Module / 通道调度模块
//!
//! One dispatcher per test channel. Every dispatcher follows the same shape:
//! print the banner, clear the artifact caches, optionally publish the
//! working tree locally, discover the channel's targets, then run each one in
//! streaming mode. A failing target aborts the remaining targets of its
//! channel; the failure is logged with the target name before it propagates.
//!
//! 每个测试通道一个调度器。所有调度器遵循相同的形态：
//! 打印横幅、清除产物缓存、按需从工作树本地发布、发现通道目标、
//! 然后以流式模式逐个运行。某个目标失败会中止该通道剩余的目标；
//! 失败在传播前会连同目标名称记录下来。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use once_cell::sync::Lazy;

use crate::core::config::IntegrationConfig;
use crate::core::models::{Channel, RunReport, TargetStatus};
use crate::core::targets::{self, Target};
use crate::infra::command::{CommandRunner, Invocation};
use crate::infra::fs::{delete_if_exists, ArtifactCaches};
use crate::infra::t;
use crate::reporting::console;

/// Maven group of the library under test.
pub const GROUP_ID: &str = "io.delta";
/// Core library artifact, cross-built against Scala 2.12 for submission.
pub const CORE_ARTIFACT_ID: &str = "delta-core_2.12";
/// The storage artifact whose absence the missing-jar probe exercises.
pub const STORAGE_ARTIFACT_ID: &str = "delta-storage";
/// Artifact of the S3/DynamoDB storage backend.
pub const DYNAMODB_ARTIFACT_ID: &str = "delta-storage-s3-dynamodb";
/// Name of the library on the package index.
pub const PIP_PACKAGE: &str = "delta-spark";
/// Alternative package index used for release candidate validation.
pub const TESTPYPI_INDEX: &str = "https://test.pypi.org/simple/";

static NO_SKIPS: Lazy<HashSet<&'static str>> = Lazy::new(HashSet::new);

// These two are run by dedicated dispatchers with their own invocation shape,
// never as part of the plain Python sweep.
// 这两个文件由拥有各自调用形态的专用调度器运行，绝不参与普通 Python 扫描。
static PYTHON_SKIPS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["using_with_pip.py", "missing_delta_storage_jar.py"]));

fn core_package(version: &str) -> String {
    format!("{GROUP_ID}:{CORE_ARTIFACT_ID}:{version}")
}

fn dynamodb_package(version: &str) -> String {
    format!("{GROUP_ID}:{DYNAMODB_ARTIFACT_ID}:{version}")
}

/// Class path that quiets the driver's logging during submission runs.
fn driver_class_path(root: &Path) -> PathBuf {
    root.join("python").join("delta").join("testing")
}

async fn publish_local(root: &Path, runner: &dyn CommandRunner) -> Result<()> {
    println!("{}", t!("run.publishing_local"));
    Invocation::new(["build/sbt", "publishM2"])
        .current_dir(root)
        .run(runner)
        .await
}

/// Runs one target in streaming mode, recording its outcome. On failure the
/// target is named in the log and the error propagates, aborting the channel.
async fn run_target(
    channel: Channel,
    shown: &str,
    name: &str,
    invocation: &Invocation,
    runner: &dyn CommandRunner,
    report: &mut RunReport,
) -> Result<()> {
    console::running_target(channel, shown);
    console::command_line(invocation);
    let started = Instant::now();
    match invocation.run(runner).await {
        Ok(()) => {
            report.record(name, TargetStatus::Passed, Some(started.elapsed()));
            Ok(())
        }
        Err(e) => {
            console::failed_target(channel, shown);
            report.record(name, TargetStatus::Failed, Some(started.elapsed()));
            Err(e)
        }
    }
}

fn skip_target(channel: Channel, target: &Target, shown: &str, report: &mut RunReport) {
    console::skipping_target(channel, shown);
    report.record(&target.name, TargetStatus::Skipped, None);
}

/// Scala channel: every example class under the Scala example project, run
/// through the build tool with the version under test exported to it.
///
/// Scala 通道：Scala 示例项目下的每个示例类，
/// 通过构建工具运行，并向其导出被测版本。
pub async fn run_scala(
    config: &IntegrationConfig,
    root: &Path,
    caches: &ArtifactCaches,
    runner: &dyn CommandRunner,
    report: &mut RunReport,
) -> Result<()> {
    console::scala_banner(&config.version, &config.scala_version);
    report.open_channel(Channel::Scala);
    caches.clear()?;
    if config.use_local {
        publish_local(root, runner).await?;
    }

    let test_dir = root.join("examples").join("scala");
    let src_dir = test_dir
        .join("src")
        .join("main")
        .join("scala")
        .join("example");
    let discovered = targets::discover(&src_dir, ".scala", &NO_SKIPS)?;

    let mut env: Vec<(String, String)> = vec![
        ("DELTA_VERSION".into(), config.version.clone()),
        ("SCALA_VERSION".into(), config.scala_version.clone()),
    ];
    if let Some(repo) = &config.maven_repo {
        env.push(("EXTRA_MAVEN_REPO".into(), repo.clone()));
    }

    for target in &discovered {
        if !target.matches(config.test_filter.as_deref()) {
            skip_target(Channel::Scala, target, &target.stem, report);
            continue;
        }
        let invocation = Invocation::new([
            "build/sbt".to_string(),
            format!("runMain example.{}", target.stem),
        ])
        .envs(env.iter().cloned())
        .current_dir(&test_dir);
        run_target(
            Channel::Scala,
            &target.stem,
            &target.name,
            &invocation,
            runner,
            report,
        )
        .await?;
    }
    Ok(())
}

/// Python channel: every example script, submitted to the compute engine
/// with the library resolved as a package.
///
/// Python 通道：每个示例脚本，以包形式解析库后提交给计算引擎。
pub async fn run_python(
    config: &IntegrationConfig,
    root: &Path,
    caches: &ArtifactCaches,
    runner: &dyn CommandRunner,
    report: &mut RunReport,
) -> Result<()> {
    console::channel_banner(Channel::Python, &config.version);
    report.open_channel(Channel::Python);
    caches.clear()?;
    if config.use_local {
        publish_local(root, runner).await?;
    }

    let test_dir = root.join("examples").join("python");
    let discovered = targets::discover(&test_dir, ".py", &PYTHON_SKIPS)?;
    let class_path = driver_class_path(root);
    let package = core_package(&config.version);
    let repo = config.maven_repo.clone().unwrap_or_default();

    for target in &discovered {
        let shown = target.path.display().to_string();
        if !target.matches(config.test_filter.as_deref()) {
            skip_target(Channel::Python, target, &shown, report);
            continue;
        }
        let invocation = Invocation::new([
            "spark-submit".to_string(),
            format!("--driver-class-path={}", class_path.display()),
            "--packages".to_string(),
            package.clone(),
            "--repositories".to_string(),
            repo.clone(),
            target.path.display().to_string(),
        ]);
        run_target(
            Channel::Python,
            &shown,
            &target.name,
            &invocation,
            runner,
            report,
        )
        .await?;
    }
    Ok(())
}

/// Runs the single probe script that exercises behavior when the storage
/// artifact is absent. The probe deletes the locally published storage
/// artifact first, so it refuses to run outside local-build mode: deleting a
/// remotely published artifact would be unsafe and irreversible.
///
/// 运行单个探针脚本，验证存储产物缺失时的行为。
/// 探针会先删除本地发布的存储产物，因此拒绝在本地构建模式之外运行：
/// 删除远程发布的产物是不安全且不可逆的。
pub async fn run_missing_storage_jar(
    config: &IntegrationConfig,
    root: &Path,
    caches: &ArtifactCaches,
    runner: &dyn CommandRunner,
    report: &mut RunReport,
) -> Result<()> {
    if !config.use_local {
        println!("{}", t!("run.probe_requires_local"));
        return Ok(());
    }

    println!(
        "\n\n{}",
        t!("run.probe_banner", version = &config.version)
    );
    caches.clear()?;
    publish_local(root, runner).await?;

    println!("{}", t!("run.clearing_storage_artifact"));
    for dir in caches.artifact_dirs(STORAGE_ARTIFACT_ID) {
        delete_if_exists(&dir)?;
    }

    let test_file = root
        .join("examples")
        .join("python")
        .join("missing_delta_storage_jar.py");
    let jar = caches.m2_jar(CORE_ARTIFACT_ID, &config.version);
    let shown = test_file.display().to_string();

    let invocation = Invocation::new([
        "spark-submit".to_string(),
        format!("--driver-class-path={}", driver_class_path(root).display()),
        "--jars".to_string(),
        jar.display().to_string(),
        test_file.display().to_string(),
    ]);
    run_target(
        Channel::Python,
        &shown,
        "missing_delta_storage_jar.py",
        &invocation,
        runner,
        report,
    )
    .await
}

/// Pip channel: uninstall any previous installation, install the pinned
/// version from the configured index, then run the single pip example with a
/// plain interpreter rather than a submission invocation.
///
/// pip 通道：卸载既有安装，从配置的索引安装固定版本，
/// 然后用普通解释器而非提交式调用运行唯一的 pip 示例。
pub async fn run_pip(
    config: &IntegrationConfig,
    root: &Path,
    caches: &ArtifactCaches,
    runner: &dyn CommandRunner,
    report: &mut RunReport,
) -> Result<()> {
    console::channel_banner(Channel::Pip, &config.version);
    report.open_channel(Channel::Pip);
    caches.clear()?;

    Invocation::new(["pip", "uninstall", "--yes", PIP_PACKAGE, "pyspark"])
        .run(runner)
        .await?;

    let pinned = format!("{PIP_PACKAGE}=={}", config.version);
    let install = if config.use_testpypi {
        Invocation::new([
            "pip".to_string(),
            "install".to_string(),
            "--extra-index-url".to_string(),
            TESTPYPI_INDEX.to_string(),
            pinned,
        ])
    } else {
        Invocation::new(["pip".to_string(), "install".to_string(), pinned])
    };
    println!("{}", t!("run.pip_install", command = install.command_line()));
    install.run(runner).await?;

    let test_file = root
        .join("examples")
        .join("python")
        .join("using_with_pip.py");
    let shown = test_file.display().to_string();
    let mut invocation = Invocation::new([
        "python3".to_string(),
        test_file.display().to_string(),
    ]);
    if let Some(repo) = &config.maven_repo {
        invocation = invocation.env("EXTRA_MAVEN_REPO", repo.clone());
    }
    run_target(
        Channel::Pip,
        &shown,
        "using_with_pip.py",
        &invocation,
        runner,
        report,
    )
    .await
}

/// Storage backend channel: the S3/DynamoDB integration scripts, submitted
/// with the storage artifact and any extra packages and settings on top of
/// the core package.
///
/// 存储后端通道：S3/DynamoDB 集成脚本，在核心包之上附加存储产物
/// 以及任何额外的包和设置后提交。
pub async fn run_storage_dynamodb(
    config: &IntegrationConfig,
    root: &Path,
    caches: &ArtifactCaches,
    runner: &dyn CommandRunner,
    report: &mut RunReport,
) -> Result<()> {
    console::channel_banner(Channel::StorageDynamoDb, &config.version);
    report.open_channel(Channel::StorageDynamoDb);
    caches.clear()?;
    if config.use_local {
        publish_local(root, runner).await?;
    }

    let test_dir = root.join("storage-s3-dynamodb").join("integration_tests");
    let discovered = targets::discover(&test_dir, ".py", &NO_SKIPS)?;
    let class_path = driver_class_path(root);

    let mut packages = format!(
        "{},{}",
        core_package(&config.version),
        dynamodb_package(&config.version)
    );
    if let Some(extra) = &config.dbb_packages {
        packages = format!("{packages},{extra}");
    }

    for target in &discovered {
        let shown = target.path.display().to_string();
        if !target.matches(config.test_filter.as_deref()) {
            skip_target(Channel::StorageDynamoDb, target, &shown, report);
            continue;
        }
        let mut argv = vec![
            "spark-submit".to_string(),
            format!("--driver-class-path={}", class_path.display()),
            "--packages".to_string(),
            packages.clone(),
        ];
        if let Some(repo) = &config.maven_repo {
            argv.push("--repositories".to_string());
            argv.push(repo.clone());
        }
        for conf in &config.dbb_conf {
            argv.push("--conf".to_string());
            argv.push(conf.clone());
        }
        argv.push(target.path.display().to_string());

        run_target(
            Channel::StorageDynamoDb,
            &shown,
            &target.name,
            &Invocation::new(argv),
            runner,
            report,
        )
        .await?;
    }
    Ok(())
}
