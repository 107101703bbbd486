//! # Channel Dispatch Unit Tests / 通道调度单元测试
//!
//! Drives the dispatchers against a scripted runner: fail-fast ordering,
//! skip-list and filter behavior, the local-build gate of the destructive
//! probe and the invocation shapes of every channel.
//!
//! 用脚本化 runner 驱动调度器：快速失败的顺序、跳过列表与过滤器行为、
//! 破坏性探针的本地构建门禁以及各通道的调用形态。

use std::fs;

use channel_runner::core::channels;
use channel_runner::core::models::{Channel, RunReport, TargetStatus};
use channel_runner::infra::fs::ArtifactCaches;
use tempfile::tempdir;

mod common;
use common::{
    sample_project, test_config, with_python_examples, with_scala_examples, with_storage_tests,
    ScriptedRunner,
};

fn statuses(report: &RunReport) -> Vec<(String, TargetStatus)> {
    report
        .channels
        .iter()
        .flat_map(|c| &c.targets)
        .map(|t| (t.name.clone(), t.status))
        .collect()
}

#[tokio::test]
async fn test_python_channel_fails_fast() {
    let project = sample_project("1.0.0");
    with_python_examples(project.path(), &["t1.py", "t2.py", "t3.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let config = test_config("1.0.0");
    let mut report = RunReport::new(&config.version);

    // t1 passes, t2 fails; t3 must never be invoked.
    let runner = ScriptedRunner::with_codes(&[0, 1]);
    let result =
        channels::run_python(&config, project.path(), &caches, &runner, &mut report).await;
    assert!(result.is_err());

    let lines = runner.command_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("t1.py"));
    assert!(lines[1].ends_with("t2.py"));
    assert!(lines.iter().all(|l| !l.ends_with("t3.py")));

    assert_eq!(
        statuses(&report),
        vec![
            ("t1.py".to_string(), TargetStatus::Passed),
            ("t2.py".to_string(), TargetStatus::Failed),
        ]
    );
}

#[tokio::test]
async fn test_python_channel_applies_skip_list_and_helpers() {
    let project = sample_project("1.0.0");
    with_python_examples(
        project.path(),
        &[
            "t1.py",
            "_helper.py",
            "using_with_pip.py",
            "missing_delta_storage_jar.py",
        ],
    );
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let config = test_config("1.0.0");
    let mut report = RunReport::new(&config.version);

    let runner = ScriptedRunner::all_zero();
    channels::run_python(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    let lines = runner.command_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("spark-submit "));
    assert!(lines[0].contains("--packages io.delta:delta-core_2.12:1.0.0"));
    assert!(lines[0].ends_with("t1.py"));
}

#[tokio::test]
async fn test_python_channel_name_filter_skips_without_running() {
    let project = sample_project("1.0.0");
    with_python_examples(project.path(), &["t1.py", "t2.py", "t3.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let mut config = test_config("1.0.0");
    config.test_filter = Some("t2.py".to_string());
    let mut report = RunReport::new(&config.version);

    let runner = ScriptedRunner::all_zero();
    channels::run_python(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    assert_eq!(runner.command_lines().len(), 1);
    assert_eq!(
        statuses(&report),
        vec![
            ("t1.py".to_string(), TargetStatus::Skipped),
            ("t2.py".to_string(), TargetStatus::Passed),
            ("t3.py".to_string(), TargetStatus::Skipped),
        ]
    );
}

#[tokio::test]
async fn test_scala_channel_invocation_shape() {
    let project = sample_project("1.0.0");
    with_scala_examples(project.path(), &["Quickstart.scala", "_Shared.scala"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let mut config = test_config("1.0.0");
    config.maven_repo = Some("https://staging.example.com/repo".to_string());
    let mut report = RunReport::new(&config.version);

    let runner = ScriptedRunner::all_zero();
    channels::run_scala(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].argv(),
        ["build/sbt", "runMain example.Quickstart"]
    );
    let expected_dir = project.path().join("examples").join("scala");
    assert_eq!(calls[0].working_dir(), Some(expected_dir.as_path()));

    let overlay = calls[0].env_overlay();
    assert!(overlay.contains(&("DELTA_VERSION".to_string(), "1.0.0".to_string())));
    assert!(overlay.contains(&("SCALA_VERSION".to_string(), "2.12".to_string())));
    assert!(overlay.contains(&(
        "EXTRA_MAVEN_REPO".to_string(),
        "https://staging.example.com/repo".to_string()
    )));
}

#[tokio::test]
async fn test_scala_channel_publishes_local_artifacts_when_requested() {
    let project = sample_project("1.0.0");
    with_scala_examples(project.path(), &["Quickstart.scala"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let mut config = test_config("1.0.0");
    config.use_local = true;
    let mut report = RunReport::new(&config.version);

    let runner = ScriptedRunner::all_zero();
    channels::run_scala(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    let lines = runner.command_lines();
    assert_eq!(lines[0], "build/sbt publishM2");
    assert!(lines[1].starts_with("build/sbt runMain"));
}

#[tokio::test]
async fn test_missing_storage_jar_probe_refuses_without_local_build() {
    let project = sample_project("1.0.0");
    with_python_examples(project.path(), &["missing_delta_storage_jar.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let config = test_config("1.0.0");
    let mut report = RunReport::new(&config.version);

    let runner = ScriptedRunner::all_zero();
    channels::run_missing_storage_jar(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    // Nothing may run and nothing may be deleted outside local-build mode.
    assert!(runner.command_lines().is_empty());
}

#[tokio::test]
async fn test_missing_storage_jar_probe_deletes_the_published_artifact() {
    let project = sample_project("1.0.0");
    with_python_examples(project.path(), &["missing_delta_storage_jar.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());

    // A previously published storage artifact in every cache.
    for dir in caches.artifact_dirs("delta-storage") {
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("artifact.jar"), "jar").unwrap();
    }

    let mut config = test_config("1.0.0");
    config.use_local = true;
    let mut report = RunReport::new(&config.version);
    report.open_channel(Channel::Python);

    let runner = ScriptedRunner::all_zero();
    channels::run_missing_storage_jar(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    for dir in caches.artifact_dirs("delta-storage") {
        assert!(!dir.exists());
    }

    let lines = runner.command_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "build/sbt publishM2");
    assert!(lines[1].starts_with("spark-submit "));
    assert!(lines[1].contains("--jars"));
    assert!(lines[1].contains("delta-core_2.12-1.0.0.jar"));
    assert_eq!(
        statuses(&report),
        vec![("missing_delta_storage_jar.py".to_string(), TargetStatus::Passed)]
    );
}

#[tokio::test]
async fn test_pip_channel_uninstalls_installs_and_runs_with_the_interpreter() {
    let project = sample_project("1.0.0");
    with_python_examples(project.path(), &["using_with_pip.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let mut config = test_config("1.0.0");
    config.maven_repo = Some("https://staging.example.com/repo".to_string());
    let mut report = RunReport::new(&config.version);

    let runner = ScriptedRunner::all_zero();
    channels::run_pip(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0].argv(),
        ["pip", "uninstall", "--yes", "delta-spark", "pyspark"]
    );
    assert_eq!(calls[1].argv(), ["pip", "install", "delta-spark==1.0.0"]);
    assert_eq!(calls[2].argv()[0], "python3");
    assert!(calls[2].argv()[1].ends_with("using_with_pip.py"));
    assert!(calls[2].env_overlay().contains(&(
        "EXTRA_MAVEN_REPO".to_string(),
        "https://staging.example.com/repo".to_string()
    )));
}

#[tokio::test]
async fn test_pip_channel_uses_the_test_index_when_requested() {
    let project = sample_project("1.0.0");
    with_python_examples(project.path(), &["using_with_pip.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let mut config = test_config("1.0.0");
    config.use_testpypi = true;
    let mut report = RunReport::new(&config.version);

    let runner = ScriptedRunner::all_zero();
    channels::run_pip(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    assert_eq!(
        runner.calls()[1].argv(),
        [
            "pip",
            "install",
            "--extra-index-url",
            "https://test.pypi.org/simple/",
            "delta-spark==1.0.0"
        ]
    );
}

#[tokio::test]
async fn test_pip_channel_aborts_when_the_installation_fails() {
    let project = sample_project("1.0.0");
    with_python_examples(project.path(), &["using_with_pip.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let config = test_config("1.0.0");
    let mut report = RunReport::new(&config.version);

    // uninstall succeeds, install fails; the interpreter must never run.
    let runner = ScriptedRunner::with_codes(&[0, 1]);
    let result = channels::run_pip(&config, project.path(), &caches, &runner, &mut report).await;
    assert!(result.is_err());
    assert_eq!(runner.command_lines().len(), 2);
}

#[tokio::test]
async fn test_storage_channel_invocation_shape() {
    let project = sample_project("1.0.0");
    with_storage_tests(project.path(), &["test_concurrent_writes.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let mut config = test_config("1.0.0");
    config.dbb_packages = Some("org.apache.hadoop:hadoop-aws:3.2.0".to_string());
    config.dbb_conf = vec![
        "spark.delta.logStore.s3a.impl=S3DynamoDBLogStore".to_string(),
        "spark.io.delta.storage.S3DynamoDBLogStore.ddb.region=us-west-2".to_string(),
    ];
    config.maven_repo = Some("https://staging.example.com/repo".to_string());
    let mut report = RunReport::new(&config.version);

    let runner = ScriptedRunner::all_zero();
    channels::run_storage_dynamodb(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let argv = calls[0].argv();
    assert_eq!(argv[0], "spark-submit");

    let packages_pos = argv.iter().position(|a| a == "--packages").unwrap();
    assert_eq!(
        argv[packages_pos + 1],
        "io.delta:delta-core_2.12:1.0.0,io.delta:delta-storage-s3-dynamodb:1.0.0,\
         org.apache.hadoop:hadoop-aws:3.2.0"
    );

    let repo_pos = argv.iter().position(|a| a == "--repositories").unwrap();
    assert_eq!(argv[repo_pos + 1], "https://staging.example.com/repo");

    let conf_count = argv.iter().filter(|a| *a == "--conf").count();
    assert_eq!(conf_count, 2);
    assert!(argv.last().unwrap().ends_with("test_concurrent_writes.py"));
}

#[tokio::test]
async fn test_channels_clear_the_artifact_caches_before_dispatch() {
    let project = sample_project("1.0.0");
    with_python_examples(project.path(), &["t1.py"]);
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    fs::create_dir_all(&caches.ivy_cache).unwrap();
    fs::write(caches.ivy_cache.join("stale.jar"), "jar").unwrap();

    let config = test_config("1.0.0");
    let mut report = RunReport::new(&config.version);
    let runner = ScriptedRunner::all_zero();
    channels::run_python(&config, project.path(), &caches, &runner, &mut report)
        .await
        .unwrap();

    assert!(!caches.ivy_cache.exists());
}
