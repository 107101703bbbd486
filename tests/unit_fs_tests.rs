//! # File System Module Unit Tests / 文件系统模块单元测试

use std::fs;

use channel_runner::infra::fs::{
    delete_if_exists, parse_version_line, read_project_version, ArtifactCaches,
};
use tempfile::tempdir;

mod common;

#[test]
fn test_parse_version_line_extracts_quoted_version() {
    assert_eq!(
        parse_version_line("ThisBuild / version := \"2.3.0-SNAPSHOT\""),
        Some("2.3.0-SNAPSHOT".to_string())
    );
}

#[test]
fn test_parse_version_line_rejects_unquoted_lines() {
    assert_eq!(parse_version_line("version := 2.3.0"), None);
    assert_eq!(parse_version_line(""), None);
    assert_eq!(parse_version_line("version := \"\""), None);
}

#[test]
fn test_read_project_version_from_fixture() {
    let project = common::sample_project("1.2.3");
    assert_eq!(read_project_version(project.path()).unwrap(), "1.2.3");
}

#[test]
fn test_read_project_version_missing_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    assert!(read_project_version(temp_dir.path()).is_err());
}

#[test]
fn test_delete_if_exists_removes_directories_and_files() {
    let temp_dir = tempdir().unwrap();
    let dir = temp_dir.path().join("cache");
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("nested").join("artifact.jar"), "jar").unwrap();

    delete_if_exists(&dir).unwrap();
    assert!(!dir.exists());

    let file = temp_dir.path().join("single.jar");
    fs::write(&file, "jar").unwrap();
    delete_if_exists(&file).unwrap();
    assert!(!file.exists());
}

#[test]
fn test_delete_if_exists_is_a_noop_for_absent_paths() {
    let temp_dir = tempdir().unwrap();
    let absent = temp_dir.path().join("never_created");
    assert!(delete_if_exists(&absent).is_ok());
    // A second call must behave the same.
    assert!(delete_if_exists(&absent).is_ok());
}

#[test]
fn test_artifact_caches_clear_is_idempotent() {
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());

    fs::create_dir_all(&caches.ivy_cache).unwrap();
    fs::create_dir_all(&caches.ivy_local).unwrap();
    fs::create_dir_all(&caches.m2_repository).unwrap();
    fs::write(caches.ivy_cache.join("stale.jar"), "jar").unwrap();

    caches.clear().unwrap();
    assert!(!caches.ivy_cache.exists());
    assert!(!caches.ivy_local.exists());
    assert!(!caches.m2_repository.exists());

    // Clearing already-clean caches must succeed as well.
    caches.clear().unwrap();
}

#[test]
fn test_artifact_dirs_cover_all_three_caches() {
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let dirs = caches.artifact_dirs("delta-storage");

    assert_eq!(dirs[0], caches.m2_repository.join("delta-storage"));
    assert_eq!(dirs[1], caches.ivy_cache.join("delta-storage"));
    assert_eq!(dirs[2], caches.ivy_local.join("delta-storage"));
}

#[test]
fn test_m2_jar_path_shape() {
    let home = tempdir().unwrap();
    let caches = ArtifactCaches::with_home(home.path());
    let jar = caches.m2_jar("delta-core_2.12", "1.0.0");
    assert_eq!(
        jar,
        caches
            .m2_repository
            .join("delta-core_2.12")
            .join("1.0.0")
            .join("delta-core_2.12-1.0.0.jar")
    );
}
