use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

mod common;
use common::*;

fn kodirepo(cwd: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("kodirepo").expect("binary not found");
    cmd.current_dir(cwd).env_remove("RUST_LOG");
    cmd
}

#[test]
fn builds_repository_from_arguments_and_list_file() {
    let work = TempDir::new().expect("failed to create work dir");
    let first = write_addon(work.path(), "first", "script.first", "1.0.0");
    write_addon(work.path(), "second", "script.second", "2.0.0");
    fs::write(
        work.path().join("addonslist.txt"),
        "# extra add-ons\n./second\n\n",
    )
    .unwrap();

    kodirepo(work.path())
        .arg("--datadir")
        .arg("repo")
        .arg(&first)
        .assert()
        .success()
        .stdout(predicate::str::contains("script.first"))
        .stdout(predicate::str::contains("script.second"));

    let repo = work.path().join("repo");
    assert!(repo.join("script.first/script.first-1.0.0.zip").is_file());
    assert!(repo.join("script.second/script.second-2.0.0.zip").is_file());
    assert!(repo.join("addons.xml").is_file());
    assert!(repo.join("addons.xml.md5").is_file());
}

#[test]
fn compressed_flag_writes_gzip_manifest() {
    let work = TempDir::new().expect("failed to create work dir");
    let addon = write_addon(work.path(), "first", "script.first", "1.0.0");

    kodirepo(work.path())
        .args(["-d", "repo", "-z"])
        .arg(&addon)
        .assert()
        .success();

    assert!(work.path().join("repo/addons.xml.gz").is_file());
    assert!(!work.path().join("repo/addons.xml").exists());
}

#[test]
fn invalid_addon_fails_without_manifest() {
    let work = TempDir::new().expect("failed to create work dir");
    let addon = write_addon(work.path(), "broken", "script.broken", "1.0");

    kodirepo(work.path())
        .args(["--datadir", "repo"])
        .arg(&addon)
        .assert()
        .failure()
        .stderr(predicate::str::contains("[ERROR]"))
        .stderr(predicate::str::contains("Invalid addon version: 1.0"));

    assert!(!work.path().join("repo/addons.xml").exists());
}

#[test]
fn unknown_location_fails() {
    let work = TempDir::new().expect("failed to create work dir");

    kodirepo(work.path())
        .args(["--datadir", "repo", "./nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found: ./nowhere"));
}

#[test]
fn reads_settings_from_config_file() {
    let work = TempDir::new().expect("failed to create work dir");
    let addon = write_addon(work.path(), "first", "script.first", "1.0.0");
    fs::write(
        work.path().join("repo.toml"),
        "datadir = \"published\"\nhtml_index = true\n",
    )
    .unwrap();

    kodirepo(work.path())
        .args(["--config", "repo.toml"])
        .arg(&addon)
        .assert()
        .success();

    let repo = work.path().join("published");
    assert!(repo.join("addons.xml").is_file());
    assert!(repo.join("index.html").is_file());
    assert!(repo.join("script.first/index.html").is_file());
}
