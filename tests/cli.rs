//! Command line integration tests
//!
//! None of these reach a real NETCONF server: runs either fail before
//! dialing or only use operations the encoder rejects.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn nc_hammer() -> Command {
    let mut cmd = Command::cargo_bin("nc-hammer").unwrap();
    cmd.env_remove("NC_HAMMER_DIAL_TIMEOUT")
        .env_remove("NC_HAMMER_EXEC_TIMEOUT")
        .env_remove("NC_HAMMER_OUTPUT_DIR")
        .env_remove("NC_HAMMER_COLOR")
        .env("NO_COLOR", "1");
    cmd
}

fn write_suite(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("suite.yml");
    fs::write(&path, content).unwrap();
    path
}

const UNSUPPORTED_SUITE: &str = r#"
iterations: 2
clients: 2
rampup: 0
configs:
  - hostname: 127.0.0.1
    port: 1
    username: admin
    password: admin
blocks:
  - type: sequential
    actions:
      - netconf:
          hostname: 127.0.0.1
          operation: commit
"#;

#[test]
fn test_version() {
    nc_hammer()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("nc-hammer "));
}

#[test]
fn test_help_lists_subcommands() {
    nc_hammer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("analyse"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_init_writes_valid_suite_and_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("suite.yml");

    nc_hammer()
        .current_dir(dir.path())
        .args(["init", "suite.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Example suite written"));

    let written = fs::read_to_string(&path).unwrap();
    assert!(nc_hammer::TestSuite::from_yaml_str(&written).is_ok());

    nc_hammer()
        .current_dir(dir.path())
        .args(["init", "suite.yml"])
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), written);
}

#[test]
fn test_init_with_env_example() {
    let dir = TempDir::new().unwrap();

    nc_hammer()
        .current_dir(dir.path())
        .args(["init", "--env"])
        .assert()
        .success();

    let env = fs::read_to_string(dir.path().join(".env.example")).unwrap();
    assert!(env.contains("NC_HAMMER_DIAL_TIMEOUT"));
}

#[test]
fn test_run_missing_suite_file() {
    let dir = TempDir::new().unwrap();

    nc_hammer()
        .current_dir(dir.path())
        .args(["run", "missing.yml", "--no-progress"])
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("missing.yml"));
}

#[test]
fn test_run_suite_without_configs_is_rejected() {
    let dir = TempDir::new().unwrap();
    let suite = write_suite(dir.path(), "iterations: 1\nclients: 1\nconfigs: []\n");

    nc_hammer()
        .current_dir(dir.path())
        .arg("run")
        .arg(&suite)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("at least one SSH Config"));
}

#[test]
fn test_run_unknown_host_is_rejected() {
    let dir = TempDir::new().unwrap();
    let suite = write_suite(
        dir.path(),
        r#"
iterations: 1
clients: 1
configs:
  - hostname: r1
    username: admin
    password: admin
blocks:
  - type: sequential
    actions:
      - netconf:
          hostname: r2
          operation: get
"#,
    );

    nc_hammer()
        .current_dir(dir.path())
        .arg("run")
        .arg(&suite)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("r2"));
}

#[test]
fn test_run_with_failing_actions_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let suite = write_suite(dir.path(), UNSUPPORTED_SUITE);
    let output_dir = dir.path().join("results");

    nc_hammer()
        .current_dir(dir.path())
        .arg("run")
        .arg(&suite)
        .arg("--output-dir")
        .arg(&output_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("EEEE"))
        .stdout(predicate::str::contains("commit is not a supported operation"))
        .stdout(predicate::str::contains("Results written to"));

    let runs: Vec<_> = fs::read_dir(&output_dir).unwrap().map(|entry| entry.unwrap().path()).collect();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].join("suite.yml").exists());

    let results = fs::read_to_string(runs[0].join("results.jsonl")).unwrap();
    assert_eq!(results.lines().count(), 4);
}

#[test]
fn test_analyse_results_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.jsonl");
    fs::write(
        &path,
        concat!(
            r#"{"client":0,"session_id":7,"hostname":"r1","operation":"get","when":120.0,"latency":4.0}"#,
            "\n",
            r#"{"client":1,"session_id":8,"hostname":"r1","operation":"get","when":240.0,"latency":6.0}"#,
            "\n",
        ),
    )
    .unwrap();

    nc_hammer()
        .arg("analyse")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("NETCONF Load Test Results"))
        .stdout(predicate::str::contains("Results:      2"))
        .stdout(predicate::str::contains("5.0ms"));
}

#[test]
fn test_analyse_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.jsonl");
    fs::write(&path, "not json\n").unwrap();

    nc_hammer()
        .arg("analyse")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 1"));
}
