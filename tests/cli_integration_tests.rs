use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn proctop() -> Command {
    let mut cmd = Command::cargo_bin("proctop").unwrap();
    cmd.env_remove("PROCTOP_CONFIG")
        .env_remove("PROCTOP_INTERVAL_MS")
        .env_remove("PROCTOP_TOP_N")
        .env_remove("RUST_LOG");
    cmd
}

/// An explicit, empty config dir keeps the user's own settings out of the run.
fn isolated() -> (TempDir, Command) {
    let dir = TempDir::new().unwrap();
    let mut cmd = proctop();
    cmd.arg("--config").arg(dir.path().join("config.toml"));
    (dir, cmd)
}

#[test]
fn test_cli_help() {
    let mut cmd = proctop();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("top-K process monitor"))
        .stdout(predicate::str::contains("Usage: proctop"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("top"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--backend"));
}

#[test]
fn test_cli_version() {
    let mut cmd = proctop();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("proctop"));
}

#[test]
fn test_top_command_help() {
    let mut cmd = proctop();
    cmd.args(["top", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Sample twice and print the top processes"))
        .stdout(predicate::str::contains("--by"))
        .stdout(predicate::str::contains("--limit"))
        .stdout(predicate::str::contains("--delay-ms"));
}

#[test]
fn test_watch_command_help() {
    let mut cmd = proctop();
    cmd.args(["watch", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--interval-ms"))
        .stdout(predicate::str::contains("--ticks"));
}

#[test]
fn test_top_prints_tables() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["top", "-n", "3", "--delay-ms", "50", "--by", "cpu", "--by", "memory"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Top 3 CPU Consumers:"))
        .stdout(predicate::str::contains("Top 3 Memory Consumers:"))
        .stdout(predicate::str::contains("PID"));
}

#[test]
fn test_top_json_output() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["top", "--json", "-n", "2", "--delay-ms", "20", "--by", "time"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["tick"], 2);
    assert_eq!(value["rankings"]["time"].as_array().unwrap().len(), 2);
}

#[test]
fn test_top_with_portable_backend() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["--backend", "sysinfo", "top", "-n", "1", "--delay-ms", "20"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Top 1 CPU Consumers:"));
}

#[test]
fn test_watch_stops_after_ticks() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["watch", "--interval-ms", "20", "--ticks", "2", "--json", "-n", "1"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_zero_limit_is_rejected() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["top", "-n", "0"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("top_n must be between 1 and 64"));
}

#[test]
fn test_invalid_criterion() {
    let mut cmd = proctop();
    cmd.args(["top", "--by", "disk"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_invalid_subcommand() {
    let mut cmd = proctop();
    cmd.arg("invalid-command");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("proctop.toml");

    proctop()
        .arg("--config")
        .arg(&path)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default settings"));
    assert!(path.exists());

    proctop()
        .arg("--config")
        .arg(&path)
        .env("PROCTOP_TOP_N", "5")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("top_n = 5"))
        .stdout(predicate::str::contains("interval_ms = 2000"));
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "criteria = [\"disk\"]\n").unwrap();

    proctop()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}
