//! CLI integration tests
//!
//! Tests the render-server binary using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;

fn render_server() -> Command {
    Command::cargo_bin("render-server")
        .expect("Failed to locate render-server binary - ensure it's built before running tests")
}

#[test]
fn test_cli_help() {
    render_server()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render-server"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("shutdown"));
}

#[test]
fn test_cli_version() {
    render_server()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("render-server"));
}

#[test]
fn test_cli_serve_help() {
    render_server()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--remote"));
}

#[test]
fn test_cli_rejects_unknown_mode() {
    render_server()
        .args(["serve", "--mode", "carrier-pigeon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown mode"));
}

#[test]
fn test_cli_reverse_without_remote_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("server.toml");
    std::fs::write(&config, "mode = \"tcp-reverse-client\"\n").unwrap();

    render_server()
        .args(["serve", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote_host"));
}

#[test]
fn test_cli_shutdown_unreachable_server() {
    render_server()
        .args(["shutdown", "--tcp", "127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to reach server"));
}

#[test]
fn test_cli_init_writes_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("render").join("server.toml");

    render_server()
        .args(["init", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("mode = \"tcp-listen\""));
    assert!(written.contains("retry_delay = 5"));

    // A second run refuses to clobber it unless forced
    render_server()
        .args(["init", "--path"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    render_server()
        .args(["init", "--force", "--path"])
        .arg(&path)
        .assert()
        .success();
}
