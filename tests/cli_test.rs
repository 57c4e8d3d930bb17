//! Binary-level contract tests
//!
//! Runs the built `sonarlgpd` binary against temporary projects with an
//! isolated environment (no inherited token, empty user config dir).

use std::path::Path;
use std::process::{Command, Output};

fn sonarlgpd(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sonarlgpd"))
        .args(args)
        .arg(dir)
        .env_remove("SONAR_TOKEN")
        .env_remove("SONAR_HOST_URL")
        .env_remove("RUST_LOG")
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .output()
        .expect("failed to run sonarlgpd")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

#[test]
fn export_without_token_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = sonarlgpd(dir.path(), &["export", "--skip-deps", "--skip-git"]);

    assert!(!out.status.success());
    assert!(
        stderr(&out).contains("No SonarQube token found"),
        "stderr: {}",
        stderr(&out)
    );
    assert!(!dir.path().join("reports").exists());
}

#[test]
fn export_with_unreachable_server_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".sonar-token"), "squ_test\n").unwrap();
    let out = sonarlgpd(
        dir.path(),
        &[
            "export",
            "--server",
            "http://127.0.0.1:9",
            "--skip-deps",
            "--skip-git",
        ],
    );

    assert!(!out.status.success());
    assert!(
        stderr(&out).contains("Could not fetch measures"),
        "stderr: {}",
        stderr(&out)
    );
}

#[test]
fn init_scaffolds_project() {
    let dir = tempfile::tempdir().unwrap();
    let out = sonarlgpd(dir.path(), &["init"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    assert!(dir.path().join("sonar-project.properties").is_file());
    assert!(dir.path().join(".github/workflows/sonarqube.yml").is_file());
    assert!(dir.path().join(".sonarlgpd/lgpd-rules.json").is_file());

    // Second run skips existing files
    let out = sonarlgpd(dir.path(), &["init"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("already exists"));
}

#[test]
fn report_prints_checklist() {
    let dir = tempfile::tempdir().unwrap();
    let out = sonarlgpd(dir.path(), &["report", "--stdout"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let md = stdout(&out);
    assert!(md.starts_with("# LGPD Compliance Checklist"));
    assert!(md.contains("## Manual Review"));
    assert!(!dir.path().join("reports").exists());
}

#[test]
fn hooks_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    git2::Repository::init(dir.path()).unwrap();

    let out = sonarlgpd(dir.path(), &["hooks", "install"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let hook = dir.path().join(".git/hooks/pre-push");
    assert!(hook.is_file());

    let out = sonarlgpd(dir.path(), &["hooks", "uninstall"]);
    assert!(out.status.success());
    assert!(!hook.exists());
}

#[test]
fn hooks_outside_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = sonarlgpd(dir.path(), &["hooks", "install"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("not inside a git repository"));
}

#[test]
fn doctor_always_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let out = sonarlgpd(dir.path(), &["doctor"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("Token: missing"));
}
