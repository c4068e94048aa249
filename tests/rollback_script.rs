//! Regression test for the companion container-rollback script.
//!
//! The script's contract is all-or-nothing with respect to the env file:
//! when pulling the target image fails, the file recording the running
//! image tag stays byte-identical and the container recreate step is
//! never invoked. Verified with a stub `docker` on `PATH` that logs its
//! arguments and fails `pull`.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn script_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("scripts").join("rollback-image.sh")
}

/// Install a stub `docker` that appends its arguments to `calls.log` and
/// exits with `pull_exit` for pull invocations.
fn install_stub_docker(dir: &Path, pull_exit: i32) -> PathBuf {
    let bin_dir = dir.join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    let calls = dir.join("calls.log");
    let stub = format!(
        "#!/usr/bin/env bash\necho \"$@\" >> '{}'\nif [ \"$1\" = pull ]; then exit {pull_exit}; fi\nexit 0\n",
        calls.display()
    );
    let docker = bin_dir.join("docker");
    fs::write(&docker, stub).unwrap();
    fs::set_permissions(&docker, fs::Permissions::from_mode(0o755)).unwrap();
    bin_dir
}

fn write_env_file(dir: &Path) -> PathBuf {
    let env_file = dir.join("gateway.env");
    fs::write(
        &env_file,
        "GATEWAY_PORT=18789\nGATEWAY_IMAGE=ghcr.io/clawdeck/gateway:2026.2.1\nGATEWAY_LOG=info\n",
    )
    .unwrap();
    env_file
}

fn run_script(bin_dir: &Path, env_file: &Path, compose_dir: &Path, tag: &str) -> assert_cmd::assert::Assert {
    let path = format!(
        "{}:{}",
        bin_dir.display(),
        std::env::var("PATH").unwrap_or_default()
    );
    assert_cmd::Command::new("bash")
        .arg(script_path())
        .arg(tag)
        .arg(env_file)
        .arg(compose_dir)
        .env("PATH", path)
        .assert()
}

#[test]
fn failed_pull_leaves_env_file_untouched_and_never_recreates() {
    let dir = TempDir::new().unwrap();
    let bin_dir = install_stub_docker(dir.path(), 1);
    let env_file = write_env_file(dir.path());
    let before = fs::read(&env_file).unwrap();

    run_script(&bin_dir, &env_file, dir.path(), "2026.1.7").failure();

    // Byte-identical, not merely equivalent.
    assert_eq!(fs::read(&env_file).unwrap(), before);

    let calls = fs::read_to_string(dir.path().join("calls.log")).unwrap();
    assert!(calls.contains("pull ghcr.io/clawdeck/gateway:2026.1.7"));
    assert!(!calls.contains("compose"), "recreate must never be invoked: {calls}");
}

#[test]
fn successful_pull_rewrites_the_tag_and_recreates() {
    let dir = TempDir::new().unwrap();
    let bin_dir = install_stub_docker(dir.path(), 0);
    let env_file = write_env_file(dir.path());

    run_script(&bin_dir, &env_file, dir.path(), "2026.1.7").success();

    let after = fs::read_to_string(&env_file).unwrap();
    assert!(after.contains("GATEWAY_IMAGE=ghcr.io/clawdeck/gateway:2026.1.7"));
    // Unrelated lines survive the rewrite.
    assert!(after.contains("GATEWAY_PORT=18789"));

    let calls = fs::read_to_string(dir.path().join("calls.log")).unwrap();
    assert!(calls.contains("compose up -d gateway"));
}

#[test]
fn missing_image_line_is_rejected_before_any_docker_call() {
    let dir = TempDir::new().unwrap();
    let bin_dir = install_stub_docker(dir.path(), 0);
    let env_file = dir.path().join("gateway.env");
    fs::write(&env_file, "GATEWAY_PORT=18789\n").unwrap();

    run_script(&bin_dir, &env_file, dir.path(), "2026.1.7").failure();
    assert!(!dir.path().join("calls.log").exists(), "docker must not have run");
}
