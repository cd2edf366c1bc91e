use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::process::Command;

#[test]
fn help_lists_server_flags() {
    let mut cmd = Command::new(cargo::cargo_bin!("clipper"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--data-dir"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn version_matches_the_crate() {
    let mut cmd = Command::new(cargo::cargo_bin!("clipper"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn invalid_bind_address_fails_fast() {
    let mut cmd = Command::new(cargo::cargo_bin!("clipper"));
    cmd.arg("--bind").arg("not-an-address");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid bind address"));
}

#[test]
fn missing_config_file_is_an_error() {
    let mut cmd = Command::new(cargo::cargo_bin!("clipper"));
    cmd.arg("--config").arg("/nonexistent/clipper.toml");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("reading config file"));
}
