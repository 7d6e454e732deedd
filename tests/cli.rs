use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A kscribe command running in a temp directory that carries its own
/// config.yaml, so no test touches the user's real configuration.
fn sandboxed_command() -> (Command, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "{}\n").unwrap();

    let mut cmd = Command::cargo_bin("kscribe").unwrap();
    cmd.current_dir(dir.path());
    (cmd, dir)
}

#[test]
fn help_lists_all_subcommands() {
    Command::cargo_bin("kscribe")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("transcribe")
                .and(predicate::str::contains("formats"))
                .and(predicate::str::contains("backends"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn version_reports_the_package() {
    Command::cargo_bin("kscribe")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn transcribe_requires_a_url() {
    Command::cargo_bin("kscribe")
        .unwrap()
        .arg("transcribe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn unknown_output_formats_are_rejected_at_parse_time() {
    Command::cargo_bin("kscribe")
        .unwrap()
        .args(["transcribe", "https://vid.example/talk", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn backends_lists_cloud_and_local() {
    let (mut cmd, _dir) = sandboxed_command();
    cmd.arg("backends")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloud").and(predicate::str::contains("local")));
}

#[test]
fn config_show_prints_the_active_settings() {
    let (mut cmd, _dir) = sandboxed_command();
    cmd.args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend:").and(predicate::str::contains("kn-IN")));
}
