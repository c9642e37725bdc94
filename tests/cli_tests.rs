use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn fleetpulse() -> Command {
    Command::cargo_bin("fleetpulse").expect("binary builds")
}

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn help_lists_subcommands() {
    fleetpulse()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("encode"));
}

#[test]
fn encode_prints_the_bucket_key() {
    fleetpulse()
        .args(["encode", "37.0", "--", "-122.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9q94r"));
}

#[test]
fn encode_honors_precision() {
    fleetpulse()
        .args(["encode", "--precision", "9", "37.7749", "--", "-122.4194"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9q8yyk8yt"));
}

#[test]
fn encode_rejects_out_of_range_coordinates() {
    fleetpulse()
        .args(["encode", "95.0", "10.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("coordinates"));
}

#[test]
fn encode_rejects_bad_precision() {
    fleetpulse()
        .args(["encode", "--precision", "0", "1.0", "2.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("precision"));
}

#[test]
fn check_config_accepts_a_valid_file() {
    let file = write_temp_config(
        r#"
[broker]
uri = "mqtt://broker.internal:1883"
"#,
    );

    fleetpulse()
        .args(["check", "config", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("config ok"))
        .stdout(predicate::str::contains("broker.internal:1883"));
}

#[test]
fn check_config_rejects_an_invalid_file() {
    let file = write_temp_config(
        r#"
[presence]
precision = 40
"#,
    );

    fleetpulse()
        .args(["check", "config", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("presence.precision"));
}

#[test]
fn check_config_rejects_a_missing_file() {
    fleetpulse()
        .args(["check", "config", "--config", "/nonexistent/fleetpulse.toml"])
        .assert()
        .failure();
}
