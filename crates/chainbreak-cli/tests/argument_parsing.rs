//! Focused CLI argument parsing tests: clap's own validation, independent of
//! keychain parsing.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn version_flag_shows_version() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chainbreak"));
}

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dump"));
}

#[test]
fn no_color_flag_works_with_help() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .args(["--no-color", "--help"])
        .assert()
        .success();
}

#[test]
fn no_command_shows_help() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn dump_requires_keychain_path() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .arg("dump")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn dump_help_shows_credential_flags() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .args(["dump", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--password"))
        .stdout(predicate::str::contains("--hex-key"))
        .stdout(predicate::str::contains("--unlock-file"));
}

#[test]
fn dump_help_shows_which_and_format() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .args(["dump", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--which"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--export-dir"));
}

#[test]
fn password_and_hex_key_can_be_combined() {
    // `try_all_kinds` tries every supplied credential in turn rather than
    // requiring exactly one, so combining flags is a parse-time success —
    // this run still fails, but only because the keychain file is missing.
    Command::cargo_bin("chainbreak")
        .unwrap()
        .args([
            "dump",
            "nonexistent.keychain",
            "--password",
            "hunter2",
            "--hex-key",
            "aabb",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading"));
}

#[test]
fn password_and_unlock_file_can_be_combined() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .args([
            "dump",
            "nonexistent.keychain",
            "--password",
            "hunter2",
            "--unlock-file",
            "some.unlock",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading"));
}

#[test]
fn invalid_which_value_rejected() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .args(["dump", "nonexistent.keychain", "--which", "nonsense"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn invalid_format_value_rejected() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .args(["dump", "nonexistent.keychain", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn unrecognized_command_shows_error() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized"));
}

#[test]
fn missing_keychain_file_fails_at_runtime_not_parsing() {
    Command::cargo_bin("chainbreak")
        .unwrap()
        .args(["dump", "/definitely/does/not/exist.keychain"])
        .assert()
        .failure();
}
