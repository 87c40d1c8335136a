//! Smoke tests of the CLI surface: flags parse, offline subcommands run
//! against an empty storage root, and exit codes behave.

use assert_cmd::cargo::CommandCargoExt;
use std::process::Command;

#[test]
fn help_names_every_subcommand() {
    let output = Command::cargo_bin("pdsctl").unwrap().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["extract", "transform", "check-extract", "reset"] {
        assert!(text.contains(subcommand), "--help lacks {subcommand}:\n{text}");
    }
}

#[test]
fn check_extract_on_an_empty_root_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("pdsctl")
        .unwrap()
        .args(["--root", dir.path().to_str().unwrap(), "check-extract"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn reset_collection_without_dataset_id_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("pdsctl")
        .unwrap()
        .args(["--root", dir.path().to_str().unwrap(), "reset", "--scope", "collection"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
