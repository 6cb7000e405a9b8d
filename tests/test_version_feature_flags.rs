use assert_cmd::Command;
use e_harness::e_cli::get_feature_flags;
use predicates::prelude::*;
use predicates::str::contains;

#[test]
fn test_version_feature_flags() {
    let mut cmd = Command::cargo_bin("e-harness").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(contains("e-harness "))
        .stdout(contains("["))
        .stdout(contains("]"))
        .stdout(if cfg!(feature = "uses_git") {
            contains("\"uses_git\"").and(contains("\"!uses_git\"").not())
        } else {
            contains("\"!uses_git\"").and(contains("\"uses_git\"").not())
        });
}

#[test]
fn test_feature_flags_compact() {
    let flags = get_feature_flags();
    assert_eq!(flags.len(), 2);
    if cfg!(feature = "uses_sysinfo") {
        assert!(flags.contains(&"uses_sysinfo"), "got {:?}", flags);
    } else {
        assert!(flags.contains(&"!uses_sysinfo"), "got {:?}", flags);
    }
}

#[test]
fn test_no_subcommand_prints_help() {
    Command::cargo_bin("e-harness")
        .unwrap()
        .assert()
        .success()
        .stdout(contains("Usage:"))
        .stdout(contains("list-tests"));
}
