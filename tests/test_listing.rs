mod common;

use common::test_prelude::*;
use common::test_utils::output::{listed_names, total};
use common::test_utils::project_setup::create_listing_project;

fn stdout_of(args: &[&str], dir: &std::path::Path) -> String {
    let out = Command::cargo_bin("e-harness")
        .unwrap()
        .current_dir(dir)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_list_md_sorted_with_matching_count() -> Result<(), Box<dyn std::error::Error>> {
    let project = create_listing_project()?;
    let stdout = stdout_of(&["list-md"], project.path());

    let names = listed_names(&stdout);
    assert_eq!(names, vec!["CHANGELOG.md", "README.md"]);
    assert_eq!(total(&stdout), Some(names.len()));
    Ok(())
}

#[test]
fn test_list_tests_only_prefixed_python_files() -> Result<(), Box<dyn std::error::Error>> {
    let project = create_listing_project()?;
    let stdout = stdout_of(&["list-tests"], project.path());

    let names = listed_names(&stdout);
    assert_eq!(names, vec!["test_api.py", "test_geoid.py"]);
    assert_eq!(total(&stdout), Some(2));
    Ok(())
}

#[test]
fn test_scan_with_explicit_dir_and_pattern() -> Result<(), Box<dyn std::error::Error>> {
    let project = create_listing_project()?;
    let dir = project.path().to_string_lossy().to_string();
    let stdout = stdout_of(&["scan", "--pattern", "*.py", &dir], project.temp_dir.path());

    let names = listed_names(&stdout);
    assert_eq!(
        names,
        vec!["conftest.py", "run_fix.py", "test_api.py", "test_geoid.py"]
    );
    assert_eq!(total(&stdout), Some(4));
    Ok(())
}

#[test]
fn test_scan_missing_directory_fails() -> Result<(), Box<dyn std::error::Error>> {
    let project = create_listing_project()?;
    Command::cargo_bin("e-harness")?
        .current_dir(project.path())
        .args(["list-md", "no-such-dir"])
        .assert()
        .failure()
        .stderr(contains("failed to read directory"));
    Ok(())
}
