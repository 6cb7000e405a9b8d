// tests/common/test_utils.rs
#![allow(dead_code)]

pub mod project_setup {
    use std::fs;
    use std::io::Result as IoResult;
    use std::path::{Path, PathBuf};
    use tempfile::{tempdir, TempDir};

    /// A wrapper around a temporary scripts directory.
    pub struct TestProject {
        /// When this is dropped, the directory and its contents are removed.
        pub temp_dir: TempDir,
        pub root: PathBuf,
    }

    impl TestProject {
        pub fn new(project_name: &str) -> IoResult<Self> {
            let temp_dir = tempdir()?;
            let root = temp_dir.path().join(project_name);
            fs::create_dir_all(&root)?;
            Ok(TestProject { temp_dir, root })
        }

        pub fn path(&self) -> &Path {
            &self.root
        }

        /// Writes `contents` to `rel`, creating parent directories.
        pub fn write(&self, rel: &str, contents: &str) -> IoResult<PathBuf> {
            let path = self.root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, contents)?;
            Ok(path)
        }

        /// Writes an `e-harness.toml` into the project root.
        pub fn write_config(&self, contents: &str) -> IoResult<PathBuf> {
            self.write("e-harness.toml", contents)
        }
    }

    /// A project with a mix of markdown, python test files and noise.
    pub fn create_listing_project() -> IoResult<TestProject> {
        let project = TestProject::new("listing")?;
        for name in [
            "README.md",
            "CHANGELOG.md",
            "notes.txt",
            "test_geoid.py",
            "test_api.py",
            "conftest.py",
            "run_fix.py",
        ] {
            project.write(name, "")?;
        }
        fs::create_dir_all(project.root.join("docs.md"))?;
        Ok(project)
    }
}

pub mod output {
    /// The names printed between the header and the `Total:` line.
    pub fn listed_names(stdout: &str) -> Vec<String> {
        stdout
            .lines()
            .filter(|l| l.starts_with("  "))
            .map(|l| l.trim().to_string())
            .collect()
    }

    pub fn total(stdout: &str) -> Option<usize> {
        stdout
            .lines()
            .find_map(|l| l.strip_prefix("Total: "))
            .and_then(|n| n.trim().parse().ok())
    }
}
