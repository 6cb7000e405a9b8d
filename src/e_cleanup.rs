use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Workflow files removed by `clean-workflows` when no `[cleanup]` section is configured.
pub const DEFAULT_WORKFLOW_FILES: &[&str] = &[
    ".github/workflows/ci.yml",
    ".github/workflows/test.yml",
    ".github/workflows/tests.yml",
    ".github/workflows/python-app.yml",
    ".github/workflows/python-package.yml",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStatus {
    Removed,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The path as given, relative to the cleanup root.
    pub path: String,
    pub status: RemovalStatus,
}

impl Removal {
    pub fn describe(&self) -> String {
        match self.status {
            RemovalStatus::Removed => format!("Removed: {}", self.path),
            RemovalStatus::Absent => format!("Not found (skipped): {}", self.path),
        }
    }
}

/// Deletes each of `paths` under `root` if it exists.
///
/// A missing file is reported as [`RemovalStatus::Absent`], so running this
/// twice leaves the same end state. Any other I/O failure, including a path
/// that names a directory, stops the run with an error.
pub fn remove_paths<S: AsRef<str>>(root: &Path, paths: &[S]) -> Result<Vec<Removal>> {
    remove_paths_with(root, paths, |_| {})
}

/// Like [`remove_paths`], calling `on_removal` after each path is handled,
/// before moving on to the next one.
pub fn remove_paths_with<S, F>(root: &Path, paths: &[S], mut on_removal: F) -> Result<Vec<Removal>>
where
    S: AsRef<str>,
    F: FnMut(&Removal),
{
    let mut removals = Vec::with_capacity(paths.len());
    for rel in paths {
        let rel = rel.as_ref();
        let full: PathBuf = root.join(rel);
        let status = match fs::remove_file(&full) {
            Ok(()) => RemovalStatus::Removed,
            // A file in place of a parent directory means the target cannot exist.
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                RemovalStatus::Absent
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to remove {}", full.display()));
            }
        };
        debug!("{} -> {:?}", full.display(), status);
        let removal = Removal {
            path: rel.to_string(),
            status,
        };
        on_removal(&removal);
        removals.push(removal);
    }
    Ok(removals)
}

/// Removes `paths` under `root`, printing one line per path as it goes.
pub fn clean_and_print<S: AsRef<str>>(root: &Path, paths: &[S]) -> Result<Vec<Removal>> {
    let removals = remove_paths_with(root, paths, |removal| println!("{}", removal.describe()))?;
    let removed = removals
        .iter()
        .filter(|r| r.status == RemovalStatus::Removed)
        .count();
    println!("{} of {} workflow files removed.", removed, removals.len());
    Ok(removals)
}
