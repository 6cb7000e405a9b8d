use anyhow::{Context, Result};
use glob::Pattern;
use std::fs;
use std::path::Path;

/// Which file names a scan keeps.
#[derive(Debug, Clone)]
pub enum FilePattern {
    Suffix(String),
    PrefixSuffix { prefix: String, suffix: String },
    Glob(Pattern),
}

impl FilePattern {
    /// Files ending in `suffix`, e.g. `.md`.
    pub fn suffix(suffix: &str) -> Self {
        FilePattern::Suffix(suffix.to_string())
    }

    /// Files starting with `prefix` and ending with `suffix`, e.g. `test_` + `.py`.
    pub fn prefix_suffix(prefix: &str, suffix: &str) -> Self {
        FilePattern::PrefixSuffix {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        let compiled =
            Pattern::new(pattern).with_context(|| format!("invalid pattern '{}'", pattern))?;
        Ok(FilePattern::Glob(compiled))
    }

    pub fn markdown() -> Self {
        Self::suffix(".md")
    }

    pub fn python_tests() -> Self {
        Self::prefix_suffix("test_", ".py")
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            FilePattern::Suffix(suffix) => name.ends_with(suffix.as_str()),
            // The prefix and suffix may not overlap: "test_.py" has no stem but still counts.
            FilePattern::PrefixSuffix { prefix, suffix } => {
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix.as_str())
                    && name.ends_with(suffix.as_str())
            }
            FilePattern::Glob(pattern) => pattern.matches(name),
        }
    }

    /// Text used in listing headers.
    pub fn describe(&self) -> String {
        match self {
            FilePattern::Suffix(suffix) => format!("*{}", suffix),
            FilePattern::PrefixSuffix { prefix, suffix } => format!("{}*{}", prefix, suffix),
            FilePattern::Glob(pattern) => pattern.as_str().to_string(),
        }
    }
}

/// Sorted file names found by [`scan_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanListing {
    pub pattern: String,
    pub names: Vec<String>,
}

impl ScanListing {
    pub fn count(&self) -> usize {
        self.names.len()
    }

    pub fn render(&self) -> String {
        let mut out = format!("Files matching {}:\n", self.pattern);
        for name in &self.names {
            out.push_str("  ");
            out.push_str(name);
            out.push('\n');
        }
        out.push_str(&format!("Total: {}\n", self.count()));
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

/// Lists regular files directly inside `dir` whose names match `pattern`.
///
/// The listing is sorted lexicographically by byte value. Subdirectories are
/// not descended into and never listed; names that are not valid UTF-8 are
/// skipped.
pub fn scan_dir(dir: &Path, pattern: &FilePattern) -> Result<ScanListing> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let file_type = entry.file_type()?;
        let is_file = file_type.is_file()
            || (file_type.is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            log::debug!("skipping non-UTF-8 name {:?}", entry.file_name());
            continue;
        };
        if pattern.matches(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(ScanListing {
        pattern: pattern.describe(),
        names,
    })
}
