//! Optional `e-harness.toml` configuration.
//!
//! Every section is optional; anything left out falls back to the built-in
//! defaults below. A missing file is the same as an empty one.

use crate::e_cleanup::DEFAULT_WORKFLOW_FILES;
use crate::e_command_builder::InvocationBuilder;
use crate::e_types::Invocation;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "e-harness.toml";

/// Timeout applied to the built-in presets.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("duplicate harness entry '{0}'")]
    DuplicateEntry(String),
    #[error("harness entry '{0}' has an empty program")]
    EmptyProgram(String),
}

/// One named harness: a program to run with a timeout and exit-code policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HarnessEntry {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub forward_exit_code: bool,
    #[serde(default)]
    pub current_dir: Option<PathBuf>,
}

impl HarnessEntry {
    fn preset(name: &str, script: &str) -> Self {
        HarnessEntry {
            name: name.to_string(),
            program: "python3".to_string(),
            args: vec![script.to_string()],
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            forward_exit_code: true,
            current_dir: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn to_invocation(&self) -> Invocation {
        let mut builder = InvocationBuilder::new(&self.program)
            .with_label(&self.name)
            .with_args(&self.args)
            .with_timeout(self.timeout());
        if let Some(dir) = &self.current_dir {
            builder = builder.with_current_dir(dir);
        }
        builder.build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CleanupConfig {
    pub paths: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        CleanupConfig {
            paths: DEFAULT_WORKFLOW_FILES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// External program that produces a geoid as JSON on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeoidConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GeoidConfig {
    fn default() -> Self {
        GeoidConfig {
            program: "python3".to_string(),
            args: vec!["geoid_backend.py".to_string()],
            timeout_secs: Some(120),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    harness: Vec<HarnessEntry>,
    cleanup: Option<CleanupConfig>,
    geoid: Option<GeoidConfig>,
}

fn builtin_presets() -> Vec<HarnessEntry> {
    vec![
        HarnessEntry::preset("fix", "fix.py"),
        HarnessEntry::preset("final-summary", "final_summary.py"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Entries `suite` runs, in order. The file's `[[harness]]` entries when it
    /// has any, otherwise the built-in presets.
    pub harness: Vec<HarnessEntry>,
    /// Built-in presets, reachable by name even when `harness` omits them.
    pub presets: Vec<HarnessEntry>,
    pub cleanup: CleanupConfig,
    pub geoid: GeoidConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            harness: builtin_presets(),
            presets: builtin_presets(),
            cleanup: CleanupConfig::default(),
            geoid: GeoidConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        let mut config = HarnessConfig::default();
        let mut seen = std::collections::HashSet::new();
        for entry in &raw.harness {
            if entry.program.trim().is_empty() {
                return Err(ConfigError::EmptyProgram(entry.name.clone()));
            }
            if !seen.insert(entry.name.clone()) {
                return Err(ConfigError::DuplicateEntry(entry.name.clone()));
            }
        }
        if !raw.harness.is_empty() {
            config.harness = raw.harness;
        }
        if let Some(cleanup) = raw.cleanup {
            config.cleanup = cleanup;
        }
        if let Some(geoid) = raw.geoid {
            config.geoid = geoid;
        }
        Ok(config)
    }

    /// Loads `path`, or the defaults when `path` does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                log::debug!("loading config from {}", path.display());
                Self::from_toml_str(&contents, path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} not found; using built-in defaults", path.display());
                Ok(HarnessConfig::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Looks `name` up among the configured entries, then the built-in presets.
    pub fn entry(&self, name: &str) -> Option<&HarnessEntry> {
        self.harness
            .iter()
            .chain(self.presets.iter())
            .find(|e| e.name == name)
    }

    /// Every name [`HarnessConfig::entry`] resolves, configured entries first.
    pub fn known_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.harness.iter().map(|e| e.name.as_str()).collect();
        for preset in &self.presets {
            if !names.contains(&preset.name.as_str()) {
                names.push(preset.name.as_str());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_presets() {
        let config = HarnessConfig::default();
        let fix = config.entry("fix").unwrap();
        assert_eq!(fix.program, "python3");
        assert_eq!(fix.args, vec!["fix.py"]);
        assert!(fix.forward_exit_code);
        assert_eq!(fix.timeout(), Some(Duration::from_secs(30)));
        assert!(config.entry("final-summary").is_some());
        assert_eq!(config.cleanup.paths.len(), DEFAULT_WORKFLOW_FILES.len());
    }

    #[test]
    fn test_file_entries_replace_suite_list() {
        let toml = r#"
            [[harness]]
            name = "fix"
            program = "sh"
            args = ["-c", "exit 0"]

            [[harness]]
            name = "lint"
            program = "ruff"
            args = ["check", "."]
            timeout_secs = 60

            [cleanup]
            paths = [".github/workflows/only.yml"]
        "#;
        let config = HarnessConfig::from_toml_str(toml, Path::new("e-harness.toml")).unwrap();
        let names: Vec<_> = config.harness.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["fix", "lint"]);
        assert_eq!(config.known_names(), vec!["fix", "lint", "final-summary"]);

        // Still reachable by name for the `final-summary` subcommand.
        assert_eq!(config.entry("final-summary").unwrap().args, vec!["final_summary.py"]);

        let fix = config.entry("fix").unwrap();
        assert_eq!(fix.program, "sh");
        assert!(!fix.forward_exit_code);
        assert_eq!(fix.timeout(), None);

        let lint = config.entry("lint").unwrap().to_invocation();
        assert_eq!(lint.label, "lint");
        assert_eq!(lint.command_line(), "ruff check .");
        assert_eq!(lint.timeout, Some(Duration::from_secs(60)));

        assert_eq!(config.cleanup.paths, vec![".github/workflows/only.yml"]);
        assert_eq!(config.geoid, GeoidConfig::default());
    }

    #[test]
    fn test_custom_entries_only() {
        let toml = "[[harness]]\nname = \"lint\"\nprogram = \"ruff\"\n";
        let config = HarnessConfig::from_toml_str(toml, Path::new("e-harness.toml")).unwrap();
        let names: Vec<_> = config.harness.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["lint"]);
        assert_eq!(config.entry("fix").unwrap().program, "python3");
    }

    #[test]
    fn test_duplicate_and_empty_entries_rejected() {
        let dup = r#"
            [[harness]]
            name = "a"
            program = "true"
            [[harness]]
            name = "a"
            program = "true"
        "#;
        assert!(matches!(
            HarnessConfig::from_toml_str(dup, Path::new("x.toml")),
            Err(ConfigError::DuplicateEntry(name)) if name == "a"
        ));

        let empty = "[[harness]]\nname = \"b\"\nprogram = \" \"\n";
        assert!(matches!(
            HarnessConfig::from_toml_str(empty, Path::new("x.toml")),
            Err(ConfigError::EmptyProgram(_))
        ));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = HarnessConfig::from_toml_str("[[harness]]\nname = 3", Path::new("bad.toml"))
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to parse bad.toml"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }
}
