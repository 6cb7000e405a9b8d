use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "e-harness runs scripts and reports whether they passed.", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version and feature flags in JSON format.
    #[arg(long, short = 'v', help = "Print version and feature flags in JSON format.")]
    pub version: bool,

    #[arg(
        long,
        global = true,
        help = "Path to the configuration file (default: ./e-harness.toml)."
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run a program, print its output and report pass/fail.
    Run {
        #[arg(long, short = 't', help = "Kill the child after this many seconds.")]
        timeout: Option<u64>,

        #[arg(
            long = "forward-exit",
            default_value_t = false,
            help = "Exit with the child's exit code. (default: false)"
        )]
        forward_exit: bool,

        #[arg(long, help = "Label used in output (default: the program name).")]
        label: Option<String>,

        #[arg(required = true, last = true, help = "Program and arguments to run.")]
        command: Vec<String>,
    },

    /// Run the `fix` harness entry and exit with its exit code.
    Fix,

    /// Run the `final-summary` harness entry and exit with its exit code.
    FinalSummary,

    /// Run a named harness entry from the configuration.
    Preset {
        #[arg(help = "Name of the [[harness]] entry.")]
        name: String,
    },

    /// Run every configured harness entry in order, stopping at the first failure.
    Suite {
        #[arg(long, help = "Also write a markdown report to this file.")]
        report: Option<PathBuf>,
    },

    /// List markdown files in a directory.
    ListMd {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// List test_*.py files in a directory.
    ListTests {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// List files in a directory matching a glob pattern.
    Scan {
        #[arg(long, short = 'p', help = "Glob pattern matched against file names.")]
        pattern: String,

        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Delete the configured workflow files if present.
    CleanWorkflows {
        #[arg(long, default_value = ".", help = "Directory the workflow paths are relative to.")]
        root: PathBuf,
    },

    /// Ask the configured geoid backend for a geoid and check its shape.
    GeoidCheck {
        #[arg(long, default_value = "Hello world")]
        raw: String,

        #[arg(long, default_value = "en")]
        lang: String,

        #[arg(long = "tag", default_values_t = vec!["default".to_string()])]
        tags: Vec<String>,
    },
}

/// Returns a vector of feature flag strings.
/// Enabled features are listed as-is while disabled ones are prefixed with "!".
pub fn get_feature_flags() -> Vec<&'static str> {
    let mut flags = Vec::new();
    if cfg!(feature = "uses_git") {
        flags.push("uses_git");
    } else {
        flags.push("!uses_git");
    }
    if cfg!(feature = "uses_sysinfo") {
        flags.push("uses_sysinfo");
    } else {
        flags.push("!uses_sysinfo");
    }
    flags
}

/// The version line and the JSON array of feature flags.
pub fn version_and_features() -> String {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown");
    let json_features = serde_json::to_string(&get_feature_flags()).unwrap_or_default();
    format!("e-harness {}\n{}", version, json_features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_trailing_command() {
        let cli = Cli::parse_from([
            "e-harness", "run", "--timeout", "30", "--forward-exit", "--", "python3", "fix.py",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                timeout: Some(30),
                forward_exit: true,
                label: None,
                command: vec!["python3".to_string(), "fix.py".to_string()],
            })
        );
    }

    #[test]
    fn test_parse_listers_default_to_cwd() {
        let cli = Cli::parse_from(["e-harness", "list-tests"]);
        assert_eq!(cli.command, Some(Commands::ListTests { dir: PathBuf::from(".") }));
        let cli = Cli::parse_from(["e-harness", "scan", "-p", "*.toml", "crates"]);
        assert_eq!(
            cli.command,
            Some(Commands::Scan {
                pattern: "*.toml".to_string(),
                dir: PathBuf::from("crates"),
            })
        );
    }

    #[test]
    fn test_geoid_check_defaults() {
        let cli = Cli::parse_from(["e-harness", "--config", "h.toml", "geoid-check"]);
        assert_eq!(cli.config, Some(PathBuf::from("h.toml")));
        assert_eq!(
            cli.command,
            Some(Commands::GeoidCheck {
                raw: "Hello world".to_string(),
                lang: "en".to_string(),
                tags: vec!["default".to_string()],
            })
        );
    }

    #[test]
    fn test_version_json() {
        let text = version_and_features();
        let json = text.lines().nth(1).unwrap();
        let flags: Vec<String> = serde_json::from_str(json).unwrap();
        assert_eq!(flags.len(), 2);
    }
}
