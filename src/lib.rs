#![doc = include_str!("../README.md")]

// Re-export std common modules
pub mod prelude {
    pub use std::env;
    pub use std::fs;
    pub use std::io;
    pub use std::path::{Path, PathBuf};
    pub use std::process::exit;
    pub use std::process::Child;
    pub use std::process::Command;
    pub use std::process::Stdio;
    pub use std::sync::{Arc, Mutex};
    pub use std::time::Instant;
    pub use log::{debug, error, info, warn};
}

pub mod e_cleanup;
pub mod e_cli;
pub use e_cli::{Cli, Commands};
pub mod e_command_builder;
pub mod e_config;
pub use e_config::{HarnessConfig, HarnessEntry};
pub mod e_fmt;
pub mod e_geoid;
pub mod e_reports;
pub mod e_runner;
pub use e_runner::{run_and_report, run_invocation};
pub mod e_scan;
pub mod e_types;
pub use e_types::{Invocation, InvocationResult, Outcome};
