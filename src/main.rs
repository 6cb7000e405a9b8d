//! # e-harness
//!
//! `e-harness` runs developer scripts as child processes, prints what they
//! wrote and reports whether they passed.
//!
//! ## Quick Start
//! ```sh
//! e-harness run --timeout 30 -- python3 fix.py
//! e-harness list-tests
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use e_harness::e_cleanup;
use e_harness::e_config::{HarnessConfig, CONFIG_FILE_NAME};
use e_harness::e_geoid::CommandGeoidSource;
use e_harness::e_reports;
use e_harness::e_scan::{scan_dir, FilePattern};
use e_harness::prelude::*;
use e_harness::{e_runner, Cli, Commands, HarnessEntry};

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<HarnessConfig> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    Ok(HarnessConfig::load(&path)?)
}

/// Runs one entry and decides the process exit code from its policy.
fn run_entry(entry: &HarnessEntry) -> Result<i32> {
    let result = e_runner::run_and_report(&entry.to_invocation())?;
    if entry.forward_exit_code {
        Ok(result.exit_code_to_forward())
    } else {
        Ok(0)
    }
}

fn run_preset(config: &HarnessConfig, name: &str) -> Result<i32> {
    let entry = config.entry(name).with_context(|| {
        format!(
            "no harness entry named '{}' (known: {})",
            name,
            config.known_names().join(", ")
        )
    })?;
    run_entry(entry)
}

fn run(cli: Cli) -> Result<i32> {
    if cli.version {
        println!("{}", e_harness::e_cli::version_and_features());
        return Ok(0);
    }
    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        println!();
        return Ok(0);
    };
    e_runner::register_ctrlc_handler()?;

    match command {
        Commands::Run {
            timeout,
            forward_exit,
            label,
            command,
        } => {
            let (program, args) = command
                .split_first()
                .context("run needs a program to execute")?;
            let entry = HarnessEntry {
                name: label.unwrap_or_else(|| program.clone()),
                program: program.clone(),
                args: args.to_vec(),
                timeout_secs: timeout,
                forward_exit_code: forward_exit,
                current_dir: None,
            };
            run_entry(&entry)
        }
        Commands::Fix => run_preset(&load_config(&cli)?, "fix"),
        Commands::FinalSummary => run_preset(&load_config(&cli)?, "final-summary"),
        Commands::Preset { name } => run_preset(&load_config(&cli)?, &name),
        Commands::Suite { report } => {
            let config = load_config(&cli)?;
            let invocations: Vec<_> = config.harness.iter().map(HarnessEntry::to_invocation).collect();
            let results = e_runner::run_until_failure(&invocations)?;
            e_reports::print_summary(&results, invocations.len());
            if let Some(path) = report {
                let md = e_reports::generate_markdown_report(&results);
                e_reports::save_report_to_file(&md, &path)?;
                println!("Report written to {}", path.display());
            }
            let all_passed = results.len() == invocations.len() && results.iter().all(|r| r.success());
            Ok(if all_passed { 0 } else { 1 })
        }
        Commands::ListMd { dir } => {
            scan_dir(&dir, &FilePattern::markdown())?.print();
            Ok(0)
        }
        Commands::ListTests { dir } => {
            scan_dir(&dir, &FilePattern::python_tests())?.print();
            Ok(0)
        }
        Commands::Scan { pattern, dir } => {
            scan_dir(&dir, &FilePattern::glob(&pattern)?)?.print();
            Ok(0)
        }
        Commands::CleanWorkflows { root } => {
            let config = load_config(&cli)?;
            e_cleanup::clean_and_print(&root, &config.cleanup.paths)?;
            Ok(0)
        }
        Commands::GeoidCheck { raw, lang, tags } => {
            let config = load_config(&cli)?;
            let source = CommandGeoidSource::from(&config.geoid);
            let started = Instant::now();
            match source.check(&raw, &lang, &tags) {
                Ok(dim) => {
                    println!(
                        "geoid OK: raw={:?} lang_axis={:?} sem_vec={} dims [{}]",
                        raw,
                        lang,
                        dim.dims(),
                        e_harness::e_fmt::format_duration_secs(started.elapsed())
                    );
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("geoid check failed: {:#}", e);
                    Ok(1)
                }
            }
        }
    }
}
