use crate::e_fmt::format_duration;
use crate::e_types::InvocationResult;
use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Row, Table};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Lines of captured output kept per stream in the markdown report.
const REPORT_TAIL_LINES: usize = 40;

#[cfg(feature = "uses_git")]
fn current_remote_and_short_sha() -> Result<(String, String), git2::Error> {
    use git2::{Error, Repository};
    let repo = Repository::discover(".")?;

    let oid = repo
        .head()?
        .target()
        .ok_or_else(|| Error::from_str("no HEAD target"))?;
    let short = repo
        .find_object(oid, None)?
        .short_id()?
        .as_str()
        .ok_or_else(|| Error::from_str("invalid short id"))?
        .to_string();

    let remote = repo
        .find_remote("origin")
        .or_else(|_| {
            repo.remotes()?
                .get(0)
                .and_then(|name| repo.find_remote(name).ok())
                .ok_or_else(|| Error::from_str("no remotes configured"))
        })?
        .url()
        .unwrap_or_default()
        .to_string();

    Ok((remote, short))
}

#[cfg(feature = "uses_git")]
fn repository_line() -> String {
    match current_remote_and_short_sha() {
        Ok((remote, sha)) => format!("{} @ {}", remote, sha),
        Err(e) => {
            log::debug!("no git metadata: {}", e);
            "Unknown".to_string()
        }
    }
}

#[cfg(not(feature = "uses_git"))]
fn repository_line() -> String {
    "Unknown".to_string()
}

#[cfg(feature = "uses_sysinfo")]
fn system_line() -> String {
    let name = sysinfo::System::name().unwrap_or_else(|| "Unknown".to_string());
    let version = sysinfo::System::os_version().unwrap_or_else(|| "Unknown".to_string());
    format!("{} {}", name, version)
}

#[cfg(not(feature = "uses_sysinfo"))]
fn system_line() -> String {
    std::env::consts::OS.to_string()
}

/// Summary table of a harness run: one row per invocation.
pub fn summary_table(results: &[InvocationResult]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "label", "outcome", "exit", "elapsed", "command"]);
    for (idx, result) in results.iter().enumerate() {
        let exit = result
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(Row::from(vec![
            Cell::new(idx + 1),
            Cell::new(&result.label),
            Cell::new(result.outcome().label()),
            Cell::new(exit),
            Cell::new(format_duration(result.elapsed)),
            Cell::new(result.command_line()),
        ]));
    }
    table
}

/// Prints [`summary_table`] followed by a pass count line.
pub fn print_summary(results: &[InvocationResult], planned: usize) {
    println!("{}", summary_table(results));
    let passed = results.iter().filter(|r| r.success()).count();
    let skipped = planned.saturating_sub(results.len());
    if skipped > 0 {
        println!("{} of {} passed ({} skipped after failure)", passed, planned, skipped);
    } else {
        println!("{} of {} passed", passed, planned);
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

/// Renders a markdown report with a metadata header, the summary table and
/// the tail of each failing invocation's output.
pub fn generate_markdown_report(results: &[InvocationResult]) -> String {
    let mut md = String::new();
    md.push_str("# Harness Report\n\n");
    md.push_str(&format!(
        "- generated on: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!("- e-harness version: {}\n", env!("CARGO_PKG_VERSION")));
    md.push_str(&format!("- repository: {}\n", repository_line()));
    md.push_str(&format!("- system: {}\n\n", system_line()));

    md.push_str("| # | label | outcome | exit | elapsed | command |\n");
    md.push_str("|---|-------|---------|------|---------|---------|\n");
    for (idx, result) in results.iter().enumerate() {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | `{}` |\n",
            idx + 1,
            result.label,
            result.outcome().label(),
            result
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_duration(result.elapsed),
            result.command_line()
        ));
    }

    for result in results.iter().filter(|r| !r.success()) {
        md.push_str(&format!("\n## {} ({})\n", result.label, result.outcome()));
        for (stream, text) in [("stdout", &result.stdout), ("stderr", &result.stderr)] {
            if text.trim().is_empty() {
                continue;
            }
            md.push_str(&format!(
                "\n### {}\n\n```text\n{}\n```\n",
                stream,
                tail(text, REPORT_TAIL_LINES)
            ));
        }
    }
    md
}

pub fn save_report_to_file(report: &str, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(report.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
