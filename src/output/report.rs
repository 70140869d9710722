//! Last-run reports
//!
//! After each run two files land in the report directory:
//! - `last_run_<kind>_<timestamp>.json`, an archive of the run summary
//! - `last_run_<kind>.txt`, a readable digest overwritten by every run

use crate::model::RunSummary;
use crate::output::OutputResult;
use crate::storage::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which entry mode produced a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Default,
    Category,
    Batch,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Default => "default",
            RunKind::Category => "categories",
            RunKind::Batch => "all_categories",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized form of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub kind: String,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn new(kind: RunKind, summary: RunSummary) -> Self {
        Self {
            generated_at: Utc::now(),
            kind: kind.as_str().to_string(),
            summary,
        }
    }
}

/// Files written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub text: PathBuf,
}

/// Writes the JSON archive and the text digest of a run
///
/// # Arguments
///
/// * `kind` - The mode that produced the summary
/// * `summary` - The run summary
/// * `dir` - Report directory; created if missing
///
/// # Returns
///
/// * `Ok(ReportPaths)` - Where the two files were written
/// * `Err(OutputError)` - A file could not be written
pub fn write_run_report(kind: RunKind, summary: &RunSummary, dir: &Path) -> OutputResult<ReportPaths> {
    let report = RunReport::new(kind, summary.clone());
    let stamp = report.generated_at.format("%Y%m%d_%H%M%S");

    let json = dir.join(format!("last_run_{}_{}.json", kind, stamp));
    let text = dir.join(format!("last_run_{}.txt", kind));

    atomic_write(&json, &serde_json::to_vec_pretty(&report)?)?;
    atomic_write(&text, format_text_report(&report).as_bytes())?;

    tracing::debug!("Run report written to {}", json.display());
    Ok(ReportPaths { json, text })
}

/// Formats the readable digest of a run
pub fn format_text_report(report: &RunReport) -> String {
    let mut text = format!(
        "Last run summary ({}) - {}\n\n",
        report.kind,
        report.generated_at.to_rfc3339()
    );

    if report.summary.is_empty() {
        text.push_str("Nothing collected.\n");
    }
    for outcome in report.summary.outcomes() {
        text.push_str(&format!(" - {} : {} items\n", outcome.name, outcome.saved));
    }

    text
}

/// Prints a run summary to stdout
pub fn print_summary(kind: RunKind, summary: &RunSummary) {
    println!("=== Shelfwalk Run ({}) ===\n", kind);

    if summary.is_empty() {
        println!("  Nothing collected.");
    }
    for outcome in summary.outcomes() {
        println!("  {:<40} {:>4} new  {}", outcome.name, outcome.saved, outcome.url);
    }

    println!(
        "\nTotal: {} new items across {} units",
        summary.total_saved(),
        summary.len()
    );
}
