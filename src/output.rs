//! Output formatting and persistence for route statistics.
//!
//! Supports the plain-text report, pretty-printing, JSON serialization, and
//! CSV append of run summaries.

use anyhow::Result;
use csv::WriterBuilder;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::classify::StopCategories;
use crate::rules::ValidationReport;
use crate::stats::{LineStats, RouteStats, RouteSummary};

/// Field error section of the text report.
pub fn render_errors(errors: &ValidationReport) -> String {
    let mut out = format!("Type and field validation: {} errors\n", errors.total());
    for (field, count) in errors.iter() {
        let _ = writeln!(out, "{field}: {count}");
    }
    out
}

/// Line/stop-count section of the text report.
pub fn render_lines(lines: &LineStats) -> String {
    let mut out = String::from("Line names and number of stops:\n");
    for line in lines.iter() {
        let _ = writeln!(out, "bus_id: {}, stops: {}", line.bus_id, line.stops);
    }
    out
}

/// Stop category section of the text report.
pub fn render_categories(categories: &StopCategories) -> String {
    let sections = [
        ("Start stops", &categories.start),
        ("Transfer stops", &categories.transfer),
        ("Finish stops", &categories.finish),
        ("On demand stops", &categories.on_demand),
    ];

    let mut out = String::new();
    for (label, names) in sections {
        let _ = writeln!(out, "{label}: {} {}", names.len(), quoted_list(names));
    }
    out
}

/// The three sections joined by blank lines.
pub fn render_report(stats: &RouteStats) -> String {
    format!(
        "{}\n{}\n{}",
        render_errors(&stats.errors),
        render_lines(&stats.lines),
        render_categories(&stats.categories)
    )
}

/// `['A', 'B']`, or `[]` when empty.
fn quoted_list(names: &BTreeSet<String>) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Logs route statistics using Rust's debug pretty-print format.
pub fn print_pretty(stats: &RouteStats) {
    debug!("{:#?}", stats);
}

/// Serializes route statistics as pretty-printed JSON.
pub fn to_json(stats: &RouteStats) -> Result<String> {
    Ok(serde_json::to_string_pretty(stats)?)
}

/// Appends a [`RouteSummary`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, summary: &RouteSummary) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(summary)?;
    writer.flush()?;

    Ok(())
}
