//! Final run report rendering

use crate::crawler::RunReport;
use std::fmt::Write;

/// Renders a run report as plain text
pub fn format_report(report: &RunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Mirror Report ===\n");
    let _ = writeln!(out, "Result: {}", report.reason);
    if report.resumed {
        let _ = writeln!(out, "Resumed from checkpoint");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "This run:");
    let _ = writeln!(out, "  Rounds: {}", report.rounds);
    let _ = writeln!(out, "  Pages processed: {}", report.pages);
    let _ = writeln!(out, "  Files downloaded: {}", report.files_written);
    let _ = writeln!(out, "  Files already present: {}", report.files_skipped);
    if report.abandoned > 0 {
        let _ = writeln!(out, "  Abandoned after retries: {}", report.abandoned);
    }
    let _ = writeln!(out);

    let total = report.completed + report.pending;
    let percentage = if total > 0 {
        (report.completed as f64 / total as f64) * 100.0
    } else {
        100.0
    };
    let _ = writeln!(
        out,
        "Progress: {:.1}% ({} completed, {} pending)",
        percentage, report.completed, report.pending
    );

    out
}

/// Prints a run report to stdout
pub fn print_report(report: &RunReport) {
    print!("{}", format_report(report));
}
