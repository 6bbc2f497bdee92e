use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::dataset::Value;
use crate::report::MetricsReport;

use super::styling::{bright, bright_yellow, cyan, dim};
use super::tables::{color_coded_success_cell, create_table, cyan_header, verdict_cell};

/// Columns identifying a row rather than carrying a verdict.
const KEY_COLUMNS: [&str; 2] = ["pipeline", "build"];

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

/// Counts of passed and failed verdicts in one column.
fn verdict_counts(report: &MetricsReport, column: &str) -> (usize, usize) {
    report
        .column_values(column)
        .fold((0, 0), |(passed, failed), value| match value.to_string().as_str() {
            "passed" => (passed + 1, failed),
            "failed" => (passed, failed + 1),
            _ => (passed, failed),
        })
}

#[allow(clippy::cast_precision_loss)]
fn pass_rate(passed: usize, failed: usize) -> f64 {
    let total = passed + failed;
    if total > 0 {
        (passed as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Renders the report as color-coded tables.
///
/// Shows an overview, one row per collected build with green/red verdicts,
/// and the pass rate of every verdict column across all rows.
pub fn render_summary(report: &MetricsReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n",
        dim("Collector:"),
        cyan(&report.collector),
        dim("Rows collected:"),
        bright_yellow(report.rows.len()),
        dim("Collected at:"),
        dim(report.collected_at.format("%Y-%m-%d %H:%M UTC")),
    );

    if report.rows.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No finished builds found."));
        return output;
    }

    add_section_header(&mut output, "📋", "Builds");

    let headers: Vec<&str> = report.columns.iter().map(String::as_str).collect();
    let mut rows_table = create_table();
    rows_table.set_header(cyan_header(&headers));

    for row in &report.rows {
        rows_table.add_row(report.columns.iter().map(|column| {
            let value = row.get(column).cloned().unwrap_or(Value::Null);
            if KEY_COLUMNS.contains(&column.as_str()) {
                Cell::new(value)
            } else {
                verdict_cell(&value)
            }
        }));
    }
    let _ = writeln!(output, "{rows_table}\n");

    add_section_header(&mut output, "✅", "Pass Rates");

    let mut rates_table = create_table();
    rates_table.set_header(cyan_header(&["Platform", "Passed", "Failed", "Pass Rate"]));

    for column in report
        .columns
        .iter()
        .filter(|c| !KEY_COLUMNS.contains(&c.as_str()))
    {
        let (passed, failed) = verdict_counts(report, column);
        if passed + failed == 0 {
            rates_table.add_row(vec![
                Cell::new(column),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("n/a"),
            ]);
            continue;
        }
        rates_table.add_row(vec![
            Cell::new(column),
            Cell::new(passed).fg(TableColor::Green),
            Cell::new(failed).fg(TableColor::Red),
            color_coded_success_cell(pass_rate(passed, failed)),
        ]);
    }
    let _ = writeln!(output, "{rates_table}");

    output
}
