use anyhow::Result;
use std::io::Write;

use crate::config::OutputFormat;
use crate::dataset::Value;
use crate::report::MetricsReport;

use super::summary::render_summary;

/// Exports a metrics report in the requested format.
///
/// - Table: Human-readable, color-coded terminal output
/// - JSON: Programmatic access
/// - CSV: Spreadsheet import or bulk loading into the reporting table
pub fn export_report(
    report: &MetricsReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(output, "{}", render_summary(report))?;
            Ok(())
        }
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Csv => export_csv(report, output),
    }
}

fn export_json(report: &MetricsReport, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn export_csv(report: &MetricsReport, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "{}", report.columns.join(","))?;

    for row in &report.rows {
        let line = report
            .columns
            .iter()
            .map(|column| row.get(column).map_or_else(String::new, csv_field))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(output, "{line}")?;
    }

    Ok(())
}

fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Text(text) => format!("\"{}\"", text.replace('"', "\"\"")),
    }
}
