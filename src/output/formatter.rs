//! Output formatters for run reports
//!
//! Provides Table, JSON, CSV and one-line summary output.

use thiserror::Error;

use crate::models::TestStatus;
use crate::reporter::{CaseReport, RunReport};

/// Errors raised while rendering a report
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }

    /// Pick a format from a report file extension
    pub fn from_extension(path: &std::path::Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "json" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "txt" => Some(OutputFormat::Table),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn status_label(&self, status: TestStatus) -> &'static str {
        if self.colorize {
            match status {
                TestStatus::Pass => "\x1b[32m✓ PASS\x1b[0m",
                TestStatus::Fail => "\x1b[31m✗ FAIL\x1b[0m",
                TestStatus::Skip => "\x1b[33m○ SKIP\x1b[0m",
                TestStatus::Error => "\x1b[31m! ERROR\x1b[0m",
            }
        } else {
            match status {
                TestStatus::Pass => "✓ PASS",
                TestStatus::Fail => "✗ FAIL",
                TestStatus::Skip => "○ SKIP",
                TestStatus::Error => "! ERROR",
            }
        }
    }

    fn format_case_table(&self, case: &CaseReport) -> String {
        let mut output = format!(
            "{:2}. {:30} {} [{:>6}ms]",
            case.number,
            case.name,
            self.status_label(case.status),
            case.duration_ms
        );

        if !case.status.is_success() {
            if let Some(message) = &case.message {
                output.push_str(&format!("\n      {message}"));
            }
            for expectation in case.failed_expectations() {
                output.push_str(&format!("\n      {expectation}"));
            }
        }

        output
    }

    /// Format a whole run
    pub fn format_report(&self, report: &RunReport) -> Result<String, FormatError> {
        Ok(match self.format {
            OutputFormat::Table => self.format_report_table(report),
            OutputFormat::Json => serde_json::to_string(report)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(report)?,
            OutputFormat::Csv => csv_rows(&report.cases)?,
            OutputFormat::Summary => self.format_report_brief(report),
        })
    }

    fn format_report_table(&self, report: &RunReport) -> String {
        let mut output = String::new();

        // Header
        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!("║  Mercado API - Run {:42} ║\n", report.id));
        output.push_str(&format!("║  {:59} ║\n", report.base_url));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        // Cases
        for case in &report.cases {
            output.push_str(&format!("  {}\n", self.format_case_table(case)));
        }

        // Footer
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", report.passed)
        } else {
            report.passed.to_string()
        };
        let fail_str = if self.colorize && report.failed > 0 {
            format!("\x1b[31m{}\x1b[0m", report.failed)
        } else {
            report.failed.to_string()
        };

        output.push_str(&format!(
            "║  Total: {:2} | Pass: {} | Fail: {} | Skip: {:2} | Error: {:2}     ║\n",
            report.total, pass_str, fail_str, report.skipped, report.errors
        ));
        output.push_str(&format!(
            "║  Pass Rate: {:5.1}% | Expectations: {:3} | Duration: {:6}ms  ║\n",
            report.pass_rate(),
            report.expectation_count(),
            report.total_duration_ms
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_report_brief(&self, report: &RunReport) -> String {
        format!(
            "Mercado API - Run {}: {}/{} passed ({:.1}%) in {}ms",
            report.id,
            report.passed,
            report.total,
            report.pass_rate(),
            report.total_duration_ms
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// One row per expectation, or one row per case without expectations
fn csv_rows(cases: &[CaseReport]) -> Result<String, FormatError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "case_num",
        "case_name",
        "status",
        "duration_ms",
        "expectation",
        "passed",
        "expected_status",
        "actual_status",
        "detail",
    ])?;

    for case in cases {
        let base = [
            case.number.to_string(),
            case.name.clone(),
            case.status.to_string(),
            case.duration_ms.to_string(),
        ];
        if case.expectations.is_empty() {
            writer.write_record(base.iter().cloned().chain([
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                case.message.clone().unwrap_or_default(),
            ]))?;
        }
        for expectation in &case.expectations {
            writer.write_record(base.iter().cloned().chain([
                expectation.description.clone(),
                expectation.passed.to_string(),
                expectation
                    .expected_status
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                expectation
                    .actual_status
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                expectation.diff().trim().to_string(),
            ]))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
