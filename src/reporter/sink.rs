//! Report sinks

use std::path::PathBuf;

use super::{ReporterError, RunReport};
use crate::output::{OutputFormat, ResultFormatter};

/// Destination for a finished report
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, report: &RunReport) -> Result<(), ReporterError>;
}

/// Prints the report to stdout
pub struct ConsoleSink {
    formatter: ResultFormatter,
}

impl ConsoleSink {
    pub fn new(formatter: ResultFormatter) -> Self {
        Self { formatter }
    }
}

impl ReportSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&self, report: &RunReport) -> Result<(), ReporterError> {
        let output = self
            .formatter
            .format_report(report)
            .map_err(|e| ReporterError::Sink {
                sink: self.name().to_string(),
                reason: e.to_string(),
            })?;
        println!("{output}");
        Ok(())
    }
}

/// Writes the report to a file, creating parent directories
pub struct FileSink {
    path: PathBuf,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ReportSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write(&self, report: &RunReport) -> Result<(), ReporterError> {
        let sink_error = |reason: String| ReporterError::Sink {
            sink: self.path.display().to_string(),
            reason,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| sink_error(e.to_string()))?;
        }

        let content = ResultFormatter::new(self.format)
            .no_color()
            .format_report(report)
            .map_err(|e| sink_error(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| sink_error(e.to_string()))?;

        tracing::info!("Saved report to {}", self.path.display());
        Ok(())
    }
}
