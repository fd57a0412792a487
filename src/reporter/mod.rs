//! Run reporter
//!
//! Collects expectation results and case outcomes during a run and writes the
//! finished report to its sinks. `record` may be called from concurrently
//! running steps; a mutex guards the append-only log.

mod report;
mod sink;

pub use report::{CaseReport, RunReport};
pub use sink::{ConsoleSink, FileSink, ReportSink};

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{CaseResult, ExpectationResult, MercadoCase};

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("reporter was not started")]
    NotStarted,

    #[error("report sink '{sink}' failed: {reason}")]
    Sink { sink: String, reason: String },
}

/// Identity of the run being reported
#[derive(Clone, Debug)]
pub struct RunInfo {
    pub id: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
}

impl RunInfo {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            id: generate_run_id(),
            base_url: base_url.into(),
            started_at: Utc::now(),
        }
    }
}

#[derive(Default)]
struct ReporterState {
    run: Option<RunInfo>,
    entries: Vec<(MercadoCase, ExpectationResult)>,
    cases: Vec<CaseResult>,
}

/// Append-only collector for one run
pub struct RunReporter {
    state: Mutex<ReporterState>,
    sinks: Vec<Box<dyn ReportSink>>,
}

impl RunReporter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ReporterState::default()),
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        // Entries are only ever appended, so a poisoned log is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a run with an empty report
    pub fn begin(&self, run: RunInfo) {
        info!("Starting run {} against {}", run.id, run.base_url);
        let mut state = self.lock();
        *state = ReporterState {
            run: Some(run),
            ..ReporterState::default()
        };
    }

    /// Append one expectation result for a case
    pub fn record(&self, case: MercadoCase, result: ExpectationResult) {
        debug!("[{}] {}", case.name(), result);
        self.lock().entries.push((case, result));
    }

    /// Record the final status of a case
    pub fn finish_case(&self, result: CaseResult) {
        self.lock().cases.push(result);
    }

    /// Expectation results recorded so far for one case
    pub fn recorded(&self, case: MercadoCase) -> Vec<ExpectationResult> {
        self.lock()
            .entries
            .iter()
            .filter(|(c, _)| *c == case)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Finalize the report and write it to every sink
    pub fn end(&self) -> Result<RunReport, ReporterError> {
        let report = {
            let mut state = self.lock();
            let run = state.run.take().ok_or(ReporterError::NotStarted)?;
            let entries = std::mem::take(&mut state.entries);
            let cases = std::mem::take(&mut state.cases);
            assemble(run, entries, cases)
        };

        for sink in &self.sinks {
            debug!("Writing report to {}", sink.name());
            sink.write(&report)?;
        }

        info!(
            "Run {} finished - Pass: {}/{} ({:.1}%)",
            report.id,
            report.passed,
            report.total,
            report.pass_rate()
        );

        Ok(report)
    }
}

impl Default for RunReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Group entries by case, keeping execution order
fn assemble(
    run: RunInfo,
    entries: Vec<(MercadoCase, ExpectationResult)>,
    cases: Vec<CaseResult>,
) -> RunReport {
    let mut reports: Vec<CaseReport> = cases
        .into_iter()
        .map(|result| {
            let expectations = entries
                .iter()
                .filter(|(c, _)| *c == result.case)
                .map(|(_, r)| r.clone())
                .collect();
            CaseReport::new(result, expectations)
        })
        .collect();

    // Entries for a case that never reported an outcome
    for (case, _) in &entries {
        if !reports.iter().any(|r| r.case == *case) {
            let expectations = entries
                .iter()
                .filter(|(c, _)| c == case)
                .map(|(_, r)| r.clone())
                .collect();
            reports.push(CaseReport::new(
                CaseResult::error(*case, 0, "case did not complete"),
                expectations,
            ));
        }
    }

    RunReport::new(run.id, run.base_url, run.started_at, Utc::now(), reports)
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}
