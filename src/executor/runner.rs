//! Suite execution runner
//!
//! Runs mercado cases one after another against a single client, threading
//! captured values through the shared context and reporting every outcome.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cases::{self, CaseContext};
use crate::config::AppConfig;
use crate::context::{ContextKey, SharedContext};
use crate::http::HttpClient;
use crate::models::{CaseResult, MercadoCase, TestStatus};
use crate::reporter::{ReporterError, RunInfo, RunReport, RunReporter};
use crate::utils::Timer;

/// Per-run knobs the cases read
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteSettings {
    pub resource_path: String,
    pub missing_id: u64,
    /// Fixed id for the delete case; `None` deletes the captured mercado
    pub delete_id: Option<u64>,
    pub fan_out: usize,
    pub max_concurrent: usize,
}

impl SuiteSettings {
    /// Context slots `case` reads under these settings
    pub fn requirements(&self, case: MercadoCase) -> Vec<ContextKey> {
        let mut keys = case.requires().to_vec();
        if case == MercadoCase::Delete && self.delete_id.is_none() {
            keys.push(ContextKey::MercadoId);
        }
        keys
    }

    /// Context slots whose resource `case` destroys; no later case may read them
    pub fn consumes(&self, case: MercadoCase) -> Vec<ContextKey> {
        match (case, self.delete_id) {
            (MercadoCase::Delete, None) => vec![ContextKey::MercadoId],
            _ => Vec::new(),
        }
    }
}

impl From<&AppConfig> for SuiteSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            resource_path: config.resource_path.clone(),
            missing_id: config.missing_id,
            delete_id: config.delete_id,
            fan_out: config.fan_out,
            max_concurrent: config.max_concurrent,
        }
    }
}

impl Default for SuiteSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SuiteError {
    #[error("suite has no cases")]
    Empty,

    #[error("{0} is listed more than once")]
    Duplicate(MercadoCase),

    #[error("{case} reads '{key}' but no earlier case writes it")]
    Unsatisfied { case: MercadoCase, key: ContextKey },

    #[error("{case} reads '{key}' after {by} deleted it")]
    Consumed {
        case: MercadoCase,
        key: ContextKey,
        by: MercadoCase,
    },
}

/// An ordered, validated list of cases
#[derive(Clone, Debug)]
pub struct Suite {
    cases: Vec<MercadoCase>,
    settings: SuiteSettings,
}

impl Suite {
    /// Validate that every context read follows its write
    pub fn new(cases: Vec<MercadoCase>, settings: SuiteSettings) -> Result<Self, SuiteError> {
        if cases.is_empty() {
            return Err(SuiteError::Empty);
        }

        let mut written: Vec<ContextKey> = Vec::new();
        let mut consumed: Vec<(ContextKey, MercadoCase)> = Vec::new();
        for (i, &case) in cases.iter().enumerate() {
            if cases[..i].contains(&case) {
                return Err(SuiteError::Duplicate(case));
            }
            for key in settings.requirements(case) {
                if !written.contains(&key) {
                    return Err(SuiteError::Unsatisfied { case, key });
                }
                if let Some(&(_, by)) = consumed.iter().find(|(k, _)| *k == key) {
                    return Err(SuiteError::Consumed { case, key, by });
                }
            }
            written.extend_from_slice(case.provides());
            consumed.extend(settings.consumes(case).into_iter().map(|key| (key, case)));
        }

        Ok(Self { cases, settings })
    }

    /// Every case in declaration order
    pub fn all(settings: SuiteSettings) -> Result<Self, SuiteError> {
        Self::new(MercadoCase::all(), settings)
    }

    /// The selected cases plus whichever cases write the values they read,
    /// in declaration order
    pub fn with_prerequisites(
        selected: &[MercadoCase],
        settings: SuiteSettings,
    ) -> Result<Self, SuiteError> {
        let mut cases: Vec<MercadoCase> = Vec::new();
        for &case in selected {
            if !cases.contains(&case) {
                cases.push(case);
            }
        }

        let needed: Vec<ContextKey> = cases
            .iter()
            .flat_map(|&case| settings.requirements(case))
            .collect();
        for key in needed {
            if cases.iter().any(|c| c.provides().contains(&key)) {
                continue;
            }
            if let Some(provider) = MercadoCase::all()
                .into_iter()
                .find(|c| c.provides().contains(&key))
            {
                info!("Including {} to capture '{}'", provider, key);
                cases.push(provider);
            }
        }

        cases.sort_by_key(|c| c.number());
        Self::new(cases, settings)
    }

    pub fn cases(&self) -> &[MercadoCase] {
        &self.cases
    }

    pub fn settings(&self) -> &SuiteSettings {
        &self.settings
    }
}

/// Sequential runner for a suite
pub struct SuiteRunner {
    client: HttpClient,
    reporter: Arc<RunReporter>,
}

impl SuiteRunner {
    pub fn new(client: HttpClient, reporter: Arc<RunReporter>) -> Self {
        Self { client, reporter }
    }

    /// Run every case in order and finalize the report
    pub async fn run(&self, suite: &Suite) -> Result<RunReport, ReporterError> {
        self.reporter
            .begin(RunInfo::new(self.client.base_url().to_string()));

        let shared = SharedContext::new();
        let mut aborted: Option<String> = None;

        for &case in suite.cases() {
            let result = match &aborted {
                Some(reason) => CaseResult::skip(case, reason.clone()),
                None => {
                    let (result, abort) = self.run_case(case, suite.settings(), &shared).await;
                    if let Some(reason) = abort {
                        error!("Aborting run: {}", reason);
                        aborted = Some(reason);
                    }
                    result
                }
            };

            info!("  {}", result);
            self.reporter.finish_case(result);
        }

        self.reporter.end()
    }

    /// Run one case, returning its result and an abort reason when the
    /// server could not be reached
    async fn run_case(
        &self,
        case: MercadoCase,
        settings: &SuiteSettings,
        shared: &SharedContext,
    ) -> (CaseResult, Option<String>) {
        if let Some(key) = settings
            .requirements(case)
            .into_iter()
            .find(|key| !shared.is_set(*key))
        {
            warn!("Skipping {}: '{}' was not captured", case, key);
            return (
                CaseResult::skip(case, format!("'{key}' was not captured by an earlier case")),
                None,
            );
        }

        info!("Running {}", case);
        let ctx = CaseContext::new(case, &self.client, &self.reporter, shared, settings);
        let timer = Timer::start(case.name());
        let outcome = cases::run_case(&ctx).await;
        let duration_ms = timer.stop();
        debug!(
            "{} recorded {} expectations",
            case,
            self.reporter.recorded(case).len()
        );

        match outcome {
            Ok(()) => (CaseResult::pass(case, duration_ms), None),
            Err(e) => {
                let abort = e
                    .aborts_run()
                    .then(|| format!("server unreachable during {}: {}", case, e));
                let result = match e.status() {
                    TestStatus::Fail => CaseResult::fail(case, duration_ms, e.to_string()),
                    TestStatus::Skip => CaseResult::skip(case, e.to_string()),
                    _ => CaseResult::error(case, duration_ms, e.to_string()),
                };
                (result, abort)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MercadoStub, SilentServer};

    fn settings() -> SuiteSettings {
        SuiteSettings {
            delete_id: None,
            ..SuiteSettings::default()
        }
    }

    fn runner(base_url: &str) -> SuiteRunner {
        let client = HttpClient::with_timeout(base_url, 5).unwrap();
        SuiteRunner::new(client, Arc::new(RunReporter::new()))
    }

    #[test]
    fn test_suite_rejects_read_before_write() {
        let err = Suite::new(
            vec![MercadoCase::FetchById, MercadoCase::Create],
            SuiteSettings::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SuiteError::Unsatisfied {
                case: MercadoCase::FetchById,
                key: ContextKey::MercadoId
            }
        );
    }

    #[test]
    fn test_suite_rejects_duplicates_and_empty() {
        assert_eq!(
            Suite::new(Vec::new(), SuiteSettings::default()).unwrap_err(),
            SuiteError::Empty
        );
        assert_eq!(
            Suite::new(
                vec![MercadoCase::List, MercadoCase::List],
                SuiteSettings::default()
            )
            .unwrap_err(),
            SuiteError::Duplicate(MercadoCase::List)
        );
    }

    #[test]
    fn test_delete_reads_captured_id_only_without_fixed_id() {
        let fixed = SuiteSettings::default();
        assert!(Suite::new(vec![MercadoCase::Delete], fixed).is_ok());

        let err = Suite::new(vec![MercadoCase::Delete], settings()).unwrap_err();
        assert!(matches!(err, SuiteError::Unsatisfied { .. }));
    }

    #[test]
    fn test_captured_delete_must_be_last_reader() {
        assert!(Suite::new(
            vec![MercadoCase::Create, MercadoCase::Update, MercadoCase::Delete],
            settings()
        )
        .is_ok());

        let err = Suite::all(settings()).unwrap_err();
        assert_eq!(
            err,
            SuiteError::Consumed {
                case: MercadoCase::FetchDetails,
                key: ContextKey::MercadoId,
                by: MercadoCase::Delete
            }
        );
    }

    #[test]
    fn test_with_prerequisites_adds_create() {
        let suite = Suite::with_prerequisites(
            &[MercadoCase::FetchDetails, MercadoCase::List],
            SuiteSettings::default(),
        )
        .unwrap();
        assert_eq!(
            suite.cases(),
            &[
                MercadoCase::Create,
                MercadoCase::List,
                MercadoCase::FetchDetails
            ]
        );
    }

    #[test]
    fn test_full_suite_is_valid() {
        assert_eq!(Suite::all(SuiteSettings::default()).unwrap().cases().len(), 13);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_run_against_stub_passes() {
        let stub = MercadoStub::start().await;
        // The delete case removes id 3
        stub.seed(3);

        let report = runner(&stub.base_url())
            .run(&Suite::all(SuiteSettings::default()).unwrap())
            .await
            .unwrap();

        for case in &report.cases {
            assert_eq!(case.status, TestStatus::Pass, "{} failed: {:?}", case.name, case.message);
        }
        assert_eq!(report.total, 13);
        assert!(!report.has_failures());

        // One expectation per dispatched spec: the fan-out case issues N
        // creates, one list and two case-level checks
        let fan_out = report.case(MercadoCase::CreateManyAndCount).unwrap();
        assert_eq!(fan_out.expectations.len(), 5 + 1 + 2);
    }

    #[tokio::test]
    async fn test_captured_delete_against_stub() {
        let stub = MercadoStub::start().await;

        let suite = Suite::new(vec![MercadoCase::Create, MercadoCase::Delete], settings()).unwrap();
        let report = runner(&stub.base_url()).run(&suite).await.unwrap();

        assert_eq!(report.passed, 2);
        assert_eq!(stub.count(), 0);
    }

    #[tokio::test]
    async fn test_fixed_delete_id_against_stub() {
        let stub = MercadoStub::start().await;
        // Seed ids 1..=3 so the fixed id exists
        stub.seed(3);

        let suite = Suite::new(
            vec![MercadoCase::Create, MercadoCase::Delete],
            SuiteSettings::default(),
        )
        .unwrap();
        let report = runner(&stub.base_url()).run(&suite).await.unwrap();

        assert_eq!(report.passed, 2);
        assert!(!stub.contains(3));
    }

    #[tokio::test]
    async fn test_skips_readers_when_create_fails() {
        let stub = MercadoStub::start().await;
        stub.fail_creates();

        let suite = Suite::new(
            vec![
                MercadoCase::Create,
                MercadoCase::FetchById,
                MercadoCase::FetchMissing,
            ],
            settings(),
        )
        .unwrap();
        let report = runner(&stub.base_url()).run(&suite).await.unwrap();

        assert_eq!(report.cases[0].status, TestStatus::Fail);
        assert_eq!(report.cases[1].status, TestStatus::Skip);
        assert_eq!(report.cases[2].status, TestStatus::Pass);

        let create = &report.cases[0];
        assert_eq!(create.expectations.len(), 1);
        assert_eq!(create.expectations[0].actual_status, Some(500));
    }

    #[tokio::test]
    async fn test_unreachable_server_aborts_remaining_cases() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let suite = Suite::new(
            vec![
                MercadoCase::List,
                MercadoCase::FetchMissing,
                MercadoCase::RejectEmptyName,
            ],
            settings(),
        )
        .unwrap();
        let report = runner(&format!("http://{addr}")).run(&suite).await.unwrap();

        assert_eq!(report.cases[0].status, TestStatus::Error);
        assert_eq!(report.cases[0].expectations.len(), 1);
        assert!(report.cases[0].expectations[0].error.is_some());
        assert_eq!(report.cases[1].status, TestStatus::Skip);
        assert_eq!(report.cases[2].status, TestStatus::Skip);
        assert_eq!(report.errors, 1);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test]
    async fn test_timeout_errors_only_its_own_case() {
        let server = SilentServer::start().await;
        let client = HttpClient::with_timeout(server.base_url(), 1).unwrap();
        let runner = SuiteRunner::new(client, Arc::new(RunReporter::new()));

        let suite = Suite::new(
            vec![MercadoCase::List, MercadoCase::FetchMissing],
            settings(),
        )
        .unwrap();
        let report = runner.run(&suite).await.unwrap();

        for case in &report.cases {
            assert_eq!(case.status, TestStatus::Error, "{}", case.name);
            assert_eq!(case.expectations.len(), 1);
            let error = case.expectations[0].error.as_deref().unwrap();
            assert!(error.contains("Timeout after 1 seconds"), "{error}");
        }
        assert_eq!(report.errors, 2);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_one_malformed_row_fails_only_shape_validation() {
        let stub = MercadoStub::start().await;
        stub.seed(1);
        stub.seed_malformed();

        let suite = Suite::new(
            vec![MercadoCase::List, MercadoCase::ValidateListShape],
            settings(),
        )
        .unwrap();
        let report = runner(&stub.base_url()).run(&suite).await.unwrap();

        assert_eq!(report.case(MercadoCase::List).unwrap().status, TestStatus::Pass);
        let shape = report.case(MercadoCase::ValidateListShape).unwrap();
        assert_eq!(shape.status, TestStatus::Fail);
        let failed: Vec<_> = shape.failed_expectations().collect();
        assert_eq!(failed[0].mismatches[0].field, "body[1].cnpj");
    }

    #[tokio::test]
    async fn test_wrong_id_in_details_fails() {
        let stub = MercadoStub::start().await;
        stub.corrupt_ids();

        let suite = Suite::new(
            vec![MercadoCase::Create, MercadoCase::FetchDetails],
            settings(),
        )
        .unwrap();
        let report = runner(&stub.base_url()).run(&suite).await.unwrap();

        let details = report.case(MercadoCase::FetchDetails).unwrap();
        assert_eq!(details.status, TestStatus::Fail);
        let failed: Vec<_> = details.failed_expectations().collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].mismatches.iter().any(|m| m.field == "body.id"));
        assert_eq!(report.case(MercadoCase::Create).unwrap().status, TestStatus::Pass);
    }
}
