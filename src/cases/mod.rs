//! Mercado test cases
//!
//! This module contains the 13 cases run against the mercado resource.
//!
//! ## Case Categories
//!
//! ### CRUD (1, 2, 5, 7, 13)
//! - Create, fetch, update and delete, plus a detail check on the created id
//!
//! ### Validation (3, 11)
//! - Short CNPJ and empty name are rejected with 400
//!
//! ### Listing (4, 10)
//! - The list is an array of well-formed mercados
//!
//! ### Not Found (6, 8, 9)
//! - Fetch, delete and update of a missing id answer 404
//!
//! ### Concurrency (12)
//! - Concurrent creates each yield a new mercado

mod concurrency;
mod crud;
mod listing;
mod not_found;
mod validation;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::context::{ContextError, ContextKey, SharedContext};
use crate::executor::{first_failure, ParallelExecutor, SuiteSettings};
use crate::fake;
use crate::http::{HttpClient, HttpError};
use crate::matcher::Mismatch;
use crate::models::{id_segment, ExpectationResult, MercadoCase, MercadoPayload, TestStatus};
use crate::reporter::RunReporter;
use crate::spec::{PreparedSpec, RequestSpec, SpecError, SpecOutcome};

/// Errors raised inside a case body and caught at the case boundary
#[derive(Error, Debug)]
pub enum CaseError {
    #[error("{0}")]
    Assertion(String),

    #[error(transparent)]
    Network(HttpError),

    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    MissingContext(ContextError),

    #[error("{0}")]
    Dispatch(String),
}

impl CaseError {
    /// Status the case is recorded with
    pub fn status(&self) -> TestStatus {
        match self {
            CaseError::Assertion(_) => TestStatus::Fail,
            CaseError::MissingContext(_) => TestStatus::Skip,
            CaseError::Network(_) | CaseError::Configuration(_) | CaseError::Dispatch(_) => {
                TestStatus::Error
            }
        }
    }

    /// The server could not be reached, so no later case can succeed
    pub fn aborts_run(&self) -> bool {
        matches!(self, CaseError::Network(e) if e.is_unreachable())
    }
}

impl From<SpecError> for CaseError {
    fn from(error: SpecError) -> Self {
        match error {
            SpecError::Configuration(_) => CaseError::Configuration(error.to_string()),
            SpecError::Http(e @ HttpError::InvalidUrl(_)) => CaseError::Configuration(e.to_string()),
            SpecError::Http(e) => CaseError::Network(e),
            SpecError::Dispatch(reason) => CaseError::Dispatch(reason),
        }
    }
}

/// Everything a case body can touch
pub struct CaseContext<'a> {
    case: MercadoCase,
    client: &'a HttpClient,
    reporter: &'a RunReporter,
    shared: &'a SharedContext,
    settings: &'a SuiteSettings,
}

impl<'a> CaseContext<'a> {
    pub fn new(
        case: MercadoCase,
        client: &'a HttpClient,
        reporter: &'a RunReporter,
        shared: &'a SharedContext,
        settings: &'a SuiteSettings,
    ) -> Self {
        Self {
            case,
            client,
            reporter,
            shared,
            settings,
        }
    }

    pub fn case(&self) -> MercadoCase {
        self.case
    }

    pub fn settings(&self) -> &SuiteSettings {
        self.settings
    }

    /// Path of the mercado collection
    pub fn collection(&self) -> String {
        self.settings.resource_path.clone()
    }

    /// Path of one mercado
    pub fn member(&self, id: &Value) -> String {
        format!(
            "{}/{}",
            self.settings.resource_path.trim_end_matches('/'),
            id_segment(id)
        )
    }

    /// Path of a mercado that must not exist
    pub fn missing_member(&self) -> String {
        self.member(&Value::from(self.settings.missing_id))
    }

    /// A fresh valid body
    pub fn payload(&self) -> MercadoPayload {
        fake::mercado_payload(&mut rand::rng())
    }

    /// Read a value captured by an earlier case
    pub fn require(&self, key: ContextKey) -> Result<Value, CaseError> {
        self.shared
            .get(key)
            .cloned()
            .map_err(CaseError::MissingContext)
    }

    /// Capture a value for later cases
    pub fn provide(&self, key: ContextKey, value: Value) -> Result<(), CaseError> {
        self.shared
            .set(key, value)
            .map_err(|e| CaseError::Configuration(e.to_string()))
    }

    /// Build, dispatch and evaluate one spec. Exactly one expectation result
    /// is recorded whatever happens.
    pub async fn step(&self, spec: RequestSpec) -> Result<SpecOutcome, CaseError> {
        let prepared = self.prepare(spec)?;
        let outcome = prepared.execute(self.client).await;
        self.settle(&prepared, outcome)
    }

    /// Dispatch specs concurrently. Specs that fail to build are recorded as
    /// errored and not sent; the rest are dispatched together. Every result is
    /// recorded in issue order and the first failure is returned after all
    /// have been observed.
    pub async fn fan_out(&self, specs: Vec<RequestSpec>) -> Result<Vec<SpecOutcome>, CaseError> {
        let built: Vec<_> = specs
            .into_iter()
            .map(|spec| (spec.description(), spec.build()))
            .collect();
        let prepared: Vec<PreparedSpec> = built
            .iter()
            .filter_map(|(_, build)| build.as_ref().ok().cloned())
            .collect();

        let results = ParallelExecutor::new(self.settings.max_concurrent)
            .scatter_gather(self.client, prepared.clone())
            .await;
        if let Some(index) = first_failure(&results) {
            warn!("Fan-out request {} of {} failed to dispatch", index + 1, results.len());
        }

        let mut dispatched = prepared.iter().zip(results);
        let mut outcomes = Vec::with_capacity(built.len());
        let mut first_error = None;
        for (description, build) in built {
            let settled = match build {
                Err(e) => Err(self.reject(description, e)),
                Ok(_) => match dispatched.next() {
                    Some((spec, result)) => self.settle(spec, result),
                    None => continue,
                },
            };
            match settled {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }

    /// Record a case-level assertion that is not tied to one response
    pub fn check(
        &self,
        description: impl Into<String>,
        passed: bool,
        detail: Option<Mismatch>,
    ) -> Result<(), CaseError> {
        let result = ExpectationResult::check(description, passed, detail);
        let message = result.to_string();
        self.reporter.record(self.case, result);
        if passed {
            Ok(())
        } else {
            Err(CaseError::Assertion(message))
        }
    }

    fn prepare(&self, spec: RequestSpec) -> Result<PreparedSpec, CaseError> {
        let description = spec.description();
        spec.build().map_err(|e| self.reject(description, e))
    }

    /// Record a spec that could not be built
    fn reject(&self, description: String, error: SpecError) -> CaseError {
        self.reporter.record(
            self.case,
            ExpectationResult::errored(description, None, error.to_string()),
        );
        CaseError::from(error)
    }

    fn settle(
        &self,
        spec: &PreparedSpec,
        outcome: Result<SpecOutcome, SpecError>,
    ) -> Result<SpecOutcome, CaseError> {
        match outcome {
            Ok(outcome) => {
                self.reporter.record(self.case, outcome.result.clone());
                if outcome.passed() {
                    Ok(outcome)
                } else {
                    Err(CaseError::Assertion(outcome.result.to_string()))
                }
            }
            Err(e) => {
                self.reporter.record(
                    self.case,
                    ExpectationResult::errored(
                        spec.description(),
                        spec.expected_status(),
                        e.to_string(),
                    ),
                );
                Err(e.into())
            }
        }
    }
}

/// Run one case body
pub async fn run_case(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    match ctx.case() {
        MercadoCase::Create => crud::create(ctx).await,
        MercadoCase::FetchById => crud::fetch_by_id(ctx).await,
        MercadoCase::RejectShortCnpj => validation::reject_short_cnpj(ctx).await,
        MercadoCase::List => listing::list(ctx).await,
        MercadoCase::Update => crud::update(ctx).await,
        MercadoCase::FetchMissing => not_found::fetch_missing(ctx).await,
        MercadoCase::Delete => crud::delete(ctx).await,
        MercadoCase::DeleteMissing => not_found::delete_missing(ctx).await,
        MercadoCase::UpdateMissing => not_found::update_missing(ctx).await,
        MercadoCase::ValidateListShape => listing::validate_list_shape(ctx).await,
        MercadoCase::RejectEmptyName => validation::reject_empty_name(ctx).await,
        MercadoCase::CreateManyAndCount => concurrency::create_many_and_count(ctx).await,
        MercadoCase::FetchDetails => crud::fetch_details(ctx).await,
    }
}
