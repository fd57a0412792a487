//! Finalized run report

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CaseResult, ExpectationResult, MercadoCase, TestStatus};

/// One case with its expectation results in execution order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseReport {
    pub case: MercadoCase,
    pub number: u8,
    pub name: String,
    pub category: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
    pub expectations: Vec<ExpectationResult>,
}

impl CaseReport {
    pub fn new(result: CaseResult, expectations: Vec<ExpectationResult>) -> Self {
        Self {
            case: result.case,
            number: result.case.number(),
            name: result.case.name().to_string(),
            category: result.case.category().to_string(),
            status: result.status,
            duration_ms: result.duration_ms,
            message: result.message,
            expectations,
        }
    }

    pub fn failed_expectations(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.expectations.iter().filter(|e| !e.passed)
    }
}

/// Report for a whole run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub id: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total_duration_ms: u64,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        cases: Vec<CaseReport>,
    ) -> Self {
        let count = |status: TestStatus| cases.iter().filter(|c| c.status == status).count();
        let passed = count(TestStatus::Pass);
        let failed = count(TestStatus::Fail);
        let skipped = count(TestStatus::Skip);
        let errors = count(TestStatus::Error);
        let total_duration_ms = cases.iter().map(|c| c.duration_ms).sum();

        Self {
            id: id.into(),
            base_url: base_url.into(),
            started_at,
            completed_at,
            total: cases.len(),
            passed,
            failed,
            skipped,
            errors,
            total_duration_ms,
            cases,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// Any failed or errored case, or any failed expectation
    pub fn has_failures(&self) -> bool {
        self.cases.iter().any(|c| {
            c.status.is_failure() || c.expectations.iter().any(|e| !e.passed)
        })
    }

    pub fn expectation_count(&self) -> usize {
        self.cases.iter().map(|c| c.expectations.len()).sum()
    }

    pub fn case(&self, case: MercadoCase) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.case == case)
    }
}
