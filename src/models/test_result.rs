//! Test case and result models
//!
//! Defines the mercado cases, their outcomes, and the per-spec expectation
//! results the reporter collects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::ContextKey;
use crate::matcher::{Mismatch, Verdict};

/// All mercado test cases, in declaration order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MercadoCase {
    // CRUD on the captured mercado (1-2)
    Create,
    FetchById,

    // Validation (3)
    RejectShortCnpj,

    // Listing (4)
    List,

    // CRUD (5)
    Update,

    // Not found (6)
    FetchMissing,

    // CRUD (7)
    Delete,

    // Not found (8-9)
    DeleteMissing,
    UpdateMissing,

    // Listing (10)
    ValidateListShape,

    // Validation (11)
    RejectEmptyName,

    // Concurrency (12)
    CreateManyAndCount,

    // CRUD (13)
    FetchDetails,
}

impl MercadoCase {
    /// Get case number (1-13)
    pub fn number(&self) -> u8 {
        match self {
            MercadoCase::Create => 1,
            MercadoCase::FetchById => 2,
            MercadoCase::RejectShortCnpj => 3,
            MercadoCase::List => 4,
            MercadoCase::Update => 5,
            MercadoCase::FetchMissing => 6,
            MercadoCase::Delete => 7,
            MercadoCase::DeleteMissing => 8,
            MercadoCase::UpdateMissing => 9,
            MercadoCase::ValidateListShape => 10,
            MercadoCase::RejectEmptyName => 11,
            MercadoCase::CreateManyAndCount => 12,
            MercadoCase::FetchDetails => 13,
        }
    }

    /// Get case name
    pub fn name(&self) -> &'static str {
        match self {
            MercadoCase::Create => "Create mercado",
            MercadoCase::FetchById => "Fetch mercado by id",
            MercadoCase::RejectShortCnpj => "Reject CNPJ under 14 digits",
            MercadoCase::List => "List mercados",
            MercadoCase::Update => "Update mercado by id",
            MercadoCase::FetchMissing => "Fetch missing mercado",
            MercadoCase::Delete => "Delete mercado by id",
            MercadoCase::DeleteMissing => "Delete missing mercado",
            MercadoCase::UpdateMissing => "Update missing mercado",
            MercadoCase::ValidateListShape => "Validate list structure",
            MercadoCase::RejectEmptyName => "Reject mercado without name",
            MercadoCase::CreateManyAndCount => "Create many and count",
            MercadoCase::FetchDetails => "Fetch mercado details",
        }
    }

    /// Get case category
    pub fn category(&self) -> &'static str {
        match self {
            MercadoCase::Create
            | MercadoCase::FetchById
            | MercadoCase::Update
            | MercadoCase::Delete
            | MercadoCase::FetchDetails => "CRUD",
            MercadoCase::RejectShortCnpj | MercadoCase::RejectEmptyName => "Validation",
            MercadoCase::List | MercadoCase::ValidateListShape => "Listing",
            MercadoCase::FetchMissing | MercadoCase::DeleteMissing | MercadoCase::UpdateMissing => {
                "Not Found"
            }
            MercadoCase::CreateManyAndCount => "Concurrency",
        }
    }

    /// Context slots this case writes
    pub fn provides(&self) -> &'static [ContextKey] {
        match self {
            MercadoCase::Create => &[ContextKey::MercadoId],
            _ => &[],
        }
    }

    /// Context slots this case reads
    pub fn requires(&self) -> &'static [ContextKey] {
        match self {
            MercadoCase::FetchById | MercadoCase::Update | MercadoCase::FetchDetails => {
                &[ContextKey::MercadoId]
            }
            _ => &[],
        }
    }

    /// Get all cases in declaration order
    pub fn all() -> Vec<MercadoCase> {
        vec![
            MercadoCase::Create,
            MercadoCase::FetchById,
            MercadoCase::RejectShortCnpj,
            MercadoCase::List,
            MercadoCase::Update,
            MercadoCase::FetchMissing,
            MercadoCase::Delete,
            MercadoCase::DeleteMissing,
            MercadoCase::UpdateMissing,
            MercadoCase::ValidateListShape,
            MercadoCase::RejectEmptyName,
            MercadoCase::CreateManyAndCount,
            MercadoCase::FetchDetails,
        ]
    }

    /// Parse from case number
    pub fn from_number(n: u8) -> Option<MercadoCase> {
        MercadoCase::all().into_iter().find(|c| c.number() == n)
    }
}

impl fmt::Display for MercadoCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Case {}: {}", self.number(), self.name())
    }
}

/// Case execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Skip => "○",
            TestStatus::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }

    /// Statuses that make the run exit non-zero
    pub fn is_failure(&self) -> bool {
        matches!(self, TestStatus::Fail | TestStatus::Error)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
            TestStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome of one request spec's expectations
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub description: String,
    pub passed: bool,
    pub expected_status: Option<u16>,
    pub actual_status: Option<u16>,
    pub mismatches: Vec<Mismatch>,
    /// Set when the request never produced a response
    pub error: Option<String>,
}

impl ExpectationResult {
    /// Build from an evaluated verdict
    pub fn from_verdict(
        description: impl Into<String>,
        expected_status: Option<u16>,
        actual_status: u16,
        verdict: Verdict,
    ) -> Self {
        Self {
            description: description.into(),
            passed: verdict.passed(),
            expected_status,
            actual_status: Some(actual_status),
            mismatches: verdict.mismatches,
            error: None,
        }
    }

    /// A spec that failed before any response was evaluated
    pub fn errored(
        description: impl Into<String>,
        expected_status: Option<u16>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            passed: false,
            expected_status,
            actual_status: None,
            mismatches: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// A case-level assertion not tied to a single response
    pub fn check(description: impl Into<String>, passed: bool, detail: Option<Mismatch>) -> Self {
        Self {
            description: description.into(),
            passed,
            expected_status: None,
            actual_status: None,
            mismatches: detail.into_iter().collect(),
            error: None,
        }
    }

    /// Human-readable diff
    pub fn diff(&self) -> String {
        let mut lines: Vec<String> = self.mismatches.iter().map(|m| format!("  - {m}")).collect();
        if let Some(error) = &self.error {
            lines.push(format!("  ! {error}"));
        }
        lines.join("\n")
    }
}

impl fmt::Display for ExpectationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.passed { "✓" } else { "✗" };
        write!(f, "{symbol} {}", self.description)?;
        if let (Some(expected), Some(actual)) = (self.expected_status, self.actual_status) {
            write!(f, " [expected {expected}, got {actual}]")?;
        }
        if !self.passed {
            let diff = self.diff();
            if !diff.is_empty() {
                write!(f, "\n{diff}")?;
            }
        }
        Ok(())
    }
}

/// Result of a single case execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseResult {
    pub case: MercadoCase,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl CaseResult {
    pub fn pass(case: MercadoCase, duration_ms: u64) -> Self {
        Self {
            case,
            status: TestStatus::Pass,
            duration_ms,
            message: None,
        }
    }

    pub fn fail(case: MercadoCase, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            case,
            status: TestStatus::Fail,
            duration_ms,
            message: Some(message.into()),
        }
    }

    pub fn skip(case: MercadoCase, reason: impl Into<String>) -> Self {
        Self {
            case,
            status: TestStatus::Skip,
            duration_ms: 0,
            message: Some(reason.into()),
        }
    }

    pub fn error(case: MercadoCase, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            case,
            status: TestStatus::Error,
            duration_ms,
            message: Some(error.into()),
        }
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.case,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}
