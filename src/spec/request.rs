//! Request spec builder
//!
//! Describes one HTTP request plus the expectations checked against its
//! response. Building validates the description; executing performs exactly
//! one network call.

use reqwest::header::HeaderName;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::http::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};
use crate::matcher::{self, ArrayMode, BodyExpectation, Expectations, Mismatch, Shape};
use crate::models::ExpectationResult;

/// Errors raised while building or dispatching a spec
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Invalid request spec: {0}")]
    Configuration(String),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Dispatch task failed: {0}")]
    Dispatch(String),
}

/// Declarative request plus expectations
#[derive(Clone, Debug)]
pub struct RequestSpec {
    method: HttpMethod,
    path: String,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
    expectations: Expectations,
    returns: Option<String>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            expectations: Expectations::default(),
            returns: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expectations.status = Some(status.as_u16());
        self
    }

    /// Body must be an object whose declared fields match
    pub fn expect_json_like(mut self, shape: Shape) -> Self {
        self.expectations.body.push(BodyExpectation::Object(shape));
        self
    }

    /// Body must be an array whose elements match per `mode`
    pub fn expect_json_array(mut self, shape: Shape, mode: ArrayMode) -> Self {
        self.expectations
            .body
            .push(BodyExpectation::Array { shape, mode });
        self
    }

    pub fn expect_length_greater_than(mut self, n: usize) -> Self {
        self.expectations
            .body
            .push(BodyExpectation::LengthGreaterThan(n));
        self
    }

    /// Extract a value from the response body by dot path
    pub fn returns(mut self, path: impl Into<String>) -> Self {
        self.returns = Some(path.into());
        self
    }

    /// "METHOD path", used to label expectation results
    pub fn description(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Validate and freeze the spec
    pub fn build(self) -> Result<PreparedSpec, SpecError> {
        if self.path.trim().is_empty() {
            return Err(SpecError::Configuration(format!(
                "{} request has an empty path",
                self.method
            )));
        }
        match (self.method.expects_body(), self.body.is_some()) {
            (true, false) => {
                return Err(SpecError::Configuration(format!(
                    "{} requires a body",
                    self.description()
                )))
            }
            (false, true) => {
                return Err(SpecError::Configuration(format!(
                    "{} must not carry a body",
                    self.description()
                )))
            }
            _ => {}
        }
        for key in self.headers.keys() {
            HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                SpecError::Configuration(format!("invalid header name '{key}'"))
            })?;
        }

        let description = self.description();
        let mut request = HttpRequest::new(self.method, self.path);
        request.headers = self.headers;
        request.body = self.body;

        Ok(PreparedSpec {
            description,
            request,
            expectations: self.expectations,
            returns: self.returns,
        })
    }
}

/// A validated spec ready for dispatch
#[derive(Clone, Debug)]
pub struct PreparedSpec {
    description: String,
    request: HttpRequest,
    expectations: Expectations,
    returns: Option<String>,
}

impl PreparedSpec {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_status(&self) -> Option<u16> {
        self.expectations.status
    }

    /// Dispatch and evaluate. Network and transport failures surface as errors;
    /// unmet expectations come back as a failed [`ExpectationResult`].
    pub async fn execute(&self, client: &HttpClient) -> Result<SpecOutcome, SpecError> {
        let response = client.send(&self.request).await?;
        Ok(self.evaluate(response))
    }

    /// Evaluate a response against the declared expectations
    pub fn evaluate(&self, response: HttpResponse) -> SpecOutcome {
        let mut verdict = matcher::evaluate(
            &self.expectations,
            response.status_code,
            response.json.as_ref(),
        );

        let extracted = self.returns.as_deref().and_then(|path| {
            let found = response
                .json
                .as_ref()
                .and_then(|body| matcher::lookup(body, path))
                .cloned();
            if found.is_none() {
                verdict.mismatches.push(Mismatch {
                    field: format!("body.{path}"),
                    expected: "value to return".to_string(),
                    actual: "<missing>".to_string(),
                });
            }
            found
        });

        if verdict.passed() {
            debug!("{} -> {}", self.description, response.status_code);
        } else {
            debug!(
                "{} -> {} ({} mismatches)\n{}",
                self.description,
                response.status_code,
                verdict.mismatches.len(),
                verdict.diff()
            );
        }

        let result = ExpectationResult::from_verdict(
            self.description.clone(),
            self.expectations.status,
            response.status_code,
            verdict,
        );

        SpecOutcome {
            response,
            result,
            extracted,
        }
    }
}

/// What a dispatched spec produced
#[derive(Clone, Debug)]
pub struct SpecOutcome {
    pub response: HttpResponse,
    pub result: ExpectationResult,
    pub extracted: Option<Value>,
}

impl SpecOutcome {
    pub fn passed(&self) -> bool {
        self.result.passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Matcher;
    use serde_json::json;

    fn response(status: u16, json: Option<Value>) -> HttpResponse {
        HttpResponse {
            status_code: status,
            headers: BTreeMap::new(),
            body: json.as_ref().map(|v| v.to_string()).unwrap_or_default(),
            json,
            duration_ms: 3,
        }
    }

    #[test]
    fn test_post_without_body_is_configuration_error() {
        let err = RequestSpec::post("/mercado")
            .expect_status(StatusCode::CREATED)
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::Configuration(_)));
        assert!(err.to_string().contains("POST /mercado requires a body"));
    }

    #[test]
    fn test_get_with_body_is_configuration_error() {
        let err = RequestSpec::get("/mercado")
            .with_body(json!({}))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::Configuration(_)));
    }

    #[test]
    fn test_empty_path_and_bad_header() {
        assert!(RequestSpec::get("  ").build().is_err());
        assert!(RequestSpec::get("/mercado")
            .with_header("bad header", "x")
            .build()
            .is_err());
    }

    #[test]
    fn test_evaluate_extracts_returned_value() {
        let spec = RequestSpec::post("/mercado")
            .with_body(json!({"nome": "Feira"}))
            .expect_status(StatusCode::CREATED)
            .returns("mercado.id")
            .build()
            .unwrap();

        let outcome = spec.evaluate(response(201, Some(json!({"mercado": {"id": 41}}))));
        assert!(outcome.passed());
        assert_eq!(outcome.extracted, Some(json!(41)));
        assert_eq!(outcome.result.description, "POST /mercado");
    }

    #[test]
    fn test_missing_returned_value_fails() {
        let spec = RequestSpec::post("/mercado")
            .with_body(json!({"nome": "Feira"}))
            .expect_status(StatusCode::CREATED)
            .returns("mercado.id")
            .build()
            .unwrap();

        let outcome = spec.evaluate(response(201, Some(json!({"ok": true}))));
        assert!(!outcome.passed());
        assert_eq!(outcome.extracted, None);
        assert_eq!(outcome.result.mismatches[0].field, "body.mercado.id");
    }

    #[test]
    fn test_status_mismatch_recorded_once() {
        let spec = RequestSpec::get("/mercado/99999")
            .expect_status(StatusCode::NOT_FOUND)
            .build()
            .unwrap();

        let outcome = spec.evaluate(response(200, Some(json!({"id": 99999}))));
        assert!(!outcome.passed());
        assert_eq!(outcome.result.expected_status, Some(404));
        assert_eq!(outcome.result.actual_status, Some(200));
        assert_eq!(outcome.result.mismatches.len(), 1);
    }

    #[test]
    fn test_json_like_expectation() {
        let spec = RequestSpec::get("/mercado/1")
            .expect_status(StatusCode::OK)
            .expect_json_like(Shape::new().field("id", Matcher::exact(1)))
            .build()
            .unwrap();

        assert!(spec.evaluate(response(200, Some(json!({"id": 1})))).passed());
        assert!(!spec.evaluate(response(200, Some(json!({"id": 2})))).passed());
    }
}
