//! Evaluation of declared expectations against a response

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::expression::{FieldMismatch, Shape};

/// Which array elements must satisfy an element shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayMode {
    /// At least one element
    Some,
    /// Every element
    Every,
}

/// Expectation about a response body
#[derive(Clone, Debug)]
pub enum BodyExpectation {
    /// Body is an object satisfying the shape
    Object(Shape),
    /// Body is a non-empty array whose elements satisfy the shape per mode
    Array { shape: Shape, mode: ArrayMode },
    /// Body is an array with more than `n` elements
    LengthGreaterThan(usize),
}

/// Everything declared on one request spec
#[derive(Clone, Debug, Default)]
pub struct Expectations {
    pub status: Option<u16>,
    pub body: Vec<BodyExpectation>,
}

/// One failing check, addressed from the response root
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    fn from_field(prefix: &str, m: FieldMismatch) -> Self {
        Self::new(format!("{prefix}.{}", m.field), m.expected, m.actual)
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Outcome of evaluating expectations
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    pub mismatches: Vec<Mismatch>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Multi-line diff naming every failing field
    pub fn diff(&self) -> String {
        self.mismatches
            .iter()
            .map(|m| format!("  - {m}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether a field (full path) appears in the diff
    pub fn names(&self, field: &str) -> bool {
        self.mismatches.iter().any(|m| m.field == field)
    }
}

/// Evaluate all expectations without short-circuiting
pub fn evaluate(expectations: &Expectations, status: u16, body: Option<&Value>) -> Verdict {
    let mut mismatches = Vec::new();

    if let Some(expected) = expectations.status {
        if expected != status {
            mismatches.push(Mismatch::new(
                "status",
                expected.to_string(),
                status.to_string(),
            ));
        }
    }

    for expectation in &expectations.body {
        match body {
            Some(body) => check_body(expectation, body, &mut mismatches),
            None => mismatches.push(Mismatch::new("body", expected_kind(expectation), "<no JSON body>")),
        }
    }

    Verdict { mismatches }
}

fn expected_kind(expectation: &BodyExpectation) -> &'static str {
    match expectation {
        BodyExpectation::Object(_) => "JSON object",
        BodyExpectation::Array { .. } | BodyExpectation::LengthGreaterThan(_) => "JSON array",
    }
}

fn check_body(expectation: &BodyExpectation, body: &Value, out: &mut Vec<Mismatch>) {
    match expectation {
        BodyExpectation::Object(shape) => {
            if !body.is_object() {
                out.push(Mismatch::new("body", "JSON object", type_name(body)));
                return;
            }
            out.extend(
                shape
                    .check(body)
                    .into_iter()
                    .map(|m| Mismatch::from_field("body", m)),
            );
        }
        BodyExpectation::Array { shape, mode } => {
            let Some(items) = body.as_array() else {
                out.push(Mismatch::new("body", "JSON array", type_name(body)));
                return;
            };
            if items.is_empty() {
                out.push(Mismatch::new("body", "non-empty array", "[]"));
                return;
            }
            match mode {
                ArrayMode::Every => {
                    for (i, item) in items.iter().enumerate() {
                        let prefix = format!("body[{i}]");
                        out.extend(
                            shape
                                .check(item)
                                .into_iter()
                                .map(|m| Mismatch::from_field(&prefix, m)),
                        );
                    }
                }
                ArrayMode::Some => {
                    let closest = items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| (i, shape.check(item)))
                        .min_by_key(|(_, mismatches)| mismatches.len());
                    if let Some((i, mismatches)) = closest {
                        let prefix = format!("body[{i}]");
                        out.extend(
                            mismatches
                                .into_iter()
                                .map(|m| Mismatch::from_field(&prefix, m)),
                        );
                    }
                }
            }
        }
        BodyExpectation::LengthGreaterThan(n) => match body.as_array() {
            Some(items) if items.len() > *n => {}
            Some(items) => out.push(Mismatch::new(
                "body.length",
                format!("> {n}"),
                items.len().to_string(),
            )),
            None => out.push(Mismatch::new("body", "JSON array", type_name(body))),
        },
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
