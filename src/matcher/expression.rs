//! Matcher expressions and body shapes

#![allow(dead_code)]

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

/// How a single declared field is checked
#[derive(Clone)]
pub enum Matcher {
    /// JSON equality
    Exact(Value),
    /// Field must be present, any value
    Any,
    /// Regex against the scalar rendering of the field
    Pattern(Regex),
    /// Arbitrary check with a description for the diff
    Predicate {
        description: String,
        check: Arc<PredicateFn>,
    },
}

impl Matcher {
    pub fn exact(value: impl Into<Value>) -> Self {
        Matcher::Exact(value.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Pattern(Regex::new(pattern)?))
    }

    pub fn predicate(
        description: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Matcher::Predicate {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Check a present value
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Exact(expected) => value == expected,
            Matcher::Any => true,
            Matcher::Pattern(regex) => regex.is_match(&render_scalar(value)),
            Matcher::Predicate { check, .. } => check(value),
        }
    }

    /// Human-readable form used in diffs
    pub fn describe(&self) -> String {
        match self {
            Matcher::Exact(expected) => expected.to_string(),
            Matcher::Any => "any value".to_string(),
            Matcher::Pattern(regex) => format!("/{}/", regex.as_str()),
            Matcher::Predicate { description, .. } => description.clone(),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(v) => f.debug_tuple("Exact").field(v).finish(),
            Matcher::Any => f.write_str("Any"),
            Matcher::Pattern(r) => f.debug_tuple("Pattern").field(&r.as_str()).finish(),
            Matcher::Predicate { description, .. } => {
                f.debug_tuple("Predicate").field(description).finish()
            }
        }
    }
}

/// Strings as-is, everything else as compact JSON text
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve a dot path (`mercado.id`, `items.0.id`) inside a JSON value
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Ordered set of field expectations for one JSON object
#[derive(Clone, Debug, Default)]
pub struct Shape {
    fields: Vec<(String, Matcher)>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, matcher: Matcher) -> Self {
        self.fields.push((name.into(), matcher));
        self
    }

    /// Check every declared field, returning one mismatch per failing field
    pub fn check(&self, actual: &Value) -> Vec<FieldMismatch> {
        self.fields
            .iter()
            .filter_map(|(name, matcher)| match lookup(actual, name) {
                None => Some(FieldMismatch {
                    field: name.clone(),
                    expected: matcher.describe(),
                    actual: "<missing>".to_string(),
                }),
                Some(value) if !matcher.matches(value) => Some(FieldMismatch {
                    field: name.clone(),
                    expected: matcher.describe(),
                    actual: value.to_string(),
                }),
                Some(_) => None,
            })
            .collect()
    }
}

/// A field that failed its matcher, relative to the checked object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_and_any() {
        assert!(Matcher::exact(7).matches(&json!(7)));
        assert!(!Matcher::exact(7).matches(&json!("7")));
        assert!(Matcher::Any.matches(&Value::Null));
    }

    #[test]
    fn test_pattern_renders_scalars() {
        let digits = Matcher::pattern(r"^\d{14}$").unwrap();
        assert!(digits.matches(&json!("12345678901234")));
        assert!(digits.matches(&json!(12345678901234_u64)));
        assert!(!digits.matches(&json!("1234567890123")));

        let anything = Matcher::pattern(".*").unwrap();
        assert!(anything.matches(&json!(42)));
        assert!(anything.matches(&json!("")));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Matcher::pattern("[unclosed").is_err());
    }

    #[test]
    fn test_predicate() {
        let non_empty = Matcher::predicate("non-empty string", |v| {
            v.as_str().map(|s| !s.is_empty()).unwrap_or(false)
        });
        assert!(non_empty.matches(&json!("Feira")));
        assert!(!non_empty.matches(&json!("")));
        assert_eq!(non_empty.describe(), "non-empty string");
    }

    #[test]
    fn test_lookup() {
        let body = json!({"mercado": {"id": 12, "tags": [{"id": 1}]}});
        assert_eq!(lookup(&body, "mercado.id"), Some(&json!(12)));
        assert_eq!(lookup(&body, "mercado.tags.0.id"), Some(&json!(1)));
        assert_eq!(lookup(&body, "mercado.nome"), None);
        assert_eq!(lookup(&body, ""), Some(&body));
    }

    #[test]
    fn test_shape_reports_every_failing_field() {
        let shape = Shape::new()
            .field("id", Matcher::exact(1))
            .field("nome", Matcher::Any)
            .field("cnpj", Matcher::pattern(r"^\d{14}$").unwrap());

        let mismatches = shape.check(&json!({"id": 2, "cnpj": "123"}));
        let fields: Vec<_> = mismatches.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["id", "nome", "cnpj"]);
        assert_eq!(mismatches[1].actual, "<missing>");
    }
}
