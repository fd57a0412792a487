//! Expectation matching
//!
//! Compares an HTTP response against the status and body shape declared on a
//! request spec. Every declared field is checked so the diff is complete.

mod expression;
mod verdict;

pub use expression::{lookup, render_scalar, Matcher, Shape};
pub use verdict::{evaluate, ArrayMode, BodyExpectation, Expectations, Mismatch, Verdict};
