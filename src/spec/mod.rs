//! Request specs
//!
//! Builder for one request and the expectations checked against its response.

mod request;

pub use request::{PreparedSpec, RequestSpec, SpecError, SpecOutcome};
