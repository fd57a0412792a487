//! Suite execution engine
//!
//! Provides the sequential suite runner and the concurrent fan-out it uses.

mod parallel;
mod runner;

pub use parallel::{first_failure, ParallelExecutor};
pub use runner::{Suite, SuiteRunner, SuiteSettings};
