//! Output formatting module
//!
//! Renders run reports for the console and report files.

mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
