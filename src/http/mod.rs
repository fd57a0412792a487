//! HTTP client module
//!
//! Dispatches requests to the mercado API and maps failures to typed errors.

mod client;

pub use client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, DEFAULT_TIMEOUT_SECS,
};
