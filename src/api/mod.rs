//! API module
//!
//! HTTP client for communicating with the feedback backend.

mod client;

pub(crate) use client::{ApiClient, ApiError, SubmissionClient};
