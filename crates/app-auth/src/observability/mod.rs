//! Observability for app authentication.
//!
//! # Privacy by Default
//!
//! Public async entry points use `#[instrument(skip_all)]` and add only safe
//! fields back explicitly. Fields are categorized as:
//! - **SAFE**: config ids, application ids, outcomes, status codes
//! - **NEVER**: app tokens, symphony tokens, session tokens, user ids, raw JWTs
//!
//! Metric labels carry SAFE values from bounded sets only.

pub mod metrics;
