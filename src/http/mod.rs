//! HTTP client module
//!
//! Provides the reqwest-backed page fetcher used for API sources, the JSON
//! sender used for API targets, and request pacing.
//!
//! # Features
//!
//! - **Body Coercion**: JSON, wrapped scalars, or raw text with content type
//! - **Pacing**: fixed sleeps or a governor token bucket between pages

mod client;
mod rate_limit;

pub use client::{
    coerce_body, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig,
    SendOutcome, DEFAULT_TIMEOUT,
};
pub use rate_limit::{RateLimitConfig, RateLimiter};
