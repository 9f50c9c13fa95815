//! # Data Retrieval Module
//!
//! Blocking HTTP retrieval of JSON documents.
//!
//! ## Contained Modules:
//!
//! - **`http_get`**: the [`Transport`](http_get::Transport) seam and its
//!   `reqwest::blocking` implementation sending basic-auth JSON GET requests.
//!   One call is one network attempt; no retries happen at this level.
//!
//! - **`fetcher`**: the [`Fetcher`](fetcher::Fetcher), a bounded retry loop with
//!   exponential backoff on top of any `Transport`, logging every failed attempt
//!   and every retry to an injected sink.

/// Single-attempt basic-auth JSON GET.
pub mod http_get;
/// Retrying fetcher with exponential backoff.
pub mod fetcher;
