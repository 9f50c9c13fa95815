//! # Retrying Fetcher
//!
//! Wraps a [`Transport`] in a bounded retry loop with exponential backoff.
//!
//! ## Logic:
//! 1.  Attempt `n` (0-indexed) issues one GET through the transport.
//! 2.  **On success** the parsed JSON is returned immediately.
//! 3.  **On failure** the error is logged at error level. Unless this was the
//!     last allowed attempt, an info line announces the retry and the fetcher
//!     sleeps `base * 2^n` (1s, 2s, 4s, ... with the default base).
//! 4.  After `max_retries` failed attempts a terminal [`FetchError::Exhausted`]
//!     naming the endpoint is returned.
//!
//! Nothing is cached: every call starts from attempt 0.

use super::http_get::{AttemptError, BasicAuthClient, Transport};
use crate::loggers::LogSink;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Attempts made by [`Fetcher::fetch`].
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Unit of the exponential backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

/// Errors surfaced by the fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("Cannot build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Every allowed attempt failed.
    #[error("Failed to fetch data from endpoint: {endpoint}")]
    Exhausted {
        /// The endpoint that was requested.
        endpoint: String,
        /// Number of attempts made.
        attempts: u32,
        /// The error of the final attempt.
        #[source]
        last: AttemptError,
    },
}

/// Delay slept after the 0-indexed `attempt` failed: `base * 2^attempt`, saturating.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// # Fetcher
///
/// Retrieves JSON documents with retries. Generic over the transport so tests
/// and alternative clients can stand in for the basic-auth `reqwest` client.
pub struct Fetcher<T = BasicAuthClient> {
    transport: T,
    logger: Arc<dyn LogSink>,
    backoff_base: Duration,
    sleeper: Sleeper,
}

impl Fetcher<BasicAuthClient> {
    /// Creates a fetcher authenticating every request with `username`/`password`.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, FetchError> {
        let transport = BasicAuthClient::new(username, password)?;
        Ok(Self::with_transport(transport, logger))
    }
}

impl<T: Transport> Fetcher<T> {
    /// Creates a fetcher over an arbitrary transport, sleeping on the current thread between attempts.
    pub fn with_transport(transport: T, logger: Arc<dyn LogSink>) -> Self {
        Self {
            transport,
            logger,
            backoff_base: DEFAULT_BACKOFF_BASE,
            sleeper: Box::new(std::thread::sleep),
        }
    }

    /// Replaces the backoff unit (default one second).
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Replaces the function used to wait between attempts.
    pub fn with_sleeper<F>(mut self, sleeper: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches `endpoint` with [`DEFAULT_MAX_RETRIES`] attempts.
    pub fn fetch(&self, endpoint: &str) -> Result<Value, FetchError> {
        self.fetch_with_retries(endpoint, DEFAULT_MAX_RETRIES)
    }

    /// Fetches `endpoint`, making at most `max_retries` attempts (at least one).
    pub fn fetch_with_retries(&self, endpoint: &str, max_retries: u32) -> Result<Value, FetchError> {
        let max_attempts = max_retries.max(1);
        let mut attempt: u32 = 0;

        loop {
            let err = match self.transport.get_json(endpoint) {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            self.logger.error(
                &err.to_string(),
                Some(json!({
                    "endpoint": endpoint,
                    "attempt": attempt + 1,
                    "max_retries": max_attempts,
                })),
            );

            if attempt + 1 >= max_attempts {
                return Err(FetchError::Exhausted {
                    endpoint: endpoint.to_string(),
                    attempts: max_attempts,
                    last: err,
                });
            }

            let delay = backoff_delay(self.backoff_base, attempt);
            self.logger.info(
                &format!("Retrying... Retry attempt {} of {}", attempt + 1, max_attempts),
                Some(json!({
                    "endpoint": endpoint,
                    "delay_ms": u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                })),
            );
            (self.sleeper)(delay);

            attempt += 1;
        }
    }
}
