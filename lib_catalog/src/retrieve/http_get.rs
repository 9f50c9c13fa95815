//! # Basic-auth JSON GET
//!
//! One request, one outcome. A non-2xx status, a transport failure and an
//! undecodable body are all reported as an [`AttemptError`]; deciding whether to
//! try again belongs to the caller (see [`Fetcher`](super::fetcher::Fetcher)).

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Why a single fetch attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The endpoint is not an absolute URL.
    #[error("Invalid endpoint URL {endpoint}: {source}")]
    InvalidUrl {
        /// The endpoint as given.
        endpoint: String,
        /// Why it did not parse.
        #[source]
        source: url::ParseError,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP error occurred: {status} for url: {url}")]
    Status {
        /// The status received.
        status: StatusCode,
        /// The URL that was requested.
        url: String,
        /// Response body, kept for diagnostics.
        body: Option<String>,
    },

    /// Connection, TLS, timeout or other transport-level failure.
    #[error("Request exception occurred: {0}")]
    Transport(#[source] reqwest::Error),

    /// A 2xx response whose body is not JSON.
    #[error("Response body is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),

    /// Anything else a transport implementation wants to report.
    #[error("An error occurred: {0}")]
    Other(String),
}

/// A way to GET a JSON document from an endpoint, one attempt per call.
pub trait Transport {
    /// Performs a single GET against `endpoint` and parses the body as JSON.
    fn get_json(&self, endpoint: &str) -> Result<Value, AttemptError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_json(&self, endpoint: &str) -> Result<Value, AttemptError> {
        (**self).get_json(endpoint)
    }
}

/// Blocking `reqwest` client sending `Authorization: Basic ...` and
/// `Content-Type: application/json` with every request.
#[derive(Clone)]
pub struct BasicAuthClient {
    http: Client,
    username: String,
    password: String,
}

impl BasicAuthClient {
    /// Builds a client with `reqwest`'s default blocking configuration.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = Client::builder().build()?;
        Ok(Self::with_client(http, username, password))
    }

    /// Wraps an already configured client (custom timeouts, proxies, TLS).
    pub fn with_client(http: Client, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            http,
            username: username.into(),
            password: password.into(),
        }
    }

    /// The basic-auth user name.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for BasicAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthClient")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Transport for BasicAuthClient {
    fn get_json(&self, endpoint: &str) -> Result<Value, AttemptError> {
        let url = Url::parse(endpoint).map_err(|source| AttemptError::InvalidUrl {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            // Capture the error body as a string for debugging
            let body = response.text().ok().filter(|b| !b.is_empty());
            return Err(AttemptError::Status {
                status,
                url: endpoint.to_string(),
                body,
            });
        }

        response.json::<Value>().map_err(AttemptError::Decode)
    }
}
