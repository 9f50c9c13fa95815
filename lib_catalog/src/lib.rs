//! # lib_catalog
//!
//! Retrieval and cross-referencing of catalog licensing metadata.
//!
//! Two HTTP APIs are involved: a *rights* document ("vq") describing licensing
//! terms and device eligibility per content item, and an *assets* document
//! ("tq") describing delivery endpoints. The [`retrieve`] module fetches them
//! with basic authentication and exponential backoff; the [`catalog`] module
//! answers the derived queries over the two fetched documents.
//!
//! Modules are gated by Cargo features the same way across the crate:
//! `loggers`, `retrieve`, `catalog`, or `full` for everything.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Injected log sinks: TTY/file logger and an in-memory recorder.
#[cfg(feature = "loggers")]
pub mod loggers;

/// Basic-auth HTTP transport and the retrying fetcher.
#[cfg(feature = "retrieve")]
pub mod retrieve;

/// Rights/assets document models and the cross-referencing processor.
#[cfg(feature = "catalog")]
pub mod catalog;

#[cfg(feature = "loggers")]
pub use loggers::{LogLevel, LogSink};

#[cfg(feature = "retrieve")]
pub use retrieve::fetcher::{FetchError, Fetcher, DEFAULT_MAX_RETRIES};

#[cfg(feature = "catalog")]
pub use catalog::processor::{ActiveItem, Processor};
