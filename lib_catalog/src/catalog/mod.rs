//! # Catalog Module
//!
//! Cross-referencing of the rights ("vq") and assets ("tq") documents.
//!
//! ## Contained Modules:
//!
//! - **`model`**: serde models of both payloads. Missing or `null` fields
//!   deserialize to empty values, which keeps the queries free of lookups
//!   with fallbacks.
//! - **`timestamps`**: parsing of term window bounds and the inclusive
//!   "active at" test.
//! - **`processor`**: the [`Processor`](processor::Processor) and its three
//!   queries, joined on `contentId`.

/// Serde models of the rights and assets payloads.
pub mod model;
/// Term window timestamp parsing.
pub mod timestamps;
/// The cross-referencing queries.
pub mod processor;
