//! tdarr core: transport-agnostic upstream models, decoding, and error types.
//!
//! This crate defines the wire-level contracts with the Tdarr server API and the
//! error surface shared by the exporter. It carries no HTTP or runtime
//! dependencies so it can be reused by other tooling against the same API.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed upstream bodies must surface as `FetchError` so the polling loop
//! keeps running when the server misbehaves.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod upstream;

/// Shared result type.
pub use error::{ConfigError, ExporterError, FetchError, FetchFailure, Result};
