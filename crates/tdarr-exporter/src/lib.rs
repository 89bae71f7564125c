//! Tdarr Prometheus exporter library.
//!
//! Polls the Tdarr server API on a fixed interval, reconciles worker, job and
//! library statistics into an in-process registry, and serves it over HTTP.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod client;
pub mod collector;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod scheduler;
