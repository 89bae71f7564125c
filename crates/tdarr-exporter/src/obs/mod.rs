//! In-process metrics registry.
//!
//! Holds the tdarr metric families republished from the upstream API plus a
//! few exporter self-metrics. Rendered by the `/metrics` handler in Prometheus
//! text format.

pub mod metrics;

pub use metrics::{CounterVec, ExporterMetrics, Gauge, GaugeVec, HistogramVec, SeriesBuilder};
