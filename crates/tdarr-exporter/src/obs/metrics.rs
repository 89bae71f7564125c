//! Metrics registry for the exporter.
//!
//! Label-bearing tdarr families are `GaugeVec`s whose whole series set is
//! rebuilt every cycle and swapped in under a single write lock, so a scrape
//! never sees a half-cleared family. Label-less families are `Gauge`s that keep
//! their last value between cycles. Exporter self-metrics use `DashMap`-backed
//! counters and histograms keyed by sorted label vectors.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;

use tdarr_core::error::{ExporterError, Result};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Exposition form of a sample value.
fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v.is_infinite() {
        if v > 0.0 {
            "+Inf".into()
        } else {
            "-Inf".into()
        }
    } else {
        v.to_string()
    }
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

fn label_pairs<'a, 'b>(
    names: impl IntoIterator<Item = &'a str>,
    values: impl IntoIterator<Item = &'b str>,
) -> String {
    names
        .into_iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Label values of one series, in the family's declared label order.
pub type LabelValues = Vec<String>;

/// Gauge family with a fixed label schema and replace-whole-set semantics.
pub struct GaugeVec {
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
    series: RwLock<BTreeMap<LabelValues, f64>>,
}

impl GaugeVec {
    pub fn new(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            name,
            help,
            labels,
            series: RwLock::new(BTreeMap::new()),
        }
    }

    /// Start collecting the next series set for this family.
    pub fn builder(&self) -> SeriesBuilder {
        SeriesBuilder {
            family: self.name,
            arity: self.labels.len(),
            series: BTreeMap::new(),
            arity_errors: 0,
        }
    }

    /// Swap in a freshly built series set. Every previous series is dropped.
    ///
    /// Fails without touching the current set if any series had the wrong
    /// number of label values.
    pub fn replace(&self, next: SeriesBuilder) -> Result<()> {
        if next.family != self.name || next.arity_errors > 0 {
            return Err(ExporterError::Internal(format!(
                "series set for {} rejected by {} ({} arity errors)",
                next.family, self.name, next.arity_errors
            )));
        }
        *self.series.write() = next.series;
        Ok(())
    }

    /// Value of one series, if exposed.
    pub fn get(&self, values: &[&str]) -> Option<f64> {
        let key: LabelValues = values.iter().map(|v| v.to_string()).collect();
        self.series.read().get(&key).copied()
    }

    /// Copy of the exposed series set.
    pub fn snapshot(&self) -> BTreeMap<LabelValues, f64> {
        self.series.read().clone()
    }

    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "gauge");
        let series = self.series.read();
        for (values, v) in series.iter() {
            let label_str =
                label_pairs(self.labels.iter().copied(), values.iter().map(String::as_str));
            let _ = writeln!(out, "{}{{{}}} {}", self.name, label_str, format_value(*v));
        }
    }
}

/// Series set under construction for one `GaugeVec`.
///
/// Setting the same label values twice keeps the last value, so a family can
/// never expose one combination twice.
pub struct SeriesBuilder {
    family: &'static str,
    arity: usize,
    series: BTreeMap<LabelValues, f64>,
    arity_errors: usize,
}

impl SeriesBuilder {
    pub fn set(&mut self, values: LabelValues, v: f64) {
        if values.len() != self.arity {
            tracing::error!(
                family = self.family,
                expected = self.arity,
                got = values.len(),
                "label arity mismatch"
            );
            self.arity_errors += 1;
            return;
        }
        self.series.insert(values, v);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Label-less gauge. Holds its last value until set again.
pub struct Gauge {
    name: &'static str,
    help: &'static str,
    bits: AtomicU64,
}

impl Gauge {
    pub fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn set(&self, v: f64) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "gauge");
        let _ = writeln!(out, "{} {}", self.name, format_value(self.get()));
    }
}

fn sorted_label_str(key: &[(String, String)]) -> String {
    label_pairs(
        key.iter().map(|(k, _)| k.as_str()),
        key.iter().map(|(_, v)| v.as_str()),
    )
}

fn sorted_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(sorted_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&sorted_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "counter");
        let mut rows: Vec<_> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (key, val) in rows {
            let label_str = sorted_label_str(&key);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str, val);
        }
    }
}

// Fixed buckets in microseconds: 1ms .. 10s, sized for HTTP round trips.
const BUCKETS_MICROS: [u64; 8] = [
    1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000, 10_000_000,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 8],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(sorted_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = duration.as_micros() as u64;

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&sorted_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format (unit: microseconds).
    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "histogram");
        let mut keys: Vec<_> = self.map.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        for key in keys {
            let Some(hist) = self.map.get(&key) else {
                continue;
            };
            let label_str = sorted_label_str(&key);
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, count);
        }
    }
}

pub const WORKER_LABELS: &[&str] = &["name", "ip", "port"];
pub const WORKER_LIMIT_LABELS: &[&str] = &[
    "name",
    "healthcheckcpu",
    "healthcheckgpu",
    "transcodecpu",
    "transcodegpu",
];
pub const PROCESSING_LABELS: &[&str] = &["name", "worker_type", "file"];

/// Process-wide registry: created once at startup, shared by `Arc` between
/// the collector (single writer) and the HTTP handlers (readers).
pub struct ExporterMetrics {
    pub worker: GaugeVec,
    pub worker_limits: GaugeVec,
    pub processing: GaugeVec,
    pub total_file_count: Gauge,
    pub total_transcode_count: Gauge,
    pub total_health_count: Gauge,
    pub size_diff: Gauge,

    pub fetch_errors: CounterVec,
    pub fetch_duration: HistogramVec, // In Microseconds
    pub upstream_up: Gauge,
    ready: AtomicBool,
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self {
            worker: GaugeVec::new("tdarr_worker", "Nodes currently working", WORKER_LABELS),
            worker_limits: GaugeVec::new(
                "tdarr_worker_limits",
                "Node worker limits",
                WORKER_LIMIT_LABELS,
            ),
            processing: GaugeVec::new(
                "tdarr_processing",
                "File currently processing",
                PROCESSING_LABELS,
            ),
            total_file_count: Gauge::new("tdarr_total_file_count", "The total file count"),
            total_transcode_count: Gauge::new(
                "tdarr_total_transcode_count",
                "The total transcoded count",
            ),
            total_health_count: Gauge::new("tdarr_total_health_count", "The total health count"),
            size_diff: Gauge::new("tdarr_size_diff", "The size difference"),
            fetch_errors: CounterVec::default(),
            fetch_duration: HistogramVec::default(),
            upstream_up: Gauge::new(
                "tdarr_exporter_upstream_up",
                "Whether the last polling cycle fully succeeded",
            ),
            ready: AtomicBool::new(false),
        }
    }
}

impl ExporterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark that at least one cycle fully succeeded.
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
    }

    /// Return whether any cycle has fully succeeded.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Render all registered metrics.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.worker.render(&mut out);
        self.worker_limits.render(&mut out);
        self.processing.render(&mut out);
        self.total_file_count.render(&mut out);
        self.total_transcode_count.render(&mut out);
        self.total_health_count.render(&mut out);
        self.size_diff.render(&mut out);

        self.fetch_errors.render(
            "tdarr_exporter_fetch_errors_total",
            "Failed upstream fetches",
            &mut out,
        );
        self.fetch_duration.render(
            "tdarr_exporter_fetch_duration_micros",
            "Upstream fetch latency in microseconds",
            &mut out,
        );
        self.upstream_up.render(&mut out);
        out
    }
}
