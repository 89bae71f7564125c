//! Fetch-transform-publish for one polling cycle.
//!
//! Label-bearing families are rebuilt from scratch every cycle and swapped in
//! whole, so workers or files that vanished upstream disappear from the
//! exposition. Scalar families are set in place and otherwise keep their last
//! value. Nothing is swapped until the upstream body decoded cleanly, so a
//! failed fetch leaves the previous state on display.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tdarr_core::error::{FetchError, Result};
use tdarr_core::upstream::{label_value, Endpoint};

use crate::client::TdarrApi;
use crate::obs::ExporterMetrics;

/// Outcome of one cycle. Errors are already logged and counted.
#[derive(Debug)]
pub struct CycleReport {
    pub workers: Result<()>,
    pub aggregates: Result<()>,
}

impl CycleReport {
    pub fn is_ok(&self) -> bool {
        self.workers.is_ok() && self.aggregates.is_ok()
    }
}

pub struct Collector {
    api: Arc<dyn TdarrApi>,
    metrics: Arc<ExporterMetrics>,
}

impl Collector {
    pub fn new(api: Arc<dyn TdarrApi>, metrics: Arc<ExporterMetrics>) -> Self {
        Self { api, metrics }
    }

    /// Reconcile `tdarr_worker`, `tdarr_worker_limits` and `tdarr_processing`
    /// against `get-nodes`.
    pub async fn fetch_workers(&self) -> Result<()> {
        let nodes = self.timed(Endpoint::Nodes, self.api.get_nodes()).await?;

        let m = &self.metrics;
        let mut worker = m.worker.builder();
        let mut limits = m.worker_limits.builder();
        let mut processing = m.processing.builder();

        for (name, node) in &nodes {
            worker.set(
                vec![
                    name.clone(),
                    label_value(node.ip.as_ref()),
                    label_value(node.port.as_ref()),
                ],
                1.0,
            );

            let l = node.limits();
            limits.set(
                vec![
                    name.clone(),
                    label_value(l.healthcheckcpu.as_ref()),
                    label_value(l.healthcheckgpu.as_ref()),
                    label_value(l.transcodecpu.as_ref()),
                    label_value(l.transcodegpu.as_ref()),
                ],
                1.0,
            );

            for job in node.jobs() {
                processing.set(
                    vec![
                        name.clone(),
                        label_value(job.worker_type.as_ref()),
                        label_value(job.file.as_ref()),
                    ],
                    1.0,
                );
            }
        }

        tracing::debug!(workers = worker.len(), jobs = processing.len(), "reconciled workers");

        m.worker.replace(worker)?;
        m.worker_limits.replace(limits)?;
        m.processing.replace(processing)?;
        Ok(())
    }

    /// Set the four library-wide gauges from the `cruddb` statistics row.
    pub async fn fetch_aggregates(&self) -> Result<()> {
        let stats = self.timed(Endpoint::Statistics, self.api.get_statistics()).await?;

        let m = &self.metrics;
        m.total_file_count.set(stats.total_file_count());
        m.total_transcode_count.set(stats.total_transcode_count());
        m.total_health_count.set(stats.total_health_check_count());
        m.size_diff.set(stats.size_diff());

        tracing::debug!(
            total_file_count = stats.total_file_count(),
            size_diff = stats.size_diff(),
            "reconciled aggregates"
        );
        Ok(())
    }

    /// Workers, then aggregates. A failing step does not skip the other.
    pub async fn run_cycle(&self) -> CycleReport {
        let workers = self.fetch_workers().await;
        if let Err(e) = &workers {
            tracing::warn!(error = %e, "worker fetch failed; keeping previous series");
        }

        let aggregates = self.fetch_aggregates().await;
        if let Err(e) = &aggregates {
            tracing::warn!(error = %e, "aggregate fetch failed; keeping previous values");
        }

        let report = CycleReport { workers, aggregates };
        if report.is_ok() {
            self.metrics.upstream_up.set(1.0);
            self.metrics.set_ready();
        } else {
            self.metrics.upstream_up.set(0.0);
        }
        report
    }

    async fn timed<T, F>(&self, endpoint: Endpoint, fut: F) -> std::result::Result<T, FetchError>
    where
        F: Future<Output = std::result::Result<T, FetchError>>,
    {
        let started = Instant::now();
        let res = fut.await;
        self.metrics
            .fetch_duration
            .observe(&[("endpoint", endpoint.as_str())], started.elapsed());

        if let Err(e) = &res {
            self.metrics.fetch_errors.inc(&[
                ("endpoint", e.endpoint.as_str()),
                ("kind", e.failure.as_str()),
            ]);
        }
        res
    }
}
