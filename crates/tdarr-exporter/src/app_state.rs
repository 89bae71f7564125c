//! Shared application state for the exporter.
//!
//! One registry and one collector per process. The HTTP handlers only read
//! the registry; the scheduler task is its only writer.

use std::sync::Arc;

use tdarr_core::error::Result;

use crate::client::{HttpTdarrApi, TdarrApi};
use crate::collector::Collector;
use crate::config::ExporterConfig;
use crate::obs::ExporterMetrics;
use crate::scheduler::Scheduler;

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ExporterConfig>,
    metrics: Arc<ExporterMetrics>,
    collector: Arc<Collector>,
}

impl AppState {
    /// Build state polling the configured Tdarr server over HTTP.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        let api = HttpTdarrApi::new(cfg.base_url(), cfg.request_timeout())?;
        Ok(Self::with_api(cfg, Arc::new(api)))
    }

    /// Build state around an arbitrary upstream (tests).
    pub fn with_api(cfg: ExporterConfig, api: Arc<dyn TdarrApi>) -> Self {
        let metrics = Arc::new(ExporterMetrics::new());
        let collector = Arc::new(Collector::new(api, Arc::clone(&metrics)));
        Self {
            cfg: Arc::new(cfg),
            metrics,
            collector,
        }
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.cfg
    }

    pub fn metrics(&self) -> Arc<ExporterMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn collector(&self) -> Arc<Collector> {
        Arc::clone(&self.collector)
    }

    pub fn is_ready(&self) -> bool {
        self.metrics.is_ready()
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.collector(), self.cfg.polling_interval())
    }
}
