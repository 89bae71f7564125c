//! Reconciliation behaviour of the collector against scripted upstream responses.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use tdarr_core::error::{ExporterError, FetchError, FetchFailure};
use tdarr_core::upstream::{decode_nodes, decode_statistics, Endpoint, Nodes, Statistics};
use tdarr_exporter::client::TdarrApi;
use tdarr_exporter::collector::Collector;
use tdarr_exporter::obs::ExporterMetrics;

#[derive(Default)]
struct ScriptedApi {
    nodes: Mutex<Option<Result<Value, FetchFailure>>>,
    stats: Mutex<Option<Result<Value, FetchFailure>>>,
}

impl ScriptedApi {
    fn nodes(&self, v: Value) {
        *self.nodes.lock() = Some(Ok(v));
    }
    fn nodes_fail(&self, f: FetchFailure) {
        *self.nodes.lock() = Some(Err(f));
    }
    fn stats(&self, v: Value) {
        *self.stats.lock() = Some(Ok(v));
    }
    fn stats_fail(&self, f: FetchFailure) {
        *self.stats.lock() = Some(Err(f));
    }
}

#[async_trait]
impl TdarrApi for ScriptedApi {
    async fn get_nodes(&self) -> Result<Nodes, FetchError> {
        let scripted = self.nodes.lock().clone().expect("nodes not scripted");
        match scripted {
            Ok(v) => decode_nodes(&serde_json::to_vec(&v).unwrap()),
            Err(f) => Err(FetchError::new(Endpoint::Nodes, f)),
        }
    }

    async fn get_statistics(&self) -> Result<Statistics, FetchError> {
        let scripted = self.stats.lock().clone().expect("stats not scripted");
        match scripted {
            Ok(v) => decode_statistics(&serde_json::to_vec(&v).unwrap()),
            Err(f) => Err(FetchError::new(Endpoint::Statistics, f)),
        }
    }
}

fn setup() -> (Arc<ScriptedApi>, Collector, Arc<ExporterMetrics>) {
    let api = Arc::new(ScriptedApi::default());
    let metrics = Arc::new(ExporterMetrics::new());
    let collector = Collector::new(api.clone(), Arc::clone(&metrics));
    (api, collector, metrics)
}

fn node1() -> Value {
    json!({
        "node1": {
            "ip": "10.0.0.1",
            "port": "8266",
            "workerLimits": { "healthcheckcpu": 1, "transcodecpu": 2 },
            "workers": { "w1": { "workerType": "video", "file": "movie.mkv" } }
        }
    })
}

fn mentions(series: &std::collections::BTreeMap<Vec<String>, f64>, name: &str) -> bool {
    series.keys().any(|k| k[0] == name)
}

#[tokio::test]
async fn single_node_scenario() {
    let (api, collector, m) = setup();
    api.nodes(node1());

    collector.fetch_workers().await.unwrap();

    assert_eq!(m.worker.get(&["node1", "10.0.0.1", "8266"]), Some(1.0));
    assert_eq!(m.worker_limits.get(&["node1", "1", "", "2", ""]), Some(1.0));
    assert_eq!(m.processing.get(&["node1", "video", "movie.mkv"]), Some(1.0));
    assert_eq!(m.worker.len(), 1);
    assert_eq!(m.worker_limits.len(), 1);
    assert_eq!(m.processing.len(), 1);

    let out = m.render();
    assert!(out.contains(r#"tdarr_worker{name="node1",ip="10.0.0.1",port="8266"} 1"#));
    assert!(out.contains(
        r#"tdarr_worker_limits{name="node1",healthcheckcpu="1",healthcheckgpu="",transcodecpu="2",transcodegpu=""} 1"#
    ));
    assert!(out.contains(r#"tdarr_processing{name="node1",worker_type="video",file="movie.mkv"} 1"#));
}

#[tokio::test]
async fn same_response_twice_is_idempotent() {
    let (api, collector, m) = setup();
    api.nodes(node1());
    api.stats(json!([{ "totalFileCount": 7 }]));

    collector.run_cycle().await;
    let first = (m.worker.snapshot(), m.worker_limits.snapshot(), m.processing.snapshot(), m.total_file_count.get());
    collector.run_cycle().await;
    let second = (m.worker.snapshot(), m.worker_limits.snapshot(), m.processing.snapshot(), m.total_file_count.get());

    assert_eq!(first, second);
}

#[tokio::test]
async fn vanished_worker_is_removed_from_every_family() {
    let (api, collector, m) = setup();
    api.nodes(json!({
        "A": { "ip": "10.0.0.1", "port": 1, "workers": { "j": { "workerType": "transcodecpu", "file": "a.mkv" } } },
        "B": { "ip": "10.0.0.2", "port": 2 }
    }));
    collector.fetch_workers().await.unwrap();
    assert!(mentions(&m.worker.snapshot(), "A"));

    api.nodes(json!({ "B": { "ip": "10.0.0.2", "port": 2 } }));
    collector.fetch_workers().await.unwrap();

    assert!(!mentions(&m.worker.snapshot(), "A"));
    assert!(!mentions(&m.worker_limits.snapshot(), "A"));
    assert!(!mentions(&m.processing.snapshot(), "A"));
    assert_eq!(m.worker.get(&["B", "10.0.0.2", "2"]), Some(1.0));
}

#[tokio::test]
async fn finished_job_is_removed_but_worker_stays() {
    let (api, collector, m) = setup();
    api.nodes(json!({
        "A": { "ip": "10.0.0.1", "port": "8266", "workers": { "w": { "workerType": "video", "file": "x.mkv" } } }
    }));
    collector.fetch_workers().await.unwrap();
    assert_eq!(m.processing.get(&["A", "video", "x.mkv"]), Some(1.0));

    api.nodes(json!({ "A": { "ip": "10.0.0.1", "port": "8266", "workers": {} } }));
    collector.fetch_workers().await.unwrap();

    assert!(m.processing.is_empty());
    assert_eq!(m.worker.get(&["A", "10.0.0.1", "8266"]), Some(1.0));
    assert_eq!(m.worker_limits.get(&["A", "", "", "", ""]), Some(1.0));
}

#[tokio::test]
async fn changed_labels_replace_old_combination() {
    let (api, collector, m) = setup();
    api.nodes(json!({ "A": { "ip": "10.0.0.1", "port": "8266" } }));
    collector.fetch_workers().await.unwrap();

    api.nodes(json!({ "A": { "ip": "10.0.0.9", "port": "8266" } }));
    collector.fetch_workers().await.unwrap();

    assert_eq!(m.worker.len(), 1);
    assert_eq!(m.worker.get(&["A", "10.0.0.1", "8266"]), None);
    assert_eq!(m.worker.get(&["A", "10.0.0.9", "8266"]), Some(1.0));
}

#[tokio::test]
async fn duplicate_jobs_collapse_to_one_series() {
    let (api, collector, m) = setup();
    api.nodes(json!({
        "A": {
            "ip": "h", "port": "p",
            "workers": {
                "w1": { "workerType": "video", "file": "same.mkv" },
                "w2": { "workerType": "video", "file": "same.mkv" }
            }
        }
    }));
    collector.fetch_workers().await.unwrap();
    assert_eq!(m.processing.len(), 1);
}

#[tokio::test]
async fn failed_worker_fetch_keeps_previous_series() {
    let (api, collector, m) = setup();
    api.nodes(node1());
    collector.fetch_workers().await.unwrap();
    let before = m.worker.snapshot();

    api.nodes_fail(FetchFailure::Status(502));
    let err = collector.fetch_workers().await.expect_err("must fail");
    assert!(matches!(err, ExporterError::Fetch(FetchError { failure: FetchFailure::Status(502), .. })));

    assert_eq!(m.worker.snapshot(), before);
    assert_eq!(m.processing.len(), 1);
}

#[tokio::test]
async fn aggregate_scenario() {
    let (api, collector, m) = setup();
    api.stats(json!([{ "totalFileCount": 100, "totalTranscodeCount": 40, "totalHealthCheckCount": 10, "sizeDiff": -500 }]));

    collector.fetch_aggregates().await.unwrap();

    assert_eq!(m.total_file_count.get(), 100.0);
    assert_eq!(m.total_transcode_count.get(), 40.0);
    assert_eq!(m.total_health_count.get(), 10.0);
    assert_eq!(m.size_diff.get(), -500.0);
}

#[tokio::test]
async fn missing_aggregate_fields_default_to_zero() {
    let (api, collector, m) = setup();
    api.stats(json!([{ "totalFileCount": 3, "sizeDiff": 9 }]));
    collector.fetch_aggregates().await.unwrap();

    api.stats(json!([{}]));
    collector.fetch_aggregates().await.unwrap();

    assert_eq!(m.total_file_count.get(), 0.0);
    assert_eq!(m.total_transcode_count.get(), 0.0);
    assert_eq!(m.total_health_count.get(), 0.0);
    assert_eq!(m.size_diff.get(), 0.0);
}

#[tokio::test]
async fn failed_aggregate_fetch_keeps_scalars() {
    let (api, collector, m) = setup();
    api.nodes(json!({}));
    api.stats(json!([{ "totalFileCount": 100, "totalTranscodeCount": 40, "totalHealthCheckCount": 10, "sizeDiff": -500 }]));
    assert!(collector.run_cycle().await.is_ok());

    api.stats(json!([]));
    let report = collector.run_cycle().await;
    assert!(report.workers.is_ok());
    assert!(report.aggregates.is_err());

    api.stats_fail(FetchFailure::Transport("connection refused".into()));
    assert!(!collector.run_cycle().await.is_ok());

    assert_eq!(m.total_file_count.get(), 100.0);
    assert_eq!(m.total_transcode_count.get(), 40.0);
    assert_eq!(m.total_health_count.get(), 10.0);
    assert_eq!(m.size_diff.get(), -500.0);
}

#[tokio::test]
async fn cycle_runs_aggregates_even_when_workers_fail() {
    let (api, collector, m) = setup();
    api.nodes_fail(FetchFailure::Decode("expected map".into()));
    api.stats(json!([{ "totalFileCount": 5 }]));

    let report = collector.run_cycle().await;

    assert!(report.workers.is_err());
    assert!(report.aggregates.is_ok());
    assert_eq!(m.total_file_count.get(), 5.0);
}

#[tokio::test]
async fn cycle_records_errors_and_readiness() {
    let (api, collector, m) = setup();
    api.nodes_fail(FetchFailure::Status(500));
    api.stats(json!([]));

    collector.run_cycle().await;
    assert!(!m.is_ready());
    assert_eq!(m.upstream_up.get(), 0.0);
    assert_eq!(m.fetch_errors.get(&[("endpoint", "get-nodes"), ("kind", "status")]), 1);
    assert_eq!(m.fetch_errors.get(&[("endpoint", "cruddb"), ("kind", "empty_statistics")]), 1);
    assert_eq!(m.fetch_duration.count(&[("endpoint", "get-nodes")]), 1);

    api.nodes(node1());
    api.stats(json!([{}]));
    collector.run_cycle().await;
    assert!(m.is_ready());
    assert_eq!(m.upstream_up.get(), 1.0);

    api.nodes_fail(FetchFailure::Transport("timed out".into()));
    collector.run_cycle().await;
    assert!(m.is_ready());
    assert_eq!(m.upstream_up.get(), 0.0);
}
