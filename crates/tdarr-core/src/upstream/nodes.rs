use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{FetchError, FetchFailure};
use crate::upstream::Endpoint;

/// `get-nodes` response: worker name -> status. Ordered for stable iteration.
pub type Nodes = BTreeMap<String, NodeStatus>;

/// One worker node. Tdarr sends many more fields; only these are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub ip: Option<Value>,
    #[serde(default)]
    pub port: Option<Value>,
    #[serde(default, rename = "workerLimits")]
    pub worker_limits: Option<WorkerLimits>,
    /// Active jobs keyed by worker id.
    #[serde(default)]
    pub workers: Option<BTreeMap<String, ActiveJob>>,
}

/// Per-node worker slot configuration. Values are usually integers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerLimits {
    #[serde(default)]
    pub healthcheckcpu: Option<Value>,
    #[serde(default)]
    pub healthcheckgpu: Option<Value>,
    #[serde(default)]
    pub transcodecpu: Option<Value>,
    #[serde(default)]
    pub transcodegpu: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveJob {
    #[serde(default, rename = "workerType")]
    pub worker_type: Option<Value>,
    #[serde(default)]
    pub file: Option<Value>,
}

impl NodeStatus {
    pub fn limits(&self) -> WorkerLimits {
        self.worker_limits.clone().unwrap_or_default()
    }

    /// Active jobs; a node without a `workers` map has none.
    pub fn jobs(&self) -> impl Iterator<Item = &ActiveJob> {
        self.workers.iter().flat_map(|w| w.values())
    }
}

/// Render a raw upstream value as a label value.
///
/// Numbers keep their decimal form, absent/null become `""`.
pub fn label_value(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Decode a `get-nodes` body.
pub fn decode_nodes(body: &[u8]) -> Result<Nodes, FetchError> {
    let nodes: Nodes = serde_json::from_slice(body)
        .map_err(|e| FetchError::new(Endpoint::Nodes, FetchFailure::Decode(e.to_string())))?;
    tracing::trace!(nodes = nodes.len(), "decoded get-nodes body");
    Ok(nodes)
}
