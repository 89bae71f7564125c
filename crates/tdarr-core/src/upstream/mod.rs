//! Tdarr server API contracts.
//!
//! - `nodes`: `GET /api/v2/get-nodes`, worker-name keyed node status
//! - `statistics`: `POST /api/v2/cruddb` against `StatisticsJSONDB`

pub mod nodes;
pub mod statistics;

use std::fmt;

pub use nodes::{decode_nodes, label_value, ActiveJob, NodeStatus, Nodes, WorkerLimits};
pub use statistics::{decode_statistics, statistics_request, Statistics};

/// Upstream endpoints polled every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Nodes,
    Statistics,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Nodes => "/api/v2/get-nodes",
            Endpoint::Statistics => "/api/v2/cruddb",
        }
    }

    /// Short name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Nodes => "get-nodes",
            Endpoint::Statistics => "cruddb",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
