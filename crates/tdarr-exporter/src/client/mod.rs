//! Upstream Tdarr API access.
//!
//! The collector talks to the server through `TdarrApi` so tests can swap in
//! scripted responses.

pub mod http;

use async_trait::async_trait;

use tdarr_core::error::FetchError;
use tdarr_core::upstream::{Nodes, Statistics};

pub use http::HttpTdarrApi;

#[async_trait]
pub trait TdarrApi: Send + Sync {
    /// `GET /api/v2/get-nodes`
    async fn get_nodes(&self) -> Result<Nodes, FetchError>;
    /// `POST /api/v2/cruddb`, first `StatisticsJSONDB` row.
    async fn get_statistics(&self) -> Result<Statistics, FetchError>;
}
