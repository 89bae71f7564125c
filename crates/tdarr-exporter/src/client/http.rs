use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use tdarr_core::error::{ExporterError, FetchError, FetchFailure, Result};
use tdarr_core::upstream::{
    decode_nodes, decode_statistics, statistics_request, Endpoint, Nodes, Statistics,
};

use super::TdarrApi;

/// `TdarrApi` over HTTP. Every request is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpTdarrApi {
    base: String,
    client: Client,
}

impl HttpTdarrApi {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExporterError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self::with_client(base, client))
    }

    pub fn with_client(base: &str, client: Client) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base, endpoint.path())
    }
}

/// Check status and read the whole body.
async fn read_body(
    endpoint: Endpoint,
    sent: reqwest::Result<Response>,
) -> std::result::Result<Vec<u8>, FetchError> {
    let transport =
        |e: reqwest::Error| FetchError::new(endpoint, FetchFailure::Transport(e.to_string()));

    let resp = sent.map_err(transport)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::new(endpoint, FetchFailure::Status(status.as_u16())));
    }
    let body = resp.bytes().await.map_err(transport)?;
    Ok(body.to_vec())
}

#[async_trait]
impl TdarrApi for HttpTdarrApi {
    async fn get_nodes(&self) -> std::result::Result<Nodes, FetchError> {
        let endpoint = Endpoint::Nodes;
        let sent = self.client.get(self.url(endpoint)).send().await;
        let body = read_body(endpoint, sent).await?;
        decode_nodes(&body)
    }

    async fn get_statistics(&self) -> std::result::Result<Statistics, FetchError> {
        let endpoint = Endpoint::Statistics;
        let sent = self
            .client
            .post(self.url(endpoint))
            .json(&statistics_request())
            .send()
            .await;
        let body = read_body(endpoint, sent).await?;
        decode_statistics(&body)
    }
}
