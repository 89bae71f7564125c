use std::time::Duration;

use serde::Deserialize;
use tdarr_core::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    #[serde(default = "default_polling_interval_seconds")]
    pub polling_interval_seconds: u64,

    #[serde(default = "default_exporter_port")]
    pub exporter_port: u16,

    #[serde(default = "default_tdarr_api")]
    pub tdarr_api: String,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            polling_interval_seconds: default_polling_interval_seconds(),
            exporter_port: default_exporter_port(),
            tdarr_api: default_tdarr_api(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=86_400).contains(&self.polling_interval_seconds) {
            return Err(ConfigError::Invalid(
                "polling_interval_seconds must be between 1 and 86400".into(),
            ));
        }
        if !(1..=86_400).contains(&self.request_timeout_seconds) {
            return Err(ConfigError::Invalid(
                "request_timeout_seconds must be between 1 and 86400".into(),
            ));
        }
        if self.exporter_port == 0 {
            return Err(ConfigError::Invalid("exporter_port must not be 0".into()));
        }
        if !(self.tdarr_api.starts_with("http://") || self.tdarr_api.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "tdarr_api must be an http(s) url, got {:?}",
                self.tdarr_api
            )));
        }
        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Upstream base url without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.tdarr_api.trim_end_matches('/')
    }
}

fn default_polling_interval_seconds() -> u64 {
    5
}
fn default_exporter_port() -> u16 {
    9877
}
fn default_tdarr_api() -> String {
    "http://localhost:8089".into()
}
fn default_request_timeout_seconds() -> u64 {
    10
}
