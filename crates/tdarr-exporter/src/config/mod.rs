//! Exporter config loader.
//!
//! Defaults, then an optional strict YAML file named by `EXPORTER_CONFIG`,
//! then individual environment variables. Read once at startup.

pub mod schema;

use std::fs;
use std::str::FromStr;

use tdarr_core::error::ConfigError;

pub use schema::ExporterConfig;

pub const ENV_CONFIG_FILE: &str = "EXPORTER_CONFIG";
pub const ENV_POLLING_INTERVAL: &str = "POLLING_INTERVAL_SECONDS";
pub const ENV_EXPORTER_PORT: &str = "EXPORTER_PORT";
pub const ENV_TDARR_API: &str = "TDARR_API";
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT_SECONDS";

pub fn load_from_file(path: &str) -> Result<ExporterConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig, ConfigError> {
    let cfg: ExporterConfig =
        serde_yaml::from_str(s).map_err(|e| ConfigError::Yaml(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load from the process environment.
pub fn from_env() -> Result<ExporterConfig, ConfigError> {
    from_lookup(|k| std::env::var(k).ok())
}

/// Load using `lookup` as the environment.
pub fn from_lookup<F>(lookup: F) -> Result<ExporterConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match lookup(ENV_CONFIG_FILE).filter(|p| !p.trim().is_empty()) {
        Some(path) => load_from_file(path.trim())?,
        None => ExporterConfig::default(),
    };

    if let Some(v) = lookup(ENV_POLLING_INTERVAL) {
        cfg.polling_interval_seconds = parse_var(ENV_POLLING_INTERVAL, &v, "a positive integer")?;
    }
    if let Some(v) = lookup(ENV_EXPORTER_PORT) {
        cfg.exporter_port = parse_var(ENV_EXPORTER_PORT, &v, "a port number")?;
    }
    if let Some(v) = lookup(ENV_TDARR_API) {
        cfg.tdarr_api = v.trim().to_string();
    }
    if let Some(v) = lookup(ENV_REQUEST_TIMEOUT) {
        cfg.request_timeout_seconds = parse_var(ENV_REQUEST_TIMEOUT, &v, "a positive integer")?;
    }

    cfg.validate()?;
    Ok(cfg)
}

fn parse_var<T: FromStr>(
    var: &'static str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        expected,
    })
}
