use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::error::{FetchError, FetchFailure};
use crate::upstream::Endpoint;

/// Library-wide statistics document (first row of `StatisticsJSONDB`).
///
/// Counters may arrive as numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_file_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_transcode_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_health_check_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub size_diff: Option<f64>,
}

fn lenient_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("number out of range: {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

impl Statistics {
    pub fn total_file_count(&self) -> f64 {
        self.total_file_count.unwrap_or(0.0)
    }
    pub fn total_transcode_count(&self) -> f64 {
        self.total_transcode_count.unwrap_or(0.0)
    }
    pub fn total_health_check_count(&self) -> f64 {
        self.total_health_check_count.unwrap_or(0.0)
    }
    pub fn size_diff(&self) -> f64 {
        self.size_diff.unwrap_or(0.0)
    }
}

/// Request body for `POST /api/v2/cruddb`.
pub fn statistics_request() -> Value {
    json!({
        "data": {
            "collection": "StatisticsJSONDB",
            "mode": "getAll"
        }
    })
}

/// Decode a `cruddb` body. Only the first element is used.
pub fn decode_statistics(body: &[u8]) -> Result<Statistics, FetchError> {
    let fail = |f| FetchError::new(Endpoint::Statistics, f);

    let rows: Vec<Value> =
        serde_json::from_slice(body).map_err(|e| fail(FetchFailure::Decode(e.to_string())))?;
    let first = rows
        .into_iter()
        .next()
        .ok_or_else(|| fail(FetchFailure::EmptyStatistics))?;

    serde_json::from_value(first).map_err(|e| fail(FetchFailure::Decode(e.to_string())))
}
