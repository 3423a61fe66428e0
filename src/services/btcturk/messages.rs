//! Wire types of the BtcTurk REST API.

use serde::{Deserialize, Deserializer, Serialize};

/// BtcTurk returns some numeric fields as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

pub(crate) fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// One row of `GET /v1/ohlcs`. `time` is in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct OhlcRow {
    #[serde(deserialize_with = "flexible_f64")]
    pub time: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub open: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub high: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub low: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub close: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub volume: f64,
}

/// Body of `POST /api/v1/order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub pair_symbol: String,
    pub quantity: String,
    pub price: String,
    /// 0 buy, 1 sell
    pub order_type: u8,
    /// 0 limit, 1 market
    pub order_method: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderData {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceRow {
    pub asset: String,
    #[serde(deserialize_with = "flexible_f64")]
    pub free: f64,
}
