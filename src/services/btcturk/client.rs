//! Signed REST client for BtcTurk.

use crate::models::{Candle, PriceSeries};
use crate::services::btcturk::messages::{BalanceRow, Envelope, OhlcRow, OrderData, OrderPayload};
use crate::services::error::ServiceError;
use crate::services::exchange::{
    format_quantity, Balance, BalanceProvider, OrderDispatcher, OrderReceipt, OrderRequest, OrderSide,
};
use crate::services::market_data::MarketDataProvider;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Response;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.btcturk.com";
pub const DEFAULT_MARKET_DATA_URL: &str = "https://graph-api.btcturk.com";
const QUANTITY_PRECISION: usize = 8;

#[derive(Clone)]
pub struct BtcTurkConfig {
    pub api_key: String,
    /// Decoded secret bytes
    pub api_secret: Vec<u8>,
    pub base_url: String,
    pub market_data_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for BtcTurkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtcTurkConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("market_data_url", &self.market_data_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct BtcTurkClient {
    config: BtcTurkConfig,
    http: reqwest::Client,
}

impl BtcTurkClient {
    pub fn new(config: BtcTurkConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// base64(HMAC-SHA256(secret, api_key + nonce))
    pub fn sign(&self, nonce: &str) -> Result<String, ServiceError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.config.api_secret)
            .map_err(|e| ServiceError::Signing(e.to_string()))?;
        mac.update(self.config.api_key.as_bytes());
        mac.update(nonce.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn auth_headers(&self) -> Result<HeaderMap, ServiceError> {
        let nonce = Utc::now().timestamp_millis().to_string();
        let signature = self.sign(&nonce)?;

        let mut headers = HeaderMap::new();
        headers.insert("X-PCK", header_value(&self.config.api_key)?);
        headers.insert("X-Stamp", header_value(&nonce)?);
        headers.insert("X-Signature", header_value(&signature)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn fetch_ohlc(&self, symbol: &str, limit: usize) -> Result<PriceSeries, ServiceError> {
        let url = format!("{}/v1/ohlcs", self.config.market_data_url.trim_end_matches('/'));
        let response = self.http.get(&url).query(&[("pair", symbol)]).send().await?;
        let rows: Vec<OhlcRow> = read_json(response).await?;
        debug!(symbol = %symbol, rows = rows.len(), "BtcTurk: received OHLC rows");
        series_from_rows(rows, limit)
    }

    pub async fn submit_order(&self, request: &OrderRequest) -> Result<OrderReceipt, ServiceError> {
        let payload = OrderPayload {
            pair_symbol: request.symbol.clone(),
            quantity: format_quantity(request.quantity, QUANTITY_PRECISION),
            price: request
                .price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "0".to_string()),
            order_type: match request.side {
                OrderSide::Buy => 0,
                OrderSide::Sell => 1,
            },
            order_method: if request.price.is_some() { 0 } else { 1 },
        };

        let url = format!("{}/api/v1/order", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&payload)
            .send()
            .await?;
        let envelope: Envelope<OrderData> = read_json(response).await?;
        if envelope.success == Some(false) {
            return Err(ServiceError::Api {
                status: 200,
                message: envelope.message.unwrap_or_default(),
            });
        }

        let order_id = envelope.data.and_then(|d| d.id).map(|id| match id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        info!(
            symbol = %request.symbol,
            side = %request.side,
            quantity = %payload.quantity,
            order_id = ?order_id,
            "BtcTurk: order accepted"
        );

        Ok(OrderReceipt {
            order_id,
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
        })
    }

    pub async fn fetch_balances(&self) -> Result<Vec<Balance>, ServiceError> {
        let url = format!("{}/api/v1/users/balances", self.config.base_url.trim_end_matches('/'));
        let response = self.http.get(&url).headers(self.auth_headers()?).send().await?;
        let envelope: Envelope<Vec<BalanceRow>> = read_json(response).await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|row| Balance {
                asset: row.asset,
                free: row.free,
            })
            .collect())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ServiceError> {
    HeaderValue::from_str(value).map_err(|e| ServiceError::Signing(e.to_string()))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ServiceError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Sort by time, keep the last row per timestamp, then the newest `limit`.
pub fn series_from_rows(mut rows: Vec<OhlcRow>, limit: usize) -> Result<PriceSeries, ServiceError> {
    rows.sort_by(|a, b| a.time.total_cmp(&b.time));
    let mut candles: Vec<Candle> = Vec::with_capacity(rows.len());
    for row in rows {
        let timestamp = DateTime::<Utc>::from_timestamp(row.time as i64, 0)
            .ok_or_else(|| ServiceError::Decode(format!("invalid candle time {}", row.time)))?;
        let candle = Candle::new(row.open, row.high, row.low, row.close, row.volume, timestamp);
        match candles.last_mut() {
            Some(last) if last.timestamp == timestamp => *last = candle,
            _ => candles.push(candle),
        }
    }
    let series = PriceSeries::new(candles).map_err(|e| ServiceError::Decode(e.to_string()))?;
    Ok(series.tail(limit))
}

#[async_trait]
impl MarketDataProvider for BtcTurkClient {
    async fn get_series(&self, symbol: &str, limit: usize) -> Result<PriceSeries, ServiceError> {
        self.fetch_ohlc(symbol, limit).await
    }
}

#[async_trait]
impl OrderDispatcher for BtcTurkClient {
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderReceipt, ServiceError> {
        self.submit_order(request).await
    }
}

#[async_trait]
impl BalanceProvider for BtcTurkClient {
    async fn get_balances(&self) -> Result<Vec<Balance>, ServiceError> {
        self.fetch_balances().await
    }
}
