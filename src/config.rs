//! Environment-driven configuration.
//!
//! Every setting has a default except the exchange credentials. Values are
//! parsed and validated once at startup; the resulting `Config` is read-only.

use crate::indicators::registry::RULE_NAMES;
use crate::ml::{FeatureSet, ModelConfig, ModelKind};
use crate::services::btcturk::{BtcTurkConfig, DEFAULT_BASE_URL, DEFAULT_MARKET_DATA_URL};
use crate::signals::LEARNED_SIGNAL_NAME;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SIGNAL_WEIGHTS: &str = "bollinger=1,macd=1,rsi=1,stochastic=1,atr=1,ml=2";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Current environment name (`APP_ENV`), `sandbox` when unset.
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

#[derive(Clone)]
pub struct Config {
    pub environment: String,
    pub api_key: String,
    pub api_secret: Vec<u8>,
    pub exchange_base_url: String,
    pub market_data_url: String,
    pub symbol: String,
    pub funding_asset: String,
    pub purchase_amount: f64,
    pub order_quantity: f64,
    pub candle_limit: usize,
    pub poll_interval: Duration,
    pub error_cooldown: Duration,
    /// Enabled strategies and their weights, in configured order
    pub signal_weights: Vec<(String, u32)>,
    pub model: ModelConfig,
    pub http_port: Option<u16>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("exchange_base_url", &self.exchange_base_url)
            .field("market_data_url", &self.market_data_url)
            .field("symbol", &self.symbol)
            .field("funding_asset", &self.funding_asset)
            .field("purchase_amount", &self.purchase_amount)
            .field("order_quantity", &self.order_quantity)
            .field("candle_limit", &self.candle_limit)
            .field("poll_interval", &self.poll_interval)
            .field("error_cooldown", &self.error_cooldown)
            .field("signal_weights", &self.signal_weights)
            .field("model", &self.model)
            .field("http_port", &self.http_port)
            .finish()
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("API_KEY").ok_or(ConfigError::Missing("API_KEY"))?;
        let raw_secret = get("API_SECRET").ok_or(ConfigError::Missing("API_SECRET"))?;
        let api_secret = STANDARD
            .decode(raw_secret.trim())
            .map_err(|e| ConfigError::Invalid {
                key: "API_SECRET",
                reason: format!("not valid base64: {}", e),
            })?;

        let purchase_amount = parse_positive_f64("PURCHASE_AMOUNT", get("PURCHASE_AMOUNT"), 100.0)?;
        let order_quantity = parse_positive_f64("ORDER_QUANTITY", get("ORDER_QUANTITY"), 0.000047)?;
        let candle_limit = parse_nonzero("CANDLE_LIMIT", get("CANDLE_LIMIT"), 250)?;
        let poll_seconds = parse_nonzero("POLL_INTERVAL_SECONDS", get("POLL_INTERVAL_SECONDS"), 300)?;
        let cooldown_seconds =
            parse_nonzero("ERROR_COOLDOWN_SECONDS", get("ERROR_COOLDOWN_SECONDS"), 60)?;

        let signal_weights = parse_signal_weights(
            &get("SIGNAL_WEIGHTS").unwrap_or_else(|| DEFAULT_SIGNAL_WEIGHTS.to_string()),
        )?;

        let kind = match get("MODEL_KIND") {
            Some(v) => ModelKind::parse(&v).ok_or_else(|| ConfigError::Invalid {
                key: "MODEL_KIND",
                reason: format!("expected random_forest or decision_tree, got '{}'", v),
            })?,
            None => ModelKind::RandomForest,
        };
        let features = match get("MODEL_FEATURES") {
            Some(v) => FeatureSet::parse(&v).ok_or_else(|| ConfigError::Invalid {
                key: "MODEL_FEATURES",
                reason: format!("expected full or minimal, got '{}'", v),
            })?,
            None => FeatureSet::Full,
        };
        let seed = match get("MODEL_SEED") {
            Some(v) => v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "MODEL_SEED",
                reason: e.to_string(),
            })?,
            None => 42,
        };

        let http_port = match get("HTTP_PORT") {
            Some(v) => Some(v.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "HTTP_PORT",
                reason: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            environment: get("APP_ENV").unwrap_or_else(|| "sandbox".to_string()),
            api_key,
            api_secret,
            exchange_base_url: get("EXCHANGE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            market_data_url: get("MARKET_DATA_URL")
                .unwrap_or_else(|| DEFAULT_MARKET_DATA_URL.to_string()),
            symbol: get("SYMBOL").unwrap_or_else(|| "BTCTRY".to_string()),
            funding_asset: get("FUNDING_ASSET").unwrap_or_else(|| "TRY".to_string()),
            purchase_amount,
            order_quantity,
            candle_limit,
            poll_interval: Duration::from_secs(poll_seconds as u64),
            error_cooldown: Duration::from_secs(cooldown_seconds as u64),
            signal_weights,
            model: ModelConfig {
                kind,
                features,
                seed,
            },
            http_port,
        })
    }

    pub fn exchange(&self) -> BtcTurkConfig {
        BtcTurkConfig {
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            base_url: self.exchange_base_url.clone(),
            market_data_url: self.market_data_url.clone(),
            timeout: HTTP_TIMEOUT,
        }
    }

    /// Weight of the learned signal, if it is enabled.
    pub fn learned_signal_weight(&self) -> Option<u32> {
        self.signal_weights
            .iter()
            .find(|(name, _)| name == LEARNED_SIGNAL_NAME)
            .map(|(_, weight)| *weight)
    }
}

/// Parse `name=weight` pairs separated by commas. Names must be known rules
/// or the learned signal; a repeated name keeps its last weight.
pub fn parse_signal_weights(raw: &str) -> Result<Vec<(String, u32)>, ConfigError> {
    let mut weights: Vec<(String, u32)> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, weight) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
            key: "SIGNAL_WEIGHTS",
            reason: format!("expected name=weight, got '{}'", entry),
        })?;
        let name = name.trim().to_ascii_lowercase();
        if name != LEARNED_SIGNAL_NAME && !RULE_NAMES.contains(&name.as_str()) {
            return Err(ConfigError::Invalid {
                key: "SIGNAL_WEIGHTS",
                reason: format!("unknown signal '{}'", name),
            });
        }
        let weight = weight.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
            key: "SIGNAL_WEIGHTS",
            reason: format!("weight of '{}': {}", name, e),
        })?;

        match weights.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = weight,
            None => weights.push((name, weight)),
        }
    }
    Ok(weights)
}

fn parse_positive_f64(key: &'static str, value: Option<String>, default: f64) -> Result<f64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    let parsed = value.trim().parse::<f64>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be a positive number, got {}", value),
        });
    }
    Ok(parsed)
}

fn parse_nonzero(key: &'static str, value: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}
