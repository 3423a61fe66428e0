//! Order and balance interfaces of the exchange.

use crate::models::Signal;
use crate::services::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Side implied by a decision; Hold has none.
    pub fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Buy => Some(OrderSide::Buy),
            Signal::Sell => Some(OrderSide::Sell),
            Signal::Hold => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    /// None places a market order
    pub price: Option<f64>,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            price: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReceipt {
    pub order_id: Option<String>,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: f64,
}

/// Places orders. Not idempotent: every call is a new order.
#[async_trait]
pub trait OrderDispatcher: Send + Sync {
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderReceipt, ServiceError>;
}

#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn get_balances(&self) -> Result<Vec<Balance>, ServiceError>;
}

/// True when `asset` has at least `required` free.
pub fn has_sufficient_balance(asset: &str, required: f64, balances: &[Balance]) -> bool {
    balances
        .iter()
        .any(|b| b.asset.eq_ignore_ascii_case(asset) && b.free >= required)
}

/// Fixed-point rendering truncated (never rounded up) to `precision` decimals.
pub fn format_quantity(quantity: f64, precision: usize) -> String {
    let wide = format!("{:.*}", precision + 4, quantity);
    match wide.find('.') {
        Some(dot) if precision == 0 => wide[..dot].to_string(),
        Some(dot) => wide[..dot + 1 + precision].to_string(),
        None => wide,
    }
}
