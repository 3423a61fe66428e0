//! Market data provider interface.

use crate::models::PriceSeries;
use crate::services::error::ServiceError;
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest `limit` bars for `symbol`, oldest first. An empty series means
    /// the source had nothing to return.
    async fn get_series(&self, symbol: &str, limit: usize) -> Result<PriceSeries, ServiceError>;
}
