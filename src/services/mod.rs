//! External collaborators: market data, order placement and balances.

pub mod btcturk;
pub mod error;
pub mod exchange;
pub mod market_data;

pub use error::ServiceError;
pub use exchange::{
    has_sufficient_balance, Balance, BalanceProvider, OrderDispatcher, OrderReceipt, OrderRequest,
    OrderSide,
};
pub use market_data::MarketDataProvider;
