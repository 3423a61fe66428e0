//! Quorum trader
//!
//! Runs the weighted-vote trading loop against BtcTurk until Ctrl-C. When
//! HTTP_PORT is set, health, metrics and status endpoints are served too.

use dotenvy::dotenv;
use quorum::config::Config;
use quorum::core::http::{start_server, AppState};
use quorum::core::trader::{SharedStatus, Trader, TraderContext, TraderSettings, TraderStatus};
use quorum::logging;
use quorum::metrics::Metrics;
use quorum::services::btcturk::BtcTurkClient;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{watch, RwLock};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    info!("Starting Quorum trader");
    info!(environment = %config.environment, "Environment");
    info!(
        symbol = %config.symbol,
        weights = ?config.signal_weights,
        model = config.model.kind.as_str(),
        "Trading {} every {}s",
        config.symbol,
        config.poll_interval.as_secs()
    );

    let client = Arc::new(BtcTurkClient::new(config.exchange())?);
    let metrics = Arc::new(Metrics::new()?);
    let status: SharedStatus = Arc::new(RwLock::new(TraderStatus::default()));

    if let Some(port) = config.http_port {
        let state = AppState::new(metrics.clone(), status.clone());
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!(error = %e, "HTTP server error");
            }
        });
    }

    let ctx = TraderContext {
        market_data: client.clone(),
        orders: client.clone(),
        balances: client,
        metrics: Some(metrics),
        status: Some(status),
    };
    let mut trader = Trader::new(TraderSettings::from(&config), ctx)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutting down trader...");
        }
        let _ = shutdown_tx.send(true);
    });

    trader.run(shutdown_rx).await;
    info!("Trader stopped");
    Ok(())
}
