//! Integration tests for the trading loop
//!
//! Drives `Trader` against in-memory collaborators: edge-triggered dispatch,
//! data unavailability, the accumulate policy, failure tolerance and shutdown.


use quorum::core::trader::TradingError;
use quorum::ml::{FeatureSet, ModelConfig, ModelKind};
use quorum::models::Signal;
use quorum::services::OrderSide;
use std::time::Duration;
use tokio::sync::watch;

use test_utils::*;

#[tokio::test]
async fn repeated_decision_dispatches_once() {
    let mut t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Series(oversold_series())]),
        MockExchange::default(),
    );

    let first = t.trader.run_cycle().await.unwrap();
    let second = t.trader.run_cycle().await.unwrap();

    assert_eq!(first.decision, Signal::Buy);
    assert_eq!(first.dispatched, Some(OrderSide::Buy));
    assert_eq!(second.decision, Signal::Buy);
    assert_eq!(second.dispatched, None);

    let orders = t.exchange.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_eq!(orders[0].quantity, 0.000047);
    assert_eq!(orders[0].price, None);
}

#[tokio::test]
async fn decision_change_dispatches_again() {
    let mut t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![
            MarketResponse::Series(oversold_series()),
            MarketResponse::Series(overbought_series()),
        ]),
        MockExchange::default(),
    );

    for _ in 0..3 {
        t.trader.run_cycle().await.unwrap();
    }

    let sides: Vec<OrderSide> = t.exchange.orders().iter().map(|o| o.side).collect();
    assert_eq!(sides, vec![OrderSide::Buy, OrderSide::Sell]);
    assert_eq!(t.trader.previous_decision(), Some(Signal::Sell));
}

#[tokio::test]
async fn first_hold_dispatches_nothing() {
    let mut t = TestTrader::new(
        settings_with(&[("bollinger", 1)]),
        MockMarketData::new(vec![MarketResponse::Series(oversold_series())]),
        MockExchange::default(),
    );

    // 40 bars is too short for the Bollinger trend window
    let report = t.trader.run_cycle().await.unwrap();
    assert_eq!(report.decision, Signal::Hold);
    assert_eq!(report.skipped, vec!["bollinger".to_string()]);
    assert!(report.votes.is_empty());
    assert!(t.exchange.orders().is_empty());
    assert_eq!(t.trader.previous_decision(), Some(Signal::Hold));
}

#[tokio::test]
async fn empty_market_data_skips_the_cycle() {
    let mut t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Empty]),
        MockExchange::default(),
    );

    let result = t.trader.run_cycle().await;
    assert!(matches!(result, Err(TradingError::DataUnavailable { .. })));
    assert!(t.exchange.orders().is_empty());
    assert_eq!(t.trader.previous_decision(), None);
    assert_eq!(t.metrics.market_data_unavailable_total.get(), 1);
}

#[tokio::test]
async fn failed_market_data_skips_the_cycle() {
    let mut t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Fail]),
        MockExchange::default(),
    );

    let result = t.trader.run_cycle().await;
    assert!(matches!(result, Err(TradingError::DataUnavailable { .. })));
    assert!(t.exchange.orders().is_empty());
    assert!(t.status.read().await.last_error.is_some());
}

#[tokio::test]
async fn accumulates_when_funding_balance_allows() {
    let mut t = TestTrader::new(
        settings_with(&[("bollinger", 1)]),
        MockMarketData::new(vec![MarketResponse::Series(oversold_series())]),
        MockExchange::with_balance("TRY", 250.0),
    );

    let report = t.trader.run_cycle().await.unwrap();
    assert!(report.accumulated);

    let orders = t.exchange.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_eq!(orders[0].quantity, 100.0);
    assert_eq!(
        t.metrics
            .orders_dispatched_total
            .with_label_values(&["buy", "accumulate"])
            .get(),
        1
    );
}

#[tokio::test]
async fn accumulate_runs_even_when_data_is_missing() {
    let mut t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Empty]),
        MockExchange::with_balance("TRY", 100.0),
    );

    assert!(t.trader.run_cycle().await.is_err());
    assert_eq!(t.exchange.orders().len(), 1);
}

#[tokio::test]
async fn low_balance_skips_accumulation() {
    let mut t = TestTrader::new(
        settings_with(&[("bollinger", 1)]),
        MockMarketData::new(vec![MarketResponse::Series(oversold_series())]),
        MockExchange::with_balance("TRY", 99.99),
    );

    let report = t.trader.run_cycle().await.unwrap();
    assert!(!report.accumulated);
    assert!(t.exchange.orders().is_empty());
}

#[tokio::test]
async fn collaborator_failures_do_not_stop_the_cycle() {
    let exchange = MockExchange::default();
    exchange.set_fail_balances(true);
    exchange.set_fail_orders(true);
    let mut t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Series(oversold_series())]),
        exchange,
    );

    let first = t.trader.run_cycle().await.unwrap();
    assert_eq!(first.decision, Signal::Buy);
    assert_eq!(first.dispatched, None);
    assert!(!first.accumulated);
    assert_eq!(t.trader.previous_decision(), Some(Signal::Buy));

    // the failed order is not retried while the decision stays the same
    t.trader.run_cycle().await.unwrap();
    assert_eq!(t.exchange.orders().len(), 1);
    assert_eq!(t.metrics.order_failures_total.get(), 1);
}

#[tokio::test]
async fn learned_signal_trains_once_and_votes() {
    let mut settings = settings_with(&[("ml", 2)]);
    settings.model = ModelConfig {
        kind: ModelKind::DecisionTree,
        features: FeatureSet::Minimal,
        seed: 42,
    };
    let mut t = TestTrader::new(
        settings,
        MockMarketData::new(vec![MarketResponse::Series(mixed_series(120))]),
        MockExchange::default(),
    );

    let first = t.trader.run_cycle().await.unwrap();
    assert!(first.model_trained);
    assert_eq!(first.votes.len(), 1);
    assert_eq!(first.votes[0].0, "ml");
    assert_eq!(first.votes[0].1.weight, 2);
    assert_ne!(first.decision, Signal::Hold);

    let report = *t.trader.model().unwrap().report();
    t.trader.run_cycle().await.unwrap();
    assert_eq!(*t.trader.model().unwrap().report(), report);
    assert_eq!(t.metrics.model_trained.get(), 1.0);
}

#[tokio::test]
async fn training_is_retried_after_short_history() {
    let mut settings = settings_with(&[("ml", 2)]);
    settings.model.features = FeatureSet::Full;
    let mut t = TestTrader::new(
        settings,
        MockMarketData::new(vec![
            MarketResponse::Series(mixed_series(100)),
            MarketResponse::Series(mixed_series(230)),
        ]),
        MockExchange::default(),
    );

    let first = t.trader.run_cycle().await.unwrap();
    assert!(!first.model_trained);
    assert_eq!(first.skipped, vec!["ml".to_string()]);
    assert_eq!(first.decision, Signal::Hold);

    let second = t.trader.run_cycle().await.unwrap();
    assert!(second.model_trained);
    assert!(second.skipped.is_empty());
}

#[tokio::test]
async fn status_snapshot_follows_cycles() {
    let mut t = TestTrader::new(
        settings_with(&[("rsi_static", 1), ("bollinger", 1)]),
        MockMarketData::new(vec![MarketResponse::Series(oversold_series())]),
        MockExchange::default(),
    );

    t.trader.run_cycle().await.unwrap();

    let status = t.status.read().await.clone();
    assert_eq!(status.symbol, "BTCTRY");
    assert_eq!(status.last_decision, Some(Signal::Buy));
    assert_eq!(status.cycles, 1);
    assert_eq!(status.votes.len(), 1);
    assert_eq!(status.skipped, vec!["bollinger".to_string()]);
    assert_eq!(status.tally.buy_weight, 1);
    assert!(status.last_cycle_at.is_some());
    assert_eq!(t.metrics.trading_cycles_total.get(), 1);
    assert_eq!(t.metrics.combined_signal.get(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn loop_sleeps_the_poll_interval_between_cycles() {
    let t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Series(oversold_series())]),
        MockExchange::default(),
    );
    let market = t.market.clone();
    let exchange = t.exchange.clone();
    let mut trader = t.trader;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        trader.run(shutdown_rx).await;
        trader
    });

    tokio::time::sleep(Duration::from_secs(650)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    // cycles at 0s, 300s and 600s
    assert_eq!(market.calls(), 3);
    assert_eq!(exchange.orders().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn panicking_cycle_waits_the_error_cooldown() {
    let t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![
            MarketResponse::Panic,
            MarketResponse::Series(oversold_series()),
        ]),
        MockExchange::default(),
    );
    let market = t.market.clone();
    let exchange = t.exchange.clone();
    let metrics = t.metrics.clone();
    let mut trader = t.trader;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        trader.run(shutdown_rx).await;
        trader
    });

    // panic at 0s, retry after the 60s cooldown rather than the 300s interval
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(market.calls(), 2);
    assert_eq!(metrics.trading_cycle_failures_total.get(), 1);
    assert_eq!(exchange.orders().len(), 1);

    shutdown_tx.send(true).unwrap();
    let trader = handle.await.expect("loop survives the panic");
    assert_eq!(trader.previous_decision(), Some(Signal::Buy));
    assert_eq!(metrics.trading_cycles_total.get(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_cycle_records_the_panic_in_status() {
    let t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Panic]),
        MockExchange::default(),
    );
    let status = t.status.clone();
    let market = t.market.clone();
    let mut trader = t.trader;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        trader.run(shutdown_rx).await;
    });

    tokio::time::sleep(Duration::from_secs(130)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    // 0s, 60s and 120s
    assert_eq!(market.calls(), 3);
    let status = status.read().await;
    let last_error = status.last_error.as_deref().unwrap_or_default();
    assert!(last_error.contains("market data feed crashed"), "{}", last_error);
    assert_eq!(status.cycles, 0);
}

#[tokio::test(start_paused = true)]
async fn unavailable_data_waits_the_full_interval() {
    let t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Empty]),
        MockExchange::default(),
    );
    let market = t.market.clone();
    let mut trader = t.trader;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        trader.run(shutdown_rx).await;
    });

    tokio::time::sleep(Duration::from_secs(350)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(market.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_the_sleep() {
    let t = TestTrader::new(
        settings_with(&[("rsi_static", 1)]),
        MockMarketData::new(vec![MarketResponse::Series(oversold_series())]),
        MockExchange::default(),
    );
    let market = t.market.clone();
    let mut trader = t.trader;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        trader.run(shutdown_rx).await;
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    let started = tokio::time::Instant::now();
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(market.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
}
