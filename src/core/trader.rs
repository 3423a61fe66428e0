//! Trading loop: fetch, vote, reduce, dispatch on change, sleep.

use crate::config::Config;
use crate::indicators::IndicatorError;
use crate::metrics::Metrics;
use crate::ml::{LearnedSignal, ModelConfig, ModelReport};
use crate::models::{PriceSeries, Signal};
use crate::services::{
    has_sufficient_balance, BalanceProvider, MarketDataProvider, OrderDispatcher, OrderRequest,
    OrderSide,
};
use crate::signals::{
    EngineError, RuleVote, RuleVotes, SignalEngine, SignalPool, SkippedRule, Tally, Vote, LEARNED_SIGNAL_NAME,
};
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum TradingError {
    /// Empty or failed market fetch; the cycle is skipped.
    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("model training task failed: {0}")]
    Training(#[from] tokio::task::JoinError),

    #[error("trading cycle panicked: {0}")]
    Panicked(String),
}

/// Collaborators and observers of a trader.
pub struct TraderContext {
    pub market_data: Arc<dyn MarketDataProvider + Send + Sync>,
    pub orders: Arc<dyn OrderDispatcher + Send + Sync>,
    pub balances: Arc<dyn BalanceProvider + Send + Sync>,
    pub metrics: Option<Arc<Metrics>>,
    pub status: Option<SharedStatus>,
}

#[derive(Debug, Clone)]
pub struct TraderSettings {
    pub symbol: String,
    pub funding_asset: String,
    /// Notional of the accumulate buy, in the funding asset
    pub purchase_amount: f64,
    /// Base-asset quantity of signal orders
    pub order_quantity: f64,
    pub candle_limit: usize,
    pub poll_interval: Duration,
    pub error_cooldown: Duration,
    pub signal_weights: Vec<(String, u32)>,
    pub model: ModelConfig,
}

impl Default for TraderSettings {
    fn default() -> Self {
        Self {
            symbol: "BTCTRY".to_string(),
            funding_asset: "TRY".to_string(),
            purchase_amount: 100.0,
            order_quantity: 0.000047,
            candle_limit: 250,
            poll_interval: Duration::from_secs(300),
            error_cooldown: Duration::from_secs(60),
            signal_weights: vec![
                ("bollinger".to_string(), 1),
                ("macd".to_string(), 1),
                ("rsi".to_string(), 1),
                ("stochastic".to_string(), 1),
                ("atr".to_string(), 1),
                (LEARNED_SIGNAL_NAME.to_string(), 2),
            ],
            model: ModelConfig::default(),
        }
    }
}

impl From<&Config> for TraderSettings {
    fn from(config: &Config) -> Self {
        Self {
            symbol: config.symbol.clone(),
            funding_asset: config.funding_asset.clone(),
            purchase_amount: config.purchase_amount,
            order_quantity: config.order_quantity,
            candle_limit: config.candle_limit,
            poll_interval: config.poll_interval,
            error_cooldown: config.error_cooldown,
            signal_weights: config.signal_weights.clone(),
            model: config.model,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteSnapshot {
    pub name: String,
    pub decision: Signal,
    pub weight: u32,
}

/// Snapshot published after every cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraderStatus {
    pub symbol: String,
    pub last_decision: Option<Signal>,
    pub tally: Tally,
    pub votes: Vec<VoteSnapshot>,
    pub skipped: Vec<String>,
    pub model_trained: bool,
    pub model: Option<ModelReport>,
    pub cycles: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

pub type SharedStatus = Arc<RwLock<TraderStatus>>;

/// Outcome of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub decision: Signal,
    pub votes: Vec<(String, Vote)>,
    pub skipped: Vec<String>,
    /// Side of the signal order the exchange accepted, if any
    pub dispatched: Option<OrderSide>,
    pub accumulated: bool,
    pub model_trained: bool,
}

pub struct Trader {
    settings: TraderSettings,
    ctx: TraderContext,
    engine: SignalEngine,
    learned_weight: Option<u32>,
    pool: SignalPool,
    model: Option<LearnedSignal>,
    previous: Option<Signal>,
    cycles: u64,
}

impl Trader {
    pub fn new(settings: TraderSettings, ctx: TraderContext) -> Result<Self, TradingError> {
        let engine = SignalEngine::from_weights(&settings.signal_weights)?;
        let learned_weight = settings
            .signal_weights
            .iter()
            .find(|(name, _)| name == LEARNED_SIGNAL_NAME)
            .map(|(_, weight)| *weight);

        Ok(Self {
            settings,
            ctx,
            engine,
            learned_weight,
            pool: SignalPool::new(),
            model: None,
            previous: None,
            cycles: 0,
        })
    }

    pub fn previous_decision(&self) -> Option<Signal> {
        self.previous
    }

    pub fn model(&self) -> Option<&LearnedSignal> {
        self.model.as_ref()
    }

    pub fn settings(&self) -> &TraderSettings {
        &self.settings
    }

    /// Run cycles until `shutdown` flips to true or its sender is dropped.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            symbol = %self.settings.symbol,
            rules = ?self.engine.rule_names(),
            learned_weight = ?self.learned_weight,
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            "Trader: starting loop for {}",
            self.settings.symbol
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = AssertUnwindSafe(self.run_cycle()).catch_unwind().await;
            let pause = match outcome {
                Ok(Ok(_)) => self.settings.poll_interval,
                Ok(Err(TradingError::DataUnavailable { .. })) => self.settings.poll_interval,
                Ok(Err(e)) => self.cycle_failed(&e).await,
                Err(payload) => {
                    self.pool.reset();
                    let e = TradingError::Panicked(panic_message(payload.as_ref()));
                    self.cycle_failed(&e).await
                }
            };

            if wait_or_shutdown(pause, &mut shutdown).await {
                break;
            }
        }

        info!(symbol = %self.settings.symbol, "Trader: shutdown requested, loop stopped");
    }

    /// One pass of the loop without the trailing sleep.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, TradingError> {
        let started = Instant::now();

        let accumulated = self.accumulate().await;

        let series = match self.fetch_series().await {
            Ok(series) => series,
            Err(e) => {
                if let Some(metrics) = &self.ctx.metrics {
                    metrics.market_data_unavailable_total.inc();
                }
                warn!(symbol = %self.settings.symbol, error = %e, "Trader: no data to analyze, skipping cycle");
                self.publish_error(&e).await;
                return Err(e);
            }
        };

        if self.model.is_none() {
            self.train(&series).await?;
        }

        let rule_votes = self.collect_votes(&series);
        if let Some(metrics) = &self.ctx.metrics {
            metrics.signal_votes_skipped_total.inc_by(rule_votes.skipped.len() as u64);
        }
        rule_votes.apply(&mut self.pool);

        let tally = self.pool.tally();
        let decision = tally.decision();
        info!(
            symbol = %self.settings.symbol,
            signal = %decision,
            buy_weight = tally.buy_weight,
            sell_weight = tally.sell_weight,
            previous = ?self.previous,
            "Trader: combined signal {}",
            decision
        );

        let mut dispatched = None;
        if self.previous != Some(decision) {
            if let Some(side) = OrderSide::from_signal(decision) {
                let request =
                    OrderRequest::market(self.settings.symbol.clone(), side, self.settings.order_quantity);
                if self.dispatch(&request, "signal").await {
                    dispatched = Some(side);
                }
            }
            self.previous = Some(decision);
        }

        let votes = self.pool.votes();
        self.pool.reset();
        self.cycles += 1;

        let report = CycleReport {
            decision,
            votes,
            skipped: rule_votes.skipped.iter().map(|s| s.name.clone()).collect(),
            dispatched,
            accumulated,
            model_trained: self.model.is_some(),
        };

        if let Some(metrics) = &self.ctx.metrics {
            metrics.trading_cycles_total.inc();
            metrics.combined_signal.set(decision.as_score());
            metrics
                .trading_cycle_duration_seconds
                .observe(started.elapsed().as_secs_f64());
        }
        self.publish(&report, tally).await;

        Ok(report)
    }

    /// Buy `purchase_amount` worth whenever the funding asset allows it.
    async fn accumulate(&self) -> bool {
        let balances = match self.ctx.balances.get_balances().await {
            Ok(balances) => balances,
            Err(e) => {
                warn!(asset = %self.settings.funding_asset, error = %e, "Trader: failed to fetch balances");
                return false;
            }
        };

        if !has_sufficient_balance(&self.settings.funding_asset, self.settings.purchase_amount, &balances) {
            info!(
                asset = %self.settings.funding_asset,
                required = self.settings.purchase_amount,
                "Trader: not enough {} balance to accumulate",
                self.settings.funding_asset
            );
            return false;
        }

        info!(
            symbol = %self.settings.symbol,
            amount = self.settings.purchase_amount,
            "Trader: accumulating {} {}",
            self.settings.purchase_amount,
            self.settings.funding_asset
        );
        let request = OrderRequest::market(
            self.settings.symbol.clone(),
            OrderSide::Buy,
            self.settings.purchase_amount,
        );
        self.dispatch(&request, "accumulate").await
    }

    async fn fetch_series(&self) -> Result<PriceSeries, TradingError> {
        let series = self
            .ctx
            .market_data
            .get_series(&self.settings.symbol, self.settings.candle_limit)
            .await
            .map_err(|e| TradingError::DataUnavailable {
                symbol: self.settings.symbol.clone(),
                reason: e.to_string(),
            })?;

        if series.is_empty() {
            return Err(TradingError::DataUnavailable {
                symbol: self.settings.symbol.clone(),
                reason: "no candles returned".to_string(),
            });
        }
        debug!(symbol = %self.settings.symbol, bars = series.len(), "Trader: fetched {} bars", series.len());
        Ok(series)
    }

    /// Train the learned signal once. Too little history leaves it absent
    /// and a later cycle tries again.
    async fn train(&mut self, series: &PriceSeries) -> Result<(), TradingError> {
        if self.learned_weight.is_none() {
            return Ok(());
        }

        let owned = series.clone();
        let config = self.settings.model;
        let trained = tokio::task::spawn_blocking(move || LearnedSignal::train(&owned, &config)).await?;

        match trained {
            Ok(model) => {
                info!(
                    symbol = %self.settings.symbol,
                    model = config.kind.as_str(),
                    "Trader: model trained successfully"
                );
                if let Some(metrics) = &self.ctx.metrics {
                    metrics.model_trained.set(1.0);
                }
                self.model = Some(model);
            }
            Err(e) => {
                warn!(
                    symbol = %self.settings.symbol,
                    error = %e,
                    "Trader: model training deferred to a later cycle"
                );
            }
        }
        Ok(())
    }

    fn collect_votes(&self, series: &PriceSeries) -> RuleVotes {
        let mut rule_votes = self.engine.collect_votes(series);

        if let Some(weight) = self.learned_weight {
            let prediction = match &self.model {
                Some(model) => model.predict(series),
                None => Err(IndicatorError::InsufficientData {
                    required: self.settings.model.min_bars(),
                    available: series.len(),
                }),
            };
            match prediction {
                Ok(decision) => {
                    debug!(rule = LEARNED_SIGNAL_NAME, decision = %decision, weight, "Trader: learned signal voted {}", decision);
                    rule_votes.votes.push(RuleVote {
                        name: LEARNED_SIGNAL_NAME.to_string(),
                        decision,
                        weight,
                    });
                }
                Err(reason) => {
                    debug!(rule = LEARNED_SIGNAL_NAME, error = %reason, "Trader: learned signal skipped");
                    rule_votes.skipped.push(SkippedRule {
                        name: LEARNED_SIGNAL_NAME.to_string(),
                        reason,
                    });
                }
            }
        }

        rule_votes
    }

    /// Place one order; failures are logged and counted, never raised.
    async fn dispatch(&self, request: &OrderRequest, reason: &str) -> bool {
        match self.ctx.orders.place_order(request).await {
            Ok(receipt) => {
                info!(
                    symbol = %request.symbol,
                    side = %request.side,
                    quantity = request.quantity,
                    reason = reason,
                    order_id = ?receipt.order_id,
                    "Trader: {} order placed ({})",
                    request.side,
                    reason
                );
                if let Some(metrics) = &self.ctx.metrics {
                    metrics
                        .orders_dispatched_total
                        .with_label_values(&[request.side.as_str(), reason])
                        .inc();
                }
                true
            }
            Err(e) => {
                warn!(
                    symbol = %request.symbol,
                    side = %request.side,
                    reason = reason,
                    error = %e,
                    "Trader: error placing {} order",
                    request.side
                );
                if let Some(metrics) = &self.ctx.metrics {
                    metrics.order_failures_total.inc();
                }
                false
            }
        }
    }

    async fn publish(&self, report: &CycleReport, tally: Tally) {
        let Some(status) = &self.ctx.status else {
            return;
        };
        let mut status = status.write().await;
        status.symbol = self.settings.symbol.clone();
        status.last_decision = Some(report.decision);
        status.tally = tally;
        status.votes = report
            .votes
            .iter()
            .map(|(name, vote)| VoteSnapshot {
                name: name.clone(),
                decision: vote.decision,
                weight: vote.weight,
            })
            .collect();
        status.skipped = report.skipped.clone();
        status.model_trained = self.model.is_some();
        status.model = self.model.as_ref().map(|m| *m.report());
        status.cycles = self.cycles;
        status.last_cycle_at = Some(Utc::now());
        status.last_error = None;
    }

    /// Log and count an unexpected failure; returns the cooldown to wait.
    async fn cycle_failed(&self, e: &TradingError) -> Duration {
        error!(symbol = %self.settings.symbol, error = %e, "Trader: cycle failed");
        if let Some(metrics) = &self.ctx.metrics {
            metrics.trading_cycle_failures_total.inc();
        }
        self.publish_error(e).await;
        self.settings.error_cooldown
    }

    async fn publish_error(&self, e: &TradingError) {
        if let Some(status) = &self.ctx.status {
            let mut status = status.write().await;
            status.symbol = self.settings.symbol.clone();
            status.last_error = Some(e.to_string());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Sleep for `duration`. Returns true if shutdown was requested first.
async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
        }
    }
}
