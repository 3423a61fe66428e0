//! Prometheus metrics for the trading loop and the status server.

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,

    pub trading_cycles_total: IntCounter,
    pub trading_cycle_failures_total: IntCounter,
    pub market_data_unavailable_total: IntCounter,
    pub orders_dispatched_total: IntCounterVec,
    pub order_failures_total: IntCounter,
    pub signal_votes_skipped_total: IntCounter,
    pub trading_cycle_duration_seconds: Histogram,
    /// 1 buy, 0 hold, -1 sell
    pub combined_signal: Gauge,
    pub model_trained: Gauge,

    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let trading_cycles_total =
            IntCounter::new("trading_cycles_total", "Completed trading cycles")?;
        let trading_cycle_failures_total = IntCounter::new(
            "trading_cycle_failures_total",
            "Trading cycles that ended in an unexpected error",
        )?;
        let market_data_unavailable_total = IntCounter::new(
            "market_data_unavailable_total",
            "Cycles skipped because market data was empty or unavailable",
        )?;
        let orders_dispatched_total = IntCounterVec::new(
            Opts::new("orders_dispatched_total", "Orders accepted by the exchange"),
            &["side", "reason"],
        )?;
        let order_failures_total =
            IntCounter::new("order_failures_total", "Orders rejected or not delivered")?;
        let signal_votes_skipped_total = IntCounter::new(
            "signal_votes_skipped_total",
            "Strategy votes skipped for lack of history",
        )?;
        let trading_cycle_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "trading_cycle_duration_seconds",
                "Wall time of one trading cycle",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        let combined_signal = Gauge::new(
            "combined_signal",
            "Last combined decision (1 buy, 0 hold, -1 sell)",
        )?;
        let model_trained = Gauge::new("model_trained", "1 once the learned signal is trained")?;

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;

        registry.register(Box::new(trading_cycles_total.clone()))?;
        registry.register(Box::new(trading_cycle_failures_total.clone()))?;
        registry.register(Box::new(market_data_unavailable_total.clone()))?;
        registry.register(Box::new(orders_dispatched_total.clone()))?;
        registry.register(Box::new(order_failures_total.clone()))?;
        registry.register(Box::new(signal_votes_skipped_total.clone()))?;
        registry.register(Box::new(trading_cycle_duration_seconds.clone()))?;
        registry.register(Box::new(combined_signal.clone()))?;
        registry.register(Box::new(model_trained.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        Ok(Self {
            registry,
            trading_cycles_total,
            trading_cycle_failures_total,
            market_data_unavailable_total,
            orders_dispatched_total,
            order_failures_total,
            signal_votes_skipped_total,
            trading_cycle_duration_seconds,
            combined_signal,
            model_trained,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
