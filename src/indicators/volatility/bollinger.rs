//! Bollinger Bands indicator

use crate::common::math;
use crate::indicators::error::{ensure_history, IndicatorError};
use crate::indicators::registry::{IndicatorCategory, SignalRule};
use crate::indicators::trend::calculate_sma;
use crate::models::{BollingerSeries, PriceSeries, Signal};

/// Calculate Bollinger Bands
///
/// Middle Band = SMA(period)
/// Upper Band = Middle + (num_std * sample standard deviation)
/// Lower Band = Middle - (num_std * sample standard deviation)
pub fn calculate_bollinger_bands(series: &PriceSeries, period: usize, num_std: f64) -> BollingerSeries {
    let closes = series.closes();
    let middle = math::rolling_mean(&closes, period);
    let std_dev = math::rolling_std(&closes, period);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(std_dev.iter())
            .map(|(m, s)| Some((*m)? + sign * num_std * (*s)?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    BollingerSeries {
        middle,
        upper,
        lower,
        std_dev,
    }
}

/// Band breakouts confirmed by the longer trend average.
pub fn bollinger_decision(close: f64, upper: Option<f64>, lower: Option<f64>, trend: Option<f64>) -> Signal {
    let (Some(upper), Some(lower), Some(trend)) = (upper, lower, trend) else {
        return Signal::Hold;
    };
    if close > upper && close > trend {
        Signal::Sell
    } else if close < lower && close < trend {
        Signal::Buy
    } else {
        Signal::Hold
    }
}

#[derive(Debug, Clone)]
pub struct BollingerRule {
    pub period: usize,
    pub num_std: f64,
    pub trend_period: usize,
}

impl Default for BollingerRule {
    fn default() -> Self {
        Self {
            period: 20,
            num_std: 2.0,
            trend_period: 50,
        }
    }
}

impl SignalRule for BollingerRule {
    fn name(&self) -> &'static str {
        "bollinger"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volatility
    }

    fn min_bars(&self) -> usize {
        self.period.max(self.trend_period) + 1
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        ensure_history(series.len(), self.min_bars())?;
        let bands = calculate_bollinger_bands(series, self.period, self.num_std);
        let trend = calculate_sma(series, self.trend_period);

        let last = series.len() - 1;
        let close = series.candles()[last].close;
        Ok(bollinger_decision(
            close,
            bands.upper[last],
            bands.lower[last],
            trend[last],
        ))
    }
}
