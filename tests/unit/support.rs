//! Series builders shared by the unit tests

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use quorum::models::{Candle, PriceSeries};

/// Bars five minutes apart; high/low sit half a unit around the close.
pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    let bars: Vec<(f64, f64, f64)> = closes.iter().map(|&c| (c + 0.5, c - 0.5, c)).collect();
    series_from_bars(&bars)
}

/// `(high, low, close)` triples.
pub fn series_from_bars(bars: &[(f64, f64, f64)]) -> PriceSeries {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let candles = bars
        .iter()
        .enumerate()
        .map(|(i, &(high, low, close))| {
            Candle::new(close, high, low, close, 1_000.0 + i as f64, start + Duration::minutes(5 * i as i64))
        })
        .collect();
    PriceSeries::new(candles).expect("chronological test series")
}

/// Geometric decline: every bar loses one percent.
pub fn declining(len: usize) -> Vec<f64> {
    (0..len).map(|i| 100.0 * 0.99f64.powi(i as i32)).collect()
}

/// Steady rise with a single half-unit dip five bars before the end.
pub fn rising_with_dip(len: usize) -> Vec<f64> {
    let mut closes = Vec::with_capacity(len);
    let mut price = 100.0;
    for i in 0..len {
        if i > 0 {
            price += if i == len - 5 { -0.5 } else { 1.0 };
        }
        closes.push(price);
    }
    closes
}

/// Fast decline that slows to a crawl for the last ten bars.
pub fn decelerating_decline() -> Vec<f64> {
    let mut closes = Vec::new();
    let mut price = 200.0;
    for i in 0..50 {
        if i > 0 {
            price -= if i < 40 { 2.0 } else { 0.1 };
        }
        closes.push(price);
    }
    closes
}

/// Fast rally that slows to a crawl for the last ten bars.
pub fn decelerating_rally() -> Vec<f64> {
    let mut closes = Vec::new();
    let mut price = 100.0;
    for i in 0..50 {
        if i > 0 {
            price += if i < 40 { 2.0 } else { 0.1 };
        }
        closes.push(price);
    }
    closes
}

/// Flat bars with constant close and the given high-low ranges.
pub fn ranges(ranges: &[f64]) -> PriceSeries {
    let bars: Vec<(f64, f64, f64)> = ranges
        .iter()
        .map(|&r| (100.0 + r / 2.0, 100.0 - r / 2.0, 100.0))
        .collect();
    series_from_bars(&bars)
}
