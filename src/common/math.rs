//! Rolling-window and exponential statistics over price columns.
//!
//! Every function returns one output per input bar. `None` marks bars where the
//! window is not yet full or where an input inside the window is undefined, so
//! indicators can be chained without sentinel values.

/// Apply `f` to every full window of defined values.
pub fn rolling<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    let mut buf = Vec::with_capacity(window);
    for end in (window - 1)..values.len() {
        buf.clear();
        buf.extend(values[end + 1 - window..=end].iter().flatten());
        if buf.len() == window {
            out[end] = f(&buf);
        }
    }
    out
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Rolling mean over a plain column.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(&lift(values), window, mean)
}

/// Rolling mean over a column that may contain undefined bars.
pub fn rolling_mean_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

/// Rolling sample standard deviation.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(&lift(values), window, sample_std)
}

pub fn rolling_std_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, sample_std)
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(&lift(values), window, |w| w.iter().copied().reduce(f64::max))
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(&lift(values), window, |w| w.iter().copied().reduce(f64::min))
}

/// Mean of every defined value seen so far.
pub fn expanding_mean(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut sum = 0.0;
    let mut count = 0usize;
    values
        .iter()
        .map(|v| {
            let v = (*v)?;
            sum += v;
            count += 1;
            Some(sum / count as f64)
        })
        .collect()
}

/// Adjusted exponentially weighted mean with `alpha = 2 / (span + 1)`.
///
/// Leading undefined values are skipped; the output becomes defined once
/// `min_periods` observations have been seen.
pub fn ewm_mean(values: &[Option<f64>], span: usize, min_periods: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if span == 0 {
        return out;
    }
    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut num = 0.0;
    let mut den = 0.0;
    let mut seen = 0usize;
    for (i, value) in values.iter().enumerate() {
        if seen == 0 && value.is_none() {
            continue;
        }
        num *= decay;
        den *= decay;
        if let Some(v) = value {
            num += v;
            den += 1.0;
            seen += 1;
        }
        if seen >= min_periods.max(1) && den > 0.0 {
            out[i] = Some(num / den);
        }
    }
    out
}

/// Bar-over-bar differences; the first bar has none.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        out.push(if i == 0 {
            None
        } else {
            Some(values[i] - values[i - 1])
        });
    }
    out
}

/// Fractional change from the previous bar. Undefined after a zero close.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 || values[i - 1] == 0.0 {
            out.push(None);
        } else {
            out.push(Some(values[i] / values[i - 1] - 1.0));
        }
    }
    out
}

/// True range of a bar given the previous close.
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

pub fn lift(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

/// Last two entries of a derived column, most recent first.
pub fn last_two(values: &[Option<f64>]) -> (Option<f64>, Option<f64>) {
    let n = values.len();
    let last = values.last().copied().flatten();
    let prev = if n >= 2 { values[n - 2] } else { None };
    (last, prev)
}
