//! Exponential smoothing shared by EMA, MACD, RSI and ATR.
//!
//! EMA, MACD and RSI use a recursive mean seeded with the first observation
//! and hidden until `min_periods` observations have been seen. EMA uses
//! `alpha = 2 / (period + 1)`, Wilder smoothing uses `1 / period`. ATR seeds
//! Wilder smoothing with the plain mean of the first `period` true ranges.

/// Smoothing factor of a standard EMA.
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Smoothing factor of Wilder's moving average.
pub fn wilder_alpha(period: usize) -> f64 {
    1.0 / period as f64
}

/// Recursive exponential mean `m[t] = m[t-1] + alpha * (x[t] - m[t-1])`,
/// seeded with the first non-NaN value.
///
/// Leading NaNs are skipped. Output is NaN until `min_periods` values have
/// been consumed, so the first defined index is `first + min_periods - 1`.
/// A NaN after the start ends the series there.
pub fn ewm(values: &[f64], alpha: f64, min_periods: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let Some(first) = values.iter().position(|v| !v.is_nan()) else {
        return out;
    };

    let mut mean = values[first];
    for (seen, (slot, &v)) in out[first..].iter_mut().zip(&values[first..]).enumerate() {
        if v.is_nan() {
            break;
        }
        if seen > 0 {
            mean += alpha * (v - mean);
        }
        if seen + 1 >= min_periods {
            *slot = mean;
        }
    }
    out
}

/// EMA of a raw series, defined from `period - 1` observations in.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    ewm(values, ema_alpha(period), period)
}

/// Wilder smoothing seeded with the first observation (RSI averages).
pub fn wilder_ewm(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    ewm(values, wilder_alpha(period), period)
}

/// Wilder smoothing seeded with the mean of the first `period` values,
/// which lands on index `period - 1` (ATR). Any NaN in that window leaves
/// the output undefined.
pub fn wilder_mean_seeded(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let mut out = vec![f64::NAN; values.len()];
    let Some(window) = values.get(..period) else {
        return out;
    };
    if window.iter().any(|v| v.is_nan()) {
        return out;
    }

    let alpha = wilder_alpha(period);
    let mut prev = window.iter().sum::<f64>() / period as f64;
    out[period - 1] = prev;
    for (slot, &v) in out[period..].iter_mut().zip(&values[period..]) {
        if v.is_nan() {
            break;
        }
        prev += alpha * (v - prev);
        *slot = prev;
    }
    out
}
