//! Wilder RSI over closes.
//!
//! Gains and losses are Wilder-smoothed separately, each seeded with the
//! first bar's change, which counts as zero. First defined value is at index
//! `period - 1`.

use super::smooth::wilder_ewm;
use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl<B: PriceBar> Indicator<B> for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[B]) -> Vec<f64> {
        // split each change into its gain and loss side; NaN stays NaN
        let (gains, losses): (Vec<f64>, Vec<f64>) = std::iter::once((0.0, 0.0))
            .chain(bars.windows(2).map(|w| {
                let change = w[1].close() - w[0].close();
                if change.is_nan() {
                    (f64::NAN, f64::NAN)
                } else {
                    (change.max(0.0), (-change).max(0.0))
                }
            }))
            .take(bars.len())
            .unzip();

        let avg_gain = wilder_ewm(&gains, self.period);
        let avg_loss = wilder_ewm(&losses, self.period);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| rsi_from_averages(g, l))
            .collect()
    }
}

/// 100 whenever the average loss is zero.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        return f64::NAN;
    }
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 * avg_gain / (avg_gain + avg_loss)
    }
}
