//! MACD histogram.
//!
//! MACD line = EMA(fast) - EMA(slow); signal = EMA(signal) of the MACD line;
//! histogram = MACD line - signal.
//! Lookback: slow - 1 + signal - 1 (33 bars for 12/26/9).

use super::smooth::ema_of_series;
use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct MacdHistogram {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl MacdHistogram {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be below slow period");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_hist_{fast}_{slow}_{signal}"),
        }
    }

    /// The conventional 12/26/9 parameterisation.
    pub fn standard() -> Self {
        Self::new(12, 26, 9)
    }
}

impl<B: PriceBar> Indicator<B> for MacdHistogram {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        (self.slow - 1) + (self.signal - 1)
    }

    fn compute(&self, bars: &[B]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);

        // NaN - x stays NaN, so the line inherits the slow EMA's warmup.
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&line, self.signal);

        line.iter().zip(&signal).map(|(l, s)| l - s).collect()
    }
}
