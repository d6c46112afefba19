//! Exponential moving average of closes, seeded with the first close.
//! Undefined for the first `period - 1` bars.

use super::smooth::ema_of_series;
use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl<B: PriceBar> Indicator<B> for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[B]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(PriceBar::close).collect();
        ema_of_series(&closes, self.period)
    }
}
