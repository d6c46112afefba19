//! Indicator engine: attaches entry-rule indicators to raw intraday bars.
//!
//! EMA, RSI and MACD run continuously over the ticker's whole intraday
//! series; only VWAP restarts each session. Every value at bar t is a
//! function of bars 0..=t.

use crate::domain::{defined, EnrichedBar, IntradayBar};
use crate::indicators::{shift_one, Ema, Indicator, MacdHistogram, Rsi, SessionVwap};
use crate::session::SessionWindow;

pub const EMA_PERIOD: usize = 5;
pub const RSI_PERIOD: usize = 14;

/// Computes the per-bar indicator set for one ticker.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    ema: Ema,
    rsi: Rsi,
    macd: MacdHistogram,
    vwap: SessionVwap,
}

impl IndicatorEngine {
    pub fn new(session: SessionWindow) -> Self {
        Self {
            ema: Ema::new(EMA_PERIOD),
            rsi: Rsi::new(RSI_PERIOD),
            macd: MacdHistogram::standard(),
            vwap: SessionVwap::new(session),
        }
    }

    /// Number of leading bars before every indicator is defined.
    pub fn warmup_bars(&self) -> usize {
        let lookbacks = [
            Indicator::<IntradayBar>::lookback(&self.ema),
            // rsi_prev needs one more bar than rsi
            Indicator::<IntradayBar>::lookback(&self.rsi) + 1,
            Indicator::<IntradayBar>::lookback(&self.macd) + 1,
        ];
        lookbacks.into_iter().max().unwrap_or(0)
    }

    /// Enrich ascending-time bars. Output is index-aligned with the input.
    pub fn enrich(&self, bars: &[IntradayBar]) -> Vec<EnrichedBar> {
        let ema = self.ema.compute(bars);
        let rsi = self.rsi.compute(bars);
        let rsi_prev = shift_one(&rsi);
        let macd = self.macd.compute(bars);
        let macd_prev = shift_one(&macd);
        let vwap = self.vwap.compute(bars);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| EnrichedBar {
                bar: *bar,
                ema5: defined(ema[i]),
                rsi14: defined(rsi[i]),
                rsi14_prev: defined(rsi_prev[i]),
                macd_hist: defined(macd[i]),
                macd_hist_prev: defined(macd_prev[i]),
                vwap: defined(vwap[i]),
            })
            .collect()
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(SessionWindow::default())
    }
}
