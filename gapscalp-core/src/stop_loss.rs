//! Stop-loss placement: fixed percentage or volatility-scaled by prior-day ATR.
//!
//! Fixed: stop = entry * (1 + stop_loss_pct_fixed), with a negative pct.
//! ATR:   applied = max(atr_min_stop_pct, prior_atr / entry * atr_multiplier)
//!        stop    = entry * (1 - applied)
//!
//! When ATR mode is on but the prior ATR is missing (or entry is not
//! positive) the fixed magnitude is used and the placement is tagged
//! `AtrFallback`, so the change in risk profile stays visible downstream.

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;

/// Where the applied stop distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopSource {
    Fixed,
    Atr,
    /// ATR mode requested but no usable ATR; fixed distance applied instead.
    AtrFallback,
}

/// Result of placing the initial stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopPlacement {
    pub stop_price: f64,
    /// Distance below entry actually used, as a positive fraction.
    pub applied_stop_pct: f64,
    pub source: StopSource,
}

/// Stop-loss policy parameters, lifted out of `StrategyConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLossPolicy {
    pub stop_loss_pct_fixed: f64,
    pub use_atr_stop: bool,
    pub atr_multiplier: f64,
    pub atr_min_stop_pct: f64,
}

impl StopLossPolicy {
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            stop_loss_pct_fixed: config.stop_loss_pct_fixed,
            use_atr_stop: config.use_atr_stop,
            atr_multiplier: config.atr_multiplier,
            atr_min_stop_pct: config.atr_min_stop_pct,
        }
    }

    /// Place the initial stop for a fill at `entry_price`.
    pub fn place(&self, entry_price: f64, prior_atr: Option<f64>) -> StopPlacement {
        if !self.use_atr_stop {
            return self.fixed(entry_price, StopSource::Fixed);
        }

        match prior_atr.filter(|a| a.is_finite() && *a >= 0.0) {
            Some(atr) if entry_price > 0.0 => {
                let applied = self
                    .atr_min_stop_pct
                    .max(atr / entry_price * self.atr_multiplier);
                StopPlacement {
                    stop_price: entry_price * (1.0 - applied),
                    applied_stop_pct: applied,
                    source: StopSource::Atr,
                }
            }
            _ => self.fixed(entry_price, StopSource::AtrFallback),
        }
    }

    fn fixed(&self, entry_price: f64, source: StopSource) -> StopPlacement {
        StopPlacement {
            stop_price: entry_price * (1.0 + self.stop_loss_pct_fixed),
            applied_stop_pct: self.stop_loss_pct_fixed.abs(),
            source,
        }
    }
}
