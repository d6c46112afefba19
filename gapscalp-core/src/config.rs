//! Strategy configuration: every knob of the entry and exit rules.
//!
//! All percentages are fractions (`0.005` = 0.5%). Times are exchange-local
//! wall-clock times, serialized as `"HH:MM"`. Missing fields deserialize to
//! the defaults of the morning gap strategy.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::PatternRuleSet;
use crate::session::SessionWindow;

/// Errors raised by `StrategyConfig::validate`. Checked before any simulation work.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("entry window start {start} is after end {end}")]
    EntryWindowInverted { start: NaiveTime, end: NaiveTime },
    #[error("session window start {start} is after end {end}")]
    SessionWindowInverted { start: NaiveTime, end: NaiveTime },
    #[error("gap range min {min} is above max {max}")]
    GapRangeInverted { min: f64, max: f64 },
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("stop_loss_pct_fixed must be negative and above -1, got {0}")]
    InvalidFixedStop(f64),
    #[error("{field} must be in (0, 1), got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("slippage_pct must be in [0, 1), got {0}")]
    InvalidSlippage(f64),
    #[error("atr_multiplier must be positive, got {0}")]
    InvalidAtrMultiplier(f64),
    #[error("atr_period must be >= 1")]
    ZeroAtrPeriod,
    #[error("rsi_floor must be within [0, 100], got {0}")]
    InvalidRsiFloor(f64),
}

/// Entry filter switches. A disabled filter is vacuously satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterToggles {
    /// close > session VWAP
    pub use_vwap: bool,
    /// close > EMA(5)
    pub use_ema: bool,
    /// RSI(14) above the floor and rising
    pub use_rsi: bool,
    /// MACD histogram rising
    pub use_macd: bool,
}

impl FilterToggles {
    pub fn all_enabled() -> Self {
        Self {
            use_vwap: true,
            use_ema: true,
            use_rsi: true,
            use_macd: true,
        }
    }

    pub fn none() -> Self {
        Self {
            use_vwap: false,
            use_ema: false,
            use_rsi: false,
            use_macd: false,
        }
    }
}

impl Default for FilterToggles {
    fn default() -> Self {
        Self::all_enabled()
    }
}

/// Complete parameter set for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// First bar time (inclusive) at which an entry may fire.
    #[serde(with = "hhmm")]
    pub entry_start: NaiveTime,
    /// Last bar time (inclusive) at which an entry may fire.
    #[serde(with = "hhmm")]
    pub entry_end: NaiveTime,
    /// Lowest accepted opening gap (inclusive).
    pub gap_min: f64,
    /// Highest accepted opening gap (inclusive).
    pub gap_max: f64,
    pub filters: FilterToggles,
    /// RSI must be strictly above this level when the RSI filter is on.
    pub rsi_floor: f64,
    /// Profit (from entry) the high watermark must reach to arm the trailing stop.
    pub trailing_start_pct: f64,
    /// Distance of the trailing exit below the high watermark.
    pub trailing_width_pct: f64,
    /// Fixed stop offset from entry; negative (e.g. -0.007).
    pub stop_loss_pct_fixed: f64,
    /// Scale the stop by the prior day's ATR instead of the fixed offset.
    pub use_atr_stop: bool,
    pub atr_multiplier: f64,
    /// Floor on the ATR-derived stop distance.
    pub atr_min_stop_pct: f64,
    pub atr_period: usize,
    /// Applied against us on both fills.
    pub slippage_pct: f64,
    /// Bars at or after this time close any open position.
    #[serde(with = "hhmm")]
    pub force_close_time: NaiveTime,
    /// Bars outside this window are dropped before the day scan.
    pub session: SessionWindow,
    pub pattern_rules: PatternRuleSet,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            entry_start: hm(9, 0),
            entry_end: hm(9, 15),
            gap_min: -0.03,
            gap_max: 0.01,
            filters: FilterToggles::default(),
            rsi_floor: 45.0,
            trailing_start_pct: 0.005,
            trailing_width_pct: 0.002,
            stop_loss_pct_fixed: -0.007,
            use_atr_stop: false,
            atr_multiplier: 1.0,
            atr_min_stop_pct: 0.005,
            atr_period: 14,
            slippage_pct: 0.0003,
            force_close_time: hm(14, 55),
            session: SessionWindow::default(),
            pattern_rules: PatternRuleSet::default(),
        }
    }
}

impl StrategyConfig {
    /// Fail fast on parameter combinations the engine cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("gap_min", self.gap_min),
            ("gap_max", self.gap_max),
            ("rsi_floor", self.rsi_floor),
            ("trailing_start_pct", self.trailing_start_pct),
            ("trailing_width_pct", self.trailing_width_pct),
            ("stop_loss_pct_fixed", self.stop_loss_pct_fixed),
            ("atr_multiplier", self.atr_multiplier),
            ("atr_min_stop_pct", self.atr_min_stop_pct),
            ("slippage_pct", self.slippage_pct),
        ];
        if let Some(&(field, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite { field, value });
        }

        if self.entry_start > self.entry_end {
            return Err(ConfigError::EntryWindowInverted {
                start: self.entry_start,
                end: self.entry_end,
            });
        }
        if self.session.start > self.session.end {
            return Err(ConfigError::SessionWindowInverted {
                start: self.session.start,
                end: self.session.end,
            });
        }
        if self.gap_min > self.gap_max {
            return Err(ConfigError::GapRangeInverted {
                min: self.gap_min,
                max: self.gap_max,
            });
        }
        if !(-1.0 < self.stop_loss_pct_fixed && self.stop_loss_pct_fixed < 0.0) {
            return Err(ConfigError::InvalidFixedStop(self.stop_loss_pct_fixed));
        }
        for (field, value) in [
            ("trailing_start_pct", self.trailing_start_pct),
            ("trailing_width_pct", self.trailing_width_pct),
        ] {
            if !(0.0 < value && value < 1.0) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        if !(0.0..1.0).contains(&self.slippage_pct) {
            return Err(ConfigError::InvalidSlippage(self.slippage_pct));
        }
        if !(0.0..=100.0).contains(&self.rsi_floor) {
            return Err(ConfigError::InvalidRsiFloor(self.rsi_floor));
        }
        if self.use_atr_stop {
            if self.atr_multiplier <= 0.0 {
                return Err(ConfigError::InvalidAtrMultiplier(self.atr_multiplier));
            }
            if !(0.0 < self.atr_min_stop_pct && self.atr_min_stop_pct < 1.0) {
                return Err(ConfigError::OutOfUnitRange {
                    field: "atr_min_stop_pct",
                    value: self.atr_min_stop_pct,
                });
            }
        }
        if self.atr_period == 0 {
            return Err(ConfigError::ZeroAtrPeriod);
        }
        Ok(())
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// `"HH:MM"` (or `"HH:MM:SS"`) serde format for wall-clock times.
pub mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(s: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
    }

    /// `HH:MM`, or `HH:MM:SS` when the seconds are non-zero.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        let fmt = if time.second() == 0 { "%H:%M" } else { "%H:%M:%S" };
        serializer.serialize_str(&time.format(fmt).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(|e| serde::de::Error::custom(format!("invalid time '{s}': {e}")))
    }
}
