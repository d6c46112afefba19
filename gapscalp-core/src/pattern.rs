//! Entry pattern classification.
//!
//! Labels a realized entry by how the session opened and where price sat
//! relative to VWAP, EMA and RSI at the entry bar. Threshold sets are named,
//! versioned rule sets; a published version never changes its thresholds or
//! check order. New behaviour gets a new version.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Descriptive category of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternLabel {
    /// Gapped down, reclaimed VWAP.
    Reversal,
    /// Gapped up and kept trending above VWAP/EMA.
    Continuation,
    /// Gapped up and stretched well above VWAP.
    Breakout,
    /// Entered at or below VWAP, or on weak momentum.
    Pullback,
    Other,
}

impl PatternLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternLabel::Reversal => "reversal",
            PatternLabel::Continuation => "continuation",
            PatternLabel::Breakout => "breakout",
            PatternLabel::Pullback => "pullback",
            PatternLabel::Other => "other",
        }
    }
}

impl fmt::Display for PatternLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a classifier may look at. Indicators can be undefined when their
/// entry filter was disabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternInput {
    pub close: f64,
    pub vwap: Option<f64>,
    pub ema5: Option<f64>,
    pub rsi14: Option<f64>,
    pub gap_pct: f64,
}

impl PatternInput {
    /// (close - vwap) / vwap.
    pub fn vwap_offset(&self) -> Option<f64> {
        self.vwap.filter(|v| *v > 0.0).map(|v| (self.close - v) / v)
    }

    fn above_vwap(&self) -> bool {
        self.vwap.is_some_and(|v| self.close > v)
    }

    fn at_or_below_vwap(&self) -> bool {
        self.vwap.is_some_and(|v| self.close <= v)
    }
}

/// A swappable classification policy.
pub trait PatternClassifier: Send + Sync {
    fn name(&self) -> &'static str;
    fn version(&self) -> u32;
    fn classify(&self, input: &PatternInput) -> PatternLabel;
}

/// Gap first, then VWAP offset, then RSI.
#[derive(Debug, Clone, Copy)]
pub struct GapVwapV1 {
    /// Gap at or below this (a negative number) counts as a gap down.
    pub reversal_gap_max: f64,
    pub breakout_gap_min: f64,
    pub breakout_vwap_offset_min: f64,
    pub pullback_rsi_max: f64,
}

impl GapVwapV1 {
    pub const RULES: GapVwapV1 = GapVwapV1 {
        reversal_gap_max: -0.003,
        breakout_gap_min: 0.005,
        breakout_vwap_offset_min: 0.003,
        pullback_rsi_max: 50.0,
    };
}

impl PatternClassifier for GapVwapV1 {
    fn name(&self) -> &'static str {
        "gap_vwap"
    }

    fn version(&self) -> u32 {
        1
    }

    fn classify(&self, input: &PatternInput) -> PatternLabel {
        if input.gap_pct <= self.reversal_gap_max && input.above_vwap() {
            return PatternLabel::Reversal;
        }
        if input.gap_pct >= self.breakout_gap_min
            && input
                .vwap_offset()
                .is_some_and(|o| o >= self.breakout_vwap_offset_min)
        {
            return PatternLabel::Breakout;
        }
        if input.gap_pct > 0.0
            && input.above_vwap()
            && input.ema5.map_or(true, |e| input.close > e)
        {
            return PatternLabel::Continuation;
        }
        if input.at_or_below_vwap() || input.rsi14.is_some_and(|r| r < self.pullback_rsi_max) {
            return PatternLabel::Pullback;
        }
        PatternLabel::Other
    }
}

/// Momentum first: an overbought RSI labels a breakout regardless of gap.
#[derive(Debug, Clone, Copy)]
pub struct RsiMomentumV2 {
    pub breakout_rsi_min: f64,
    pub pullback_rsi_max: f64,
}

impl RsiMomentumV2 {
    pub const RULES: RsiMomentumV2 = RsiMomentumV2 {
        breakout_rsi_min: 70.0,
        pullback_rsi_max: 50.0,
    };
}

impl PatternClassifier for RsiMomentumV2 {
    fn name(&self) -> &'static str {
        "rsi_momentum"
    }

    fn version(&self) -> u32 {
        2
    }

    fn classify(&self, input: &PatternInput) -> PatternLabel {
        if input.rsi14.is_some_and(|r| r >= self.breakout_rsi_min) {
            return PatternLabel::Breakout;
        }
        if input.gap_pct < 0.0 && input.above_vwap() {
            return PatternLabel::Reversal;
        }
        if input.rsi14.is_some_and(|r| r < self.pullback_rsi_max) || input.at_or_below_vwap() {
            return PatternLabel::Pullback;
        }
        if input.gap_pct > 0.0 {
            return PatternLabel::Continuation;
        }
        PatternLabel::Other
    }
}

/// Configuration selector for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternRuleSet {
    #[default]
    GapVwapV1,
    RsiMomentumV2,
}

impl PatternRuleSet {
    pub fn classifier(&self) -> &'static dyn PatternClassifier {
        match self {
            PatternRuleSet::GapVwapV1 => &GapVwapV1::RULES,
            PatternRuleSet::RsiMomentumV2 => &RsiMomentumV2::RULES,
        }
    }

    pub fn classify(&self, input: &PatternInput) -> PatternLabel {
        self.classifier().classify(input)
    }
}
