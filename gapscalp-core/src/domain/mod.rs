//! Domain types for GapScalp

pub mod bar;
pub mod day;
pub mod position;
pub mod trade;

pub use bar::{defined, DailyBar, EnrichedBar, IntradayBar, PriceBar};
pub use day::TradingDay;
pub use position::{OpenPosition, PositionState};
pub use trade::{ExitReason, Trade};
