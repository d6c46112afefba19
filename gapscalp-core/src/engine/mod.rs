//! Simulation engine: position state machine and day/ticker scans.

pub mod loop_runner;
pub mod state_machine;

pub use loop_runner::{simulate_day, simulate_ticker, DayOutcome, TickerRun};
pub use state_machine::{advance, close_trade, open_position, ExitFill, Step};
