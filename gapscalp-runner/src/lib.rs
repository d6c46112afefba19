//! GapScalp Runner: batch orchestration over the core engine.
//!
//! This crate builds on `gapscalp-core` to provide:
//! - TOML run configuration with fail-fast validation and a strategy fingerprint
//! - CSV bar loading with synthetic fallback
//! - Parallel per-ticker simulation on a bounded Rayon pool, merged in ticker order
//! - Trade and skip ledger export (CSV/JSON)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, RunConfig};
pub use data_loader::{
    generate_synthetic_bars, load_ticker, DataSource, LoadError, LoadedTicker, SyntheticSpec,
};
pub use export::{export_trades_csv, save_artifacts, ExportError};
pub use runner::{run_batch, BatchOptions, BatchResult, RunError, TickerSummary};
