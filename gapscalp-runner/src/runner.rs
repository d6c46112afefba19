//! Batch runner: loads each ticker, simulates it on a bounded Rayon pool,
//! and merges results in configured ticker order.
//!
//! Tickers are independent; a failure to load one is recorded as a skip and
//! the batch continues. An optional deadline is checked before each ticker
//! starts: tickers not yet started when it passes are skipped with
//! `SkipReason::Timeout`. A ticker already running is never interrupted.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use gapscalp_core::config::StrategyConfig;
use gapscalp_core::engine::{simulate_ticker, TickerRun};
use gapscalp_core::recorder::{Skip, SkipReason, TradeRecorder};
use gapscalp_core::Trade;

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_ticker, DataSource};

/// Current schema version for persisted batch results.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that abort a whole batch. Per-ticker failures are skips instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Options that are not part of the reproducible configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Generate synthetic bars for tickers without CSV data.
    pub synthetic: bool,
}

/// Per-ticker summary line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSummary {
    pub ticker: String,
    /// `None` when the ticker never loaded.
    pub source: Option<DataSource>,
    pub days_simulated: usize,
    pub trades: usize,
    pub skipped_days: usize,
    pub open_at_close: usize,
}

/// Complete result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 fingerprint of the strategy parameters.
    pub config_hash: String,
    pub strategy: StrategyConfig,
    pub tickers: Vec<TickerSummary>,
    /// Grouped by ticker in configured order, chronological within a ticker.
    pub trades: Vec<Trade>,
    pub skips: Vec<Skip>,
    /// Whether any ticker ran on synthetic bars.
    pub has_synthetic: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BatchResult {
    pub fn win_count(&self) -> usize {
        self.trades.iter().filter(|t| t.is_winner()).count()
    }
}

/// Outcome of one ticker task, before merging.
struct TickerTask {
    run: TickerRun,
    source: Option<DataSource>,
}

/// Validate, load and simulate every configured ticker.
pub fn run_batch(config: &RunConfig, opts: &BatchOptions) -> Result<BatchResult, RunError> {
    config.validate()?;
    let config_hash = config.config_hash()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .build()?;
    let deadline = config
        .timeout_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    info!(
        tickers = config.tickers.len(),
        threads = pool.current_num_threads(),
        config_hash = %config_hash,
        "starting batch"
    );

    let tasks: Vec<TickerTask> = pool.install(|| {
        config
            .tickers
            .par_iter()
            .map(|ticker| run_ticker_task(ticker, config, opts, deadline))
            .collect()
    });

    Ok(merge(config_hash, &config.strategy, tasks))
}

fn run_ticker_task(
    ticker: &str,
    config: &RunConfig,
    opts: &BatchOptions,
    deadline: Option<Instant>,
) -> TickerTask {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        warn!(ticker, "batch deadline passed, skipping ticker");
        return TickerTask {
            run: TickerRun::skipped(ticker, SkipReason::Timeout),
            source: None,
        };
    }

    match load_ticker(&config.data_dir, ticker, opts.synthetic) {
        Ok(loaded) => TickerTask {
            run: simulate_ticker(ticker, &loaded.intraday, &loaded.daily, &config.strategy),
            source: Some(loaded.source),
        },
        Err(e) => {
            warn!(ticker, error = %e, "failed to load ticker");
            TickerTask {
                run: TickerRun::skipped(ticker, SkipReason::LoadFailed(e.to_string())),
                source: None,
            }
        }
    }
}

fn merge(config_hash: String, strategy: &StrategyConfig, tasks: Vec<TickerTask>) -> BatchResult {
    let mut recorder = TradeRecorder::new();
    let mut tickers = Vec::with_capacity(tasks.len());
    let mut has_synthetic = false;

    for task in tasks {
        has_synthetic |= task.source == Some(DataSource::Synthetic);
        tickers.push(TickerSummary {
            ticker: task.run.ticker.clone(),
            source: task.source,
            days_simulated: task.run.days_simulated,
            trades: task.run.trades.len(),
            skipped_days: task.run.skips.iter().filter(|s| s.date.is_some()).count(),
            open_at_close: task.run.open_at_close.len(),
        });
        recorder.record_ticker(task.run);
    }

    let (trades, skips) = recorder.into_parts();
    info!(
        trades = trades.len(),
        skips = skips.len(),
        has_synthetic,
        "batch complete"
    );

    BatchResult {
        schema_version: SCHEMA_VERSION,
        config_hash,
        strategy: strategy.clone(),
        tickers,
        trades,
        skips,
        has_synthetic,
    }
}
