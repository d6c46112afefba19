//! GapScalp CLI: run, validate, and synthetic data commands.
//!
//! Commands:
//! - `run`: execute a batch backtest from a TOML config file
//! - `validate`: parse and validate a config without running it
//! - `synth`: write a seeded synthetic CSV pair for one ticker
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gapscalp_core::ExitReason;
use gapscalp_runner::data_loader::{daily_path, intraday_path, write_daily_csv, write_intraday_csv};
use gapscalp_runner::{
    generate_synthetic_bars, run_batch, save_artifacts, BatchOptions, BatchResult, RunConfig,
    SyntheticSpec,
};

const DEFAULT_LOG_FILTER: &str = "gapscalp_core=info,gapscalp_runner=info,gapscalp=info";

#[derive(Parser)]
#[command(name = "gapscalp", about = "GapScalp CLI: intraday gap-scalp backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a batch backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for the trade ledger and batch result.
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,

        /// Generate synthetic bars for tickers without CSV data.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Override the configured worker thread count.
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Parse and validate a config file, printing its fingerprint.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Write synthetic intraday and daily CSV files for a ticker.
    Synth {
        #[arg(long)]
        ticker: String,

        /// Number of intraday sessions.
        #[arg(long, default_value_t = 60)]
        days: usize,

        /// First session date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Directory to write `<TICKER>_intraday.csv` and `<TICKER>_daily.csv` into.
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,

        /// RNG seed. Derived from the ticker when omitted.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            out_dir,
            synthetic,
            threads,
        } => run_cmd(&config, &out_dir, synthetic, threads),
        Commands::Validate { config } => validate_cmd(&config),
        Commands::Synth {
            ticker,
            days,
            start,
            out_dir,
            seed,
        } => synth_cmd(&ticker, days, start.as_deref(), &out_dir, seed),
    }
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))
}

fn run_cmd(config_path: &Path, out_dir: &Path, synthetic: bool, threads: Option<usize>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if threads.is_some() {
        config.threads = threads;
    }

    let result = run_batch(&config, &BatchOptions { synthetic }).context("batch run failed")?;
    print_summary(&result);

    let paths = save_artifacts(&result, out_dir)
        .with_context(|| format!("saving artifacts to {}", out_dir.display()))?;
    for path in &paths {
        println!("Wrote: {}", path.display());
    }
    Ok(())
}

fn validate_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", config_path.display()))?;
    let hash = config.config_hash()?;

    println!("Config OK: {}", config_path.display());
    println!("Tickers:        {}", config.tickers.join(", "));
    println!("Data dir:       {}", config.data_dir.display());
    println!(
        "Entry window:   {} to {}",
        config.strategy.entry_start.format("%H:%M"),
        config.strategy.entry_end.format("%H:%M")
    );
    println!(
        "Gap range:      {:.2}% to {:.2}%",
        config.strategy.gap_min * 100.0,
        config.strategy.gap_max * 100.0
    );
    println!("Pattern rules:  {}", config.strategy.pattern_rules.classifier().name());
    println!("Config hash:    {hash}");
    Ok(())
}

fn synth_cmd(
    ticker: &str,
    days: usize,
    start: Option<&str>,
    out_dir: &Path,
    seed: Option<u64>,
) -> Result<()> {
    if days == 0 {
        bail!("--days must be at least 1");
    }
    let mut spec = SyntheticSpec {
        sessions: days,
        seed,
        ..Default::default()
    };
    if let Some(s) = start {
        spec.start = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --start date '{s}'"))?;
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let (intraday, daily) = generate_synthetic_bars(ticker, spec);

    let intraday_file = intraday_path(out_dir, ticker);
    let daily_file = daily_path(out_dir, ticker);
    write_intraday_csv(&intraday_file, &intraday)?;
    write_daily_csv(&daily_file, &daily)?;
    info!(ticker, sessions = days, bars = intraday.len(), "synthetic data written");

    println!("Wrote: {} ({} bars)", intraday_file.display(), intraday.len());
    println!("Wrote: {} ({} bars)", daily_file.display(), daily.len());
    Ok(())
}

fn print_summary(result: &BatchResult) {
    let trades = result.trades.len();
    let wins = result.win_count();
    let exits = |reason: ExitReason| result.trades.iter().filter(|t| t.exit_reason == reason).count();

    println!();
    println!("=== Batch Result ===");
    println!("Config hash:    {}", result.config_hash);
    println!("Tickers:        {}", result.tickers.len());
    println!("Trades:         {trades}");
    if trades > 0 {
        let mean = result.trades.iter().map(|t| t.pnl_pct).sum::<f64>() / trades as f64;
        println!("Win Rate:       {:.1}%", wins as f64 / trades as f64 * 100.0);
        println!("Mean PnL:       {:.3}%", mean * 100.0);
        println!(
            "Exits:          {} trailing, {} stop, {} force close",
            exits(ExitReason::Trailing),
            exits(ExitReason::StopLoss),
            exits(ExitReason::ForceClose)
        );
    }
    println!("Skips:          {}", result.skips.len());
    println!();
    println!(
        "{:<10} {:<10} {:>6} {:>7} {:>8} {:>6}",
        "Ticker", "Source", "Days", "Trades", "Skipped", "Open"
    );
    println!("{}", "-".repeat(52));
    for t in &result.tickers {
        let source = t
            .source
            .map_or_else(|| "-".to_string(), |s| format!("{s:?}"));
        println!(
            "{:<10} {:<10} {:>6} {:>7} {:>8} {:>6}",
            t.ticker, source, t.days_simulated, t.trades, t.skipped_days, t.open_at_close
        );
    }
    for skip in result.skips.iter().filter(|s| s.date.is_none()) {
        println!("SKIPPED {}: {}", skip.ticker, skip.reason);
    }
    if result.has_synthetic {
        println!();
        println!("WARNING: Results include SYNTHETIC data");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_args_parse() {
        let cli = Cli::try_parse_from([
            "gapscalp", "run", "--config", "run.toml", "--synthetic", "--threads", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                config,
                out_dir,
                synthetic,
                threads,
            } => {
                assert_eq!(config, PathBuf::from("run.toml"));
                assert_eq!(out_dir, PathBuf::from("results"));
                assert!(synthetic);
                assert_eq!(threads, Some(2));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_requires_config() {
        assert!(Cli::try_parse_from(["gapscalp", "run"]).is_err());
    }

    #[test]
    fn synth_zero_days_rejected() {
        let err = synth_cmd("X", 0, None, Path::new("unused"), None).unwrap_err();
        assert!(err.to_string().contains("--days"));
    }
}
