//! Bar loading for the runner.
//!
//! Reads `<data_dir>/<TICKER>_intraday.csv` and `<data_dir>/<TICKER>_daily.csv`.
//! Fallback policy:
//! 1. If both CSV files exist → load them
//! 2. If not and `synthetic` is set → generate synthetic bars (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Loaded series are sorted ascending; duplicate timestamps keep the last row;
//! rows with non-finite or inconsistent OHLC are dropped with a warning.
//! Synthetic data is a developer-only mode and is tagged in batch results.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use gapscalp_core::domain::{DailyBar, IntradayBar};

/// Intraday timestamp format, exchange-local.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data for '{ticker}' in {} (use --synthetic for synthetic data)", dir.display())]
    Missing { ticker: String, dir: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: row {row}: bad timestamp '{value}'", path.display())]
    BadTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a ticker's bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// Bars for one ticker, ready for simulation.
#[derive(Debug, Clone)]
pub struct LoadedTicker {
    pub intraday: Vec<IntradayBar>,
    pub daily: Vec<DailyBar>,
    pub source: DataSource,
}

pub fn intraday_path(data_dir: &Path, ticker: &str) -> PathBuf {
    data_dir.join(format!("{ticker}_intraday.csv"))
}

pub fn daily_path(data_dir: &Path, ticker: &str) -> PathBuf {
    data_dir.join(format!("{ticker}_daily.csv"))
}

/// Load one ticker's bars from `data_dir`, falling back to synthetic bars.
pub fn load_ticker(data_dir: &Path, ticker: &str, synthetic: bool) -> Result<LoadedTicker, LoadError> {
    let intraday_file = intraday_path(data_dir, ticker);
    let daily_file = daily_path(data_dir, ticker);

    if intraday_file.exists() && daily_file.exists() {
        let intraday = load_intraday_csv(&intraday_file)?;
        let daily = load_daily_csv(&daily_file)?;
        debug!(ticker, intraday = intraday.len(), daily = daily.len(), "loaded CSV bars");
        return Ok(LoadedTicker {
            intraday,
            daily,
            source: DataSource::Csv,
        });
    }

    if synthetic {
        warn!(ticker, "no CSV data, generating synthetic bars");
        let (intraday, daily) = generate_synthetic_bars(ticker, SyntheticSpec::default());
        return Ok(LoadedTicker {
            intraday,
            daily,
            source: DataSource::Synthetic,
        });
    }

    Err(LoadError::Missing {
        ticker: ticker.to_string(),
        dir: data_dir.to_path_buf(),
    })
}

// ─── CSV rows ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct IntradayRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DailyRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn csv_err(path: &Path) -> impl Fn(csv::Error) -> LoadError + '_ {
    move |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Read an intraday CSV (`timestamp,open,high,low,close,volume`).
pub fn load_intraday_csv(path: &Path) -> Result<Vec<IntradayBar>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_err(path))?;
    let mut bars = Vec::new();

    for (i, row) in reader.deserialize::<IntradayRow>().enumerate() {
        let row = row.map_err(csv_err(path))?;
        let timestamp = NaiveDateTime::parse_from_str(row.timestamp.trim(), TIMESTAMP_FORMAT)
            .map_err(|_| LoadError::BadTimestamp {
                path: path.to_path_buf(),
                row: i + 1,
                value: row.timestamp.clone(),
            })?;
        bars.push(IntradayBar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    Ok(clean_series(path, bars, |b: &IntradayBar| b.timestamp, IntradayBar::is_sane))
}

/// Read a daily CSV (`date,open,high,low,close,volume`).
pub fn load_daily_csv(path: &Path) -> Result<Vec<DailyBar>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_err(path))?;
    let mut bars = Vec::new();

    for row in reader.deserialize::<DailyRow>() {
        let row = row.map_err(csv_err(path))?;
        bars.push(DailyBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    Ok(clean_series(path, bars, |b: &DailyBar| b.date, |b: &DailyBar| {
        b.open.is_finite() && b.close.is_finite() && b.high >= b.low
    }))
}

/// Sort by key, keep the last row per key, drop rows failing `sane`.
fn clean_series<T, K: Ord + Copy>(
    path: &Path,
    mut bars: Vec<T>,
    key: impl Fn(&T) -> K,
    sane: impl Fn(&T) -> bool,
) -> Vec<T> {
    let before = bars.len();
    bars.retain(|b| sane(b));
    let dropped = before - bars.len();
    if dropped > 0 {
        warn!(path = %path.display(), dropped, "dropped malformed bars");
    }

    // stable sort, then keep the last row of each equal-key run
    bars.sort_by_key(|b| key(b));
    bars.reverse();
    bars.dedup_by_key(|b| key(b));
    bars.reverse();
    bars
}

// ─── CSV writing ────────────────────────────────────────────────────

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> LoadError + '_ {
    move |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn write_intraday_csv(path: &Path, bars: &[IntradayBar]) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;
    for b in bars {
        writer
            .serialize(IntradayRow {
                timestamp: b.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                volume: b.volume,
            })
            .map_err(csv_err(path))?;
    }
    writer.flush().map_err(io_err(path))
}

pub fn write_daily_csv(path: &Path, bars: &[DailyBar]) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;
    for b in bars {
        writer
            .serialize(DailyRow {
                date: b.date,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                volume: b.volume,
            })
            .map_err(csv_err(path))?;
    }
    writer.flush().map_err(io_err(path))
}

// ─── Synthetic data ─────────────────────────────────────────────────

/// Shape of a synthetic series.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSpec {
    pub start: NaiveDate,
    /// Weekday sessions with intraday bars.
    pub sessions: usize,
    /// Daily-only weekdays before `start`, so gaps and ATR resolve from day one.
    pub warmup_days: usize,
    /// Explicit seed; derived from the ticker name when `None`.
    pub seed: Option<u64>,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap_or(NaiveDate::MIN),
            sessions: 60,
            warmup_days: 20,
            seed: None,
        }
    }
}

const BAR_MINUTES: i64 = 5;

fn rng_for(ticker: &str, seed: Option<u64>) -> rand::rngs::StdRng {
    use rand::SeedableRng;

    match seed {
        Some(s) => rand::rngs::StdRng::seed_from_u64(s),
        None => rand::rngs::StdRng::from_seed(*blake3::hash(ticker.as_bytes()).as_bytes()),
    }
}

fn next_weekday(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}

/// Generate a seeded random walk of intraday sessions plus matching daily bars.
///
/// Sessions run 09:00–15:00 in 5-minute bars. Each session opens with a gap
/// drawn from roughly -2%..+1% against the prior close. Daily bars for the
/// simulated sessions are aggregated from their intraday bars.
pub fn generate_synthetic_bars(ticker: &str, spec: SyntheticSpec) -> (Vec<IntradayBar>, Vec<DailyBar>) {
    use rand::Rng;

    let mut rng = rng_for(ticker, spec.seed);
    let mut price = 1000.0_f64;
    let mut daily = Vec::with_capacity(spec.warmup_days + spec.sessions);
    let mut intraday = Vec::new();

    // warmup: daily bars only, ending the weekday before `start`
    let mut warmup_dates = Vec::with_capacity(spec.warmup_days);
    let mut d = spec.start;
    while warmup_dates.len() < spec.warmup_days {
        d -= Duration::days(1);
        if !matches!(d.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            warmup_dates.push(d);
        }
    }
    for date in warmup_dates.into_iter().rev() {
        let open = price * (1.0 + rng.gen_range(-0.01..0.01));
        let close = open * (1.0 + rng.gen_range(-0.02..0.02));
        daily.push(DailyBar {
            date,
            open,
            high: open.max(close) * (1.0 + rng.gen_range(0.0..0.01)),
            low: open.min(close) * (1.0 - rng.gen_range(0.0..0.01)),
            close,
            volume: rng.gen_range(1e6..5e6),
        });
        price = close;
    }

    let session_open = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
    let bars_per_session = (6 * 60 / BAR_MINUTES + 1) as usize;
    let mut date = next_weekday(spec.start);

    for _ in 0..spec.sessions {
        let start = date.and_time(session_open);
        let day_open = price * (1.0 + rng.gen_range(-0.02..0.01));
        let mut last = day_open;
        let mut session = Vec::with_capacity(bars_per_session);

        for k in 0..bars_per_session {
            let open = if k == 0 { day_open } else { last };
            let close = open * (1.0 + rng.gen_range(-0.003..0.003));
            session.push(IntradayBar {
                timestamp: start + Duration::minutes(BAR_MINUTES * k as i64),
                open,
                high: open.max(close) * (1.0 + rng.gen_range(0.0..0.0015)),
                low: open.min(close) * (1.0 - rng.gen_range(0.0..0.0015)),
                close,
                volume: if rng.gen_bool(0.05) {
                    0.0
                } else {
                    rng.gen_range(100.0..10_000.0_f64).round()
                },
            });
            last = close;
        }

        daily.push(DailyBar {
            date,
            open: day_open,
            high: session.iter().map(|b| b.high).fold(f64::MIN, f64::max),
            low: session.iter().map(|b| b.low).fold(f64::MAX, f64::min),
            close: last,
            volume: session.iter().map(|b| b.volume).sum(),
        });
        intraday.extend(session);
        price = last;
        date = next_weekday(date + Duration::days(1));
    }

    (intraday, daily)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(sessions: usize) -> SyntheticSpec {
        SyntheticSpec {
            sessions,
            ..Default::default()
        }
    }

    #[test]
    fn synthetic_data_is_deterministic() {
        assert_eq!(
            generate_synthetic_bars("7203.T", spec(3)),
            generate_synthetic_bars("7203.T", spec(3))
        );
    }

    #[test]
    fn different_tickers_get_different_synthetic_data() {
        let (a, _) = generate_synthetic_bars("A", spec(2));
        let (b, _) = generate_synthetic_bars("B", spec(2));
        assert_ne!(a, b);
    }

    #[test]
    fn explicit_seed_overrides_ticker() {
        let seeded = SyntheticSpec {
            seed: Some(7),
            ..spec(2)
        };
        let (a, _) = generate_synthetic_bars("A", seeded);
        let (b, _) = generate_synthetic_bars("B", seeded);
        assert_eq!(a, b);
    }

    #[test]
    fn synthetic_shape() {
        let (intraday, daily) = generate_synthetic_bars("X", spec(5));
        assert_eq!(intraday.len(), 5 * 73);
        assert_eq!(daily.len(), 20 + 5);
        assert!(intraday.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(daily.windows(2).all(|w| w[0].date < w[1].date));
        assert!(intraday.iter().all(|b| b.is_sane()));
        assert!(daily
            .iter()
            .all(|d| d.date.weekday() != chrono::Weekday::Sat && d.date.weekday() != chrono::Weekday::Sun));
        // every session date has a daily bar
        let last_daily = daily.last().unwrap();
        assert_eq!(last_daily.date, intraday.last().unwrap().timestamp.date());
        assert_eq!(last_daily.close, intraday.last().unwrap().close);
    }

    #[test]
    fn clean_series_sorts_dedupes_and_drops() {
        let t = |m: u32, close: f64| IntradayBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(9, m, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1.0,
        };
        let mut bad = t(15, 100.0);
        bad.high = 50.0;
        let bars = vec![t(10, 101.0), t(5, 100.0), t(10, 102.0), bad];
        let cleaned = clean_series(Path::new("x.csv"), bars, |b: &IntradayBar| b.timestamp, IntradayBar::is_sane);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].close, 100.0);
        assert_eq!(cleaned[1].close, 102.0);
    }

    proptest::proptest! {
        #[test]
        fn cleaned_series_is_strictly_increasing(
            minutes in proptest::collection::vec(0u32..60, 0..40),
        ) {
            let bars: Vec<IntradayBar> = minutes
                .iter()
                .enumerate()
                .map(|(i, &m)| IntradayBar {
                    timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                        .unwrap()
                        .and_hms_opt(9, m, 0)
                        .unwrap(),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.0 + i as f64 * 0.01,
                    volume: 1.0,
                })
                .collect();
            let cleaned = clean_series(Path::new("p.csv"), bars.clone(), |b: &IntradayBar| b.timestamp, IntradayBar::is_sane);

            proptest::prop_assert!(cleaned.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            let mut distinct = minutes.clone();
            distinct.sort_unstable();
            distinct.dedup();
            proptest::prop_assert_eq!(cleaned.len(), distinct.len());
            // each kept bar is the last input row with its timestamp
            for bar in &cleaned {
                let last = bars.iter().rev().find(|b| b.timestamp == bar.timestamp).unwrap();
                proptest::prop_assert_eq!(bar.close, last.close);
            }
        }
    }
}
