//! Ledger export: trade tape as CSV or JSON, skip list as JSON, and the full
//! batch result with schema versioning.
//!
//! Persisted batch results include a `schema_version` field. Newer versions
//! than this build understands are rejected on load.

use std::path::{Path, PathBuf};

use thiserror::Error;

use gapscalp_core::recorder::Skip;
use gapscalp_core::Trade;

use crate::runner::{BatchResult, SCHEMA_VERSION};

/// Errors from exporting or importing ledger artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to flush CSV writer: {0}")]
    Flush(String),
    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BatchResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Deserialize a `BatchResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BatchResult, ExportError> {
    let result: BatchResult = serde_json::from_str(json)?;
    if result.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: result.schema_version,
            max: SCHEMA_VERSION,
        });
    }
    Ok(result)
}

pub fn export_trades_json(trades: &[Trade]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(trades)?)
}

pub fn export_skips_json(skips: &[Skip]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(skips)?)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Column order of the trade tape.
pub const TRADE_COLUMNS: [&str; 18] = [
    "ticker",
    "date",
    "entry_time",
    "entry_price",
    "entry_vwap",
    "vwap_deviation_pct",
    "exit_time",
    "exit_price",
    "exit_reason",
    "pnl_pct",
    "bars_held",
    "pattern",
    "gap_pct",
    "prev_close",
    "day_open",
    "applied_stop_pct",
    "stop_source",
    "win",
];

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.precision$}"))
}

/// Export a trade list as CSV. Undefined values are empty fields.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TRADE_COLUMNS)?;

    for t in trades {
        let row = [
            t.ticker.clone(),
            t.date.to_string(),
            t.entry_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.6}", t.entry_price),
            opt(t.entry_vwap, 6),
            opt(t.vwap_deviation_pct(), 6),
            t.exit_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.6}", t.exit_price),
            t.exit_reason.to_string(),
            format!("{:.6}", t.pnl_pct),
            t.bars_held.to_string(),
            t.pattern.to_string(),
            format!("{:.6}", t.gap_pct),
            format!("{:.6}", t.prev_close),
            format!("{:.6}", t.day_open),
            format!("{:.6}", t.applied_stop_pct),
            format!("{:?}", t.stop_source),
            u8::from(t.is_winner()).to_string(),
        ];
        wtr.write_record(&row)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(data)?)
}

// ─── Artifact bundle ────────────────────────────────────────────────

fn write(path: PathBuf, content: &str) -> Result<PathBuf, ExportError> {
    std::fs::write(&path, content).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Save the ledger artifacts for a batch into `output_dir`:
/// - `batch.json`: the full `BatchResult`
/// - `trades.csv` and `trades.json`: the trade tape
/// - `skips.json`: skipped tickers and days
///
/// Returns the written paths.
pub fn save_artifacts(result: &BatchResult, output_dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ExportError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    Ok(vec![
        write(output_dir.join("batch.json"), &export_json(result)?)?,
        write(output_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?,
        write(output_dir.join("trades.json"), &export_trades_json(&result.trades)?)?,
        write(output_dir.join("skips.json"), &export_skips_json(&result.skips)?)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gapscalp_core::recorder::SkipReason;
    use gapscalp_core::{ExitReason, PatternLabel, StopSource, StrategyConfig};

    fn sample_trade(vwap: Option<f64>) -> Trade {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        Trade {
            ticker: "8267.T".into(),
            date,
            entry_time: date.and_hms_opt(9, 5, 0).unwrap(),
            entry_price: 1000.3,
            entry_vwap: vwap,
            exit_time: date.and_hms_opt(9, 40, 0).unwrap(),
            exit_price: 1005.0,
            exit_reason: ExitReason::Trailing,
            pnl_pct: (1005.0 - 1000.3) / 1000.3,
            bars_held: 7,
            pattern: PatternLabel::Reversal,
            gap_pct: -0.005,
            prev_close: 1005.0,
            day_open: 1000.0,
            applied_stop_pct: 0.007,
            stop_source: StopSource::Fixed,
        }
    }

    fn sample_result() -> BatchResult {
        BatchResult {
            schema_version: SCHEMA_VERSION,
            config_hash: "abc".into(),
            strategy: StrategyConfig::default(),
            tickers: Vec::new(),
            trades: vec![sample_trade(Some(998.0))],
            skips: vec![Skip::ticker("X", SkipReason::NoIntradayBars)],
            has_synthetic: false,
        }
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = export_trades_csv(&[sample_trade(Some(998.0)), sample_trade(None)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TRADE_COLUMNS.join(","));
        assert!(lines[1].starts_with("8267.T,2024-03-04,2024-03-04 09:05:00,1000.300000,998.000000,"));
        assert!(lines[1].contains(",Trailing,"));
        assert!(lines[1].contains(",reversal,"));
        assert!(lines[1].ends_with(",Fixed,1"));
        // undefined vwap leaves both vwap columns empty
        assert!(lines[2].contains(",1000.300000,,,"));
    }

    #[test]
    fn batch_json_roundtrip() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.trades, result.trades);
        assert_eq!(back.skips, result.skips);
        assert_eq!(back.config_hash, "abc");
    }

    #[test]
    fn newer_schema_rejected() {
        let mut result = sample_result();
        result.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&result).unwrap();
        assert!(matches!(
            import_json(&json),
            Err(ExportError::UnsupportedSchema { .. })
        ));
    }

    #[test]
    fn skips_json_lists_reasons() {
        let json = export_skips_json(&sample_result().skips).unwrap();
        assert!(json.contains("NoIntradayBars"));
        assert!(json.contains("\"date\": null"));
    }
}
