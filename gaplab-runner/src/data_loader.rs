//! Bar sources for the runner.
//!
//! Two sources exist:
//! 1. `CsvSource` reads `<dir>/<SYMBOL>.csv` with a `date,open,high,low,close,volume` header
//! 2. `SyntheticSource` generates a deterministic random walk with overnight gaps
//!
//! Every loaded series passes through `validate_bars` before it reaches the
//! analysis, so the core only ever sees strictly increasing dates and finite prices.

use chrono::{Datelike, NaiveDate};
use gaplab_core::domain::PriceBar;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for '{symbol}' at {}", .path.display())]
    NotFound { symbol: String, path: PathBuf },

    #[error("read '{symbol}': {source}")]
    Csv {
        symbol: String,
        #[source]
        source: csv::Error,
    },

    #[error("'{symbol}' has no bars")]
    Empty { symbol: String },

    #[error("'{symbol}': dates not strictly increasing at row {row} ({previous} then {date})")]
    Unordered {
        symbol: String,
        row: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("'{symbol}': non-finite price at row {row} ({date})")]
    NonFinite {
        symbol: String,
        row: usize,
        date: NaiveDate,
    },

    #[error("'{symbol}' is not a valid symbol (must be a single path component)")]
    InvalidSymbol { symbol: String },
}

/// True when `symbol` can be used as a file or directory name under a data
/// or output directory without escaping it.
pub fn is_path_safe_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol != "."
        && !symbol.contains("..")
        && !symbol.contains(['/', '\\', '\0'])
        && !Path::new(symbol).is_absolute()
}

/// Reject symbols that cannot be used as a path component.
pub fn check_symbol(symbol: &str) -> Result<(), LoadError> {
    if is_path_safe_symbol(symbol) {
        Ok(())
    } else {
        Err(LoadError::InvalidSymbol {
            symbol: symbol.to_string(),
        })
    }
}

/// Anything that can produce a symbol's daily bars.
pub trait BarSource: Send + Sync {
    fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError>;

    /// Short label recorded in reports.
    fn describe(&self) -> String;
}

// ─── CSV ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl From<CsvRow> for PriceBar {
    fn from(row: CsvRow) -> Self {
        PriceBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl BarSource for CsvSource {
    fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
        check_symbol(symbol)?;
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(LoadError::NotFound {
                symbol: symbol.to_string(),
                path,
            });
        }
        let csv_err = |source| LoadError::Csv {
            symbol: symbol.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(csv_err)?;
        let bars = reader
            .deserialize::<CsvRow>()
            .map(|row| row.map(PriceBar::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;

        validate_bars(symbol, &bars)?;
        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "loaded csv");
        Ok(bars)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.dir.display())
    }
}

// ─── Synthetic ───────────────────────────────────────────────────────

/// Deterministic sample data. Seeded from the symbol name, so the same symbol
/// always yields the same bars.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    days: usize,
    end_date: NaiveDate,
}

impl SyntheticSource {
    pub fn new(days: usize, end_date: NaiveDate) -> Self {
        Self { days, end_date }
    }

    pub fn default_end_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MIN)
    }
}

impl BarSource for SyntheticSource {
    fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
        let bars = generate_synthetic_bars(symbol, self.days, self.end_date);
        validate_bars(symbol, &bars)?;
        Ok(bars)
    }

    fn describe(&self) -> String {
        format!("synthetic:{}d", self.days)
    }
}

/// Weekday-only random walk ending at `end`, `days` bars long.
///
/// Each bar opens at the previous close plus an overnight gap, then moves
/// intraday; high and low bracket open and close.
fn generate_synthetic_bars(symbol: &str, days: usize, end: NaiveDate) -> Vec<PriceBar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // Deterministic seed from symbol name
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut dates = Vec::with_capacity(days);
    let mut current = end;
    while dates.len() < days {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            dates.push(current);
        }
        match current.pred_opt() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    dates.reverse();

    let mut bars = Vec::with_capacity(dates.len());
    let mut prev_close = 100.0_f64;
    for date in dates {
        let gap: f64 = rng.gen_range(-0.015..0.015);
        let intraday: f64 = rng.gen_range(-0.02..0.02);
        let open = prev_close * (1.0 + gap);
        let close = open * (1.0 + intraday);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.012));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.012));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
        prev_close = close;
    }

    bars
}

// ─── Validation / hashing ────────────────────────────────────────────

/// Reject empty series, non-increasing dates and non-finite prices.
pub fn validate_bars(symbol: &str, bars: &[PriceBar]) -> Result<(), LoadError> {
    if bars.is_empty() {
        return Err(LoadError::Empty {
            symbol: symbol.to_string(),
        });
    }
    for (row, bar) in bars.iter().enumerate() {
        if bar.is_void() {
            return Err(LoadError::NonFinite {
                symbol: symbol.to_string(),
                row,
                date: bar.date,
            });
        }
        if row > 0 && bar.date <= bars[row - 1].date {
            return Err(LoadError::Unordered {
                symbol: symbol.to_string(),
                row,
                previous: bars[row - 1].date,
                date: bar.date,
            });
        }
    }
    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        tracing::warn!(symbol, bars = insane, "bars with inconsistent OHLC");
    }
    Ok(())
}

/// BLAKE3 over dates and OHLCV values of one symbol's bars.
pub fn dataset_hash(symbol: &str, bars: &[PriceBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
