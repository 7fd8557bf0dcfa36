//! Market data provider seam and an in-memory close-price store.
//!
//! The simulation engine only ever needs three lookups: a closing price, a
//! trailing-window volatility estimate, and the trading calendar. Anything
//! that can answer those (a cache of downloaded bars, a database, a test
//! fixture) plugs in through [`MarketData`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Fallback annualized volatility when price history is too short.
pub const DEFAULT_VOLATILITY: f64 = 0.30;

/// Read-only, idempotent market data lookups consumed by the engine.
pub trait MarketData {
    /// Closing price for a symbol on a date, if available.
    fn close_price(&self, symbol: &str, date: NaiveDate) -> Option<Decimal>;

    /// Annualized standard deviation of daily returns over the trailing
    /// window ending at `date`. Falls back to [`DEFAULT_VOLATILITY`] when
    /// there is not enough history.
    fn historical_volatility(&self, symbol: &str, date: NaiveDate, window_days: usize) -> f64;

    /// Ascending, unique trading dates available for a symbol.
    fn trading_dates(&self, symbol: &str) -> Vec<NaiveDate>;
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("failed to read price file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse price file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// In-memory historical close prices, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct HistoricalData {
    series: HashMap<String, Vec<(NaiveDate, Decimal)>>,
}

impl HistoricalData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a close-price series for a symbol. The series is sorted by
    /// date and deduplicated (last close wins for a repeated date).
    pub fn insert_series(&mut self, symbol: &str, mut closes: Vec<(NaiveDate, Decimal)>) {
        closes.sort_by_key(|(d, _)| *d);
        closes.dedup_by_key(|(d, _)| *d);
        self.series.insert(symbol.to_string(), closes);
    }

    /// Load series from a JSON map of symbol to `[[date, close], ...]`.
    pub fn from_json_str(json: &str) -> Result<Self, HistoryError> {
        let raw: HashMap<String, Vec<(NaiveDate, Decimal)>> = serde_json::from_str(json)?;
        let mut data = Self::new();
        for (symbol, closes) in raw {
            data.insert_series(&symbol, closes);
        }
        Ok(data)
    }

    /// Load series from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<_> = self.series.keys().map(String::as_str).collect();
        symbols.sort();
        symbols
    }

    /// Closes at or before `date`, most recent last.
    fn closes_through(&self, symbol: &str, date: NaiveDate) -> &[(NaiveDate, Decimal)] {
        let Some(series) = self.series.get(symbol) else {
            return &[];
        };
        let end = series.partition_point(|(d, _)| *d <= date);
        &series[..end]
    }
}

impl MarketData for HistoricalData {
    fn close_price(&self, symbol: &str, date: NaiveDate) -> Option<Decimal> {
        // Most recent close at or before the date; tolerates holidays and
        // weekends when querying off-calendar.
        self.closes_through(symbol, date).last().map(|(_, c)| *c)
    }

    fn historical_volatility(&self, symbol: &str, date: NaiveDate, window_days: usize) -> f64 {
        let closes = self.closes_through(symbol, date);
        let tail = if closes.len() > window_days + 1 {
            &closes[closes.len() - (window_days + 1)..]
        } else {
            closes
        };

        if tail.len() < 2 {
            return DEFAULT_VOLATILITY;
        }

        let returns: Vec<f64> = tail
            .windows(2)
            .map(|w| {
                let prev: f64 = w[0].1.try_into().unwrap_or(1.0);
                let curr: f64 = w[1].1.try_into().unwrap_or(1.0);
                (curr - prev) / prev
            })
            .collect();

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / (returns.len() as f64 - 1.0).max(1.0);

        // Annualize over 252 trading days
        variance.sqrt() * 252.0_f64.sqrt()
    }

    fn trading_dates(&self, symbol: &str) -> Vec<NaiveDate> {
        self.series
            .get(symbol)
            .map(|s| s.iter().map(|(d, _)| *d).collect())
            .unwrap_or_default()
    }
}
