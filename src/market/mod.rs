//! Market data access: the provider seam and an in-memory historical store.

mod history;

pub use history::{HistoricalData, HistoryError, MarketData, DEFAULT_VOLATILITY};
