//! Simulation configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration threaded into the simulator at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Stock universe. The first symbol's calendar is the reference
    /// trading-date sequence for the clock.
    pub symbols: Vec<String>,

    /// Starting cash.
    pub initial_capital: Decimal,

    /// Annualized risk-free rate used for pricing.
    pub risk_free_rate: f64,

    /// Trailing window (days) for historical volatility.
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,

    /// Offered expiration cycles, in trading days.
    #[serde(default = "default_expiration_cycles")]
    pub expiration_cycles: Vec<usize>,

    /// Strikes generated on each side of spot for option chains.
    #[serde(default = "default_strikes_per_side")]
    pub strikes_per_side: u32,
}

fn default_volatility_window() -> usize {
    30
}

fn default_expiration_cycles() -> Vec<usize> {
    vec![7, 14, 30, 45]
}

fn default_strikes_per_side() -> u32 {
    5
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            symbols: ["AAPL", "MSFT", "JNJ", "KO", "XOM", "V", "GOOG", "AXP", "WMT", "PG"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            initial_capital: Decimal::from(100_000),
            risk_free_rate: 0.045,
            volatility_window: default_volatility_window(),
            expiration_cycles: default_expiration_cycles(),
            strikes_per_side: default_strikes_per_side(),
        }
    }
}

impl SimConfig {
    /// Config for a custom universe, keeping the other defaults.
    pub fn with_symbols(symbols: Vec<String>) -> Self {
        Self {
            symbols,
            ..Default::default()
        }
    }
}
