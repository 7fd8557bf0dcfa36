pub mod market;
pub mod portfolio;
pub mod pricing;
pub mod sim;

// Re-export commonly used types
pub use market::{HistoricalData, MarketData};
pub use portfolio::{
    OptionContract, OptionType, Portfolio, PortfolioError, PortfolioSnapshot, PositionStatus,
    StockHolding,
};
pub use pricing::{generate_strikes, BlackScholes};
pub use sim::{AdvanceOutcome, ExpirationEvent, SimConfig, SimError, Simulator};
