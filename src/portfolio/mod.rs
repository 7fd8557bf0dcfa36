//! Portfolio data model: position entities and the cash/stock/options ledger.

mod portfolio;
mod position;

pub use portfolio::{
    CashFlow, Portfolio, PortfolioError, PortfolioSnapshot, Transaction,
};
pub use position::{OptionContract, OptionType, PositionStatus, StockHolding, CONTRACT_SIZE};
