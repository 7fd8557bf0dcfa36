//! Position entities: sold option contracts and stock holdings.
//!
//! Pure data plus derived queries; all state transitions live in the
//! portfolio ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shares represented by one option contract.
pub const CONTRACT_SIZE: u32 = 100;

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::Put => "PUT",
        }
    }
}

/// Lifecycle status of a sold option position.
///
/// Terminal states are absorbing; nothing reopens a resolved contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    /// Position is open.
    Open,
    /// Expired out of the money; premium kept.
    ExpiredWorthless,
    /// Put exercised against us; stock was purchased at the strike.
    Assigned,
    /// Call exercised against us; stock was sold at the strike.
    CalledAway,
    /// Closed early by buying back the option. No engine path produces
    /// this today; kept for manual-close support.
    Closed,
}

/// A sold (short) option contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying symbol.
    pub symbol: String,
    /// Call or put.
    pub option_type: OptionType,
    /// Strike price.
    pub strike: Decimal,
    /// Expiration date.
    pub expiration: NaiveDate,
    /// Premium received per share at origination.
    pub premium_per_share: Decimal,
    /// Number of contracts (each covers 100 shares).
    pub contracts: u32,
    /// Date the position was opened.
    pub entry_date: NaiveDate,
    /// Spot price of the underlying at entry.
    pub entry_spot: Decimal,
    /// Lifecycle status.
    pub status: PositionStatus,
    /// Date the position was resolved, if resolved.
    pub exit_date: Option<NaiveDate>,
    /// Spot price at resolution, if resolved.
    pub exit_spot: Option<Decimal>,
}

impl OptionContract {
    /// Create a new open contract.
    pub fn new(
        symbol: &str,
        option_type: OptionType,
        strike: Decimal,
        expiration: NaiveDate,
        premium_per_share: Decimal,
        contracts: u32,
        entry_date: NaiveDate,
        entry_spot: Decimal,
    ) -> Self {
        debug_assert!(strike > Decimal::ZERO);
        debug_assert!(contracts >= 1);
        debug_assert!(expiration >= entry_date);
        Self {
            symbol: symbol.to_string(),
            option_type,
            strike,
            expiration,
            premium_per_share,
            contracts,
            entry_date,
            entry_spot,
            status: PositionStatus::Open,
            exit_date: None,
            exit_spot: None,
        }
    }

    /// Shares-equivalent covered by this position.
    pub fn shares(&self) -> u32 {
        self.contracts * CONTRACT_SIZE
    }

    /// Strike value of the full position (strike x contracts x 100).
    pub fn notional(&self) -> Decimal {
        self.strike * Decimal::from(self.shares())
    }

    /// Total premium received for this position.
    pub fn total_premium(&self) -> Decimal {
        self.premium_per_share * Decimal::from(self.shares())
    }

    /// Days remaining to expiration; 0 once expired.
    pub fn days_to_expiration(&self, as_of: NaiveDate) -> i64 {
        if as_of >= self.expiration {
            return 0;
        }
        (self.expiration - as_of).num_days()
    }

    /// Whether the contract has reached expiration.
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        as_of >= self.expiration
    }

    /// Whether the position has not yet been resolved.
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

/// A stock holding, typically acquired through put assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockHolding {
    /// Underlying symbol.
    pub symbol: String,
    /// Share count; holdings never exist at zero shares.
    pub shares: u32,
    /// Cost basis per share.
    pub cost_basis: Decimal,
    /// Date the shares were acquired.
    pub acquisition_date: NaiveDate,
    /// Whether the shares came from a put assignment.
    pub assigned_from_put: bool,
}

impl StockHolding {
    /// Total cost of the position.
    pub fn total_cost(&self) -> Decimal {
        self.cost_basis * Decimal::from(self.shares)
    }

    /// Current market value at the given price.
    pub fn current_value(&self, price: Decimal) -> Decimal {
        price * Decimal::from(self.shares)
    }

    /// Unrealized profit or loss at the given price.
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.current_value(price) - self.total_cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_put() -> OptionContract {
        OptionContract::new(
            "AAPL",
            OptionType::Put,
            dec!(175),
            date(2024, 3, 15),
            dec!(2.40),
            2,
            date(2024, 2, 14),
            dec!(180.25),
        )
    }

    #[test]
    fn test_total_premium() {
        let put = sample_put();
        // 2.40 * 2 contracts * 100 shares
        assert_eq!(put.total_premium(), dec!(480));
        assert_eq!(put.notional(), dec!(35000));
        assert_eq!(put.shares(), 200);
    }

    #[test]
    fn test_days_to_expiration() {
        let put = sample_put();
        assert_eq!(put.days_to_expiration(date(2024, 2, 14)), 30);
        assert_eq!(put.days_to_expiration(date(2024, 3, 14)), 1);
        // Zero at and past expiration, never negative
        assert_eq!(put.days_to_expiration(date(2024, 3, 15)), 0);
        assert_eq!(put.days_to_expiration(date(2024, 4, 1)), 0);
    }

    #[test]
    fn test_is_expired() {
        let put = sample_put();
        assert!(!put.is_expired(date(2024, 3, 14)));
        assert!(put.is_expired(date(2024, 3, 15)));
        assert!(put.is_expired(date(2024, 3, 18)));
    }

    #[test]
    fn test_is_open_tracks_status() {
        let mut put = sample_put();
        assert!(put.is_open());
        put.status = PositionStatus::Assigned;
        assert!(!put.is_open());
    }

    #[test]
    fn test_holding_pnl() {
        let holding = StockHolding {
            symbol: "KO".to_string(),
            shares: 100,
            cost_basis: dec!(50),
            acquisition_date: date(2024, 1, 19),
            assigned_from_put: true,
        };
        assert_eq!(holding.total_cost(), dec!(5000));
        assert_eq!(holding.current_value(dec!(55)), dec!(5500));
        assert_eq!(holding.unrealized_pnl(dec!(55)), dec!(500));
        assert_eq!(holding.unrealized_pnl(dec!(45)), dec!(-500));
    }
}
