//! Structured events returned by the simulation engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::OptionType;

/// An option expiration resolved while advancing the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpirationEvent {
    /// A put finished in the money; shares were purchased at the strike.
    PutAssigned {
        symbol: String,
        strike: Decimal,
        shares: u32,
        total_cost: Decimal,
        spot: Decimal,
    },
    /// A call finished in the money; shares were sold at the strike.
    CallAssigned {
        symbol: String,
        strike: Decimal,
        shares: u32,
        total_proceeds: Decimal,
        spot: Decimal,
    },
    /// The option finished out of the money; premium kept in full.
    ExpiredWorthless {
        symbol: String,
        strike: Decimal,
        option_type: OptionType,
        premium_kept: Decimal,
        spot: Decimal,
    },
}

impl ExpirationEvent {
    pub fn symbol(&self) -> &str {
        match self {
            Self::PutAssigned { symbol, .. }
            | Self::CallAssigned { symbol, .. }
            | Self::ExpiredWorthless { symbol, .. } => symbol,
        }
    }
}

/// Result of an `advance_day` command.
///
/// `advanced` is false when the requested step ran past the last trading
/// date; the clock is then clamped and no expirations are evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    pub advanced: bool,
    pub date: NaiveDate,
    pub events: Vec<ExpirationEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_serialization_tagged() {
        let event = ExpirationEvent::PutAssigned {
            symbol: "KO".to_string(),
            strike: dec!(50),
            shares: 100,
            total_cost: dec!(5000),
            spot: dec!(45),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "put_assigned");
        assert_eq!(json["symbol"], "KO");
        assert_eq!(event.symbol(), "KO");
    }
}
