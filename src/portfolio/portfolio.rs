//! Portfolio ledger: cash, stock holdings, option positions, audit log.
//!
//! All cash movements flow through `credit`/`debit` and are recorded in the
//! transaction log. Every operation either completes fully or returns an
//! error with state untouched.
//!
//! Collateral model: selling a cash-secured put checks that the strike
//! notional is available but does not reserve it. Two open puts can count
//! the same cash, so an assignment can later fail with `InsufficientCash`.
//! The check is isolated in [`Portfolio::has_collateral`] so a stricter
//! escrow policy can be swapped in without touching the engine.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::position::{OptionContract, PositionStatus, StockHolding};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("insufficient collateral for cash-secured put: ${available} available, ${required} required")]
    InsufficientCollateral {
        available: Decimal,
        required: Decimal,
    },

    #[error("insufficient shares of {symbol} for covered call: {held} held, {required} required")]
    InsufficientCoverage {
        symbol: String,
        held: u32,
        required: u32,
    },

    #[error("insufficient cash: ${available} available, ${required} required")]
    InsufficientCash {
        available: Decimal,
        required: Decimal,
    },
}

/// Direction of a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlow {
    Credit,
    Debit,
}

/// One entry in the append-only cash audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub flow: CashFlow,
    pub amount: Decimal,
    pub reason: String,
    pub date: NaiveDate,
}

/// Point-in-time view of the portfolio for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: Decimal,
    pub holdings: Vec<StockHolding>,
    pub open_positions: Vec<OptionContract>,
    pub closed_positions: Vec<OptionContract>,
    pub total_value: Decimal,
    pub total_premium_collected: Decimal,
    pub total_return_pct: f64,
}

/// The portfolio ledger.
#[derive(Debug, Clone)]
pub struct Portfolio {
    initial_capital: Decimal,
    cash: Decimal,
    holdings: HashMap<String, StockHolding>,
    open_positions: Vec<OptionContract>,
    closed_positions: Vec<OptionContract>,
    transactions: Vec<Transaction>,
}

impl Portfolio {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            holdings: HashMap::new(),
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
            transactions: Vec::new(),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn holdings(&self) -> &HashMap<String, StockHolding> {
        &self.holdings
    }

    pub fn open_positions(&self) -> &[OptionContract] {
        &self.open_positions
    }

    pub fn closed_positions(&self) -> &[OptionContract] {
        &self.closed_positions
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Add cash and log the movement.
    fn credit(&mut self, amount: Decimal, reason: String, date: NaiveDate) {
        self.cash += amount;
        self.transactions.push(Transaction {
            flow: CashFlow::Credit,
            amount,
            reason,
            date,
        });
    }

    /// Remove cash, failing if the balance would go negative.
    fn debit(
        &mut self,
        amount: Decimal,
        reason: String,
        date: NaiveDate,
    ) -> Result<(), PortfolioError> {
        if amount > self.cash {
            return Err(PortfolioError::InsufficientCash {
                available: self.cash,
                required: amount,
            });
        }
        self.cash -= amount;
        self.transactions.push(Transaction {
            flow: CashFlow::Debit,
            amount,
            reason,
            date,
        });
        Ok(())
    }

    /// External capital contribution.
    pub fn deposit(&mut self, amount: Decimal, reason: &str, date: NaiveDate) {
        self.credit(amount, reason.to_string(), date);
    }

    /// Whether enough cash is available to back a put of the given notional.
    ///
    /// Checked at sale time only; the cash is not reserved afterwards.
    pub fn has_collateral(&self, required: Decimal) -> bool {
        self.cash >= required
    }

    /// Sell a cash-secured put. The strike notional must be available in
    /// cash; the premium is credited immediately.
    pub fn sell_put(&mut self, contract: OptionContract) -> Result<(), PortfolioError> {
        debug_assert!(contract.is_open());
        let required = contract.notional();
        if !self.has_collateral(required) {
            return Err(PortfolioError::InsufficientCollateral {
                available: self.cash,
                required,
            });
        }

        let premium = contract.total_premium();
        self.credit(
            premium,
            format!(
                "Premium from selling {} {} put(s)",
                contract.contracts, contract.symbol
            ),
            contract.entry_date,
        );
        self.open_positions.push(contract);
        Ok(())
    }

    /// Sell a covered call against an existing stock holding.
    pub fn sell_call(&mut self, contract: OptionContract) -> Result<(), PortfolioError> {
        debug_assert!(contract.is_open());
        let required = contract.shares();
        let held = self
            .holdings
            .get(&contract.symbol)
            .map(|h| h.shares)
            .unwrap_or(0);
        if held < required {
            return Err(PortfolioError::InsufficientCoverage {
                symbol: contract.symbol.clone(),
                held,
                required,
            });
        }

        let premium = contract.total_premium();
        self.credit(
            premium,
            format!(
                "Premium from selling {} {} call(s)",
                contract.contracts, contract.symbol
            ),
            contract.entry_date,
        );
        self.open_positions.push(contract);
        Ok(())
    }

    /// Resolve an expired put in the money: buy the stock at the strike.
    ///
    /// `index` refers to `open_positions` and must be in range; the engine
    /// is the only caller. Fails without side effects when cash cannot
    /// cover the purchase (possible under the non-escrowed collateral
    /// model).
    pub(crate) fn assign_put(
        &mut self,
        index: usize,
        spot: Decimal,
        date: NaiveDate,
    ) -> Result<(), PortfolioError> {
        let cost = self.open_positions[index].notional();
        let shares = self.open_positions[index].shares();
        let symbol = self.open_positions[index].symbol.clone();

        // Debit first; a failure leaves the position open and cash intact.
        self.debit(
            cost,
            format!("Put assigned: bought {} shares of {}", shares, symbol),
            date,
        )?;

        let mut contract = self.open_positions.remove(index);
        self.holdings.insert(
            contract.symbol.clone(),
            StockHolding {
                symbol: contract.symbol.clone(),
                shares,
                cost_basis: contract.strike,
                acquisition_date: date,
                assigned_from_put: true,
            },
        );

        contract.status = PositionStatus::Assigned;
        contract.exit_date = Some(date);
        contract.exit_spot = Some(spot);
        self.closed_positions.push(contract);
        Ok(())
    }

    /// Resolve an expired call in the money: sell the stock at the strike.
    ///
    /// Removes the holding entirely when its shares drop to exactly zero.
    pub(crate) fn assign_call(&mut self, index: usize, spot: Decimal, date: NaiveDate) {
        let mut contract = self.open_positions.remove(index);
        let shares = contract.shares();
        let proceeds = contract.notional();

        let fully_called = match self.holdings.get_mut(&contract.symbol) {
            Some(holding) if holding.shares > shares => {
                holding.shares -= shares;
                false
            }
            Some(_) => true,
            None => false,
        };
        if fully_called {
            self.holdings.remove(&contract.symbol);
        }

        self.credit(
            proceeds,
            format!("Call assigned: sold {} shares of {}", shares, contract.symbol),
            date,
        );

        contract.status = PositionStatus::CalledAway;
        contract.exit_date = Some(date);
        contract.exit_spot = Some(spot);
        self.closed_positions.push(contract);
    }

    /// Resolve an expired option out of the money. No cash movement; the
    /// premium was credited at origination.
    pub(crate) fn expire_worthless(&mut self, index: usize, spot: Decimal, date: NaiveDate) {
        let mut contract = self.open_positions.remove(index);
        contract.status = PositionStatus::ExpiredWorthless;
        contract.exit_date = Some(date);
        contract.exit_spot = Some(spot);
        self.closed_positions.push(contract);
    }

    /// Total portfolio value: cash plus stock at the given prices.
    /// Symbols without a price are valued at zero.
    pub fn total_value(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        let stock_value: Decimal = self
            .holdings
            .values()
            .map(|h| h.current_value(prices.get(&h.symbol).copied().unwrap_or(Decimal::ZERO)))
            .sum();
        self.cash + stock_value
    }

    /// Total premium collected across open and closed positions.
    pub fn total_premium_collected(&self) -> Decimal {
        self.open_positions
            .iter()
            .chain(self.closed_positions.iter())
            .map(|p| p.total_premium())
            .sum()
    }

    /// Build a snapshot at the given prices.
    pub fn snapshot(&self, prices: &HashMap<String, Decimal>) -> PortfolioSnapshot {
        let total_value = self.total_value(prices);
        let initial: f64 = self.initial_capital.try_into().unwrap_or(1.0);
        let value: f64 = total_value.try_into().unwrap_or(0.0);
        let total_return_pct = if initial != 0.0 {
            (value - initial) / initial * 100.0
        } else {
            0.0
        };

        let mut holdings: Vec<_> = self.holdings.values().cloned().collect();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        PortfolioSnapshot {
            cash: self.cash,
            holdings,
            open_positions: self.open_positions.clone(),
            closed_positions: self.closed_positions.clone(),
            total_value,
            total_premium_collected: self.total_premium_collected(),
            total_return_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::position::OptionType;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn put(symbol: &str, strike: Decimal, premium: Decimal, contracts: u32) -> OptionContract {
        OptionContract::new(
            symbol,
            OptionType::Put,
            strike,
            date(2024, 3, 15),
            premium,
            contracts,
            date(2024, 2, 14),
            strike + dec!(5),
        )
    }

    fn call(symbol: &str, strike: Decimal, premium: Decimal, contracts: u32) -> OptionContract {
        OptionContract::new(
            symbol,
            OptionType::Call,
            strike,
            date(2024, 3, 15),
            premium,
            contracts,
            date(2024, 2, 14),
            strike - dec!(5),
        )
    }

    #[test]
    fn test_sell_put_credits_premium() {
        let mut pf = Portfolio::new(dec!(10_000));
        pf.sell_put(put("KO", dec!(50), dec!(1.25), 1)).unwrap();

        assert_eq!(pf.cash(), dec!(10_125));
        assert_eq!(pf.open_positions().len(), 1);
        assert_eq!(pf.transactions().len(), 1);
        assert_eq!(pf.transactions()[0].flow, CashFlow::Credit);
    }

    #[test]
    fn test_sell_put_insufficient_collateral() {
        let mut pf = Portfolio::new(dec!(1_000));
        let err = pf.sell_put(put("KO", dec!(50), dec!(1.25), 1)).unwrap_err();

        assert_eq!(
            err,
            PortfolioError::InsufficientCollateral {
                available: dec!(1_000),
                required: dec!(5_000),
            }
        );
        // Rejection leaves state untouched
        assert_eq!(pf.cash(), dec!(1_000));
        assert!(pf.open_positions().is_empty());
        assert!(pf.transactions().is_empty());
    }

    #[test]
    fn test_collateral_not_escrowed() {
        // Two puts both pass the collateral check against the same cash.
        let mut pf = Portfolio::new(dec!(5_000));
        pf.sell_put(put("KO", dec!(50), dec!(1.00), 1)).unwrap();
        pf.sell_put(put("XOM", dec!(50), dec!(1.00), 1)).unwrap();
        assert_eq!(pf.open_positions().len(), 2);

        // First assignment drains the cash; the second fails cleanly.
        pf.assign_put(0, dec!(45), date(2024, 3, 15)).unwrap();
        let err = pf.assign_put(0, dec!(45), date(2024, 3, 15)).unwrap_err();
        assert!(matches!(err, PortfolioError::InsufficientCash { .. }));
        assert_eq!(pf.open_positions().len(), 1);
        assert!(pf.cash() >= Decimal::ZERO);
    }

    #[test]
    fn test_sell_call_requires_shares() {
        let mut pf = Portfolio::new(dec!(10_000));
        let err = pf.sell_call(call("KO", dec!(55), dec!(0.80), 1)).unwrap_err();
        assert_eq!(
            err,
            PortfolioError::InsufficientCoverage {
                symbol: "KO".to_string(),
                held: 0,
                required: 100,
            }
        );

        // Acquire 100 shares via assignment, then the call is covered.
        pf.sell_put(put("KO", dec!(50), dec!(1.00), 1)).unwrap();
        pf.assign_put(0, dec!(48), date(2024, 3, 15)).unwrap();
        pf.sell_call(call("KO", dec!(55), dec!(0.80), 1)).unwrap();
        assert_eq!(pf.open_positions().len(), 1);
    }

    #[test]
    fn test_assign_put_creates_holding() {
        let mut pf = Portfolio::new(dec!(10_000));
        pf.sell_put(put("KO", dec!(50), dec!(1.00), 1)).unwrap();

        pf.assign_put(0, dec!(45), date(2024, 3, 15)).unwrap();
        let resolved = pf.closed_positions().last().unwrap();
        assert_eq!(resolved.status, PositionStatus::Assigned);
        assert_eq!(resolved.exit_spot, Some(dec!(45)));
        assert_eq!(resolved.exit_date, Some(date(2024, 3, 15)));

        // 10,000 + 100 premium - 5,000 purchase
        assert_eq!(pf.cash(), dec!(5_100));
        let holding = &pf.holdings()["KO"];
        assert_eq!(holding.shares, 100);
        assert_eq!(holding.cost_basis, dec!(50));
        assert!(holding.assigned_from_put);
        assert!(pf.open_positions().is_empty());
        assert_eq!(pf.closed_positions().len(), 1);
    }

    #[test]
    fn test_assign_call_removes_exact_holding() {
        let mut pf = Portfolio::new(dec!(10_000));
        pf.sell_put(put("KO", dec!(50), dec!(1.00), 1)).unwrap();
        pf.assign_put(0, dec!(48), date(2024, 3, 1)).unwrap();
        pf.sell_call(call("KO", dec!(55), dec!(0.80), 1)).unwrap();

        pf.assign_call(0, dec!(58), date(2024, 3, 15));
        let resolved = pf.closed_positions().last().unwrap();
        assert_eq!(resolved.status, PositionStatus::CalledAway);

        // Holding at exactly contracts x 100 is removed, not left at zero
        assert!(!pf.holdings().contains_key("KO"));
        // 10,000 + 100 put premium - 5,000 purchase + 80 call premium + 5,500 sale
        assert_eq!(pf.cash(), dec!(10_680));
    }

    #[test]
    fn test_assign_call_partial_reduction() {
        let mut pf = Portfolio::new(dec!(20_000));
        pf.sell_put(put("KO", dec!(50), dec!(1.00), 2)).unwrap();
        pf.assign_put(0, dec!(48), date(2024, 3, 1)).unwrap();
        assert_eq!(pf.holdings()["KO"].shares, 200);

        pf.sell_call(call("KO", dec!(55), dec!(0.80), 1)).unwrap();
        pf.assign_call(0, dec!(58), date(2024, 3, 15));
        assert_eq!(pf.holdings()["KO"].shares, 100);
    }

    #[test]
    fn test_expire_worthless_no_cash_movement() {
        let mut pf = Portfolio::new(dec!(10_000));
        pf.sell_put(put("KO", dec!(50), dec!(1.00), 1)).unwrap();
        let cash_after_sale = pf.cash();

        pf.expire_worthless(0, dec!(55), date(2024, 3, 15));
        let resolved = pf.closed_positions().last().unwrap();
        assert_eq!(resolved.status, PositionStatus::ExpiredWorthless);
        assert_eq!(pf.cash(), cash_after_sale);
        assert_eq!(pf.transactions().len(), 1); // only the premium credit
    }

    #[test]
    fn test_total_value_and_premium() {
        let mut pf = Portfolio::new(dec!(10_000));
        pf.sell_put(put("KO", dec!(50), dec!(1.00), 1)).unwrap();
        pf.assign_put(0, dec!(48), date(2024, 3, 1)).unwrap();
        pf.sell_call(call("KO", dec!(55), dec!(0.80), 1)).unwrap();

        let mut prices = HashMap::new();
        prices.insert("KO".to_string(), dec!(52));
        // 5,180 cash + 100 shares * 52
        assert_eq!(pf.total_value(&prices), dec!(10_380));
        // Missing price values the holding at zero
        assert_eq!(pf.total_value(&HashMap::new()), dec!(5_180));

        assert_eq!(pf.total_premium_collected(), dec!(180));
    }

    #[test]
    fn test_snapshot() {
        let mut pf = Portfolio::new(dec!(10_000));
        pf.sell_put(put("KO", dec!(50), dec!(1.00), 1)).unwrap();

        let snap = pf.snapshot(&HashMap::new());
        assert_eq!(snap.cash, dec!(10_100));
        assert_eq!(snap.total_value, dec!(10_100));
        assert_eq!(snap.open_positions.len(), 1);
        assert!(snap.closed_positions.is_empty());
        assert!((snap.total_return_pct - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deposit_logged() {
        let mut pf = Portfolio::new(dec!(0));
        pf.deposit(dec!(2_500), "initial funding", date(2024, 1, 2));
        assert_eq!(pf.cash(), dec!(2_500));
        assert_eq!(pf.transactions().len(), 1);
        assert_eq!(pf.transactions()[0].reason, "initial funding");
    }
}
