//! The wheel-strategy simulation engine.
//!
//! Owns the trading-day clock and the portfolio, prices new positions off
//! the market data provider, and resolves expirations into portfolio
//! transitions when the clock advances:
//!
//! 1. `advance_day` moves the clock (clamped at the calendar end)
//! 2. each open position past its expiration is resolved against the spot
//!    price at the landing date: ITM puts are assigned, ITM calls called
//!    away, everything else expires worthless
//! 3. structured events describing the resolutions are returned for the
//!    presentation layer to render
//!
//! Expirations are evaluated only at the date the clock lands on. A
//! position whose expiration falls inside a multi-day jump is resolved
//! with the landing date's spot, not the spot on its true expiration date.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::market::MarketData;
use crate::portfolio::{
    OptionContract, OptionType, Portfolio, PortfolioError, PortfolioSnapshot,
};
use crate::pricing::{generate_strikes, BlackScholes, DEFAULT_SPACING};

use super::clock::SimulationClock;
use super::config::SimConfig;
use super::events::{AdvanceOutcome, ExpirationEvent};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("no trading dates available for the reference symbol")]
    NoTradingDates,

    #[error("no price available for {symbol} on {date}")]
    NoPrice { symbol: String, date: NaiveDate },

    #[error(
        "invalid pricing input for {symbol}: spot={spot}, strike={strike}, volatility={volatility}"
    )]
    InvalidPricingInput {
        symbol: String,
        spot: Decimal,
        strike: Decimal,
        volatility: f64,
    },

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
}

/// One row of a generated option chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainRow {
    pub strike: Decimal,
    pub call_premium: Decimal,
    pub put_premium: Decimal,
    /// Call premium as a percentage of spot.
    pub call_pct: f64,
    /// Put premium as a percentage of spot.
    pub put_pct: f64,
}

/// One row of the market overview.
#[derive(Debug, Clone, Serialize)]
pub struct MarketOverviewRow {
    pub symbol: String,
    pub price: Decimal,
    pub volatility: f64,
    pub has_stock: bool,
    pub has_option: bool,
}

/// The simulation engine, generic over the market data provider.
#[derive(Debug)]
pub struct Simulator<D: MarketData> {
    config: SimConfig,
    data: D,
    model: BlackScholes,
    portfolio: Portfolio,
    clock: SimulationClock,
}

impl<D: MarketData> Simulator<D> {
    /// Build and initialize a simulator. Loads the trading calendar from
    /// the first configured symbol; fails when the calendar is empty.
    pub fn new(config: SimConfig, data: D) -> Result<Self, SimError> {
        let reference = config.symbols.first().ok_or(SimError::NoTradingDates)?;
        let clock =
            SimulationClock::new(data.trading_dates(reference)).ok_or(SimError::NoTradingDates)?;

        info!(
            trading_days = clock.len(),
            start = %clock.first_date(),
            end = %clock.last_date(),
            "simulation initialized"
        );

        Ok(Self {
            model: BlackScholes::new(config.risk_free_rate),
            portfolio: Portfolio::new(config.initial_capital),
            config,
            data,
            clock,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn current_date(&self) -> NaiveDate {
        self.clock.current_date()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Advance the clock by `days` trading days and resolve expirations at
    /// the landing date.
    ///
    /// A step past the end of the calendar clamps to the last date and
    /// returns `advanced: false` with no events; repeated calls keep
    /// reporting the same outcome.
    pub fn advance_day(&mut self, days: usize) -> AdvanceOutcome {
        if !self.clock.advance(days) {
            return AdvanceOutcome {
                advanced: false,
                date: self.clock.current_date(),
                events: Vec::new(),
            };
        }

        let date = self.clock.current_date();
        let events = self.process_expirations(date);
        AdvanceOutcome {
            advanced: true,
            date,
            events,
        }
    }

    /// Resolve every open position expired as of `date`, in position order.
    ///
    /// Expiring exactly at the strike resolves out of the money for both
    /// sides; assignment requires a strict breach.
    fn process_expirations(&mut self, date: NaiveDate) -> Vec<ExpirationEvent> {
        let mut events = Vec::new();
        let mut i = 0;

        while i < self.portfolio.open_positions().len() {
            let position = &self.portfolio.open_positions()[i];
            if !position.is_expired(date) {
                i += 1;
                continue;
            }

            let symbol = position.symbol.clone();
            let option_type = position.option_type;
            let strike = position.strike;
            let shares = position.shares();
            let notional = position.notional();
            let premium = position.total_premium();
            // A symbol with no close on this date resolves against zero,
            // which assigns puts and lets calls lapse.
            let spot = self
                .data
                .close_price(&symbol, date)
                .unwrap_or(Decimal::ZERO);

            match option_type {
                OptionType::Put if spot < strike => {
                    match self.portfolio.assign_put(i, spot, date) {
                        Ok(()) => {
                            info!(%symbol, %strike, %spot, shares, "put assigned");
                            events.push(ExpirationEvent::PutAssigned {
                                symbol,
                                strike,
                                shares,
                                total_cost: notional,
                                spot,
                            });
                        }
                        Err(err) => {
                            // Non-escrowed collateral can leave the cash
                            // short when several puts finish ITM together.
                            // The position stays open and is retried on the
                            // next advance.
                            warn!(%symbol, %strike, %err, "put assignment failed");
                            i += 1;
                        }
                    }
                }
                OptionType::Call if spot > strike => {
                    self.portfolio.assign_call(i, spot, date);
                    info!(%symbol, %strike, %spot, shares, "call assigned");
                    events.push(ExpirationEvent::CallAssigned {
                        symbol,
                        strike,
                        shares,
                        total_proceeds: notional,
                        spot,
                    });
                }
                _ => {
                    self.portfolio.expire_worthless(i, spot, date);
                    info!(%symbol, %strike, %spot, "expired worthless");
                    events.push(ExpirationEvent::ExpiredWorthless {
                        symbol,
                        strike,
                        option_type,
                        premium_kept: premium,
                        spot,
                    });
                }
            }
        }

        events
    }

    /// Sell a cash-secured put at the current date.
    pub fn open_put(
        &mut self,
        symbol: &str,
        strike: Decimal,
        days_to_expiration: usize,
        contracts: u32,
    ) -> Result<OptionContract, SimError> {
        self.open_position(OptionType::Put, symbol, strike, days_to_expiration, contracts)
    }

    /// Sell a covered call at the current date.
    pub fn open_call(
        &mut self,
        symbol: &str,
        strike: Decimal,
        days_to_expiration: usize,
        contracts: u32,
    ) -> Result<OptionContract, SimError> {
        self.open_position(OptionType::Call, symbol, strike, days_to_expiration, contracts)
    }

    fn open_position(
        &mut self,
        option_type: OptionType,
        symbol: &str,
        strike: Decimal,
        days_to_expiration: usize,
        contracts: u32,
    ) -> Result<OptionContract, SimError> {
        let date = self.clock.current_date();
        let (spot, volatility) = self.spot_and_volatility(symbol, date, strike)?;

        let spot_f: f64 = spot.try_into().unwrap_or(0.0);
        let strike_f: f64 = strike.try_into().unwrap_or(0.0);
        let time = days_to_expiration as f64 / 365.0;
        let premium_f = self.model.price(option_type, spot_f, strike_f, time, volatility);
        let premium = Decimal::try_from(premium_f).unwrap_or(Decimal::ZERO);

        // Expiration is measured in trading days, clamped to the calendar.
        let expiration = self.clock.peek_forward(days_to_expiration);

        let contract = OptionContract::new(
            symbol, option_type, strike, expiration, premium, contracts, date, spot,
        );

        let result = match option_type {
            OptionType::Put => self.portfolio.sell_put(contract.clone()),
            OptionType::Call => self.portfolio.sell_call(contract.clone()),
        };
        if let Err(err) = result {
            warn!(%symbol, %strike, %err, "order rejected");
            return Err(err.into());
        }

        info!(
            %symbol,
            side = option_type.as_str(),
            %strike,
            %premium,
            contracts,
            %expiration,
            "position opened"
        );
        Ok(contract)
    }

    /// Spot and volatility for pricing, guarded against degenerate inputs
    /// before they reach the model.
    fn spot_and_volatility(
        &self,
        symbol: &str,
        date: NaiveDate,
        strike: Decimal,
    ) -> Result<(Decimal, f64), SimError> {
        let spot = self
            .data
            .close_price(symbol, date)
            .ok_or_else(|| SimError::NoPrice {
                symbol: symbol.to_string(),
                date,
            })?;
        let volatility = self
            .data
            .historical_volatility(symbol, date, self.config.volatility_window);

        if spot <= Decimal::ZERO || strike <= Decimal::ZERO || volatility <= 0.0 {
            return Err(SimError::InvalidPricingInput {
                symbol: symbol.to_string(),
                spot,
                strike,
                volatility,
            });
        }
        Ok((spot, volatility))
    }

    /// Spot price per tracked symbol at the current date; missing or
    /// non-positive prices are reported as zero.
    pub fn current_prices(&self) -> HashMap<String, Decimal> {
        let date = self.clock.current_date();
        self.config
            .symbols
            .iter()
            .map(|symbol| {
                let price = self
                    .data
                    .close_price(symbol, date)
                    .filter(|p| *p > Decimal::ZERO)
                    .unwrap_or(Decimal::ZERO);
                (symbol.clone(), price)
            })
            .collect()
    }

    /// Generate a priced option chain around the current spot. Read-only.
    pub fn option_chain(
        &self,
        symbol: &str,
        days_to_expiration: usize,
        strikes_per_side: u32,
    ) -> Result<Vec<ChainRow>, SimError> {
        let date = self.clock.current_date();
        // Any positive strike validates the remaining inputs.
        let (spot, volatility) = self.spot_and_volatility(symbol, date, Decimal::ONE)?;

        let spot_f: f64 = spot.try_into().unwrap_or(0.0);
        let time = days_to_expiration as f64 / 365.0;

        let rows = generate_strikes(spot, strikes_per_side, DEFAULT_SPACING)
            .into_iter()
            .map(|strike| {
                let strike_f: f64 = strike.try_into().unwrap_or(0.0);
                let call = self.model.call_price(spot_f, strike_f, time, volatility);
                let put = self.model.put_price(spot_f, strike_f, time, volatility);
                ChainRow {
                    strike,
                    call_premium: Decimal::try_from(call).unwrap_or(Decimal::ZERO).round_dp(2),
                    put_premium: Decimal::try_from(put).unwrap_or(Decimal::ZERO).round_dp(2),
                    call_pct: call / spot_f * 100.0,
                    put_pct: put / spot_f * 100.0,
                }
            })
            .collect();
        Ok(rows)
    }

    /// Price and volatility per tracked symbol, with position flags.
    pub fn market_overview(&self) -> Vec<MarketOverviewRow> {
        let date = self.clock.current_date();
        self.config
            .symbols
            .iter()
            .map(|symbol| {
                let price = self
                    .data
                    .close_price(symbol, date)
                    .filter(|p| *p > Decimal::ZERO)
                    .unwrap_or(Decimal::ZERO);
                let volatility =
                    self.data
                        .historical_volatility(symbol, date, self.config.volatility_window);
                MarketOverviewRow {
                    symbol: symbol.clone(),
                    price,
                    volatility,
                    has_stock: self.portfolio.holdings().contains_key(symbol),
                    has_option: self
                        .portfolio
                        .open_positions()
                        .iter()
                        .any(|p| &p.symbol == symbol),
                }
            })
            .collect()
    }

    /// Portfolio snapshot valued at the current date's prices.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.portfolio.snapshot(&self.current_prices())
    }
}
