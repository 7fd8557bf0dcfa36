//! Black-Scholes closed-form option pricing.
//!
//! Premiums are floored at zero. At or past expiration (`time <= 0`) the
//! model returns intrinsic value without consulting rate or volatility.
//!
//! Degenerate inputs (non-positive spot, strike, or volatility) are the
//! caller's responsibility; the simulation engine guards before invoking.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::portfolio::OptionType;

/// Black-Scholes calculator for European option premiums.
#[derive(Debug, Clone, Copy)]
pub struct BlackScholes {
    /// Annualized risk-free interest rate.
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self { rate: 0.045 }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Calculate d1 parameter.
    fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        ((spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
    }

    /// Calculate d2 parameter.
    fn d2(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        self.d1(spot, strike, time, vol) - vol * time.sqrt()
    }

    /// Standard normal CDF.
    fn norm_cdf(x: f64) -> f64 {
        let normal = Normal::new(0.0, 1.0).unwrap();
        normal.cdf(x)
    }

    /// Calculate call option premium per share.
    pub fn call_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        if time <= 0.0 {
            return (spot - strike).max(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        let call = spot * Self::norm_cdf(d1) - strike * (-self.rate * time).exp() * Self::norm_cdf(d2);
        call.max(0.0)
    }

    /// Calculate put option premium per share.
    pub fn put_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        if time <= 0.0 {
            return (strike - spot).max(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        let put = strike * (-self.rate * time).exp() * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1);
        put.max(0.0)
    }

    /// Calculate option premium for either side.
    pub fn price(&self, option_type: OptionType, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        match option_type {
            OptionType::Call => self.call_price(spot, strike, time, vol),
            OptionType::Put => self.put_price(spot, strike, time, vol),
        }
    }
}
