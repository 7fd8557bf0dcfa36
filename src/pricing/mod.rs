//! Option pricing: Black-Scholes model and strike ladder generation.

mod black_scholes;
mod strikes;

pub use black_scholes::BlackScholes;
pub use strikes::{generate_strikes, DEFAULT_SPACING};
