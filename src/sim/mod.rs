//! Simulation engine: trading-day clock, configuration, events, and the
//! day-stepping state machine.

mod clock;
mod config;
mod engine;
mod events;

pub use clock::SimulationClock;
pub use config::SimConfig;
pub use engine::{ChainRow, MarketOverviewRow, SimError, Simulator};
pub use events::{AdvanceOutcome, ExpirationEvent};
