//! # Print an option chain as of the first trading date
//! wheel-sim chain --data prices.json --symbol KO --dte 30
//!
//! # Run a scripted session: open puts, step the clock, report events
//! wheel-sim run --data prices.json --days 30 --put KO:50:30:1

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use wheel_sim::market::HistoricalData;
use wheel_sim::sim::{SimConfig, Simulator};

#[derive(Parser)]
#[command(name = "wheel-sim")]
#[command(about = "Wheel strategy options simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a priced option chain for a symbol
    Chain {
        /// Path to JSON price history ({"SYM": [["YYYY-MM-DD", close], ...]})
        #[arg(short, long)]
        data: String,

        /// Underlying symbol
        #[arg(short, long)]
        symbol: String,

        /// Days to expiration
        #[arg(long, default_value_t = 30)]
        dte: usize,

        /// Strikes on each side of spot
        #[arg(long, default_value_t = 5)]
        strikes: u32,
    },

    /// Advance the simulation day by day and report expiration events
    Run {
        /// Path to JSON price history
        #[arg(short, long)]
        data: String,

        /// Trading days to simulate
        #[arg(long, default_value_t = 30)]
        days: usize,

        /// Starting cash
        #[arg(long, default_value_t = 100_000)]
        capital: i64,

        /// Puts to sell on day one, as SYMBOL:STRIKE:DTE:CONTRACTS
        #[arg(long = "put", value_name = "SPEC")]
        puts: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wheel_sim=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chain {
            data,
            symbol,
            dte,
            strikes,
        } => {
            let history = HistoricalData::from_json_file(&data)
                .with_context(|| format!("loading price history from {}", data))?;
            let config = SimConfig::with_symbols(vec![symbol.clone()]);
            let sim = Simulator::new(config, history)?;

            println!(
                "Option chain for {} on {} ({} DTE)",
                symbol,
                sim.current_date(),
                dte
            );
            println!(
                "{:>10} {:>12} {:>12} {:>9} {:>9}",
                "Strike", "Call", "Put", "Call %", "Put %"
            );
            for row in sim.option_chain(&symbol, dte, strikes)? {
                println!(
                    "{:>10} {:>12} {:>12} {:>8.2}% {:>8.2}%",
                    row.strike, row.call_premium, row.put_premium, row.call_pct, row.put_pct
                );
            }
        }

        Commands::Run {
            data,
            days,
            capital,
            puts,
        } => {
            let history = HistoricalData::from_json_file(&data)
                .with_context(|| format!("loading price history from {}", data))?;
            let symbols: Vec<String> = history.symbols().iter().map(|s| s.to_string()).collect();
            let config = SimConfig {
                symbols,
                initial_capital: Decimal::from(capital),
                ..Default::default()
            };
            let mut sim = Simulator::new(config, history)?;

            println!("Session start: {}", sim.current_date());
            for spec in &puts {
                let (symbol, strike, dte, contracts) = parse_put_spec(spec)?;
                match sim.open_put(&symbol, strike, dte, contracts) {
                    Ok(contract) => println!(
                        "Sold {} {} {} put(s) @ {} exp {}",
                        contract.contracts,
                        contract.symbol,
                        contract.strike,
                        contract.premium_per_share.round_dp(2),
                        contract.expiration
                    ),
                    Err(err) => println!("Rejected {}: {}", spec, err),
                }
            }

            for _ in 0..days {
                let outcome = sim.advance_day(1);
                for event in &outcome.events {
                    println!("{}: {}", outcome.date, serde_json::to_string(event)?);
                }
                if !outcome.advanced {
                    println!("End of price history reached at {}", outcome.date);
                    break;
                }
            }

            let snapshot = sim.snapshot();
            println!("\nFinal state as of {}", sim.current_date());
            println!("  Cash:              {}", snapshot.cash.round_dp(2));
            println!("  Total value:       {}", snapshot.total_value.round_dp(2));
            println!("  Total return:      {:+.2}%", snapshot.total_return_pct);
            println!(
                "  Premium collected: {}",
                snapshot.total_premium_collected.round_dp(2)
            );
            for holding in &snapshot.holdings {
                println!(
                    "  Holding: {} x {} @ {}",
                    holding.shares, holding.symbol, holding.cost_basis
                );
            }
            println!(
                "  Open positions: {}, closed: {}",
                snapshot.open_positions.len(),
                snapshot.closed_positions.len()
            );
        }
    }

    Ok(())
}

/// Parse SYMBOL:STRIKE:DTE:CONTRACTS.
fn parse_put_spec(spec: &str) -> Result<(String, Decimal, usize, u32)> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        anyhow::bail!("expected SYMBOL:STRIKE:DTE:CONTRACTS, got {}", spec);
    }
    Ok((
        parts[0].to_string(),
        parts[1]
            .parse()
            .with_context(|| format!("bad strike in {}", spec))?,
        parts[2]
            .parse()
            .with_context(|| format!("bad dte in {}", spec))?,
        parts[3]
            .parse()
            .with_context(|| format!("bad contract count in {}", spec))?,
    ))
}
