//! Demo binary: run a seeded agent-based simulation and print the book.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use matchbook::{
    InformedTrader, MarketMaker, NoiseTrader, Side, SimConfig, Simulation,
};

#[derive(Parser, Debug)]
#[command(name = "sim", about = "Agent-based matching engine simulation")]
struct Args {
    /// RNG seed; reruns with the same seed replay identically
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of simulation ticks
    #[arg(long, default_value_t = 200)]
    ticks: u32,

    /// Number of noise traders
    #[arg(long, default_value_t = 4)]
    noise_traders: usize,

    /// Base price the midpoint falls back to while the book is empty
    #[arg(long, default_value_t = 100.0)]
    base_price: f64,

    /// The informed trader's private value estimate
    #[arg(long, default_value_t = 101.5)]
    true_value: f64,

    /// Write the trade tape to this CSV file
    #[arg(long)]
    trade_log: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let base_price =
        Decimal::from_f64(args.base_price).ok_or("base price is not a valid decimal")?;
    let true_value =
        Decimal::from_f64(args.true_value).ok_or("true value is not a valid decimal")?;

    let mut sim = Simulation::new(SimConfig {
        seed: args.seed,
        ticks: args.ticks,
        delta_t: 1.0,
        base_price,
    });

    sim.add_strategy(Box::new(MarketMaker::new("mm-1")));
    for i in 0..args.noise_traders {
        sim.add_strategy(Box::new(NoiseTrader::new(
            format!("noise-{i}"),
            0.4,
            0.02,
            (1.0, 100.0),
        )));
    }
    sim.add_strategy(Box::new(InformedTrader::new(
        "informed-1",
        true_value,
        50.0,
        0.01,
        0.3,
        (10.0, 100.0),
    )));

    sim.run();

    print_book(&sim);
    print_summary(&sim);

    if let Some(path) = args.trade_log {
        write_trade_log(&sim, &path)?;
        println!("trade tape written to {}", path.display());
    }

    Ok(())
}

fn print_book(sim: &Simulation) {
    let (bid, ask) = sim.engine().top_of_book();
    println!("\n=== ORDER BOOK ===");
    println!(
        "top of book: bid={} ask={}",
        bid.map_or("-".to_string(), |p| p.to_string()),
        ask.map_or("-".to_string(), |p| p.to_string()),
    );
    if let Some(spread) = sim.engine().spread() {
        println!("spread: {spread}");
    }

    println!("\nbids:");
    for (price, quantity) in sim.engine().depth(Side::Buy).iter().take(10) {
        println!("  {price:>10} | {quantity}");
    }
    println!("asks:");
    for (price, quantity) in sim.engine().depth(Side::Sell).iter().take(10) {
        println!("  {price:>10} | {quantity}");
    }
}

fn print_summary(sim: &Simulation) {
    let summary = sim.summary();
    println!("\n=== SUMMARY ===");
    println!("orders accepted:  {}", summary.orders_accepted);
    println!("trades executed:  {}", summary.trades);
    println!("orders cancelled: {}", summary.orders_cancelled);
    println!("orders rejected:  {}", summary.orders_rejected);
    println!("total volume:     {}", summary.total_volume);
    if let Some(vwap) = summary.vwap {
        println!("vwap:             {}", vwap.round_dp(4));
    }
}

fn write_trade_log(sim: &Simulation, path: &std::path::Path) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for trade in &sim.engine().listener().trades {
        writer.serialize(trade)?;
    }
    writer.flush()?;
    Ok(())
}
