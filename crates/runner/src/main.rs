//! Run one configured simulation and print its summary as JSON.
//!
//! Usage: `agora [config.json]` — without an argument the default scenario
//! runs. Logging is controlled through `RUST_LOG`.

use agora_runner::{Simulation, SimulationConfig};
use std::error::Error;
use std::fs;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        }
        None => SimulationConfig::default(),
    };
    log::info!(
        "running {} days of '{}' on the {} topology",
        config.days,
        config.good,
        config.topology
    );

    let mut simulation = Simulation::new(config)?;
    let summary = simulation.run()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
