//! Agora Runner
//!
//! The simulation driver: wires a configured market topology to a pool of
//! demo agents, pumps the discrete-event queue day by day, and reports a
//! summary at the end.

pub mod agents;
pub mod config;
pub mod simulation;

pub use agents::{FixedBudgetBuyer, FixedPriceSeller};
pub use config::{MarketTopology, SimulationConfig};
pub use simulation::{SimEvent, Simulation, SimulationSummary};
