//! Agora Ports
//!
//! Trait boundaries between the market engine and the rest of the
//! simulation: agents, pricing policies, trade observers, and the
//! discrete-event scheduler. Implementations live in the other crates;
//! this one only defines the seams plus the shared error taxonomy.

pub mod agent;
pub mod error;
pub mod listener;
pub mod pricing;
pub mod scheduler;

pub use agent::EconomicAgent;
pub use error::{MarketError, MarketResult};
pub use listener::TradeListener;
pub use pricing::PricePolicy;
pub use scheduler::PhaseScheduler;
