//! Agora Core Domain
//!
//! Pure domain types for the Agora market simulation.
//! This crate contains no I/O, no scheduling machinery, and is 100% unit testable.

pub mod event;
pub mod good;
pub mod quote;
pub mod trade;
pub mod values;

// Re-export commonly used types at crate root
pub use event::{ClearingEvent, ClearingStep};
pub use good::Good;
pub use quote::{OriginatorTag, Quote, SellerOffer, Side, SubmitOutcome};
pub use trade::{ClearingOutcome, Trade, TradeOutcome};
pub use values::{AgentId, GoodId, GoodKind, Money, Phase, Price, Priority, QuoteId};
