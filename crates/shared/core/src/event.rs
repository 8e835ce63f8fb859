use crate::values::GoodKind;
use serde::{Deserialize, Serialize};

/// What a scheduled clearing callback should do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearingStep {
    /// Run one batched matching pass over an order book.
    MatchBook,
    /// Run one round of the sequential auction (one buyer considered).
    AuctionRound,
}

/// A clearing callback registered with the discrete-event scheduler,
/// addressed to the market trading `good`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingEvent {
    pub good: GoodKind,
    pub step: ClearingStep,
}

impl ClearingEvent {
    pub fn new(good: GoodKind, step: ClearingStep) -> Self {
        ClearingEvent { good, step }
    }
}
