use crate::values::{AgentId, GoodId, GoodKind, Price};
use serde::{Deserialize, Serialize};

/// Record of one settled exchange: one good instance moved from seller to
/// buyer against `price`. The crossing quote prices are kept so observers
/// can verify `ask_price <= price <= bid_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub buyer: AgentId,
    pub seller: AgentId,
    pub good: GoodId,
    pub kind: GoodKind,
    pub price: Price,
    pub bid_price: Price,
    pub ask_price: Price,
}

/// Outcome of the settlement choke point.
///
/// Bankruptcy is a domain event, not an error: the match is aborted with
/// both quotes left in place, and the caller must hand the agent to the
/// simulation driver for removal. It is never retried by matching code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum TradeOutcome {
    Completed(Trade),
    BuyerBankrupt(AgentId),
}

/// Outcome of one clearing step (a matching pass or an auction round).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ClearingOutcome {
    /// Nothing crossed; the books are unchanged.
    NoTrade,
    /// At least one trade settled.
    Traded,
    /// A buyer could not pay; its quotes are untouched and the driver
    /// must retire the agent before clearing continues.
    Bankrupt(AgentId),
}
