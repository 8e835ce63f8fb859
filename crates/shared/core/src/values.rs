//! Value objects shared across the simulation: money, identifiers,
//! and the day/phase/priority coordinates of the discrete-event schedule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cash amounts held by agents. Signed so that book-keeping code can
/// express debits without wrapping.
pub type Money = i64;

/// A quoted or traded price. Non-negative by construction and bounded by
/// `Money::MAX` so settlement never wraps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Price(u64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Largest representable price, the cash range's upper bound.
    pub const MAX: Price = Price(Money::MAX as u64);

    pub fn new(value: u64) -> Self {
        debug_assert!(value <= Self::MAX.0);
        Price(value)
    }

    pub fn inner(self) -> u64 {
        self.0
    }

    /// The price as a cash amount, for settlement against agent wallets.
    /// Lossless for every price within [`Price::MAX`].
    pub fn as_money(self) -> Money {
        self.0 as Money
    }
}

impl From<u64> for Price {
    fn from(value: u64) -> Self {
        Price::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one economic agent for the lifetime of the simulation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

/// Identifies one live quote within its market.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct QuoteId(pub u64);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quote-{}", self.0)
    }
}

/// Identifies one specific good instance (the unit a seller actually holds).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GoodId(pub u64);

impl fmt::Display for GoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "good-{}", self.0)
    }
}

/// The kind of good a market trades. One market instance trades exactly
/// one kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoodKind(String);

impl GoodKind {
    pub fn new(name: &str) -> Self {
        GoodKind(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The phases every simulated day walks through, in order. Within a day
/// the scheduler exhausts one phase before moving to the next.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Phase {
    Dawn,
    Production,
    PrepareToTrade,
    Trade,
    AdjustPrices,
    Think,
    CleanupDataGathering,
}

impl Phase {
    /// All phases in daily execution order.
    pub const ALL: [Phase; 7] = [
        Phase::Dawn,
        Phase::Production,
        Phase::PrepareToTrade,
        Phase::Trade,
        Phase::AdjustPrices,
        Phase::Think,
        Phase::CleanupDataGathering,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Dawn => "dawn",
            Phase::Production => "production",
            Phase::PrepareToTrade => "prepare-to-trade",
            Phase::Trade => "trade",
            Phase::AdjustPrices => "adjust-prices",
            Phase::Think => "think",
            Phase::CleanupDataGathering => "cleanup-data-gathering",
        };
        f.write_str(name)
    }
}

/// Priority of a callback within its phase. Lower priorities run first;
/// `Final` runs after every agent has acted, which is what batched
/// clearing relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    Before,
    Standard,
    After,
    Final,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_order_matches_daily_sequence() {
        assert!(Phase::Dawn < Phase::Trade);
        assert!(Phase::Trade < Phase::CleanupDataGathering);
        let mut sorted = Phase::ALL;
        sorted.sort();
        assert_eq!(sorted, Phase::ALL);
    }

    #[test]
    fn final_priority_runs_last() {
        assert!(Priority::Before < Priority::Standard);
        assert!(Priority::After < Priority::Final);
    }

    #[test]
    fn price_converts_to_money() {
        assert_eq!(Price::new(42).as_money(), 42i64);
        assert_eq!(Price::ZERO.inner(), 0);
    }

    #[test]
    fn the_largest_price_settles_without_wrapping() {
        let top = Price::MAX;
        assert_eq!(top.as_money(), Money::MAX);
        assert!(top.as_money() > 0);
    }
}
