use crate::values::{AgentId, GoodId, GoodKind, Price, QuoteId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the market a quote sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// A standing offer to buy at or below the quoted price.
    Bid,
    /// A standing offer to sell at or above the quoted price.
    Ask,
}

/// An accounting tag naming the department (or sub-unit) that placed a
/// quote on an agent's behalf. Never consulted during matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginatorTag(String);

impl OriginatorTag {
    pub fn new(name: &str) -> Self {
        OriginatorTag(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A standing offer to buy or sell one unit at a given price.
///
/// Quotes are immutable once created: a cancelled or filled quote is simply
/// removed from whatever book holds it, there is no tombstone state. Ask
/// quotes reference the specific good instance on sale; bid quotes only
/// name the good kind of their market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    id: QuoteId,
    side: Side,
    agent: AgentId,
    price: Price,
    good: Option<GoodId>,
    kind: GoodKind,
    originator: Option<OriginatorTag>,
}

impl Quote {
    /// A seller's offer on a specific good instance.
    pub fn new_ask(id: QuoteId, seller: AgentId, price: Price, good: GoodId, kind: GoodKind) -> Self {
        Quote {
            id,
            side: Side::Ask,
            agent: seller,
            price,
            good: Some(good),
            kind,
            originator: None,
        }
    }

    /// A buyer's offer on any unit of the market's good kind.
    pub fn new_bid(id: QuoteId, buyer: AgentId, price: Price, kind: GoodKind) -> Self {
        Quote {
            id,
            side: Side::Bid,
            agent: buyer,
            price,
            good: None,
            kind,
            originator: None,
        }
    }

    pub fn with_originator(mut self, tag: OriginatorTag) -> Self {
        self.originator = Some(tag);
        self
    }

    pub fn id(&self) -> QuoteId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// The specific good instance, present on ask quotes only.
    pub fn good(&self) -> Option<GoodId> {
        self.good
    }

    pub fn kind(&self) -> &GoodKind {
        &self.kind
    }

    pub fn originator(&self) -> Option<&OriginatorTag> {
        self.originator.as_ref()
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            Side::Bid => "bid",
            Side::Ask => "ask",
        };
        write!(f, "{} {} @ {} by {}", side, self.kind, self.price, self.agent)
    }
}

/// What a market reports back from a quote submission.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum SubmitOutcome {
    /// The quote is resting in the book; keep its id to cancel it later.
    Live(Quote),
    /// Matching consumed the quote synchronously; the owner already received
    /// its fill callback and must not track the quote as pending.
    Filled,
    /// Settlement aborted because this buyer could not pay. The simulation
    /// driver must retire the agent; the order is not retried.
    Bankrupt(AgentId),
}

/// One seller's best standing ask, as shown to a buyer choosing a supplier
/// in the sequential auction. A read-only projection of the seller board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellerOffer {
    pub seller: AgentId,
    pub price: Price,
    pub good: GoodId,
}
