use agora_core::{AgentId, GoodId, QuoteId};
use thiserror::Error;

/// Caller mistakes and unsupported operations. Domain events such as a
/// buyer going bankrupt are not errors; they come back as tagged outcomes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("agent {0} is not registered on this market")]
    NotRegistered(AgentId),

    #[error("agent {0} is already registered on this market")]
    AlreadyRegistered(AgentId),

    #[error("no live quote with id {0}")]
    UnknownQuote(QuoteId),

    #[error("this market does not accept quotes")]
    QuotingNotSupported,

    #[error("the order book is not visible on this market")]
    BookNotVisible,

    #[error("the market is closed")]
    MarketClosed,

    #[error("agent {0} cannot trade with itself")]
    SelfTrade(AgentId),

    #[error("agent {agent} does not hold good {good}")]
    GoodNotHeld { agent: AgentId, good: GoodId },

    #[error("agent {0} chose a supplier with no standing offer")]
    NoSuchOffer(AgentId),
}

pub type MarketResult<T> = Result<T, MarketError>;
