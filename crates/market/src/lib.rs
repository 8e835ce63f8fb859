//! Agora Market
//!
//! The market clearing subsystem: the `Market` contract, the order-book
//! market with pluggable order handlers, the discriminatory sequential
//! auction, the bookless decentralized market, and per-market statistics.
//!
//! All topologies settle through `MarketCore::trade`, the single choke
//! point that moves goods and cash, keeps the records honest, and turns
//! an unpayable buyer into a tagged `BuyerBankrupt` outcome instead of an
//! error.

pub mod auction;
pub mod base;
pub mod book;
pub mod decentralized;
pub mod handlers;
pub mod market;
pub mod order_book_market;
pub mod pool;
pub mod records;

pub use auction::SequentialAuctionMarket;
pub use base::{MarketConfig, MarketCore};
pub use book::{BookSide, OrderBook};
pub use decentralized::DecentralizedMarket;
pub use handlers::{
    EndOfPhaseOrderHandler, ImmediateOrderHandler, OrderHandler, OrderHandlerKind,
    match_top_of_book,
};
pub use market::{Market, TradeCtx};
pub use order_book_market::OrderBookMarket;
pub use pool::AgentPool;
pub use records::{DailyObservation, ExponentialFilter, MarketRecords};

#[cfg(test)]
pub(crate) mod testutil;
