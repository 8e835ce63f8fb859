use agora_core::GoodKind;
use agora_market::{
    DecentralizedMarket, Market, MarketConfig, OrderBookMarket, OrderHandlerKind,
    SequentialAuctionMarket,
};
use agora_pricing::PricePolicyKind;
use serde::{Deserialize, Serialize};

/// Every market topology the runner can drive, by stable configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketTopology {
    OrderBookImmediate,
    OrderBookBatch,
    SequentialAuction,
    Decentralized,
}

impl MarketTopology {
    pub const ALL: [MarketTopology; 4] = [
        MarketTopology::OrderBookImmediate,
        MarketTopology::OrderBookBatch,
        MarketTopology::SequentialAuction,
        MarketTopology::Decentralized,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "order-book-immediate" => Some(MarketTopology::OrderBookImmediate),
            "order-book-batch" => Some(MarketTopology::OrderBookBatch),
            "sequential-auction" => Some(MarketTopology::SequentialAuction),
            "decentralized" => Some(MarketTopology::Decentralized),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MarketTopology::OrderBookImmediate => "order-book-immediate",
            MarketTopology::OrderBookBatch => "order-book-batch",
            MarketTopology::SequentialAuction => "sequential-auction",
            MarketTopology::Decentralized => "decentralized",
        }
    }

    pub fn build(self, good: GoodKind, config: &MarketConfig) -> Box<dyn Market> {
        match self {
            MarketTopology::OrderBookImmediate => {
                let config = MarketConfig {
                    order_handler: OrderHandlerKind::Immediate,
                    ..*config
                };
                Box::new(OrderBookMarket::new(good, &config))
            }
            MarketTopology::OrderBookBatch => {
                let config = MarketConfig {
                    order_handler: OrderHandlerKind::EndOfPhase,
                    ..*config
                };
                Box::new(OrderBookMarket::new(good, &config))
            }
            MarketTopology::SequentialAuction => {
                Box::new(SequentialAuctionMarket::new(good, config))
            }
            MarketTopology::Decentralized => Box::new(DecentralizedMarket::new(good, config)),
        }
    }
}

/// A runnable scenario. Deserialized from a JSON file when the binary gets
/// a path argument, otherwise the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub good: String,
    pub days: u32,
    pub seed: u64,
    pub topology: String,
    pub price_policy: String,
    pub sellers: u32,
    pub buyers: u32,
    /// Inclusive bounds each seller's fixed ask price is drawn from.
    pub seller_price_range: (u64, u64),
    /// Inclusive bounds each buyer's reservation price is drawn from.
    pub buyer_price_range: (u64, u64),
    pub initial_buyer_cash: i64,
    pub record_daily_history: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            good: "grain".to_string(),
            days: 100,
            seed: 42,
            topology: MarketTopology::OrderBookBatch.name().to_string(),
            price_policy: PricePolicyKind::Average.name().to_string(),
            sellers: 5,
            buyers: 5,
            seller_price_range: (8, 20),
            buyer_price_range: (10, 30),
            initial_buyer_cash: 10_000,
            record_daily_history: true,
        }
    }
}

impl SimulationConfig {
    pub fn topology(&self) -> Option<MarketTopology> {
        MarketTopology::from_name(&self.topology)
    }

    pub fn market_config(&self) -> MarketConfig {
        MarketConfig {
            price_policy: PricePolicyKind::from_name(&self.price_policy)
                .unwrap_or(PricePolicyKind::Average),
            order_handler: OrderHandlerKind::EndOfPhase,
            record_daily_history: self.record_daily_history,
        }
    }
}
