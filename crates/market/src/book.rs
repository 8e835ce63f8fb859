use agora_core::{AgentId, Price, Quote, QuoteId, Side};
use agora_ports::{MarketError, MarketResult};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// One side of an order book: price levels in a `BTreeMap`, FIFO queues
/// within a level, and a quote-id index for O(log n) cancellation.
///
/// "Best" means lowest price for asks and highest for bids; ties go to the
/// oldest quote at the level.
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, VecDeque<Quote>>,
    index: HashMap<QuoteId, Price>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        BookSide {
            side,
            levels: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn insert(&mut self, quote: Quote) {
        self.index.insert(quote.id(), quote.price());
        self.levels.entry(quote.price()).or_default().push_back(quote);
    }

    /// Remove a quote by id. Unknown ids are an error, never a silent no-op.
    pub fn remove(&mut self, id: QuoteId) -> MarketResult<Quote> {
        let price = self.index.remove(&id).ok_or(MarketError::UnknownQuote(id))?;
        let level = self
            .levels
            .get_mut(&price)
            .ok_or(MarketError::UnknownQuote(id))?;
        let position = level
            .iter()
            .position(|q| q.id() == id)
            .ok_or(MarketError::UnknownQuote(id))?;
        let quote = level.remove(position).ok_or(MarketError::UnknownQuote(id))?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Ok(quote)
    }

    pub fn peek_best(&self) -> Option<&Quote> {
        let level = match self.side {
            Side::Ask => self.levels.first_key_value(),
            Side::Bid => self.levels.last_key_value(),
        };
        level.and_then(|(_, queue)| queue.front())
    }

    pub fn best_price(&self) -> Option<Price> {
        self.peek_best().map(Quote::price)
    }

    pub fn best_agent(&self) -> Option<AgentId> {
        self.peek_best().map(Quote::agent)
    }

    pub fn contains(&self, id: QuoteId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Pull every quote owned by `agent`. Used when an agent exits or goes
    /// bankrupt.
    pub fn remove_all_by(&mut self, agent: AgentId) -> Vec<Quote> {
        let ids: Vec<QuoteId> = self
            .levels
            .values()
            .flatten()
            .filter(|q| q.agent() == agent)
            .map(Quote::id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.remove(id).ok())
            .collect()
    }

    /// All resting quotes, best first.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Quote> + '_> {
        match self.side {
            Side::Ask => Box::new(self.levels.values().flatten()),
            Side::Bid => Box::new(self.levels.values().rev().flatten()),
        }
    }
}

/// Both sides of an order book.
pub struct OrderBook {
    pub asks: BookSide,
    pub bids: BookSide,
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook {
            asks: BookSide::new(Side::Ask),
            bids: BookSide::new(Side::Bid),
        }
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
