use crate::base::{MarketConfig, MarketCore};
use crate::market::{Market, TradeCtx};
use agora_core::{
    AgentId, ClearingEvent, ClearingOutcome, ClearingStep, GoodId, GoodKind, OriginatorTag,
    Phase, Price, Priority, Quote, QuoteId, SellerOffer, SubmitOutcome, TradeOutcome,
};
use agora_ports::{EconomicAgent, MarketError, MarketResult, PhaseScheduler};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Orders buyers by willingness to pay, richest first; ties break on the
/// lower agent id so the walk is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BuyerKey {
    max_price: Price,
    agent: AgentId,
}

impl Ord for BuyerKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .max_price
            .cmp(&self.max_price)
            .then_with(|| self.agent.cmp(&other.agent))
    }
}

impl PartialOrd for BuyerKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The discriminatory sequential auction.
///
/// Sellers keep per-seller ask lists (cheapest first) on a board that
/// preserves registration order; buyers queue in willingness-to-pay order,
/// each holding its own bids highest first.
/// Each scheduled round offers the board to exactly one buyer, who picks a
/// supplier or passes. External submits and cancels set `dirty`, which
/// restarts the buyer walk; removals done by the round itself do not, so
/// the cursor naturally slides to the next buyer.
pub struct SequentialAuctionMarket {
    core: MarketCore,
    seller_asks: IndexMap<AgentId, Vec<Quote>>,
    ask_index: HashMap<QuoteId, AgentId>,
    buyer_bids: BTreeMap<BuyerKey, Vec<Quote>>,
    bid_index: HashMap<QuoteId, BuyerKey>,
    buyer_keys: HashMap<AgentId, BuyerKey>,
    dirty: bool,
    cursor: usize,
}

impl SequentialAuctionMarket {
    pub fn new(good: GoodKind, config: &MarketConfig) -> Self {
        SequentialAuctionMarket {
            core: MarketCore::new(good, config),
            seller_asks: IndexMap::new(),
            ask_index: HashMap::new(),
            buyer_bids: BTreeMap::new(),
            bid_index: HashMap::new(),
            buyer_keys: HashMap::new(),
            dirty: false,
            cursor: 0,
        }
    }

    fn schedule_round(&self, scheduler: &mut dyn PhaseScheduler, tomorrow: bool) {
        let event = ClearingEvent::new(self.core.good().clone(), ClearingStep::AuctionRound);
        if tomorrow {
            scheduler.schedule_tomorrow(Phase::Trade, Priority::Final, event);
        } else {
            scheduler.schedule_soon(Phase::Trade, Priority::Final, event);
        }
    }

    /// Remove an ask without touching `dirty`.
    fn take_ask(&mut self, id: QuoteId) -> MarketResult<Quote> {
        let seller = self.ask_index.remove(&id).ok_or(MarketError::UnknownQuote(id))?;
        let asks = self
            .seller_asks
            .get_mut(&seller)
            .ok_or(MarketError::UnknownQuote(id))?;
        let position = asks
            .iter()
            .position(|q| q.id() == id)
            .ok_or(MarketError::UnknownQuote(id))?;
        let quote = asks.remove(position);
        if asks.is_empty() {
            self.seller_asks.shift_remove(&seller);
        }
        Ok(quote)
    }

    /// Remove a bid without touching `dirty`.
    fn take_bid(&mut self, id: QuoteId) -> MarketResult<Quote> {
        let key = self.bid_index.remove(&id).ok_or(MarketError::UnknownQuote(id))?;
        let bids = self
            .buyer_bids
            .get_mut(&key)
            .ok_or(MarketError::UnknownQuote(id))?;
        let position = bids
            .iter()
            .position(|q| q.id() == id)
            .ok_or(MarketError::UnknownQuote(id))?;
        let quote = bids.remove(position);
        if bids.is_empty() {
            self.buyer_bids.remove(&key);
        }
        Ok(quote)
    }

    /// One best ask per seller, in seller registration order.
    fn offer_board(&self) -> Vec<SellerOffer> {
        self.seller_asks
            .iter()
            .filter_map(|(seller, asks)| {
                asks.first().map(|quote| SellerOffer {
                    seller: *seller,
                    price: quote.price(),
                    good: quote.good().expect("sell quotes always reference a good"),
                })
            })
            .collect()
    }

    fn run_round(&mut self, ctx: &mut TradeCtx<'_>) -> MarketResult<ClearingOutcome> {
        self.core.ensure_open()?;
        if self.dirty {
            self.cursor = 0;
            self.dirty = false;
        }

        // Done for the day: nothing to match or every buyer had its turn.
        if self.buyer_bids.is_empty()
            || self.seller_asks.is_empty()
            || self.cursor >= self.buyer_bids.len()
        {
            self.cursor = 0;
            self.schedule_round(ctx.scheduler, true);
            return Ok(ClearingOutcome::NoTrade);
        }

        let (key, bids) = self
            .buyer_bids
            .iter()
            .nth(self.cursor)
            .expect("cursor checked against length");
        let key = *key;
        let bid = bids
            .first()
            .expect("buyer entries are removed when empty")
            .clone();

        let offers = self.offer_board();
        let buyer = ctx
            .agents
            .get(key.agent)
            .ok_or(MarketError::NotRegistered(key.agent))?;
        let Some(seller) = buyer.choose_supplier(&offers) else {
            self.cursor += 1;
            self.schedule_round(ctx.scheduler, false);
            return Ok(ClearingOutcome::NoTrade);
        };
        let offer = offers
            .iter()
            .find(|o| o.seller == seller)
            .copied()
            .ok_or(MarketError::NoSuchOffer(key.agent))?;

        // A choice the standing bid cannot cover counts as passing.
        if offer.price > bid.price() {
            self.cursor += 1;
            self.schedule_round(ctx.scheduler, false);
            return Ok(ClearingOutcome::NoTrade);
        }

        let ask = self
            .seller_asks
            .get(&seller)
            .and_then(|asks| asks.first())
            .cloned()
            .expect("offer came from this board");
        let price = self.core.price(ask.price(), bid.price());

        match self
            .core
            .trade(ctx.agents, key.agent, seller, offer.good, price, &bid, &ask)?
        {
            TradeOutcome::BuyerBankrupt(agent) => {
                self.schedule_round(ctx.scheduler, false);
                Ok(ClearingOutcome::Bankrupt(agent))
            }
            TradeOutcome::Completed(_) => {
                self.take_ask(ask.id())?;
                self.take_bid(bid.id())?;
                if let Some(agent) = ctx.agents.get_mut(key.agent) {
                    agent.bid_filled(&bid, offer.good, price, seller);
                }
                if let Some(agent) = ctx.agents.get_mut(seller) {
                    agent.ask_filled(&ask, offer.good, price, key.agent);
                }
                self.schedule_round(ctx.scheduler, false);
                Ok(ClearingOutcome::Traded)
            }
        }
    }
}

impl Market for SequentialAuctionMarket {
    fn core(&self) -> &MarketCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MarketCore {
        &mut self.core
    }

    fn start(&mut self, scheduler: &mut dyn PhaseScheduler) {
        self.core.start();
        self.schedule_round(scheduler, false);
    }

    fn turn_off(&mut self) {
        self.core.turn_off();
    }

    fn register_buyer(&mut self, agent: &dyn EconomicAgent) -> MarketResult<()> {
        self.core.register_buyer(agent.id())?;
        // The ordering key is sampled once, here; later changes to the
        // agent's willingness to pay do not reshuffle the queue.
        let key = BuyerKey {
            max_price: agent.max_price(self.core.good()),
            agent: agent.id(),
        };
        self.buyer_keys.insert(agent.id(), key);
        Ok(())
    }

    fn deregister_buyer(&mut self, agent: AgentId) -> MarketResult<()> {
        self.core.deregister_buyer(agent)?;
        if let Some(key) = self.buyer_keys.remove(&agent) {
            if let Some(bids) = self.buyer_bids.remove(&key) {
                for quote in &bids {
                    self.bid_index.remove(&quote.id());
                }
            }
            self.dirty = true;
        }
        Ok(())
    }

    fn submit_sell_quote(
        &mut self,
        _ctx: &mut TradeCtx<'_>,
        seller: AgentId,
        price: Price,
        good: GoodId,
        originator: Option<OriginatorTag>,
    ) -> MarketResult<SubmitOutcome> {
        self.core.ensure_open()?;
        if !self.core.is_seller(seller) {
            return Err(MarketError::NotRegistered(seller));
        }
        let mut quote = Quote::new_ask(
            self.core.next_quote_id(),
            seller,
            price,
            good,
            self.core.good().clone(),
        );
        if let Some(tag) = originator {
            quote = quote.with_originator(tag);
        }
        let asks = self.seller_asks.entry(seller).or_default();
        let position = asks.partition_point(|q| q.price() <= price);
        asks.insert(position, quote.clone());
        self.ask_index.insert(quote.id(), seller);
        self.dirty = true;
        Ok(SubmitOutcome::Live(quote))
    }

    fn submit_buy_quote(
        &mut self,
        _ctx: &mut TradeCtx<'_>,
        buyer: AgentId,
        price: Price,
        originator: Option<OriginatorTag>,
    ) -> MarketResult<SubmitOutcome> {
        self.core.ensure_open()?;
        let key = *self
            .buyer_keys
            .get(&buyer)
            .ok_or(MarketError::NotRegistered(buyer))?;
        let mut quote = Quote::new_bid(
            self.core.next_quote_id(),
            buyer,
            price,
            self.core.good().clone(),
        );
        if let Some(tag) = originator {
            quote = quote.with_originator(tag);
        }
        // Each buyer's own bids are kept descending, so a round always
        // clears the strongest one first.
        let bids = self.buyer_bids.entry(key).or_default();
        let position = bids.partition_point(|q| q.price() >= price);
        bids.insert(position, quote.clone());
        self.bid_index.insert(quote.id(), key);
        self.dirty = true;
        Ok(SubmitOutcome::Live(quote))
    }

    fn remove_sell_quote(&mut self, quote: QuoteId) -> MarketResult<Quote> {
        let removed = self.take_ask(quote)?;
        self.dirty = true;
        Ok(removed)
    }

    fn remove_buy_quote(&mut self, quote: QuoteId) -> MarketResult<Quote> {
        let removed = self.take_bid(quote)?;
        self.dirty = true;
        Ok(removed)
    }

    fn remove_all_sell_quotes_by(&mut self, agent: AgentId) -> Vec<Quote> {
        let Some(asks) = self.seller_asks.shift_remove(&agent) else {
            return Vec::new();
        };
        for quote in &asks {
            self.ask_index.remove(&quote.id());
        }
        self.dirty = true;
        asks
    }

    fn remove_all_buy_quotes_by(&mut self, agent: AgentId) -> Vec<Quote> {
        let Some(key) = self.buyer_keys.get(&agent) else {
            return Vec::new();
        };
        let Some(bids) = self.buyer_bids.remove(key) else {
            return Vec::new();
        };
        for quote in &bids {
            self.bid_index.remove(&quote.id());
        }
        self.dirty = true;
        bids
    }

    fn is_best_sale_price_visible(&self) -> bool {
        true
    }

    fn is_best_buy_price_visible(&self) -> bool {
        true
    }

    fn best_sell_price(&self) -> MarketResult<Option<Price>> {
        Ok(self
            .seller_asks
            .values()
            .filter_map(|asks| asks.first())
            .map(Quote::price)
            .min())
    }

    fn best_buy_price(&self) -> MarketResult<Option<Price>> {
        Ok(self
            .buyer_bids
            .values()
            .flatten()
            .map(Quote::price)
            .max())
    }

    fn best_seller(&self) -> MarketResult<Option<AgentId>> {
        Ok(self
            .seller_asks
            .values()
            .filter_map(|asks| asks.first())
            .min_by_key(|q| q.price())
            .map(Quote::agent))
    }

    fn best_buyer(&self) -> MarketResult<Option<AgentId>> {
        Ok(self
            .buyer_bids
            .values()
            .flatten()
            .max_by_key(|q| q.price())
            .map(Quote::agent))
    }

    fn clearing_step(
        &mut self,
        step: ClearingStep,
        ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome> {
        match step {
            ClearingStep::AuctionRound => self.run_round(ctx),
            ClearingStep::MatchBook => Ok(ClearingOutcome::NoTrade),
        }
    }
}
