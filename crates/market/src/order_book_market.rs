use crate::base::{MarketConfig, MarketCore};
use crate::book::OrderBook;
use crate::handlers::OrderHandler;
use crate::market::{Market, TradeCtx};
use agora_core::{
    AgentId, ClearingOutcome, ClearingStep, GoodId, GoodKind, OriginatorTag, Price, Quote,
    QuoteId, Side, SubmitOutcome,
};
use agora_ports::{MarketError, MarketResult, PhaseScheduler};

/// The order-book topology: quotes rest in price-time priority on two book
/// sides, and a pluggable [`OrderHandler`] decides when the top of the book
/// is crossed — synchronously on every submit, or batched at the end of the
/// trading phase.
pub struct OrderBookMarket {
    core: MarketCore,
    book: OrderBook,
    handler: Box<dyn OrderHandler>,
}

impl OrderBookMarket {
    pub fn new(good: GoodKind, config: &MarketConfig) -> Self {
        Self::with_handler(good, config, config.order_handler.build())
    }

    pub fn with_handler(good: GoodKind, config: &MarketConfig, handler: Box<dyn OrderHandler>) -> Self {
        OrderBookMarket {
            core: MarketCore::new(good, config),
            book: OrderBook::new(),
            handler,
        }
    }

    fn submit(
        &mut self,
        ctx: &mut TradeCtx<'_>,
        quote: Quote,
    ) -> MarketResult<SubmitOutcome> {
        let id = quote.id();
        let side = quote.side();
        log::debug!("{}: new {quote}", self.core.good());
        self.book.side_mut(side).insert(quote.clone());

        match self.handler.react_to_new_quote(&mut self.book, &mut self.core, ctx)? {
            ClearingOutcome::Bankrupt(agent) => Ok(SubmitOutcome::Bankrupt(agent)),
            _ => {
                if self.book.side(side).contains(id) {
                    Ok(SubmitOutcome::Live(quote))
                } else {
                    Ok(SubmitOutcome::Filled)
                }
            }
        }
    }
}

impl Market for OrderBookMarket {
    fn core(&self) -> &MarketCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MarketCore {
        &mut self.core
    }

    fn start(&mut self, scheduler: &mut dyn PhaseScheduler) {
        self.core.start();
        self.handler.start(self.core.good(), scheduler);
    }

    fn turn_off(&mut self) {
        self.handler.turn_off();
        self.core.turn_off();
    }

    fn submit_sell_quote(
        &mut self,
        ctx: &mut TradeCtx<'_>,
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
        self.submit(ctx, quote)
    }

    fn submit_buy_quote(
        &mut self,
        ctx: &mut TradeCtx<'_>,
        buyer: AgentId,
        price: Price,
        originator: Option<OriginatorTag>,
    ) -> MarketResult<SubmitOutcome> {
        self.core.ensure_open()?;
        if !self.core.is_buyer(buyer) {
            return Err(MarketError::NotRegistered(buyer));
        }
        let mut quote = Quote::new_bid(
            self.core.next_quote_id(),
            buyer,
            price,
            self.core.good().clone(),
        );
        if let Some(tag) = originator {
            quote = quote.with_originator(tag);
        }
        self.submit(ctx, quote)
    }

    fn remove_sell_quote(&mut self, quote: QuoteId) -> MarketResult<Quote> {
        self.book.asks.remove(quote)
    }

    fn remove_buy_quote(&mut self, quote: QuoteId) -> MarketResult<Quote> {
        self.book.bids.remove(quote)
    }

    fn remove_all_sell_quotes_by(&mut self, agent: AgentId) -> Vec<Quote> {
        self.book.asks.remove_all_by(agent)
    }

    fn remove_all_buy_quotes_by(&mut self, agent: AgentId) -> Vec<Quote> {
        self.book.bids.remove_all_by(agent)
    }

    fn is_best_sale_price_visible(&self) -> bool {
        true
    }

    fn is_best_buy_price_visible(&self) -> bool {
        true
    }

    fn best_sell_price(&self) -> MarketResult<Option<Price>> {
        Ok(self.book.asks.best_price())
    }

    fn best_buy_price(&self) -> MarketResult<Option<Price>> {
        Ok(self.book.bids.best_price())
    }

    fn best_seller(&self) -> MarketResult<Option<AgentId>> {
        Ok(self.book.asks.best_agent())
    }

    fn best_buyer(&self) -> MarketResult<Option<AgentId>> {
        Ok(self.book.bids.best_agent())
    }

    fn quotes_visible(&self) -> bool {
        true
    }

    fn quotes(&self, side: Side) -> MarketResult<Vec<&Quote>> {
        Ok(self.book.side(side).iter().collect())
    }

    fn clearing_step(
        &mut self,
        step: ClearingStep,
        ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome> {
        match step {
            ClearingStep::MatchBook => {
                self.handler.scheduled_step(&mut self.book, &mut self.core, ctx)
            }
            // Auction rounds are not this topology's callback.
            ClearingStep::AuctionRound => Ok(ClearingOutcome::NoTrade),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::OrderHandlerKind;
    use crate::pool::AgentPool;
    use crate::testutil::TestTrader;
    use agora_core::Good;
    use agora_pricing::PricePolicyKind;
    use agora_scheduler::EventQueue;
    use agora_core::ClearingEvent;

    fn grain() -> GoodKind {
        GoodKind::new("grain")
    }

    fn immediate_config() -> MarketConfig {
        MarketConfig {
            price_policy: PricePolicyKind::Average,
            order_handler: OrderHandlerKind::Immediate,
            record_daily_history: false,
        }
    }

    struct Fixture {
        market: OrderBookMarket,
        agents: AgentPool,
        scheduler: EventQueue<ClearingEvent>,
    }

    impl Fixture {
        fn new(config: MarketConfig) -> Self {
            let mut market = OrderBookMarket::new(grain(), &config);
            let mut agents = AgentPool::new();
            let mut scheduler: EventQueue<ClearingEvent> = EventQueue::new();

            let mut seller_a = TestTrader::new(AgentId(1), 0, Price::new(100));
            seller_a.give(Good::new(GoodId(10), grain(), Price::new(5)));
            let mut seller_b = TestTrader::new(AgentId(2), 0, Price::new(100));
            seller_b.give(Good::new(GoodId(11), grain(), Price::new(5)));
            let buyer = TestTrader::new(AgentId(3), 1000, Price::new(100));

            market.register_seller(&seller_a).unwrap();
            market.register_seller(&seller_b).unwrap();
            market.register_buyer(&buyer).unwrap();
            agents.register(Box::new(seller_a));
            agents.register(Box::new(seller_b));
            agents.register(Box::new(buyer));

            market.start(&mut scheduler);
            Fixture { market, agents, scheduler }
        }

        fn submit_ask(&mut self, seller: u64, price: u64, good: u64) -> SubmitOutcome {
            let mut ctx = TradeCtx { agents: &mut self.agents, scheduler: &mut self.scheduler };
            self.market
                .submit_sell_quote(&mut ctx, AgentId(seller), Price::new(price), GoodId(good), None)
                .unwrap()
        }

        fn submit_bid(&mut self, buyer: u64, price: u64) -> SubmitOutcome {
            let mut ctx = TradeCtx { agents: &mut self.agents, scheduler: &mut self.scheduler };
            self.market
                .submit_buy_quote(&mut ctx, AgentId(buyer), Price::new(price), None)
                .unwrap()
        }
    }

    #[test]
    fn crossing_bid_fills_against_the_cheapest_ask() {
        let mut fx = Fixture::new(immediate_config());
        assert!(matches!(fx.submit_ask(1, 10, 10), SubmitOutcome::Live(_)));
        assert!(matches!(fx.submit_ask(2, 20, 11), SubmitOutcome::Live(_)));

        let outcome = fx.submit_bid(3, 12);
        assert_eq!(outcome, SubmitOutcome::Filled);

        // One trade happened, inside [ask, bid].
        let price = fx.market.records().last_price().unwrap();
        assert!(Price::new(10) <= price && price <= Price::new(12));
        assert_eq!(fx.market.records().today_volume(), 1);

        // The expensive ask still rests; the bid is gone.
        assert_eq!(fx.market.best_sell_price().unwrap(), Some(Price::new(20)));
        assert_eq!(fx.market.best_buy_price().unwrap(), None);

        // The buyer holds the cheap seller's unit.
        assert!(fx.agents.get_mut(AgentId(3)).is_some());
        let buyer = fx.agents.get_mut(AgentId(3)).unwrap();
        assert!(buyer.take_good(GoodId(10)).is_some());
    }

    #[test]
    fn bid_on_an_empty_book_rests_and_sets_the_best_buy_price() {
        let mut fx = Fixture::new(immediate_config());
        let outcome = fx.submit_bid(3, 30);
        assert!(matches!(outcome, SubmitOutcome::Live(_)));
        assert_eq!(fx.market.records().today_volume(), 0);
        assert_eq!(fx.market.best_buy_price().unwrap(), Some(Price::new(30)));
        assert_eq!(fx.market.best_buyer().unwrap(), Some(AgentId(3)));
    }

    #[test]
    fn cancelling_an_unknown_quote_is_an_error_and_the_book_is_untouched() {
        let mut fx = Fixture::new(immediate_config());
        let SubmitOutcome::Live(quote) = fx.submit_ask(1, 15, 10) else {
            panic!("ask should rest");
        };

        let err = fx.market.remove_sell_quote(QuoteId(999)).unwrap_err();
        assert_eq!(err, MarketError::UnknownQuote(QuoteId(999)));
        assert_eq!(fx.market.best_sell_price().unwrap(), Some(Price::new(15)));

        // The real quote still cancels cleanly afterwards.
        let removed = fx.market.remove_sell_quote(quote.id()).unwrap();
        assert_eq!(removed.id(), quote.id());
        assert_eq!(fx.market.best_sell_price().unwrap(), None);
    }

    #[test]
    fn closed_market_rejects_submissions() {
        let mut fx = Fixture::new(immediate_config());
        fx.market.turn_off();
        let mut ctx = TradeCtx { agents: &mut fx.agents, scheduler: &mut fx.scheduler };
        let err = fx
            .market
            .submit_buy_quote(&mut ctx, AgentId(3), Price::new(10), None)
            .unwrap_err();
        assert_eq!(err, MarketError::MarketClosed);
    }

    #[test]
    fn unregistered_agents_cannot_quote() {
        let mut fx = Fixture::new(immediate_config());
        let mut ctx = TradeCtx { agents: &mut fx.agents, scheduler: &mut fx.scheduler };
        let err = fx
            .market
            .submit_buy_quote(&mut ctx, AgentId(99), Price::new(10), None)
            .unwrap_err();
        assert_eq!(err, MarketError::NotRegistered(AgentId(99)));
    }

    #[test]
    fn bankrupt_buyer_surfaces_through_submit() {
        let mut fx = Fixture::new(immediate_config());
        let broke = TestTrader::new(AgentId(4), 0, Price::new(100));
        fx.market.register_buyer(&broke).unwrap();
        fx.agents.register(Box::new(broke));

        let _ = fx.submit_ask(1, 10, 10);
        let outcome = fx.submit_bid(4, 12);
        assert_eq!(outcome, SubmitOutcome::Bankrupt(AgentId(4)));

        // Quotes stay put for the driver to clean up.
        assert_eq!(fx.market.best_sell_price().unwrap(), Some(Price::new(10)));
        assert_eq!(fx.market.best_buy_price().unwrap(), Some(Price::new(12)));
        let pulled = fx.market.remove_all_buy_quotes_by(AgentId(4));
        assert_eq!(pulled.len(), 1);
    }

    #[test]
    fn quotes_are_visible_best_first() {
        let mut fx = Fixture::new(immediate_config());
        let _ = fx.submit_ask(1, 20, 10);
        let _ = fx.submit_ask(2, 10, 11);
        let asks = fx.market.quotes(Side::Ask).unwrap();
        let prices: Vec<u64> = asks.iter().map(|q| q.price().inner()).collect();
        assert_eq!(prices, vec![10, 20]);
        assert!(fx.market.quotes_visible());
    }

    #[test]
    fn batched_market_clears_on_the_scheduled_step() {
        let config = MarketConfig {
            order_handler: OrderHandlerKind::EndOfPhase,
            ..immediate_config()
        };
        let mut fx = Fixture::new(config);

        let _ = fx.submit_ask(1, 10, 10);
        let outcome = fx.submit_bid(3, 14);
        // Batched handler lets crossing quotes rest until its callback.
        assert!(matches!(outcome, SubmitOutcome::Live(_)));
        assert_eq!(fx.market.records().today_volume(), 0);

        let event = fx.scheduler.pop().unwrap();
        let mut ctx = TradeCtx { agents: &mut fx.agents, scheduler: &mut fx.scheduler };
        let outcome = fx.market.clearing_step(event.event.step, &mut ctx).unwrap();
        assert_eq!(outcome, ClearingOutcome::Traded);
        assert_eq!(fx.market.records().today_volume(), 1);
    }
}
