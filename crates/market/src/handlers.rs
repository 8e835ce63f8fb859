use crate::base::MarketCore;
use crate::book::OrderBook;
use crate::market::TradeCtx;
use crate::pool::AgentPool;
use agora_core::{ClearingEvent, ClearingOutcome, ClearingStep, GoodKind, Phase, Priority, TradeOutcome};
use agora_ports::{MarketResult, PhaseScheduler};

/// Try to cross the top of the book once.
///
/// Crosses when best bid >= best ask. On success both quotes are popped and
/// both agents get their fill callbacks. A bankrupt buyer aborts the match
/// with the quotes left in place; the caller decides what happens next.
pub fn match_top_of_book(
    book: &mut OrderBook,
    core: &mut MarketCore,
    agents: &mut AgentPool,
) -> MarketResult<ClearingOutcome> {
    let (Some(best_ask), Some(best_bid)) = (book.asks.peek_best(), book.bids.peek_best()) else {
        return Ok(ClearingOutcome::NoTrade);
    };
    if best_bid.price() < best_ask.price() {
        return Ok(ClearingOutcome::NoTrade);
    }
    let ask = best_ask.clone();
    let bid = best_bid.clone();

    let price = core.price(ask.price(), bid.price());
    let good = ask.good().expect("sell quotes always reference a good");

    match core.trade(agents, bid.agent(), ask.agent(), good, price, &bid, &ask)? {
        TradeOutcome::BuyerBankrupt(agent) => Ok(ClearingOutcome::Bankrupt(agent)),
        TradeOutcome::Completed(_) => {
            book.asks.remove(ask.id())?;
            book.bids.remove(bid.id())?;
            if let Some(buyer) = agents.get_mut(bid.agent()) {
                buyer.bid_filled(&bid, good, price, ask.agent());
            }
            if let Some(seller) = agents.get_mut(ask.agent()) {
                seller.ask_filled(&ask, good, price, bid.agent());
            }
            Ok(ClearingOutcome::Traded)
        }
    }
}

/// How an order-book market turns resting quotes into trades.
///
/// `react_to_new_quote` fires synchronously inside every submit;
/// `scheduled_step` fires when a callback the handler registered comes up.
pub trait OrderHandler {
    /// Stable name used in configuration files and logs.
    fn name(&self) -> &str;

    /// Called once when the market opens.
    fn start(&mut self, good: &GoodKind, scheduler: &mut dyn PhaseScheduler);

    fn react_to_new_quote(
        &mut self,
        book: &mut OrderBook,
        core: &mut MarketCore,
        ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome>;

    fn scheduled_step(
        &mut self,
        book: &mut OrderBook,
        core: &mut MarketCore,
        ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome>;

    fn turn_off(&mut self);
}

/// Continuous double auction: drain every cross as soon as a quote lands.
#[derive(Default)]
pub struct ImmediateOrderHandler;

impl ImmediateOrderHandler {
    pub fn new() -> Self {
        ImmediateOrderHandler
    }
}

impl OrderHandler for ImmediateOrderHandler {
    fn name(&self) -> &str {
        "immediate"
    }

    fn start(&mut self, _good: &GoodKind, _scheduler: &mut dyn PhaseScheduler) {}

    fn react_to_new_quote(
        &mut self,
        book: &mut OrderBook,
        core: &mut MarketCore,
        ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome> {
        let mut traded = false;
        loop {
            match match_top_of_book(book, core, ctx.agents)? {
                ClearingOutcome::Traded => traded = true,
                ClearingOutcome::NoTrade => {
                    return Ok(if traded {
                        ClearingOutcome::Traded
                    } else {
                        ClearingOutcome::NoTrade
                    });
                }
                bankrupt @ ClearingOutcome::Bankrupt(_) => return Ok(bankrupt),
            }
        }
    }

    fn scheduled_step(
        &mut self,
        _book: &mut OrderBook,
        _core: &mut MarketCore,
        _ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome> {
        Ok(ClearingOutcome::NoTrade)
    }

    fn turn_off(&mut self) {}
}

/// Batched clearing: quotes rest until the end of the trading phase, then
/// match one pair per callback at `Priority::Final`, rescheduling within
/// the phase while progress continues.
pub struct EndOfPhaseOrderHandler {
    active: bool,
    matches_today: u32,
    max_matches_per_day: u32,
}

impl EndOfPhaseOrderHandler {
    pub const DEFAULT_MAX_MATCHES_PER_DAY: u32 = 10_000;

    pub fn new() -> Self {
        Self::with_match_budget(Self::DEFAULT_MAX_MATCHES_PER_DAY)
    }

    /// `max_matches_per_day` bounds same-day rescheduling so a pathological
    /// quote stream cannot pin the clock inside one trading phase.
    pub fn with_match_budget(max_matches_per_day: u32) -> Self {
        EndOfPhaseOrderHandler {
            active: false,
            matches_today: 0,
            max_matches_per_day,
        }
    }

    fn reschedule_soon(&self, good: &GoodKind, scheduler: &mut dyn PhaseScheduler) {
        scheduler.schedule_soon(
            Phase::Trade,
            Priority::Final,
            ClearingEvent::new(good.clone(), ClearingStep::MatchBook),
        );
    }

    fn reschedule_tomorrow(&self, good: &GoodKind, scheduler: &mut dyn PhaseScheduler) {
        scheduler.schedule_tomorrow(
            Phase::Trade,
            Priority::Final,
            ClearingEvent::new(good.clone(), ClearingStep::MatchBook),
        );
    }
}

impl Default for EndOfPhaseOrderHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderHandler for EndOfPhaseOrderHandler {
    fn name(&self) -> &str {
        "end-of-phase"
    }

    fn start(&mut self, good: &GoodKind, scheduler: &mut dyn PhaseScheduler) {
        self.active = true;
        self.reschedule_soon(good, scheduler);
    }

    fn react_to_new_quote(
        &mut self,
        _book: &mut OrderBook,
        _core: &mut MarketCore,
        _ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome> {
        // Quotes rest until the scheduled step.
        Ok(ClearingOutcome::NoTrade)
    }

    fn scheduled_step(
        &mut self,
        book: &mut OrderBook,
        core: &mut MarketCore,
        ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome> {
        if !self.active {
            return Ok(ClearingOutcome::NoTrade);
        }
        let good = core.good().clone();
        match match_top_of_book(book, core, ctx.agents)? {
            ClearingOutcome::Traded => {
                self.matches_today += 1;
                if self.matches_today < self.max_matches_per_day {
                    self.reschedule_soon(&good, ctx.scheduler);
                } else {
                    log::warn!(
                        "{good}: match budget of {} exhausted, deferring to tomorrow",
                        self.max_matches_per_day
                    );
                    self.matches_today = 0;
                    self.reschedule_tomorrow(&good, ctx.scheduler);
                }
                Ok(ClearingOutcome::Traded)
            }
            ClearingOutcome::NoTrade => {
                self.matches_today = 0;
                self.reschedule_tomorrow(&good, ctx.scheduler);
                Ok(ClearingOutcome::NoTrade)
            }
            bankrupt @ ClearingOutcome::Bankrupt(_) => {
                // The driver retires the buyer; keep the callback chain
                // alive so clearing resumes afterwards.
                self.reschedule_soon(&good, ctx.scheduler);
                Ok(bankrupt)
            }
        }
    }

    fn turn_off(&mut self) {
        self.active = false;
    }
}

/// Every order handler the engine knows, by stable configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderHandlerKind {
    Immediate,
    EndOfPhase,
}

impl OrderHandlerKind {
    pub const ALL: [OrderHandlerKind; 2] = [OrderHandlerKind::Immediate, OrderHandlerKind::EndOfPhase];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "immediate" => Some(OrderHandlerKind::Immediate),
            "end-of-phase" => Some(OrderHandlerKind::EndOfPhase),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OrderHandlerKind::Immediate => "immediate",
            OrderHandlerKind::EndOfPhase => "end-of-phase",
        }
    }

    pub fn build(self) -> Box<dyn OrderHandler> {
        match self {
            OrderHandlerKind::Immediate => Box::new(ImmediateOrderHandler::new()),
            OrderHandlerKind::EndOfPhase => Box::new(EndOfPhaseOrderHandler::new()),
        }
    }
}

impl Default for OrderHandlerKind {
    fn default() -> Self {
        OrderHandlerKind::EndOfPhase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::MarketConfig;
    use crate::testutil::TestTrader;
    use agora_core::{AgentId, Good, GoodId, Price, Quote, QuoteId};
    use agora_scheduler::EventQueue;

    fn grain() -> GoodKind {
        GoodKind::new("grain")
    }

    fn setup(buyer_cash: i64) -> (OrderBook, MarketCore, AgentPool) {
        let mut core = MarketCore::new(grain(), &MarketConfig::default());
        core.start();
        let mut agents = AgentPool::new();
        let mut seller = TestTrader::new(AgentId(1), 0, Price::new(100));
        seller.give(Good::new(GoodId(10), grain(), Price::new(5)));
        agents.register(Box::new(seller));
        agents.register(Box::new(TestTrader::new(AgentId(2), buyer_cash, Price::new(100))));
        core.register_seller(AgentId(1)).unwrap();
        core.register_buyer(AgentId(2)).unwrap();
        (OrderBook::new(), core, agents)
    }

    #[test]
    fn crossing_quotes_trade_within_the_spread() {
        let (mut book, mut core, mut agents) = setup(1000);
        book.asks.insert(Quote::new_ask(QuoteId(1), AgentId(1), Price::new(10), GoodId(10), grain()));
        book.bids.insert(Quote::new_bid(QuoteId(2), AgentId(2), Price::new(14), grain()));

        let outcome = match_top_of_book(&mut book, &mut core, &mut agents).unwrap();
        assert_eq!(outcome, ClearingOutcome::Traded);
        assert!(book.asks.is_empty());
        assert!(book.bids.is_empty());

        let price = core.records().last_price().unwrap();
        assert!(Price::new(10) <= price && price <= Price::new(14));
    }

    #[test]
    fn non_crossing_quotes_rest() {
        let (mut book, mut core, mut agents) = setup(1000);
        book.asks.insert(Quote::new_ask(QuoteId(1), AgentId(1), Price::new(20), GoodId(10), grain()));
        book.bids.insert(Quote::new_bid(QuoteId(2), AgentId(2), Price::new(14), grain()));

        let outcome = match_top_of_book(&mut book, &mut core, &mut agents).unwrap();
        assert_eq!(outcome, ClearingOutcome::NoTrade);
        assert_eq!(book.asks.len(), 1);
        assert_eq!(book.bids.len(), 1);
    }

    #[test]
    fn both_agents_are_notified_after_settlement() {
        let mut core = MarketCore::new(grain(), &MarketConfig::default());
        core.start();
        let mut agents = AgentPool::new();

        let mut seller = TestTrader::new(AgentId(1), 0, Price::new(100));
        seller.give(Good::new(GoodId(10), grain(), Price::new(5)));
        let seller_log = seller.fill_log();
        let buyer = TestTrader::new(AgentId(2), 1000, Price::new(100));
        let buyer_log = buyer.fill_log();
        agents.register(Box::new(seller));
        agents.register(Box::new(buyer));
        core.register_seller(AgentId(1)).unwrap();
        core.register_buyer(AgentId(2)).unwrap();

        let mut book = OrderBook::new();
        book.asks.insert(Quote::new_ask(QuoteId(1), AgentId(1), Price::new(10), GoodId(10), grain()));
        book.bids.insert(Quote::new_bid(QuoteId(2), AgentId(2), Price::new(14), grain()));

        let outcome = match_top_of_book(&mut book, &mut core, &mut agents).unwrap();
        assert_eq!(outcome, ClearingOutcome::Traded);

        // Each side hears about its own fill, with the counterparty named.
        let price = core.records().last_price().unwrap();
        assert_eq!(*buyer_log.bids.borrow(), vec![(GoodId(10), price, AgentId(1))]);
        assert_eq!(*seller_log.asks.borrow(), vec![(GoodId(10), price, AgentId(2))]);
        assert!(buyer_log.asks.borrow().is_empty());
        assert!(seller_log.bids.borrow().is_empty());
    }

    #[test]
    fn bankruptcy_leaves_both_quotes_in_place() {
        let (mut book, mut core, mut agents) = setup(0);
        book.asks.insert(Quote::new_ask(QuoteId(1), AgentId(1), Price::new(10), GoodId(10), grain()));
        book.bids.insert(Quote::new_bid(QuoteId(2), AgentId(2), Price::new(14), grain()));

        let outcome = match_top_of_book(&mut book, &mut core, &mut agents).unwrap();
        assert_eq!(outcome, ClearingOutcome::Bankrupt(AgentId(2)));
        assert!(book.asks.contains(QuoteId(1)));
        assert!(book.bids.contains(QuoteId(2)));
    }

    #[test]
    fn end_of_phase_handler_reschedules_until_the_book_uncrosses() {
        let (mut book, mut core, mut agents) = setup(1000);
        let mut scheduler: EventQueue<ClearingEvent> = EventQueue::new();
        let mut handler = EndOfPhaseOrderHandler::new();
        handler.start(&grain(), &mut scheduler);
        assert_eq!(scheduler.len(), 1);

        book.asks.insert(Quote::new_ask(QuoteId(1), AgentId(1), Price::new(10), GoodId(10), grain()));
        book.bids.insert(Quote::new_bid(QuoteId(2), AgentId(2), Price::new(14), grain()));

        // First scheduled step trades and re-registers within the day.
        let first = scheduler.pop().unwrap();
        assert_eq!(first.day, 0);
        let mut ctx = TradeCtx { agents: &mut agents, scheduler: &mut scheduler };
        let outcome = handler.scheduled_step(&mut book, &mut core, &mut ctx).unwrap();
        assert_eq!(outcome, ClearingOutcome::Traded);

        let second = scheduler.pop().unwrap();
        assert_eq!(second.day, 0);
        let mut ctx = TradeCtx { agents: &mut agents, scheduler: &mut scheduler };
        let outcome = handler.scheduled_step(&mut book, &mut core, &mut ctx).unwrap();
        assert_eq!(outcome, ClearingOutcome::NoTrade);

        // Book is clear, so the next callback is tomorrow's.
        let third = scheduler.pop().unwrap();
        assert_eq!(third.day, 1);
    }

    #[test]
    fn match_budget_defers_to_tomorrow() {
        let (mut book, mut core, mut agents) = setup(1000);
        let mut seller = TestTrader::new(AgentId(3), 0, Price::new(100));
        seller.give(Good::new(GoodId(11), grain(), Price::new(5)));
        agents.register(Box::new(seller));
        core.register_seller(AgentId(3)).unwrap();

        book.asks.insert(Quote::new_ask(QuoteId(1), AgentId(1), Price::new(10), GoodId(10), grain()));
        book.asks.insert(Quote::new_ask(QuoteId(2), AgentId(3), Price::new(10), GoodId(11), grain()));
        book.bids.insert(Quote::new_bid(QuoteId(3), AgentId(2), Price::new(14), grain()));
        book.bids.insert(Quote::new_bid(QuoteId(4), AgentId(2), Price::new(14), grain()));

        let mut scheduler: EventQueue<ClearingEvent> = EventQueue::new();
        let mut handler = EndOfPhaseOrderHandler::with_match_budget(1);
        handler.start(&grain(), &mut scheduler);

        let _ = scheduler.pop().unwrap();
        let mut ctx = TradeCtx { agents: &mut agents, scheduler: &mut scheduler };
        let outcome = handler.scheduled_step(&mut book, &mut core, &mut ctx).unwrap();
        assert_eq!(outcome, ClearingOutcome::Traded);

        // Budget of one spent, so the follow-up lands tomorrow even though
        // the book still crosses.
        let next = scheduler.pop().unwrap();
        assert_eq!(next.day, 1);
        assert_eq!(book.asks.len(), 1);
    }

    #[test]
    fn handler_names_round_trip() {
        for kind in OrderHandlerKind::ALL {
            assert_eq!(OrderHandlerKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.build().name(), kind.name());
        }
    }
}
