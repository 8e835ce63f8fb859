use crate::base::MarketCore;
use crate::pool::AgentPool;
use crate::records::MarketRecords;
use agora_core::{
    AgentId, ClearingOutcome, ClearingStep, GoodId, GoodKind, OriginatorTag, Price, Quote,
    QuoteId, Side, SubmitOutcome, TradeOutcome,
};
use agora_ports::{EconomicAgent, MarketError, MarketResult, PhaseScheduler, TradeListener};

/// Everything a market may touch while clearing: the agents it settles
/// between and the scheduler it re-registers its callbacks with. Borrowed
/// for one call, never stored.
pub struct TradeCtx<'a> {
    pub agents: &'a mut AgentPool,
    pub scheduler: &'a mut dyn PhaseScheduler,
}

/// The market contract every clearing topology implements.
///
/// Topologies differ in how quotes rest and how matches are found; they
/// share registration, statistics, and the settlement path through
/// [`MarketCore::trade`]. Capability queries (`supports_quoting`,
/// `quotes_visible`, `is_best_*_price_visible`) tell callers which of the
/// optional operations this topology answers.
pub trait Market {
    fn core(&self) -> &MarketCore;
    fn core_mut(&mut self) -> &mut MarketCore;

    /// Open the market and let it register its clearing callbacks.
    fn start(&mut self, scheduler: &mut dyn PhaseScheduler);

    /// Close the market permanently. Further quotes get `MarketClosed`.
    fn turn_off(&mut self);

    /// Whether this topology accepts standing quotes at all.
    fn supports_quoting(&self) -> bool {
        true
    }

    fn submit_sell_quote(
        &mut self,
        ctx: &mut TradeCtx<'_>,
        seller: AgentId,
        price: Price,
        good: GoodId,
        originator: Option<OriginatorTag>,
    ) -> MarketResult<SubmitOutcome>;

    fn submit_buy_quote(
        &mut self,
        ctx: &mut TradeCtx<'_>,
        buyer: AgentId,
        price: Price,
        originator: Option<OriginatorTag>,
    ) -> MarketResult<SubmitOutcome>;

    fn remove_sell_quote(&mut self, quote: QuoteId) -> MarketResult<Quote>;

    fn remove_buy_quote(&mut self, quote: QuoteId) -> MarketResult<Quote>;

    /// Pull every ask owned by `agent`. Used on exit or bankruptcy.
    fn remove_all_sell_quotes_by(&mut self, agent: AgentId) -> Vec<Quote>;

    /// Pull every bid owned by `agent`.
    fn remove_all_buy_quotes_by(&mut self, agent: AgentId) -> Vec<Quote>;

    fn is_best_sale_price_visible(&self) -> bool;

    fn is_best_buy_price_visible(&self) -> bool;

    /// Lowest standing ask, when the book edge is visible.
    fn best_sell_price(&self) -> MarketResult<Option<Price>>;

    /// Highest standing bid, when the book edge is visible.
    fn best_buy_price(&self) -> MarketResult<Option<Price>>;

    fn best_seller(&self) -> MarketResult<Option<AgentId>>;

    fn best_buyer(&self) -> MarketResult<Option<AgentId>>;

    /// Whether the full book can be iterated, not just its edge.
    fn quotes_visible(&self) -> bool {
        false
    }

    /// All resting quotes on one side, best first.
    fn quotes(&self, side: Side) -> MarketResult<Vec<&Quote>> {
        let _ = side;
        Err(MarketError::BookNotVisible)
    }

    /// Scheduler callback dispatch: run one clearing step of the given kind.
    fn clearing_step(
        &mut self,
        step: ClearingStep,
        ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome>;

    /// Settle a deal the two agents negotiated outside the market. Only the
    /// bookless topology answers this.
    fn trade_directly(
        &mut self,
        ctx: &mut TradeCtx<'_>,
        buyer: AgentId,
        seller: AgentId,
        good: GoodId,
        price: Price,
    ) -> MarketResult<TradeOutcome> {
        let _ = (ctx, buyer, seller, good, price);
        Err(MarketError::QuotingNotSupported)
    }

    // Registration and statistics share the core implementation; the
    // auction overrides buyer registration to capture its ordering key.

    fn register_buyer(&mut self, agent: &dyn EconomicAgent) -> MarketResult<()> {
        self.core_mut().register_buyer(agent.id())
    }

    fn register_seller(&mut self, agent: &dyn EconomicAgent) -> MarketResult<()> {
        self.core_mut().register_seller(agent.id())
    }

    fn deregister_buyer(&mut self, agent: AgentId) -> MarketResult<()> {
        self.core_mut().deregister_buyer(agent)
    }

    fn deregister_seller(&mut self, agent: AgentId) -> MarketResult<()> {
        self.core_mut().deregister_seller(agent)
    }

    fn good(&self) -> &GoodKind {
        self.core().good()
    }

    fn price(&self, seller_price: Price, buyer_price: Price) -> Price {
        self.core().price(seller_price, buyer_price)
    }

    fn records(&self) -> &MarketRecords {
        self.core().records()
    }

    fn collect_day_statistics(&mut self, day: u32) {
        self.core_mut().collect_day_statistics(day);
    }

    fn week_end(&mut self) {
        self.core_mut().week_end();
    }

    fn add_trade_listener(&mut self, listener: Box<dyn TradeListener>) {
        self.core_mut().add_trade_listener(listener);
    }
}
