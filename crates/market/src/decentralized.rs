use crate::base::{MarketConfig, MarketCore};
use crate::market::{Market, TradeCtx};
use agora_core::{
    AgentId, ClearingOutcome, ClearingStep, GoodId, GoodKind, OriginatorTag, Price, Quote,
    QuoteId, SubmitOutcome, TradeOutcome,
};
use agora_ports::{MarketError, MarketResult, PhaseScheduler};

/// A market with no books at all: agents find each other on their own and
/// only come here to settle, so statistics and bankruptcy semantics stay
/// identical to the quoted topologies.
pub struct DecentralizedMarket {
    core: MarketCore,
}

impl DecentralizedMarket {
    pub fn new(good: GoodKind, config: &MarketConfig) -> Self {
        DecentralizedMarket {
            core: MarketCore::new(good, config),
        }
    }
}

impl Market for DecentralizedMarket {
    fn core(&self) -> &MarketCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MarketCore {
        &mut self.core
    }

    fn start(&mut self, _scheduler: &mut dyn PhaseScheduler) {
        self.core.start();
    }

    fn turn_off(&mut self) {
        self.core.turn_off();
    }

    fn supports_quoting(&self) -> bool {
        false
    }

    fn submit_sell_quote(
        &mut self,
        _ctx: &mut TradeCtx<'_>,
        _seller: AgentId,
        _price: Price,
        _good: GoodId,
        _originator: Option<OriginatorTag>,
    ) -> MarketResult<SubmitOutcome> {
        Err(MarketError::QuotingNotSupported)
    }

    fn submit_buy_quote(
        &mut self,
        _ctx: &mut TradeCtx<'_>,
        _buyer: AgentId,
        _price: Price,
        _originator: Option<OriginatorTag>,
    ) -> MarketResult<SubmitOutcome> {
        Err(MarketError::QuotingNotSupported)
    }

    fn remove_sell_quote(&mut self, _quote: QuoteId) -> MarketResult<Quote> {
        Err(MarketError::QuotingNotSupported)
    }

    fn remove_buy_quote(&mut self, _quote: QuoteId) -> MarketResult<Quote> {
        Err(MarketError::QuotingNotSupported)
    }

    fn remove_all_sell_quotes_by(&mut self, _agent: AgentId) -> Vec<Quote> {
        Vec::new()
    }

    fn remove_all_buy_quotes_by(&mut self, _agent: AgentId) -> Vec<Quote> {
        Vec::new()
    }

    fn is_best_sale_price_visible(&self) -> bool {
        false
    }

    fn is_best_buy_price_visible(&self) -> bool {
        false
    }

    fn best_sell_price(&self) -> MarketResult<Option<Price>> {
        Err(MarketError::BookNotVisible)
    }

    fn best_buy_price(&self) -> MarketResult<Option<Price>> {
        Err(MarketError::BookNotVisible)
    }

    fn best_seller(&self) -> MarketResult<Option<AgentId>> {
        Err(MarketError::BookNotVisible)
    }

    fn best_buyer(&self) -> MarketResult<Option<AgentId>> {
        Err(MarketError::BookNotVisible)
    }

    fn clearing_step(
        &mut self,
        _step: ClearingStep,
        _ctx: &mut TradeCtx<'_>,
    ) -> MarketResult<ClearingOutcome> {
        Ok(ClearingOutcome::NoTrade)
    }

    /// Settle a deal the two agents negotiated outside the market. Transient
    /// quotes are minted so the trade record carries the agreed price as
    /// both bound prices.
    fn trade_directly(
        &mut self,
        ctx: &mut TradeCtx<'_>,
        buyer: AgentId,
        seller: AgentId,
        good: GoodId,
        price: Price,
    ) -> MarketResult<TradeOutcome> {
        let kind = self.core.good().clone();
        let ask = Quote::new_ask(self.core.next_quote_id(), seller, price, good, kind.clone());
        let bid = Quote::new_bid(self.core.next_quote_id(), buyer, price, kind);

        let outcome = self.core.trade(ctx.agents, buyer, seller, good, price, &bid, &ask)?;
        if let TradeOutcome::Completed(_) = &outcome {
            if let Some(agent) = ctx.agents.get_mut(buyer) {
                agent.bid_filled(&bid, good, price, seller);
            }
            if let Some(agent) = ctx.agents.get_mut(seller) {
                agent.ask_filled(&ask, good, price, buyer);
            }
        }
        Ok(outcome)
    }
}
