use crate::handlers::OrderHandlerKind;
use crate::pool::AgentPool;
use crate::records::MarketRecords;
use agora_core::{AgentId, GoodId, GoodKind, Price, Quote, QuoteId, Trade, TradeOutcome};
use agora_ports::{MarketError, MarketResult, PricePolicy, TradeListener};
use agora_pricing::PricePolicyKind;
use std::collections::HashSet;

/// Construction-time knobs shared by every market topology.
#[derive(Debug, Clone, Copy)]
pub struct MarketConfig {
    pub price_policy: PricePolicyKind,
    pub order_handler: OrderHandlerKind,
    pub record_daily_history: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            price_policy: PricePolicyKind::Average,
            order_handler: OrderHandlerKind::EndOfPhase,
            record_daily_history: true,
        }
    }
}

/// State every market topology shares: the registries, the price policy,
/// the listeners, the statistics, and the settlement choke point.
pub struct MarketCore {
    good: GoodKind,
    buyers: HashSet<AgentId>,
    sellers: HashSet<AgentId>,
    price_policy: Box<dyn PricePolicy>,
    listeners: Vec<Box<dyn TradeListener>>,
    records: MarketRecords,
    active: bool,
    next_quote: u64,
}

impl MarketCore {
    pub fn new(good: GoodKind, config: &MarketConfig) -> Self {
        MarketCore {
            good,
            buyers: HashSet::new(),
            sellers: HashSet::new(),
            price_policy: config.price_policy.build(),
            listeners: Vec::new(),
            records: MarketRecords::new(config.record_daily_history),
            active: false,
            next_quote: 0,
        }
    }

    pub fn good(&self) -> &GoodKind {
        &self.good
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn turn_off(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ensure_open(&self) -> MarketResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(MarketError::MarketClosed)
        }
    }

    pub fn register_buyer(&mut self, agent: AgentId) -> MarketResult<()> {
        if !self.buyers.insert(agent) {
            return Err(MarketError::AlreadyRegistered(agent));
        }
        Ok(())
    }

    pub fn register_seller(&mut self, agent: AgentId) -> MarketResult<()> {
        if !self.sellers.insert(agent) {
            return Err(MarketError::AlreadyRegistered(agent));
        }
        Ok(())
    }

    pub fn deregister_buyer(&mut self, agent: AgentId) -> MarketResult<()> {
        if !self.buyers.remove(&agent) {
            return Err(MarketError::NotRegistered(agent));
        }
        Ok(())
    }

    pub fn deregister_seller(&mut self, agent: AgentId) -> MarketResult<()> {
        if !self.sellers.remove(&agent) {
            return Err(MarketError::NotRegistered(agent));
        }
        Ok(())
    }

    pub fn is_buyer(&self, agent: AgentId) -> bool {
        self.buyers.contains(&agent)
    }

    pub fn is_seller(&self, agent: AgentId) -> bool {
        self.sellers.contains(&agent)
    }

    pub fn next_quote_id(&mut self) -> QuoteId {
        let id = QuoteId(self.next_quote);
        self.next_quote += 1;
        id
    }

    /// Delegate to the configured price policy.
    pub fn price(&self, seller_price: Price, buyer_price: Price) -> Price {
        self.price_policy.trade_price(seller_price, buyer_price)
    }

    pub fn add_trade_listener(&mut self, listener: Box<dyn TradeListener>) {
        self.listeners.push(listener);
    }

    pub fn records(&self) -> &MarketRecords {
        &self.records
    }

    pub fn collect_day_statistics(&mut self, day: u32) {
        self.records.collect_day_statistics(day);
    }

    pub fn week_end(&mut self) {
        self.records.week_end();
    }

    /// The settlement choke point. Moves the good seller → buyer and the
    /// payment buyer → seller, then records and notifies.
    ///
    /// A buyer that cannot cover the price is not an error: the good goes
    /// back to the seller and the caller gets `BuyerBankrupt`, with the
    /// crossing quotes left wherever they live.
    pub fn trade(
        &mut self,
        agents: &mut AgentPool,
        buyer: AgentId,
        seller: AgentId,
        good: GoodId,
        price: Price,
        bid: &Quote,
        ask: &Quote,
    ) -> MarketResult<TradeOutcome> {
        self.ensure_open()?;
        if buyer == seller {
            return Err(MarketError::SelfTrade(buyer));
        }
        if !self.buyers.contains(&buyer) {
            return Err(MarketError::NotRegistered(buyer));
        }
        if !self.sellers.contains(&seller) {
            return Err(MarketError::NotRegistered(seller));
        }

        let seller_agent = agents
            .get_mut(seller)
            .ok_or(MarketError::NotRegistered(seller))?;
        let mut unit = seller_agent
            .take_good(good)
            .ok_or(MarketError::GoodNotHeld { agent: seller, good })?;
        let prior_valuation = unit.last_valid_price();

        let buyer_agent = agents
            .get_mut(buyer)
            .ok_or(MarketError::NotRegistered(buyer))?;
        if !buyer_agent.withdraw(price.as_money()) {
            log::warn!(
                "buyer {buyer} cannot pay {price} for {good} on the {} market",
                self.good
            );
            if let Some(seller_agent) = agents.get_mut(seller) {
                seller_agent.receive_good(unit);
            }
            return Ok(TradeOutcome::BuyerBankrupt(buyer));
        }
        unit.revalue(price);
        buyer_agent.receive_good(unit);

        if let Some(seller_agent) = agents.get_mut(seller) {
            seller_agent.deposit(price.as_money());
        }

        self.records
            .record_trade(price, bid.price(), ask.price(), prior_valuation);

        let trade = Trade {
            buyer,
            seller,
            good,
            kind: self.good.clone(),
            price,
            bid_price: bid.price(),
            ask_price: ask.price(),
        };
        log::debug!(
            "{}: {buyer} bought {good} from {seller} at {price}",
            self.good
        );
        for listener in &mut self.listeners {
            listener.on_trade(&trade);
        }
        Ok(TradeOutcome::Completed(trade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestTrader;
    use agora_core::Good;

    fn setup() -> (MarketCore, AgentPool) {
        let mut core = MarketCore::new(GoodKind::new("grain"), &MarketConfig::default());
        core.start();
        let mut agents = AgentPool::new();

        let mut seller = TestTrader::new(AgentId(1), 0, Price::new(100));
        seller.give(Good::new(GoodId(7), GoodKind::new("grain"), Price::new(4)));
        agents.register(Box::new(seller));
        agents.register(Box::new(TestTrader::new(AgentId(2), 50, Price::new(100))));

        core.register_seller(AgentId(1)).unwrap();
        core.register_buyer(AgentId(2)).unwrap();
        (core, agents)
    }

    fn crossing_quotes(core: &mut MarketCore) -> (Quote, Quote) {
        let kind = core.good().clone();
        let ask = Quote::new_ask(core.next_quote_id(), AgentId(1), Price::new(8), GoodId(7), kind.clone());
        let bid = Quote::new_bid(core.next_quote_id(), AgentId(2), Price::new(12), kind);
        (bid, ask)
    }

    #[test]
    fn trade_moves_good_cash_and_records() {
        let (mut core, mut agents) = setup();
        let (bid, ask) = crossing_quotes(&mut core);

        let outcome = core
            .trade(&mut agents, AgentId(2), AgentId(1), GoodId(7), Price::new(10), &bid, &ask)
            .unwrap();
        let TradeOutcome::Completed(trade) = outcome else {
            panic!("expected a completed trade");
        };
        assert_eq!(trade.price, Price::new(10));
        assert_eq!(trade.bid_price, Price::new(12));
        assert_eq!(trade.ask_price, Price::new(8));

        assert_eq!(agents.get(AgentId(1)).unwrap().cash(), 10);
        assert_eq!(agents.get(AgentId(2)).unwrap().cash(), 40);
        assert_eq!(core.records().last_price(), Some(Price::new(10)));
        assert_eq!(core.records().today_volume(), 1);
        // markup against the good's prior valuation of 4
        assert_eq!(core.records().last_markup(), Some(6));
    }

    #[test]
    fn broke_buyer_is_a_tagged_outcome_and_the_good_goes_back() {
        let (mut core, mut agents) = setup();
        let (bid, ask) = crossing_quotes(&mut core);

        let outcome = core
            .trade(&mut agents, AgentId(2), AgentId(1), GoodId(7), Price::new(80), &bid, &ask)
            .unwrap();
        assert_eq!(outcome, TradeOutcome::BuyerBankrupt(AgentId(2)));
        assert_eq!(agents.get(AgentId(2)).unwrap().cash(), 50);
        assert!(agents.get_mut(AgentId(1)).unwrap().take_good(GoodId(7)).is_some());
        assert_eq!(core.records().today_volume(), 0);
    }

    #[test]
    fn self_trade_and_unregistered_parties_are_errors() {
        let (mut core, mut agents) = setup();
        let (bid, ask) = crossing_quotes(&mut core);

        let err = core
            .trade(&mut agents, AgentId(1), AgentId(1), GoodId(7), Price::new(10), &bid, &ask)
            .unwrap_err();
        assert_eq!(err, MarketError::SelfTrade(AgentId(1)));

        let err = core
            .trade(&mut agents, AgentId(9), AgentId(1), GoodId(7), Price::new(10), &bid, &ask)
            .unwrap_err();
        assert_eq!(err, MarketError::NotRegistered(AgentId(9)));
    }

    #[test]
    fn closed_market_rejects_trades() {
        let (mut core, mut agents) = setup();
        let (bid, ask) = crossing_quotes(&mut core);
        core.turn_off();
        let err = core
            .trade(&mut agents, AgentId(2), AgentId(1), GoodId(7), Price::new(10), &bid, &ask)
            .unwrap_err();
        assert_eq!(err, MarketError::MarketClosed);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut core = MarketCore::new(GoodKind::new("grain"), &MarketConfig::default());
        core.register_buyer(AgentId(1)).unwrap();
        assert_eq!(
            core.register_buyer(AgentId(1)),
            Err(MarketError::AlreadyRegistered(AgentId(1)))
        );
        assert_eq!(
            core.deregister_seller(AgentId(1)),
            Err(MarketError::NotRegistered(AgentId(1)))
        );
    }
}
