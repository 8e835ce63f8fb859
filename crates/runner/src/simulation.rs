use crate::agents::{FixedBudgetBuyer, FixedPriceSeller};
use crate::config::{MarketTopology, SimulationConfig};
use agora_core::{
    AgentId, ClearingEvent, ClearingOutcome, Good, GoodId, GoodKind, Phase, Price, Priority,
    SubmitOutcome, Trade, TradeOutcome,
};
use agora_market::{AgentPool, Market, TradeCtx};
use agora_ports::{EconomicAgent, MarketError, MarketResult, TradeListener};
use agora_scheduler::EventQueue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Everything the driver's event queue carries: market clearing callbacks,
/// daily agent turns, and the end-of-day statistics rollover.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Clearing(ClearingEvent),
    AgentTurn(AgentId),
    DayStatistics,
}

impl From<ClearingEvent> for SimEvent {
    fn from(event: ClearingEvent) -> Self {
        SimEvent::Clearing(event)
    }
}

/// What an agent does with its daily turn.
enum TradePlan {
    Sell { price: Price },
    Buy { price: Price },
}

/// A seller's posting on the decentralized bulletin: no market book exists,
/// so the driver keeps the board the buyers search.
struct Posting {
    seller: AgentId,
    good: GoodId,
    price: Price,
}

#[derive(Clone, Default)]
struct TradeCounter(Rc<Cell<u64>>);

impl TradeListener for TradeCounter {
    fn on_trade(&mut self, _trade: &Trade) {
        self.0.set(self.0.get() + 1);
    }
}

/// End-of-run report, printed as JSON by the binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub good: String,
    pub topology: String,
    pub days: u32,
    pub total_trades: u64,
    pub last_price: Option<u64>,
    pub smoothed_price: Option<f64>,
    pub bankruptcies: Vec<u64>,
    pub surviving_agents: usize,
}

/// One configured run: a market, its agents, and the event queue that
/// drives them through the daily phases.
pub struct Simulation {
    config: SimulationConfig,
    topology: MarketTopology,
    scheduler: EventQueue<SimEvent>,
    agents: AgentPool,
    market: Box<dyn Market>,
    plans: HashMap<AgentId, TradePlan>,
    bulletin: Vec<Posting>,
    next_good: u64,
    bankruptcies: Vec<AgentId>,
    trades: TradeCounter,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> MarketResult<Self> {
        let topology = config
            .topology()
            .unwrap_or(MarketTopology::OrderBookBatch);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let kind = GoodKind::new(&config.good);
        let mut market = topology.build(kind, &config.market_config());
        let mut agents = AgentPool::new();
        let mut plans = HashMap::new();
        let trades = TradeCounter::default();
        market.add_trade_listener(Box::new(trades.clone()));

        let mut scheduler: EventQueue<SimEvent> = EventQueue::new();
        let (ask_lo, ask_hi) = config.seller_price_range;
        for id in 1..=u64::from(config.sellers) {
            let price = Price::new(rng.gen_range(ask_lo..=ask_hi));
            let seller = FixedPriceSeller::new(AgentId(id), price);
            market.register_seller(&seller)?;
            plans.insert(seller.id(), TradePlan::Sell { price });
            agents.register(Box::new(seller));
        }
        let (bid_lo, bid_hi) = config.buyer_price_range;
        let first_buyer = u64::from(config.sellers) + 1;
        for id in first_buyer..first_buyer + u64::from(config.buyers) {
            let price = Price::new(rng.gen_range(bid_lo..=bid_hi));
            let buyer = FixedBudgetBuyer::new(AgentId(id), config.initial_buyer_cash, price);
            market.register_buyer(&buyer)?;
            plans.insert(buyer.id(), TradePlan::Buy { price });
            agents.register(Box::new(buyer));
        }

        market.start(&mut scheduler);
        for id in agents.ids() {
            scheduler.schedule_on(0, Phase::Trade, Priority::Standard, SimEvent::AgentTurn(id));
        }
        scheduler.schedule_on(
            0,
            Phase::CleanupDataGathering,
            Priority::Final,
            SimEvent::DayStatistics,
        );

        Ok(Simulation {
            config,
            topology,
            scheduler,
            agents,
            market,
            plans,
            bulletin: Vec::new(),
            next_good: 0,
            bankruptcies: Vec::new(),
            trades,
        })
    }

    pub fn run(&mut self) -> MarketResult<SimulationSummary> {
        while let Some(event) = self.scheduler.pop() {
            if event.day >= self.config.days {
                break;
            }
            match event.event {
                SimEvent::Clearing(clearing) => self.clearing(clearing)?,
                SimEvent::AgentTurn(agent) => self.agent_turn(agent)?,
                SimEvent::DayStatistics => self.day_statistics(event.day),
            }
        }
        Ok(self.summary())
    }

    pub fn market(&self) -> &dyn Market {
        self.market.as_ref()
    }

    fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            good: self.config.good.clone(),
            topology: self.topology.name().to_string(),
            days: self.config.days,
            total_trades: self.trades.0.get(),
            last_price: self.market.records().last_price().map(Price::inner),
            smoothed_price: self.market.records().smoothed_price(),
            bankruptcies: self.bankruptcies.iter().map(|a| a.0).collect(),
            surviving_agents: self.agents.len(),
        }
    }

    fn clearing(&mut self, event: ClearingEvent) -> MarketResult<()> {
        let mut ctx = TradeCtx { agents: &mut self.agents, scheduler: &mut self.scheduler };
        if let ClearingOutcome::Bankrupt(agent) = self.market.clearing_step(event.step, &mut ctx)? {
            self.retire(agent)?;
        }
        Ok(())
    }

    fn agent_turn(&mut self, agent: AgentId) -> MarketResult<()> {
        if !self.agents.contains(agent) {
            return Ok(()); // retired earlier today
        }
        match self.plans.get(&agent) {
            Some(&TradePlan::Sell { price }) => self.seller_turn(agent, price)?,
            Some(&TradePlan::Buy { price }) => self.buyer_turn(agent, price)?,
            None => return Ok(()),
        }
        self.scheduler.schedule_tomorrow(
            Phase::Trade,
            Priority::Standard,
            SimEvent::AgentTurn(agent),
        );
        Ok(())
    }

    fn seller_turn(&mut self, seller: AgentId, price: Price) -> MarketResult<()> {
        self.next_good += 1;
        let good = Good::new(GoodId(self.next_good), GoodKind::new(&self.config.good), price);
        let good_id = good.id();
        if let Some(agent) = self.agents.get_mut(seller) {
            agent.receive_good(good);
        }

        if self.topology == MarketTopology::Decentralized {
            self.bulletin.push(Posting { seller, good: good_id, price });
            return Ok(());
        }
        let mut ctx = TradeCtx { agents: &mut self.agents, scheduler: &mut self.scheduler };
        let outcome = self
            .market
            .submit_sell_quote(&mut ctx, seller, price, good_id, None)?;
        if let SubmitOutcome::Bankrupt(broke) = outcome {
            self.retire(broke)?;
        }
        Ok(())
    }

    fn buyer_turn(&mut self, buyer: AgentId, price: Price) -> MarketResult<()> {
        if self.topology == MarketTopology::Decentralized {
            return self.search_bulletin(buyer, price);
        }
        let mut ctx = TradeCtx { agents: &mut self.agents, scheduler: &mut self.scheduler };
        let outcome = self.market.submit_buy_quote(&mut ctx, buyer, price, None)?;
        if let SubmitOutcome::Bankrupt(broke) = outcome {
            self.retire(broke)?;
        }
        Ok(())
    }

    /// Decentralized search: take the cheapest posting the buyer can cover
    /// and settle it directly.
    fn search_bulletin(&mut self, buyer: AgentId, reservation: Price) -> MarketResult<()> {
        let cash = match self.agents.get(buyer) {
            Some(agent) => agent.cash(),
            None => return Ok(()),
        };
        let found = self
            .bulletin
            .iter()
            .enumerate()
            .filter(|(_, p)| p.price <= reservation && p.price.as_money() <= cash)
            .min_by_key(|(_, p)| (p.price, p.seller))
            .map(|(i, _)| i);
        let Some(index) = found else {
            return Ok(());
        };
        let posting = self.bulletin.swap_remove(index);

        let mut ctx = TradeCtx { agents: &mut self.agents, scheduler: &mut self.scheduler };
        let outcome = self.market.trade_directly(
            &mut ctx,
            buyer,
            posting.seller,
            posting.good,
            posting.price,
        )?;
        if let TradeOutcome::BuyerBankrupt(broke) = outcome {
            self.bulletin.push(posting);
            self.retire(broke)?;
        }
        Ok(())
    }

    fn day_statistics(&mut self, day: u32) {
        self.market.collect_day_statistics(day);
        if (day + 1) % 7 == 0 {
            self.market.week_end();
        }
        self.scheduler.schedule_tomorrow(
            Phase::CleanupDataGathering,
            Priority::Final,
            SimEvent::DayStatistics,
        );
    }

    /// Pull a bankrupt agent out of the simulation: quotes first, then
    /// registration, then the pool.
    fn retire(&mut self, agent: AgentId) -> MarketResult<()> {
        log::warn!("retiring bankrupt agent {agent}");
        let pulled_bids = self.market.remove_all_buy_quotes_by(agent);
        let pulled_asks = self.market.remove_all_sell_quotes_by(agent);
        log::debug!(
            "{agent}: dropped {} bids and {} asks",
            pulled_bids.len(),
            pulled_asks.len()
        );
        match self.plans.remove(&agent) {
            Some(TradePlan::Buy { .. }) => self.market.deregister_buyer(agent)?,
            Some(TradePlan::Sell { .. }) => self.market.deregister_seller(agent)?,
            None => return Err(MarketError::NotRegistered(agent)),
        }
        self.bulletin.retain(|p| p.seller != agent);
        self.agents.remove(agent);
        self.bankruptcies.push(agent);
        Ok(())
    }
}
