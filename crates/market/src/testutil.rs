//! Minimal agent used by the unit tests in this crate.

use agora_core::{AgentId, Good, GoodId, GoodKind, Money, Price, Quote, SellerOffer};
use agora_ports::EconomicAgent;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared view of a trader's fill callbacks. Cloned out of the trader
/// before it is boxed into the pool, so tests can assert on notifications
/// after the fact.
#[derive(Clone, Default)]
pub(crate) struct FillLog {
    pub(crate) bids: Rc<RefCell<Vec<(GoodId, Price, AgentId)>>>,
    pub(crate) asks: Rc<RefCell<Vec<(GoodId, Price, AgentId)>>>,
}

pub(crate) struct TestTrader {
    id: AgentId,
    cash: Money,
    max_price: Price,
    inventory: HashMap<GoodId, Good>,
    fills: FillLog,
    /// `choose_supplier` answer, when set; otherwise cheapest affordable.
    /// The answer is returned as-is, offered or not.
    pub(crate) preferred_seller: Option<AgentId>,
}

impl TestTrader {
    pub(crate) fn new(id: AgentId, cash: Money, max_price: Price) -> Self {
        TestTrader {
            id,
            cash,
            max_price,
            inventory: HashMap::new(),
            fills: FillLog::default(),
            preferred_seller: None,
        }
    }

    pub(crate) fn give(&mut self, good: Good) {
        self.inventory.insert(good.id(), good);
    }

    pub(crate) fn fill_log(&self) -> FillLog {
        self.fills.clone()
    }
}

impl EconomicAgent for TestTrader {
    fn id(&self) -> AgentId {
        self.id
    }

    fn cash(&self) -> Money {
        self.cash
    }

    fn deposit(&mut self, amount: Money) {
        self.cash += amount;
    }

    fn withdraw(&mut self, amount: Money) -> bool {
        if self.cash < amount {
            return false;
        }
        self.cash -= amount;
        true
    }

    fn receive_good(&mut self, good: Good) {
        self.inventory.insert(good.id(), good);
    }

    fn take_good(&mut self, good: GoodId) -> Option<Good> {
        self.inventory.remove(&good)
    }

    fn max_price(&self, _kind: &GoodKind) -> Price {
        self.max_price
    }

    fn bid_filled(&mut self, _quote: &Quote, good: GoodId, price: Price, seller: AgentId) {
        self.fills.bids.borrow_mut().push((good, price, seller));
    }

    fn ask_filled(&mut self, _quote: &Quote, good: GoodId, price: Price, buyer: AgentId) {
        self.fills.asks.borrow_mut().push((good, price, buyer));
    }

    fn choose_supplier(&self, offers: &[SellerOffer]) -> Option<AgentId> {
        if self.preferred_seller.is_some() {
            return self.preferred_seller;
        }
        offers
            .iter()
            .filter(|o| o.price <= self.max_price)
            .min_by_key(|o| (o.price, o.seller))
            .map(|o| o.seller)
    }
}
