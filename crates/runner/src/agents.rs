use agora_core::{AgentId, Good, GoodId, GoodKind, Money, Price, Quote, SellerOffer};
use agora_ports::EconomicAgent;
use std::collections::HashMap;

/// Demo producer: asks the same fixed price for every unit it mints.
pub struct FixedPriceSeller {
    id: AgentId,
    cash: Money,
    ask_price: Price,
    inventory: HashMap<GoodId, Good>,
    units_sold: u32,
}

impl FixedPriceSeller {
    pub fn new(id: AgentId, ask_price: Price) -> Self {
        FixedPriceSeller {
            id,
            cash: 0,
            ask_price,
            inventory: HashMap::new(),
            units_sold: 0,
        }
    }

    pub fn ask_price(&self) -> Price {
        self.ask_price
    }

    pub fn units_sold(&self) -> u32 {
        self.units_sold
    }
}

impl EconomicAgent for FixedPriceSeller {
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
        // Sellers never buy.
        Price::ZERO
    }

    fn bid_filled(&mut self, _quote: &Quote, _good: GoodId, _price: Price, _seller: AgentId) {}

    fn ask_filled(&mut self, _quote: &Quote, _good: GoodId, _price: Price, _buyer: AgentId) {
        self.units_sold += 1;
    }
}

/// Demo consumer: bids its reservation price daily until the cash runs out,
/// and in supplier-choice markets picks the cheapest offer it can cover.
pub struct FixedBudgetBuyer {
    id: AgentId,
    cash: Money,
    reservation: Price,
    inventory: HashMap<GoodId, Good>,
    units_bought: u32,
}

impl FixedBudgetBuyer {
    pub fn new(id: AgentId, cash: Money, reservation: Price) -> Self {
        FixedBudgetBuyer {
            id,
            cash,
            reservation,
            inventory: HashMap::new(),
            units_bought: 0,
        }
    }

    pub fn reservation(&self) -> Price {
        self.reservation
    }

    pub fn units_bought(&self) -> u32 {
        self.units_bought
    }
}

impl EconomicAgent for FixedBudgetBuyer {
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
        self.reservation
    }

    fn bid_filled(&mut self, _quote: &Quote, _good: GoodId, _price: Price, _seller: AgentId) {
        self.units_bought += 1;
    }

    fn ask_filled(&mut self, _quote: &Quote, _good: GoodId, _price: Price, _buyer: AgentId) {}

    fn choose_supplier(&self, offers: &[SellerOffer]) -> Option<AgentId> {
        offers
            .iter()
            .filter(|o| o.price <= self.reservation && o.price.as_money() <= self.cash)
            .min_by_key(|o| (o.price, o.seller))
            .map(|o| o.seller)
    }
}
