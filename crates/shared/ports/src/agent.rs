use agora_core::{AgentId, Good, GoodId, GoodKind, Money, Price, Quote, SellerOffer};

/// An agent as the market engine sees it: a wallet, an inventory, and the
/// fill callbacks matching invokes after settlement.
///
/// Settlement order is fixed: the market first takes the good from the
/// seller, then calls [`withdraw`](EconomicAgent::withdraw) on the buyer.
/// A `false` return means the buyer cannot pay; the market puts the good
/// back and reports the buyer as bankrupt instead of erroring.
pub trait EconomicAgent {
    fn id(&self) -> AgentId;

    /// Cash currently on hand.
    fn cash(&self) -> Money;

    /// Credit the wallet with sale proceeds.
    fn deposit(&mut self, amount: Money);

    /// Debit the wallet. Returns `false` (leaving the wallet untouched)
    /// when the agent cannot cover `amount`.
    fn withdraw(&mut self, amount: Money) -> bool;

    /// Transfer a purchased unit into the agent's inventory.
    fn receive_good(&mut self, good: Good);

    /// Surrender the given unit, or `None` if the agent does not hold it.
    fn take_good(&mut self, good: GoodId) -> Option<Good>;

    /// The most this agent would pay per unit of `kind`. Sampled once at
    /// registration time by markets that rank buyers by willingness to pay.
    fn max_price(&self, kind: &GoodKind) -> Price;

    /// One of the agent's bids filled: it bought `good` at `price` from
    /// `seller`. The unit is already in inventory when this fires.
    fn bid_filled(&mut self, quote: &Quote, good: GoodId, price: Price, seller: AgentId);

    /// One of the agent's asks filled: it sold `good` at `price` to `buyer`.
    /// Proceeds are already deposited when this fires.
    fn ask_filled(&mut self, quote: &Quote, good: GoodId, price: Price, buyer: AgentId);

    /// Pick a seller from the offers currently on the board, or `None` to
    /// sit out this round. Only decentralized markets ask; the default is
    /// to abstain.
    fn choose_supplier(&self, offers: &[SellerOffer]) -> Option<AgentId> {
        let _ = offers;
        None
    }
}
