use agora_core::Price;

/// Decides the trade price when a seller's ask crosses a buyer's bid.
///
/// Implementations may assume `seller_price <= buyer_price` and must
/// return a price inside that closed interval.
pub trait PricePolicy {
    fn trade_price(&self, seller_price: Price, buyer_price: Price) -> Price;

    /// Stable name used in configuration files and logs.
    fn name(&self) -> &str;
}
