use agora_core::Price;
use agora_ports::PricePolicy;

/// Splits the bid/ask spread down the middle, rounding toward the seller's
/// price when the spread is odd.
pub struct AveragePricePolicy;

impl PricePolicy for AveragePricePolicy {
    fn trade_price(&self, seller_price: Price, buyer_price: Price) -> Price {
        let s = seller_price.inner();
        let b = buyer_price.inner();
        Price::new(s + (b - s) / 2)
    }

    fn name(&self) -> &str {
        "average"
    }
}
