use agora_core::Price;
use agora_ports::PricePolicy;

/// The buyer dictates: trades settle at the bid price.
pub struct BuyerSetsPricePolicy;

impl PricePolicy for BuyerSetsPricePolicy {
    fn trade_price(&self, _seller_price: Price, buyer_price: Price) -> Price {
        buyer_price
    }

    fn name(&self) -> &str {
        "buyer-sets"
    }
}

/// The seller dictates: trades settle at the ask price.
pub struct SellerSetsPricePolicy;

impl PricePolicy for SellerSetsPricePolicy {
    fn trade_price(&self, seller_price: Price, _buyer_price: Price) -> Price {
        seller_price
    }

    fn name(&self) -> &str {
        "seller-sets"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buyer_sets_returns_bid_price() {
        let policy = BuyerSetsPricePolicy;
        assert_eq!(policy.trade_price(Price::new(10), Price::new(20)), Price::new(20));
    }

    #[test]
    fn seller_sets_returns_ask_price() {
        let policy = SellerSetsPricePolicy;
        assert_eq!(policy.trade_price(Price::new(10), Price::new(20)), Price::new(10));
    }
}
