use agora_core::Trade;

/// Observer notified after every settled trade on a market. Listeners run
/// after both agents' fill callbacks and must not mutate market state.
pub trait TradeListener {
    fn on_trade(&mut self, trade: &Trade);
}
