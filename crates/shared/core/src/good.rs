use crate::values::{GoodId, GoodKind, Price};
use serde::{Deserialize, Serialize};

/// One physical unit of a good, owned by exactly one agent at a time.
///
/// `last_valid_price` is the price the unit last changed hands at (or its
/// production cost before the first sale). Markets read it right before a
/// trade to compute the seller's markup, then revalue the unit at the
/// trade price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Good {
    id: GoodId,
    kind: GoodKind,
    last_valid_price: Price,
}

impl Good {
    pub fn new(id: GoodId, kind: GoodKind, cost: Price) -> Self {
        Good {
            id,
            kind,
            last_valid_price: cost,
        }
    }

    pub fn id(&self) -> GoodId {
        self.id
    }

    pub fn kind(&self) -> &GoodKind {
        &self.kind
    }

    pub fn last_valid_price(&self) -> Price {
        self.last_valid_price
    }

    /// Record that the unit changed hands at `price`.
    pub fn revalue(&mut self, price: Price) {
        self.last_valid_price = price;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revalue_updates_last_valid_price() {
        let mut good = Good::new(GoodId(1), GoodKind::new("grain"), Price::new(5));
        assert_eq!(good.last_valid_price(), Price::new(5));
        good.revalue(Price::new(9));
        assert_eq!(good.last_valid_price(), Price::new(9));
    }
}
