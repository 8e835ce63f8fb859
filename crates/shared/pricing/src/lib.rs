//! Agora Pricing
//!
//! Price policy implementations plus the registry markets build them from.
//! Every policy receives the crossing pair (seller price first) and must
//! answer inside the closed interval between them.

pub mod average;
pub mod dictated;

pub use average::AveragePricePolicy;
pub use dictated::{BuyerSetsPricePolicy, SellerSetsPricePolicy};

use agora_ports::PricePolicy;
use rand::Rng;

/// Every price policy the engine knows, by stable configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePolicyKind {
    Average,
    BuyerSets,
    SellerSets,
}

impl PricePolicyKind {
    pub const ALL: [PricePolicyKind; 3] = [
        PricePolicyKind::Average,
        PricePolicyKind::BuyerSets,
        PricePolicyKind::SellerSets,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "average" => Some(PricePolicyKind::Average),
            "buyer-sets" => Some(PricePolicyKind::BuyerSets),
            "seller-sets" => Some(PricePolicyKind::SellerSets),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PricePolicyKind::Average => "average",
            PricePolicyKind::BuyerSets => "buyer-sets",
            PricePolicyKind::SellerSets => "seller-sets",
        }
    }

    pub fn build(self) -> Box<dyn PricePolicy> {
        match self {
            PricePolicyKind::Average => Box::new(AveragePricePolicy),
            PricePolicyKind::BuyerSets => Box::new(BuyerSetsPricePolicy),
            PricePolicyKind::SellerSets => Box::new(SellerSetsPricePolicy),
        }
    }

    /// Draw one of the known policies uniformly. Used by randomized
    /// scenario setups.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl Default for PricePolicyKind {
    fn default() -> Self {
        PricePolicyKind::Average
    }
}

/// Build a price policy by name, defaulting to the midpoint policy when
/// the name is unknown.
pub fn create_price_policy(name: &str) -> Box<dyn PricePolicy> {
    PricePolicyKind::from_name(name)
        .unwrap_or(PricePolicyKind::Average)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_registry() {
        for kind in PricePolicyKind::ALL {
            assert_eq!(PricePolicyKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.build().name(), kind.name());
        }
    }

    #[test]
    fn unknown_name_falls_back_to_average() {
        assert_eq!(create_price_policy("no-such-policy").name(), "average");
    }
}
