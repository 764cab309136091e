use crate::{
    chains::{ChainContext, ContractName},
    decoder::RawLog,
    events::EventKind,
};
use alloy::primitives::{Address, B256};
use entity::sea_orm_active_enums::AuctionCategory;
use std::collections::HashMap;

/// Auction contract backing each marketplace category.
pub const AUCTION_CONTRACTS: [(ContractName, AuctionCategory); 5] = [
    (ContractName::LandSale, AuctionCategory::LandSale),
    (ContractName::LandLease, AuctionCategory::LandLease),
    (ContractName::CreatureSale, AuctionCategory::CreatureSale),
    (ContractName::CreatureBreeding, AuctionCategory::CreatureBreeding),
    (ContractName::CreatureLease, AuctionCategory::CreatureLease),
];

pub fn is_lease(category: AuctionCategory) -> bool {
    matches!(
        category,
        AuctionCategory::LandLease | AuctionCategory::CreatureLease
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub district: i32,
    pub category: AuctionCategory,
    pub kind: EventKind,
}

/// Table from (district, emitting contract, event signature) to the handler
/// that applies the log. Built once from the chain table.
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    routes: HashMap<(i32, Address, B256), Route>,
    watched: HashMap<i32, Vec<Address>>,
}

impl EventRouter {
    pub fn new(context: &ChainContext) -> Self {
        let mut routes = HashMap::new();
        let mut watched: HashMap<i32, Vec<Address>> = HashMap::new();

        for chain in context.chains() {
            for (name, category) in AUCTION_CONTRACTS {
                let Some(address) = chain.contract(name) else {
                    continue;
                };
                watched.entry(chain.district).or_default().push(address);

                let lease_kinds = is_lease(category).then_some(EventKind::LeaseEnded);
                for kind in EventKind::AUCTION.into_iter().chain(lease_kinds) {
                    routes.insert(
                        (chain.district, address, kind.signature()),
                        Route {
                            district: chain.district,
                            category,
                            kind,
                        },
                    );
                }
            }
        }

        Self { routes, watched }
    }

    pub fn route(&self, district: i32, log: &RawLog) -> Option<Route> {
        let signature = log.signature()?;
        self.routes.get(&(district, log.address, signature)).copied()
    }

    /// Auction contracts whose logs the watcher must fetch for a district.
    pub fn watched_addresses(&self, district: i32) -> &[Address] {
        self.watched
            .get(&district)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
