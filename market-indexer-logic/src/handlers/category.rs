//! Per-category hooks of the shared auction state machine.

use crate::chains::{ChainConfig, ContractName};
use bigdecimal::BigDecimal;
use entity::sea_orm_active_enums::{AssetKind, AuctionCategory, CustodyStatus};
use std::time::Duration;

/// Who holds the asset once an auction settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementCustody {
    Winner,
    Seller,
}

/// Where the settlement price comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Contract view `getCurrentPriceInToken` right before the settling block.
    OnChain,
    /// Price carried by the settlement event.
    Event,
}

pub trait Category: Send + Sync + 'static {
    const KIND: AuctionCategory;
    /// Auction contract, which is also the escrow holder of listed assets.
    const CONTRACT: ContractName;
    /// Kind of the auctioned asset. Custody is tracked per kind.
    const ASSET: AssetKind;
    const ESCROW: CustodyStatus;
    const SETTLED: CustodyStatus;
    const SETTLEMENT_CUSTODY: SettlementCustody;
    const PRICE_SOURCE: PriceSource;
    const LEASE: bool;

    /// Share of the settlement price withheld from the seller.
    fn fee_rate(_chain: &ChainConfig) -> BigDecimal {
        fixed_settlement_tax()
    }

    fn claim_window(chain: &ChainConfig) -> Duration {
        chain.claim_window()
    }
}

/// Breeding and lease settlements net the seller 96% of the price.
pub fn fixed_settlement_tax() -> BigDecimal {
    BigDecimal::new(4.into(), 2)
}

pub struct LandSale;
pub struct LandLease;
pub struct CreatureSale;
pub struct CreatureBreeding;
pub struct CreatureLease;

impl Category for LandSale {
    const KIND: AuctionCategory = AuctionCategory::LandSale;
    const CONTRACT: ContractName = ContractName::LandSale;
    const ASSET: AssetKind = AssetKind::Land;
    const ESCROW: CustodyStatus = CustodyStatus::OnSale;
    const SETTLED: CustodyStatus = CustodyStatus::Claimed;
    const SETTLEMENT_CUSTODY: SettlementCustody = SettlementCustody::Winner;
    const PRICE_SOURCE: PriceSource = PriceSource::OnChain;
    const LEASE: bool = false;

    fn fee_rate(chain: &ChainConfig) -> BigDecimal {
        chain.sale_fee_rate.clone()
    }
}

impl Category for LandLease {
    const KIND: AuctionCategory = AuctionCategory::LandLease;
    const CONTRACT: ContractName = ContractName::LandLease;
    const ASSET: AssetKind = AssetKind::Land;
    const ESCROW: CustodyStatus = CustodyStatus::OnLease;
    const SETTLED: CustodyStatus = CustodyStatus::Leased;
    const SETTLEMENT_CUSTODY: SettlementCustody = SettlementCustody::Seller;
    const PRICE_SOURCE: PriceSource = PriceSource::Event;
    const LEASE: bool = true;
}

impl Category for CreatureSale {
    const KIND: AuctionCategory = AuctionCategory::CreatureSale;
    const CONTRACT: ContractName = ContractName::CreatureSale;
    const ASSET: AssetKind = AssetKind::Creature;
    const ESCROW: CustodyStatus = CustodyStatus::OnSale;
    const SETTLED: CustodyStatus = CustodyStatus::Claimed;
    const SETTLEMENT_CUSTODY: SettlementCustody = SettlementCustody::Winner;
    const PRICE_SOURCE: PriceSource = PriceSource::Event;
    const LEASE: bool = false;

    fn fee_rate(chain: &ChainConfig) -> BigDecimal {
        chain.sale_fee_rate.clone()
    }
}

impl Category for CreatureBreeding {
    const KIND: AuctionCategory = AuctionCategory::CreatureBreeding;
    const CONTRACT: ContractName = ContractName::CreatureBreeding;
    const ASSET: AssetKind = AssetKind::Creature;
    const ESCROW: CustodyStatus = CustodyStatus::OnBreeding;
    const SETTLED: CustodyStatus = CustodyStatus::Free;
    const SETTLEMENT_CUSTODY: SettlementCustody = SettlementCustody::Seller;
    const PRICE_SOURCE: PriceSource = PriceSource::Event;
    const LEASE: bool = false;
}

impl Category for CreatureLease {
    const KIND: AuctionCategory = AuctionCategory::CreatureLease;
    const CONTRACT: ContractName = ContractName::CreatureLease;
    const ASSET: AssetKind = AssetKind::Creature;
    const ESCROW: CustodyStatus = CustodyStatus::OnLease;
    const SETTLED: CustodyStatus = CustodyStatus::Leased;
    const SETTLEMENT_CUSTODY: SettlementCustody = SettlementCustody::Seller;
    const PRICE_SOURCE: PriceSource = PriceSource::Event;
    const LEASE: bool = true;
}

/// Runs `$body` with `$C` bound to the marker type of `$category`.
macro_rules! with_category {
    ($category:expr, $C:ident => $body:expr) => {
        match $category {
            ::entity::sea_orm_active_enums::AuctionCategory::LandSale => {
                type $C = $crate::handlers::category::LandSale;
                $body
            }
            ::entity::sea_orm_active_enums::AuctionCategory::LandLease => {
                type $C = $crate::handlers::category::LandLease;
                $body
            }
            ::entity::sea_orm_active_enums::AuctionCategory::CreatureSale => {
                type $C = $crate::handlers::category::CreatureSale;
                $body
            }
            ::entity::sea_orm_active_enums::AuctionCategory::CreatureBreeding => {
                type $C = $crate::handlers::category::CreatureBreeding;
                $body
            }
            ::entity::sea_orm_active_enums::AuctionCategory::CreatureLease => {
                type $C = $crate::handlers::category::CreatureLease;
                $body
            }
        }
    };
}
pub(crate) use with_category;

pub fn fee_rate(category: AuctionCategory, chain: &ChainConfig) -> BigDecimal {
    with_category!(category, C => C::fee_rate(chain))
}

pub fn claim_window(category: AuctionCategory, chain: &ChainConfig) -> Duration {
    with_category!(category, C => C::claim_window(chain))
}

pub fn price_source(category: AuctionCategory) -> PriceSource {
    with_category!(category, C => C::PRICE_SOURCE)
}

pub fn settlement_custody(category: AuctionCategory) -> SettlementCustody {
    with_category!(category, C => C::SETTLEMENT_CUSTODY)
}

pub fn asset_kind(category: AuctionCategory) -> AssetKind {
    with_category!(category, C => C::ASSET)
}

/// Token contract of the auctioned asset.
pub fn asset_contract(category: AuctionCategory) -> ContractName {
    match asset_kind(category) {
        AssetKind::Land => ContractName::Land,
        AssetKind::Creature => ContractName::Creature,
    }
}
