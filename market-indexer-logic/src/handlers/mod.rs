//! Per-category event handlers.
//!
//! Every category runs the same [`auction::Auction`] state machine,
//! parameterized by the hooks of its [`category::Category`] marker type.

pub mod auction;
pub mod category;
pub mod custody;

use crate::{chains::ChainConfig, error::IngestError, events::AuctionEvent};
use alloy::primitives::{Address, U256};
use category::with_category;
use chrono::NaiveDateTime;
use entity::sea_orm_active_enums::AuctionCategory;
use sea_orm::ConnectionTrait;

/// Chain state sampled before the database transaction opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementFacts {
    /// Contract price of the auction at the block preceding settlement.
    pub price: Option<U256>,
    /// Owner of the asset token right after settlement.
    pub owner: Option<Address>,
}

/// Everything a handler needs to know about the log it applies.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub chain: &'a ChainConfig,
    /// Auction contract that emitted the log.
    pub contract: Address,
    pub tx_hash: &'a str,
    pub log_index: u64,
    pub block_timestamp: NaiveDateTime,
    pub settlement: Option<&'a SettlementFacts>,
}

pub async fn apply<D: ConnectionTrait>(
    db: &D,
    category: AuctionCategory,
    ctx: &HandlerContext<'_>,
    event: &AuctionEvent,
) -> Result<(), IngestError> {
    with_category!(category, C => auction::Auction::<C>::apply(db, ctx, event).await)
}
