use crate::{claim::EffectiveStatus, pricing};
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use entity::{
    auction_bids, auctions,
    sea_orm_active_enums::{AuctionCategory, AuctionStatus},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use serde::Serialize;
use std::time::Duration;

/// Auction as observed by readers: stored row plus derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionView {
    pub id: i64,
    pub district: i32,
    pub token_id: String,
    pub seller: String,
    pub currency: String,
    pub status: EffectiveStatus,
    pub current_price: Option<BigDecimal>,
    pub last_bidder: Option<String>,
    pub last_price: Option<BigDecimal>,
    pub winner: Option<String>,
    pub final_price: Option<BigDecimal>,
}

impl AuctionView {
    pub fn new(auction: auctions::Model, now: NaiveDateTime, claim_window: Duration) -> Self {
        Self {
            status: crate::claim::effective_status(&auction, now, claim_window),
            current_price: pricing::current_price(&auction, now),
            id: auction.id,
            district: auction.district,
            token_id: auction.token_id,
            seller: auction.seller,
            currency: auction.currency,
            last_bidder: auction.last_bidder,
            last_price: auction.last_price,
            winner: auction.winner,
            final_price: auction.final_price,
        }
    }
}

pub(crate) fn going_query(
    district: i32,
    token_id: &str,
    category: AuctionCategory,
) -> Select<auctions::Entity> {
    auctions::Entity::find()
        .filter(auctions::Column::District.eq(district))
        .filter(auctions::Column::TokenId.eq(token_id))
        .filter(auctions::Column::Category.eq(category))
        .filter(auctions::Column::Status.eq(AuctionStatus::Going))
}

pub async fn find_going<C: ConnectionTrait>(
    db: &C,
    district: i32,
    token_id: &str,
    category: AuctionCategory,
) -> Result<Option<auctions::Model>, DbErr> {
    going_query(district, token_id, category).one(db).await
}

/// Same as [`find_going`], holding a row lock until the enclosing transaction ends.
pub async fn find_going_for_update<C: ConnectionTrait>(
    db: &C,
    district: i32,
    token_id: &str,
    category: AuctionCategory,
) -> Result<Option<auctions::Model>, DbErr> {
    going_query(district, token_id, category)
        .lock_exclusive()
        .one(db)
        .await
}

/// Most recent finished auction of a token, used to end leases.
pub async fn find_latest_finished_for_update<C: ConnectionTrait>(
    db: &C,
    district: i32,
    token_id: &str,
    category: AuctionCategory,
) -> Result<Option<auctions::Model>, DbErr> {
    auctions::Entity::find()
        .filter(auctions::Column::District.eq(district))
        .filter(auctions::Column::TokenId.eq(token_id))
        .filter(auctions::Column::Category.eq(category))
        .filter(auctions::Column::Status.eq(AuctionStatus::Finish))
        .order_by_desc(auctions::Column::Id)
        .lock_exclusive()
        .one(db)
        .await
}

pub async fn history<C: ConnectionTrait>(
    db: &C,
    district: i32,
    token_id: &str,
    category: AuctionCategory,
) -> Result<Vec<auctions::Model>, DbErr> {
    auctions::Entity::find()
        .filter(auctions::Column::District.eq(district))
        .filter(auctions::Column::TokenId.eq(token_id))
        .filter(auctions::Column::Category.eq(category))
        .order_by_asc(auctions::Column::Id)
        .all(db)
        .await
}

/// Going auctions of a category, ordered by id. Returns the page and the
/// token of the next page, if any.
pub async fn list_going<C: ConnectionTrait>(
    db: &C,
    district: i32,
    category: AuctionCategory,
    page_token: Option<i64>,
    limit: u64,
) -> Result<(Vec<auctions::Model>, Option<i64>), DbErr> {
    let mut auctions = auctions::Entity::find()
        .filter(auctions::Column::District.eq(district))
        .filter(auctions::Column::Category.eq(category))
        .filter(auctions::Column::Status.eq(AuctionStatus::Going))
        .filter(auctions::Column::Id.gte(page_token.unwrap_or_default()))
        .order_by_asc(auctions::Column::Id)
        .limit(limit + 1)
        .all(db)
        .await?;

    match auctions.get(limit as usize) {
        Some(next) => {
            let next = next.id;
            auctions.truncate(limit as usize);
            Ok((auctions, Some(next)))
        }
        None => Ok((auctions, None)),
    }
}

pub async fn bids_of<C: ConnectionTrait>(
    db: &C,
    auction_id: i64,
) -> Result<Vec<auction_bids::Model>, DbErr> {
    auction_bids::Entity::find()
        .filter(auction_bids::Column::AuctionId.eq(auction_id))
        .order_by_asc(auction_bids::Column::Id)
        .all(db)
        .await
}
