//! At-most-once application of logical actions.
//!
//! An action is one routed log of a blockchain transaction. Its record is
//! written inside the same database transaction as the state it mutates, so
//! the record exists iff the mutation committed. The `(tx_hash, action)`
//! primary key turns a concurrent second delivery into a unique violation
//! that aborts the losing transaction.

use crate::{error::IngestError, events::EventKind};
use entity::{applied_actions, sea_orm_active_enums::AuctionCategory};
use sea_orm::{ActiveValue::Set, ConnectionTrait, EntityTrait};

/// Stable name of an action, unique within its transaction.
pub fn action_key(category: AuctionCategory, kind: EventKind, log_index: u64) -> String {
    format!("{}.{}#{}", category_name(category), kind.name(), log_index)
}

pub fn category_name(category: AuctionCategory) -> &'static str {
    match category {
        AuctionCategory::LandSale => "land_sale",
        AuctionCategory::LandLease => "land_lease",
        AuctionCategory::CreatureSale => "creature_sale",
        AuctionCategory::CreatureBreeding => "creature_breeding",
        AuctionCategory::CreatureLease => "creature_lease",
    }
}

pub async fn check_applied<C: ConnectionTrait>(
    db: &C,
    tx_hash: &str,
    action: &str,
) -> Result<Option<applied_actions::Model>, IngestError> {
    let record =
        applied_actions::Entity::find_by_id((tx_hash.to_string(), action.to_string()))
            .one(db)
            .await?;
    Ok(record)
}

pub async fn mark_applied<C: ConnectionTrait>(
    db: &C,
    tx_hash: &str,
    action: &str,
    district: i32,
    block_number: i64,
) -> Result<(), IngestError> {
    applied_actions::Entity::insert(applied_actions::ActiveModel {
        tx_hash: Set(tx_hash.to_string()),
        action: Set(action.to_string()),
        district: Set(district),
        block_number: Set(block_number),
        created_at: Set(chrono::Utc::now().naive_utc()),
    })
    .exec(db)
    .await?;
    Ok(())
}
