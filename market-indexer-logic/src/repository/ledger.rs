use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use entity::{balance_ledger, sea_orm_active_enums::LedgerReason};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// One signed balance movement. Debits are negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub account: String,
    pub amount: BigDecimal,
    pub reason: LedgerReason,
}

impl LedgerEntry {
    pub fn credit(account: impl Into<String>, amount: BigDecimal, reason: LedgerReason) -> Self {
        Self {
            account: account.into(),
            amount,
            reason,
        }
    }

    pub fn debit(account: impl Into<String>, amount: BigDecimal, reason: LedgerReason) -> Self {
        Self::credit(account, -amount, reason)
    }
}

pub async fn record<C: ConnectionTrait>(
    db: &C,
    district: i32,
    currency: &str,
    auction_id: i64,
    tx_hash: &str,
    at: NaiveDateTime,
    entries: Vec<LedgerEntry>,
) -> Result<(), DbErr> {
    if entries.is_empty() {
        return Ok(());
    }

    let models = entries.into_iter().map(|entry| balance_ledger::ActiveModel {
        district: Set(district),
        account: Set(entry.account),
        currency: Set(currency.to_string()),
        amount: Set(entry.amount),
        reason: Set(entry.reason),
        auction_id: Set(auction_id),
        tx_hash: Set(tx_hash.to_string()),
        created_at: Set(at),
        ..Default::default()
    });
    balance_ledger::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

/// Net balance movement of an account in one currency.
pub async fn balance<C: ConnectionTrait>(
    db: &C,
    district: i32,
    account: &str,
    currency: &str,
) -> Result<BigDecimal, DbErr> {
    let total: Option<Option<BigDecimal>> = balance_ledger::Entity::find()
        .select_only()
        .column_as(balance_ledger::Column::Amount.sum(), "total")
        .filter(balance_ledger::Column::District.eq(district))
        .filter(balance_ledger::Column::Account.eq(account))
        .filter(balance_ledger::Column::Currency.eq(currency))
        .into_tuple()
        .one(db)
        .await?;
    Ok(total.flatten().unwrap_or_default())
}

pub async fn entries_of<C: ConnectionTrait>(
    db: &C,
    auction_id: i64,
) -> Result<Vec<balance_ledger::Model>, DbErr> {
    balance_ledger::Entity::find()
        .filter(balance_ledger::Column::AuctionId.eq(auction_id))
        .order_by_asc(balance_ledger::Column::Id)
        .all(db)
        .await
}
