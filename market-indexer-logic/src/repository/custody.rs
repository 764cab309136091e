use chrono::NaiveDateTime;
use entity::{
    asset_custody,
    sea_orm_active_enums::{AssetKind, CustodyStatus},
};
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ConnectionTrait, DbErr, EntityTrait, QuerySelect,
};

/// Custody of one token. Land and creature ids are separate namespaces.
pub async fn find<C: ConnectionTrait>(
    db: &C,
    district: i32,
    asset: AssetKind,
    token_id: &str,
) -> Result<Option<asset_custody::Model>, DbErr> {
    asset_custody::Entity::find_by_id((district, asset, token_id.to_string()))
        .one(db)
        .await
}

pub async fn find_for_update<C: ConnectionTrait>(
    db: &C,
    district: i32,
    asset: AssetKind,
    token_id: &str,
) -> Result<Option<asset_custody::Model>, DbErr> {
    asset_custody::Entity::find_by_id((district, asset, token_id.to_string()))
        .lock_exclusive()
        .one(db)
        .await
}

pub async fn upsert<C: ConnectionTrait>(
    db: &C,
    district: i32,
    asset: AssetKind,
    token_id: &str,
    holder: String,
    origin_owner: String,
    status: CustodyStatus,
    at: NaiveDateTime,
) -> Result<(), DbErr> {
    asset_custody::Entity::insert(asset_custody::ActiveModel {
        district: Set(district),
        asset: Set(asset),
        token_id: Set(token_id.to_string()),
        holder: Set(holder),
        origin_owner: Set(origin_owner),
        status: Set(status),
        updated_at: Set(at),
    })
    .on_conflict(
        OnConflict::columns([
            asset_custody::Column::District,
            asset_custody::Column::Asset,
            asset_custody::Column::TokenId,
        ])
        .update_columns([
            asset_custody::Column::Holder,
            asset_custody::Column::OriginOwner,
            asset_custody::Column::Status,
            asset_custody::Column::UpdatedAt,
        ])
        .to_owned(),
    )
    .exec(db)
    .await?;
    Ok(())
}
