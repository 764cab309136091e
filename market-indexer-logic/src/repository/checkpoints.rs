use entity::indexer_checkpoints;
use sea_orm::{
    prelude::Expr, sea_query::OnConflict, ActiveValue::Set, ConnectionTrait, DbErr, EntityTrait,
};

pub async fn get<C: ConnectionTrait>(db: &C, district: i32) -> Result<Option<u64>, DbErr> {
    let checkpoint = indexer_checkpoints::Entity::find_by_id(district)
        .one(db)
        .await?;
    Ok(checkpoint.map(|c| c.last_block.max(0) as u64))
}

pub async fn save<C: ConnectionTrait>(db: &C, district: i32, last_block: u64) -> Result<(), DbErr> {
    indexer_checkpoints::Entity::insert(indexer_checkpoints::ActiveModel {
        district: Set(district),
        last_block: Set(last_block as i64),
        updated_at: Set(chrono::Utc::now().naive_utc()),
    })
    .on_conflict(
        OnConflict::column(indexer_checkpoints::Column::District)
            .update_column(indexer_checkpoints::Column::LastBlock)
            .value(
                indexer_checkpoints::Column::UpdatedAt,
                Expr::current_timestamp(),
            )
            .to_owned(),
    )
    .exec(db)
    .await?;
    Ok(())
}
