//! Custody moves of marketplace assets.

use crate::{error::IngestError, repository};
use chrono::NaiveDateTime;
use entity::sea_orm_active_enums::{AssetKind, CustodyStatus};
use sea_orm::ConnectionTrait;

/// Whether an asset in `from` (or never seen) may move to `to`.
///
/// Listings start only from a free asset; escrow is left either back to
/// free or to the category's settled state.
pub fn is_allowed(from: Option<CustodyStatus>, to: CustodyStatus) -> bool {
    use CustodyStatus::*;

    let free_like = matches!(from, None | Some(Free) | Some(Claimed));
    match (from, to) {
        (_, OnSale | OnBreeding | OnLease) => free_like,
        (Some(OnSale), Free | Claimed) => true,
        (Some(OnBreeding), Free) => true,
        (Some(OnLease), Leased | Free) => true,
        (Some(Leased), Free) => true,
        _ => false,
    }
}

/// Target of a custody move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyMove {
    pub holder: String,
    pub origin_owner: String,
    pub status: CustodyStatus,
}

pub async fn transition<C: ConnectionTrait>(
    db: &C,
    district: i32,
    asset: AssetKind,
    token_id: &str,
    target: CustodyMove,
    at: NaiveDateTime,
) -> Result<(), IngestError> {
    let current = repository::custody::find_for_update(db, district, asset, token_id).await?;
    let from = current.as_ref().map(|custody| custody.status);

    if !is_allowed(from, target.status) {
        return Err(IngestError::MissingReferent(format!(
            "{asset:?} {token_id} cannot move from {from:?} custody to {:?}",
            target.status
        )));
    }

    repository::custody::upsert(
        db,
        district,
        asset,
        token_id,
        target.holder,
        target.origin_owner,
        target.status,
        at,
    )
    .await?;
    Ok(())
}
