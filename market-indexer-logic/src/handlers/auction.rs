//! Auction state machine shared by every marketplace category.

use super::{
    category::{Category, PriceSource, SettlementCustody},
    custody::{self, CustodyMove},
    HandlerContext,
};
use crate::{
    chains::format_token_id,
    decoder::DecodeError,
    error::IngestError,
    events::AuctionEvent,
    metrics, pricing,
    repository::{self, ledger::LedgerEntry},
    utils::{amount_to_decimal, unix_to_datetime},
};
use alloy::primitives::{Address, U256};
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::NaiveDateTime;
use entity::{
    auction_bids, auctions,
    sea_orm_active_enums::{AuctionStatus, CustodyStatus, LedgerReason},
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait, EntityTrait, IntoActiveModel};
use std::marker::PhantomData;

pub struct Auction<C: Category>(PhantomData<C>);

impl<C: Category> Auction<C> {
    pub async fn apply<D: ConnectionTrait>(
        db: &D,
        ctx: &HandlerContext<'_>,
        event: &AuctionEvent,
    ) -> Result<(), IngestError> {
        match event {
            AuctionEvent::Created {
                token_id,
                seller,
                start_price,
                end_price,
                duration,
                currency,
                started_at,
            } => {
                let listing = Listing {
                    token_id: *token_id,
                    seller: *seller,
                    start_price: *start_price,
                    end_price: *end_price,
                    duration: *duration,
                    currency: *currency,
                    started_at: *started_at,
                };
                Self::created(db, ctx, listing).await
            }
            AuctionEvent::Cancelled { token_id } => Self::cancelled(db, ctx, *token_id).await,
            AuctionEvent::Bid {
                token_id,
                bidder,
                price,
                bid_at,
                refund,
                ..
            } => Self::bid(db, ctx, *token_id, *bidder, *price, *bid_at, *refund).await,
            AuctionEvent::Successful {
                token_id,
                price,
                winner,
            } => Self::successful(db, ctx, *token_id, *price, *winner).await,
            AuctionEvent::LeaseEnded { token_id } => Self::lease_ended(db, ctx, *token_id).await,
        }
    }

    async fn created<D: ConnectionTrait>(
        db: &D,
        ctx: &HandlerContext<'_>,
        listing: Listing,
    ) -> Result<(), IngestError> {
        let district = ctx.chain.district;
        let token_id = format_token_id(listing.token_id);

        if repository::auctions::find_going_for_update(db, district, &token_id, C::KIND)
            .await?
            .is_some()
        {
            return Err(IngestError::PersistenceConflict(format!(
                "{:?} auction for token {token_id} is already going",
                C::KIND
            )));
        }

        let seller = ctx.chain.format_address(listing.seller);
        let duration = i64::try_from(listing.duration).map_err(|_| DecodeError::Overflow {
            index: 4,
            target: "i64",
        })?;
        let start_at = timestamp(listing.started_at, 6)?;

        auctions::ActiveModel {
            district: Set(district),
            token_id: Set(token_id.clone()),
            category: Set(C::KIND),
            seller: Set(seller.clone()),
            start_price: Set(amount_to_decimal(listing.start_price)),
            end_price: Set(amount_to_decimal(listing.end_price)),
            duration: Set(duration),
            start_at: Set(start_at),
            currency: Set(ctx.chain.format_address(listing.currency)),
            fee_rate: Set(C::fee_rate(ctx.chain)),
            status: Set(AuctionStatus::Going),
            created_tx_hash: Set(ctx.tx_hash.to_string()),
            created_at: Set(ctx.block_timestamp),
            updated_at: Set(ctx.block_timestamp),
            ..Default::default()
        }
        .insert(db)
        .await?;

        custody::transition(
            db,
            district,
            C::ASSET,
            &token_id,
            CustodyMove {
                holder: ctx.chain.format_address(ctx.contract),
                origin_owner: seller,
                status: C::ESCROW,
            },
            ctx.block_timestamp,
        )
        .await
    }

    async fn cancelled<D: ConnectionTrait>(
        db: &D,
        ctx: &HandlerContext<'_>,
        token_id: U256,
    ) -> Result<(), IngestError> {
        let auction = Self::going(db, ctx, token_id).await?;
        let district = auction.district;
        let token_id = auction.token_id.clone();
        let seller = auction.seller.clone();

        let mut active = auction.into_active_model();
        active.status = Set(AuctionStatus::Cancel);
        active.updated_at = Set(ctx.block_timestamp);
        active.update(db).await?;

        custody::transition(
            db,
            district,
            C::ASSET,
            &token_id,
            CustodyMove {
                holder: seller.clone(),
                origin_owner: seller,
                status: CustodyStatus::Free,
            },
            ctx.block_timestamp,
        )
        .await
    }

    async fn bid<D: ConnectionTrait>(
        db: &D,
        ctx: &HandlerContext<'_>,
        token_id: U256,
        bidder: Address,
        price: U256,
        bid_at: u64,
        refund: U256,
    ) -> Result<(), IngestError> {
        let auction = Self::going(db, ctx, token_id).await?;
        let price = amount_to_decimal(price);
        let bid_at = timestamp(bid_at, 4)?;
        let bidder = ctx.chain.format_address(bidder);
        let log_index = log_position(ctx.log_index)?;

        if let Some(last_price) = &auction.last_price {
            if &price < last_price {
                return Err(IngestError::MissingReferent(format!(
                    "bid of {price} on auction {} is below last price {last_price}",
                    auction.id
                )));
            }
        }

        let mut entries = vec![LedgerEntry::debit(
            bidder.clone(),
            price.clone(),
            LedgerReason::BidLocked,
        )];
        if let Some(previous) = &auction.last_bidder {
            let refund = amount_to_decimal(refund);
            let refund = if refund.is_zero() {
                auction.last_price.clone().unwrap_or_default()
            } else {
                refund
            };
            entries.push(LedgerEntry::credit(
                previous.clone(),
                refund,
                LedgerReason::BidRefunded,
            ));
        }

        auction_bids::Entity::insert(auction_bids::ActiveModel {
            auction_id: Set(auction.id),
            bidder: Set(bidder.clone()),
            price: Set(price.clone()),
            bid_at: Set(bid_at),
            tx_hash: Set(ctx.tx_hash.to_string()),
            log_index: Set(log_index),
            created_at: Set(ctx.block_timestamp),
            ..Default::default()
        })
        .exec(db)
        .await?;

        repository::ledger::record(
            db,
            auction.district,
            &auction.currency,
            auction.id,
            ctx.tx_hash,
            ctx.block_timestamp,
            entries,
        )
        .await?;

        let mut active = auction.into_active_model();
        active.last_bidder = Set(Some(bidder));
        active.last_price = Set(Some(price));
        active.last_bid_at = Set(Some(bid_at));
        active.updated_at = Set(ctx.block_timestamp);
        active.update(db).await?;
        Ok(())
    }

    async fn successful<D: ConnectionTrait>(
        db: &D,
        ctx: &HandlerContext<'_>,
        token_id: U256,
        event_price: U256,
        winner: Address,
    ) -> Result<(), IngestError> {
        let auction = Self::going(db, ctx, token_id).await?;
        let winner = ctx.chain.format_address(winner);
        let price = Self::settlement_price(ctx, &auction, event_price);
        let (proceeds, tax) = settlement_split(&price, &auction.fee_rate);

        let mut entries = Vec::with_capacity(4);
        if let (Some(last_bidder), Some(last_price)) = (&auction.last_bidder, &auction.last_price) {
            if *last_bidder == winner {
                entries.push(LedgerEntry::credit(
                    winner.clone(),
                    last_price.clone(),
                    LedgerReason::BidReleased,
                ));
            }
        }
        entries.push(LedgerEntry::debit(
            winner.clone(),
            price.clone(),
            LedgerReason::SettlementPaid,
        ));
        entries.push(LedgerEntry::credit(
            auction.seller.clone(),
            proceeds,
            LedgerReason::SettlementProceeds,
        ));
        if !tax.is_zero() {
            entries.push(LedgerEntry::credit(
                ctx.chain.format_address(ctx.contract),
                tax,
                LedgerReason::SettlementTax,
            ));
        }

        repository::ledger::record(
            db,
            auction.district,
            &auction.currency,
            auction.id,
            ctx.tx_hash,
            ctx.block_timestamp,
            entries,
        )
        .await?;

        let target = match C::SETTLEMENT_CUSTODY {
            SettlementCustody::Winner => CustodyMove {
                holder: winner.clone(),
                origin_owner: winner.clone(),
                status: C::SETTLED,
            },
            SettlementCustody::Seller => CustodyMove {
                holder: auction.seller.clone(),
                origin_owner: auction.seller.clone(),
                status: C::SETTLED,
            },
        };
        let district = auction.district;
        let token_id = auction.token_id.clone();
        if let Some(owner) = ctx.settlement.and_then(|facts| facts.owner) {
            Self::check_holder(ctx, &token_id, &target.holder, owner);
        }
        let claim_reference_at = auction.last_bid_at.unwrap_or(ctx.block_timestamp);

        let mut active = auction.into_active_model();
        active.status = Set(AuctionStatus::Finish);
        active.winner = Set(Some(winner));
        active.final_price = Set(Some(price));
        active.claim_reference_at = Set(Some(claim_reference_at));
        active.updated_at = Set(ctx.block_timestamp);
        active.update(db).await?;

        custody::transition(db, district, C::ASSET, &token_id, target, ctx.block_timestamp).await
    }

    async fn lease_ended<D: ConnectionTrait>(
        db: &D,
        ctx: &HandlerContext<'_>,
        token_id: U256,
    ) -> Result<(), IngestError> {
        let token_id = format_token_id(token_id);
        if !C::LEASE {
            return Err(IngestError::MissingReferent(format!(
                "{:?} auctions have no lease to end for token {token_id}",
                C::KIND
            )));
        }

        let auction = repository::auctions::find_latest_finished_for_update(
            db,
            ctx.chain.district,
            &token_id,
            C::KIND,
        )
        .await?
        .ok_or_else(|| {
            IngestError::MissingReferent(format!(
                "no finished {:?} auction for token {token_id}",
                C::KIND
            ))
        })?;
        let seller = auction.seller.clone();

        let mut active = auction.into_active_model();
        active.status = Set(AuctionStatus::Over);
        active.updated_at = Set(ctx.block_timestamp);
        active.update(db).await?;

        custody::transition(
            db,
            ctx.chain.district,
            C::ASSET,
            &token_id,
            CustodyMove {
                holder: seller.clone(),
                origin_owner: seller,
                status: CustodyStatus::Free,
            },
            ctx.block_timestamp,
        )
        .await
    }

    async fn going<D: ConnectionTrait>(
        db: &D,
        ctx: &HandlerContext<'_>,
        token_id: U256,
    ) -> Result<auctions::Model, IngestError> {
        let token_id = format_token_id(token_id);
        repository::auctions::find_going_for_update(db, ctx.chain.district, &token_id, C::KIND)
            .await?
            .ok_or_else(|| {
                IngestError::MissingReferent(format!(
                    "no going {:?} auction for token {token_id}",
                    C::KIND
                ))
            })
    }

    /// Compares the settled custody holder with the token owner reported by
    /// the chain. The asset may still sit in escrow until it is claimed.
    fn check_holder(ctx: &HandlerContext<'_>, token_id: &str, holder: &str, owner: Address) {
        let owner = ctx.chain.format_address(owner);
        let escrow = ctx.chain.format_address(ctx.contract);
        if !owner_agrees(holder, &escrow, &owner) {
            metrics::CUSTODY_MISMATCHES
                .with_label_values(&[ctx.chain.district.to_string().as_str()])
                .inc();
            tracing::warn!(
                district = ctx.chain.district,
                token_id,
                holder,
                owner = %owner,
                "on-chain owner differs from settled custody holder"
            );
        }
    }

    /// On-chain price when the category verifies it, the event price
    /// otherwise. A zero price settles at the accepted bid, or at the
    /// Dutch price when nobody bid.
    fn settlement_price(
        ctx: &HandlerContext<'_>,
        auction: &auctions::Model,
        event_price: U256,
    ) -> BigDecimal {
        let on_chain = match C::PRICE_SOURCE {
            PriceSource::OnChain => ctx.settlement.and_then(|facts| facts.price),
            PriceSource::Event => None,
        };
        let price = on_chain
            .map(amount_to_decimal)
            .unwrap_or_else(|| amount_to_decimal(event_price));

        if price.is_zero() {
            pricing::settlement_fallback(auction, ctx.block_timestamp).unwrap_or(price)
        } else {
            price
        }
    }
}

/// Splits a settlement price into the seller's proceeds and the withheld tax.
pub fn settlement_split(price: &BigDecimal, fee_rate: &BigDecimal) -> (BigDecimal, BigDecimal) {
    let tax = (price * fee_rate).with_scale_round(pricing::PRICE_SCALE, RoundingMode::HalfUp);
    (price - &tax, tax)
}

struct Listing {
    token_id: U256,
    seller: Address,
    start_price: U256,
    end_price: U256,
    duration: u64,
    currency: Address,
    started_at: u64,
}

/// The chain agrees when it reports the settled holder, or the escrow
/// contract while a claim is pending.
pub fn owner_agrees(holder: &str, escrow: &str, owner: &str) -> bool {
    owner == holder || owner == escrow
}

fn log_position(log_index: u64) -> Result<i32, DecodeError> {
    i32::try_from(log_index).map_err(|_| DecodeError::LogIndexOverflow(log_index))
}

fn timestamp(value: u64, index: usize) -> Result<NaiveDateTime, DecodeError> {
    unix_to_datetime(value).ok_or(DecodeError::Overflow {
        index,
        target: "timestamp",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::tests::dec;
    use rstest::rstest;

    #[rstest]
    #[case("100", "0.04", "96", "4")]
    #[case("100", "0.035", "96.5", "3.5")]
    #[case("0.000000000000000001", "0.04", "0.000000000000000001", "0")]
    #[case("7", "0", "7", "0")]
    fn settlement_withholds_fee(
        #[case] price: &str,
        #[case] rate: &str,
        #[case] proceeds: &str,
        #[case] tax: &str,
    ) {
        assert_eq!(
            settlement_split(&dec(price), &dec(rate)),
            (dec(proceeds), dec(tax))
        );
    }

    #[test]
    fn owner_check_tolerates_pending_claims() {
        assert!(owner_agrees("0xwinner", "0xescrow", "0xwinner"));
        assert!(owner_agrees("0xwinner", "0xescrow", "0xescrow"));
        assert!(!owner_agrees("0xwinner", "0xescrow", "0xstranger"));
    }

    #[test]
    fn log_index_must_fit_bid_column() {
        assert_eq!(log_position(7), Ok(7));
        assert_eq!(log_position(i32::MAX as u64), Ok(i32::MAX));
        assert_eq!(
            log_position(i32::MAX as u64 + 1),
            Err(DecodeError::LogIndexOverflow(2_147_483_648))
        );
    }
}
