//! Local Dutch-auction price computation.
//!
//! The formula approximates the price reported by the auction contracts and
//! is meant for browse contexts. Settlement of land sales asks the chain for
//! the authoritative value instead (see [`crate::client::ChainClient`]).

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDateTime;
use entity::{auctions, sea_orm_active_enums::AuctionStatus};

/// Fractional digits kept by every computed price.
pub const PRICE_SCALE: i64 = 18;

/// Markup applied on top of the last accepted bid, as `numerator / 10`.
const BID_MARKUP_TENTHS: u32 = 11;

/// Linear interpolation from `start` to `end` over `duration` seconds,
/// clamped to `end` once `elapsed` exceeds the duration.
pub fn dutch_price(start: &BigDecimal, end: &BigDecimal, duration: i64, elapsed: i64) -> BigDecimal {
    let elapsed = elapsed.clamp(0, duration);
    let delta = (end - start) * BigDecimal::from(elapsed) / BigDecimal::from(duration);
    round(start + delta)
}

/// Minimal price of the next bid once a bid exists.
pub fn bid_markup(last_price: &BigDecimal) -> BigDecimal {
    round(last_price * BigDecimal::from(BID_MARKUP_TENTHS) / BigDecimal::from(10))
}

/// Current price of an auction, or `None` when it has no active price.
pub fn current_price(auction: &auctions::Model, now: NaiveDateTime) -> Option<BigDecimal> {
    if auction.status != AuctionStatus::Going || auction.duration <= 0 || now < auction.start_at {
        return None;
    }

    if let Some(last_price) = &auction.last_price {
        return Some(bid_markup(last_price));
    }

    let elapsed = (now - auction.start_at).num_seconds();
    Some(dutch_price(
        &auction.start_price,
        &auction.end_price,
        auction.duration,
        elapsed,
    ))
}

/// Price of a settlement that reports none: the accepted bid, or the
/// Dutch price when nobody bid. The bid markup only applies to new bids.
pub fn settlement_fallback(auction: &auctions::Model, now: NaiveDateTime) -> Option<BigDecimal> {
    match &auction.last_price {
        Some(last_price) => Some(last_price.clone()),
        None => current_price(auction, now),
    }
}

fn round(value: BigDecimal) -> BigDecimal {
    value.with_scale_round(PRICE_SCALE, RoundingMode::HalfUp)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use entity::sea_orm_active_enums::AuctionCategory;
    use rstest::rstest;
    use std::str::FromStr;

    pub(crate) fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    pub(crate) fn epoch() -> NaiveDateTime {
        chrono::DateTime::from_timestamp(1_600_000_000, 0)
            .unwrap()
            .naive_utc()
    }

    pub(crate) fn going_auction(start: &str, end: &str, duration: i64) -> auctions::Model {
        auctions::Model {
            id: 1,
            district: 1,
            token_id: "0x01".to_string(),
            category: AuctionCategory::LandSale,
            seller: "0xseller".to_string(),
            start_price: dec(start),
            end_price: dec(end),
            duration,
            start_at: epoch(),
            currency: "0xring".to_string(),
            fee_rate: dec("0.04"),
            status: AuctionStatus::Going,
            last_bidder: None,
            last_price: None,
            last_bid_at: None,
            winner: None,
            final_price: None,
            claim_reference_at: None,
            created_tx_hash: "0xtx".to_string(),
            created_at: epoch(),
            updated_at: epoch(),
        }
    }

    #[rstest]
    #[case(0, "10")]
    #[case(500, "55")]
    #[case(1000, "100")]
    #[case(5000, "100")]
    fn dutch_price_interpolates_and_clamps(#[case] elapsed: i64, #[case] expected: &str) {
        let auction = going_auction("10", "100", 1000);
        let now = epoch() + Duration::seconds(elapsed);
        assert_eq!(current_price(&auction, now), Some(dec(expected)));
    }

    #[test]
    fn decreasing_auction_moves_down() {
        let auction = going_auction("100", "40", 600);
        let now = epoch() + Duration::seconds(200);
        assert_eq!(current_price(&auction, now), Some(dec("80")));
    }

    #[test]
    fn results_are_rounded_to_18_digits() {
        let price = dutch_price(&dec("0"), &dec("1"), 3, 1);
        assert_eq!(price, dec("0.333333333333333333"));
        assert_eq!(price.fractional_digit_count(), PRICE_SCALE);
    }

    #[test]
    fn bid_fixes_price_at_markup() {
        let mut auction = going_auction("10", "100", 1000);
        auction.last_price = Some(dec("20"));

        for elapsed in [0, 300, 999, 100_000] {
            let now = epoch() + Duration::seconds(elapsed);
            assert_eq!(current_price(&auction, now), Some(dec("22")));
        }
    }

    #[test]
    fn price_is_non_decreasing_across_bids() {
        let mut auction = going_auction("10", "100", 1000);
        let now = epoch() + Duration::seconds(10);
        let mut previous = current_price(&auction, now).unwrap();

        for bid in ["12", "13.2", "20", "20"] {
            auction.last_price = Some(dec(bid));
            let price = current_price(&auction, now).unwrap();
            assert!(price >= previous);
            previous = price;
        }
    }

    #[test]
    fn settlement_fallback_uses_accepted_bid() {
        let mut auction = going_auction("10", "100", 1000);
        let now = epoch() + Duration::seconds(500);
        assert_eq!(settlement_fallback(&auction, now), Some(dec("55")));

        auction.last_price = Some(dec("20"));
        assert_eq!(settlement_fallback(&auction, now), Some(dec("20")));
    }

    #[test]
    fn inactive_auctions_have_no_price() {
        let auction = going_auction("10", "100", 1000);
        assert_eq!(current_price(&auction, epoch() - Duration::seconds(1)), None);

        let zero_duration = going_auction("10", "100", 0);
        assert_eq!(current_price(&zero_duration, epoch()), None);

        for status in [
            AuctionStatus::Cancel,
            AuctionStatus::Finish,
            AuctionStatus::Over,
        ] {
            let auction = auctions::Model {
                status,
                ..going_auction("10", "100", 1000)
            };
            assert_eq!(current_price(&auction, epoch()), None);
        }
    }
}
