//! Read-time derivation of claimed/unclaimed auctions.
//!
//! Stored rows never carry a claim status. Readers combine the stored status
//! with the district claim window from [`crate::chains::ChainContext`].

use chrono::NaiveDateTime;
use entity::{auctions, sea_orm_active_enums::AuctionStatus};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Going,
    Cancel,
    Finish,
    Over,
    /// Finished, and the claim window after settlement has elapsed.
    Claimed,
    /// Still going, but the last bid is older than the claim window.
    Unclaimed,
}

impl From<AuctionStatus> for EffectiveStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Going => Self::Going,
            AuctionStatus::Cancel => Self::Cancel,
            AuctionStatus::Finish => Self::Finish,
            AuctionStatus::Over => Self::Over,
        }
    }
}

fn window_elapsed(reference: NaiveDateTime, now: NaiveDateTime, window: Duration) -> bool {
    let Ok(window) = chrono::Duration::from_std(window) else {
        return false;
    };
    now - reference > window
}

pub fn effective_status(
    auction: &auctions::Model,
    now: NaiveDateTime,
    window: Duration,
) -> EffectiveStatus {
    match auction.status {
        AuctionStatus::Going => match auction.last_bid_at {
            Some(last_bid_at) if window_elapsed(last_bid_at, now, window) => {
                EffectiveStatus::Unclaimed
            }
            _ => EffectiveStatus::Going,
        },
        AuctionStatus::Finish => {
            let reference = auction.claim_reference_at.or(auction.last_bid_at);
            match reference {
                Some(reference) if window_elapsed(reference, now, window) => {
                    EffectiveStatus::Claimed
                }
                _ => EffectiveStatus::Finish,
            }
        }
        status => status.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::tests::{epoch, going_auction};
    use chrono::Duration as ChronoDuration;
    use rstest::rstest;

    const WINDOW: Duration = Duration::from_secs(1800);

    fn finished_at(reference: NaiveDateTime) -> auctions::Model {
        auctions::Model {
            status: AuctionStatus::Finish,
            last_bid_at: Some(reference),
            claim_reference_at: Some(reference),
            ..going_auction("10", "100", 1000)
        }
    }

    #[rstest]
    #[case(1801, EffectiveStatus::Claimed)]
    #[case(1800, EffectiveStatus::Finish)]
    #[case(1799, EffectiveStatus::Finish)]
    fn finished_auction_becomes_claimed(#[case] elapsed: i64, #[case] expected: EffectiveStatus) {
        let auction = finished_at(epoch());
        let now = epoch() + ChronoDuration::seconds(elapsed);
        assert_eq!(effective_status(&auction, now, WINDOW), expected);
    }

    #[rstest]
    #[case(1801, EffectiveStatus::Unclaimed)]
    #[case(1799, EffectiveStatus::Going)]
    fn stale_bid_makes_going_auction_unclaimed(
        #[case] elapsed: i64,
        #[case] expected: EffectiveStatus,
    ) {
        let auction = auctions::Model {
            last_bid_at: Some(epoch()),
            ..going_auction("10", "100", 1000)
        };
        let now = epoch() + ChronoDuration::seconds(elapsed);
        assert_eq!(effective_status(&auction, now, WINDOW), expected);
    }

    #[test]
    fn going_auction_without_bids_stays_going() {
        let auction = going_auction("10", "100", 1000);
        let now = epoch() + ChronoDuration::days(30);
        assert_eq!(effective_status(&auction, now, WINDOW), EffectiveStatus::Going);
    }

    #[test]
    fn shorter_window_applies_per_district() {
        let auction = finished_at(epoch());
        let now = epoch() + ChronoDuration::seconds(301);
        assert_eq!(
            effective_status(&auction, now, Duration::from_secs(300)),
            EffectiveStatus::Claimed
        );
        assert_eq!(effective_status(&auction, now, WINDOW), EffectiveStatus::Finish);
    }

    #[test]
    fn terminal_statuses_are_untouched() {
        let now = epoch() + ChronoDuration::days(30);
        for status in [AuctionStatus::Cancel, AuctionStatus::Over] {
            let auction = auctions::Model {
                status,
                ..finished_at(epoch())
            };
            assert_eq!(effective_status(&auction, now, WINDOW), status.into());
        }
    }
}
