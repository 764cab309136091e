//! Typed marketplace events built on top of positional decoding.

use crate::{
    abi::{IClockAuction, ILeaseAuction},
    decoder::{DecodeError, DecodedLog},
};
use alloy::{
    primitives::{Address, B256, U256},
    sol_types::SolEvent,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Created,
    Cancelled,
    Bid,
    Successful,
    LeaseEnded,
}

impl EventKind {
    pub const AUCTION: [EventKind; 4] = [
        EventKind::Created,
        EventKind::Cancelled,
        EventKind::Bid,
        EventKind::Successful,
    ];

    pub fn signature(&self) -> B256 {
        match self {
            EventKind::Created => IClockAuction::AuctionCreated::SIGNATURE_HASH,
            EventKind::Cancelled => IClockAuction::AuctionCancelled::SIGNATURE_HASH,
            EventKind::Bid => IClockAuction::NewBid::SIGNATURE_HASH,
            EventKind::Successful => IClockAuction::AuctionSuccessful::SIGNATURE_HASH,
            EventKind::LeaseEnded => ILeaseAuction::LeaseEnded::SIGNATURE_HASH,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Cancelled => "cancelled",
            EventKind::Bid => "bid",
            EventKind::Successful => "successful",
            EventKind::LeaseEnded => "lease_ended",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionEvent {
    Created {
        token_id: U256,
        seller: Address,
        start_price: U256,
        end_price: U256,
        duration: u64,
        currency: Address,
        started_at: u64,
    },
    Cancelled {
        token_id: U256,
    },
    Bid {
        token_id: U256,
        bidder: Address,
        price: U256,
        bid_token: Address,
        bid_at: u64,
        refund: U256,
    },
    Successful {
        token_id: U256,
        price: U256,
        winner: Address,
    },
    LeaseEnded {
        token_id: U256,
    },
}

impl AuctionEvent {
    pub fn decode(kind: EventKind, log: &DecodedLog) -> Result<Self, DecodeError> {
        let token_id = log.uint(0)?;
        let event = match kind {
            EventKind::Created => AuctionEvent::Created {
                token_id,
                seller: log.address(1)?,
                start_price: log.uint(2)?,
                end_price: log.uint(3)?,
                duration: log.u64(4)?,
                currency: log.address(5)?,
                started_at: log.u64(6)?,
            },
            EventKind::Cancelled => AuctionEvent::Cancelled { token_id },
            EventKind::Bid => AuctionEvent::Bid {
                token_id,
                bidder: log.address(1)?,
                price: log.uint(2)?,
                bid_token: log.address(3)?,
                bid_at: log.u64(4)?,
                refund: log.uint(5)?,
            },
            EventKind::Successful => AuctionEvent::Successful {
                token_id,
                price: log.uint(1)?,
                winner: log.address(2)?,
            },
            EventKind::LeaseEnded => AuctionEvent::LeaseEnded { token_id },
        };
        Ok(event)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            AuctionEvent::Created { .. } => EventKind::Created,
            AuctionEvent::Cancelled { .. } => EventKind::Cancelled,
            AuctionEvent::Bid { .. } => EventKind::Bid,
            AuctionEvent::Successful { .. } => EventKind::Successful,
            AuctionEvent::LeaseEnded { .. } => EventKind::LeaseEnded,
        }
    }

    pub fn token_id(&self) -> U256 {
        match self {
            AuctionEvent::Created { token_id, .. }
            | AuctionEvent::Cancelled { token_id }
            | AuctionEvent::Bid { token_id, .. }
            | AuctionEvent::Successful { token_id, .. }
            | AuctionEvent::LeaseEnded { token_id } => *token_id,
        }
    }
}
