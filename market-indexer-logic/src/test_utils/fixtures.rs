use super::MockChainClient;
use crate::{
    chains::tests::test_context,
    client::{ChainClient, TransactionLogs},
    events::{tests::encode_log, AuctionEvent},
    ingest::Ingestor,
    pricing::tests::epoch,
};
use alloy::primitives::{address, Address, B256, U256};
use chrono::Duration;
use sea_orm::DatabaseConnection;
use std::{collections::HashMap, sync::Arc};

pub const SELLER: Address = address!("0x00000000000000000000000000000000000000a1");
pub const ALICE: Address = address!("0x00000000000000000000000000000000000000b1");
pub const BOB: Address = address!("0x00000000000000000000000000000000000000b2");
pub const RING: Address = address!("0x00000000000000000000000000000000000000c1");

pub const START_TIME: u64 = 1_600_000_000;

pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18))
}

pub fn hex_address(address: Address) -> String {
    format!("0x{}", hex::encode(address))
}

pub fn created(token_id: u64, start: u64, end: u64, duration: u64) -> AuctionEvent {
    AuctionEvent::Created {
        token_id: U256::from(token_id),
        seller: SELLER,
        start_price: ether(start),
        end_price: ether(end),
        duration,
        currency: RING,
        started_at: START_TIME,
    }
}

pub fn bid(token_id: u64, bidder: Address, price: u64, at: u64, refund: u64) -> AuctionEvent {
    AuctionEvent::Bid {
        token_id: U256::from(token_id),
        bidder,
        price: ether(price),
        bid_token: RING,
        bid_at: START_TIME + at,
        refund: ether(refund),
    }
}

pub fn successful(token_id: u64, price: u64, winner: Address) -> AuctionEvent {
    AuctionEvent::Successful {
        token_id: U256::from(token_id),
        price: ether(price),
        winner,
    }
}

pub fn cancelled(token_id: u64) -> AuctionEvent {
    AuctionEvent::Cancelled {
        token_id: U256::from(token_id),
    }
}

pub fn lease_ended(token_id: u64) -> AuctionEvent {
    AuctionEvent::LeaseEnded {
        token_id: U256::from(token_id),
    }
}

/// Transaction of district 1 mined at `block`, `block` seconds after the
/// auctions started.
pub fn transaction(seed: u8, block: u64, events: Vec<(Address, AuctionEvent)>) -> TransactionLogs {
    TransactionLogs {
        district: 1,
        tx_hash: B256::repeat_byte(seed),
        block_number: block,
        block_timestamp: epoch() + Duration::seconds(block as i64),
        logs: events
            .iter()
            .enumerate()
            .map(|(index, (contract, event))| encode_log(*contract, event, index as u64))
            .collect(),
    }
}

pub fn ingestor(db: Arc<DatabaseConnection>, client: MockChainClient) -> Ingestor {
    let clients: HashMap<i32, Arc<dyn ChainClient>> = HashMap::from([(1, Arc::new(client) as _)]);
    Ingestor::new(db, Arc::new(test_context()), clients)
}
