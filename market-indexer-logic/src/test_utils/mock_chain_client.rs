use crate::client::{ChainClient, ChainError, TransactionLogs};
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// Mock chain collaborator with deterministic, scripted behavior.
#[derive(Clone, Default)]
pub struct MockChainClient {
    district: i32,
    block_number: Arc<RwLock<u64>>,
    transactions: Arc<RwLock<Vec<TransactionLogs>>>,
    prices: Arc<RwLock<HashMap<(Address, U256, u64), U256>>>,
    owners: Arc<RwLock<HashMap<(Address, U256), Address>>>,
    failures_left: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl MockChainClient {
    pub fn new(district: i32) -> Self {
        Self {
            district,
            ..Default::default()
        }
    }

    pub fn set_block_number(&self, block: u64) {
        *self.block_number.write() = block;
    }

    /// Makes the next `count` requests fail with a transient RPC error.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Number of requests received so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn add_transaction(&self, tx: TransactionLogs) {
        let mut transactions = self.transactions.write();
        transactions.push(tx);
        transactions.sort_by_key(|tx| (tx.block_number, tx.logs.first().map(|l| l.log_index)));
    }

    pub fn set_auction_price(&self, contract: Address, token_id: U256, block: u64, price: U256) {
        self.prices.write().insert((contract, token_id, block), price);
    }

    pub fn set_owner(&self, contract: Address, token_id: U256, owner: Address) {
        self.owners.write().insert((contract, token_id), owner);
    }

    fn request(&self) -> Result<(), ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            Err(ChainError::Rpc("mock client configured to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn receipt_logs(&self, tx_hash: B256) -> Result<TransactionLogs, ChainError> {
        self.request()?;
        self.transactions
            .read()
            .iter()
            .find(|tx| tx.tx_hash == tx_hash)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("receipt of {tx_hash}")))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.request()?;
        Ok(*self.block_number.read())
    }

    async fn logs_in_range(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
    ) -> Result<Vec<TransactionLogs>, ChainError> {
        self.request()?;
        let transactions = self
            .transactions
            .read()
            .iter()
            .filter(|tx| tx.district == self.district)
            .filter(|tx| (from..=to).contains(&tx.block_number))
            .filter_map(|tx| {
                let logs = tx
                    .logs
                    .iter()
                    .filter(|log| addresses.contains(&log.address))
                    .cloned()
                    .collect::<Vec<_>>();
                (!logs.is_empty()).then(|| TransactionLogs {
                    logs,
                    ..tx.clone()
                })
            })
            .collect();
        Ok(transactions)
    }

    async fn auction_price(
        &self,
        contract: Address,
        token_id: U256,
        block: u64,
    ) -> Result<U256, ChainError> {
        self.request()?;
        self.prices
            .read()
            .get(&(contract, token_id, block))
            .copied()
            .ok_or_else(|| ChainError::NotFound(format!("price of {token_id} at {block}")))
    }

    async fn owner_of(
        &self,
        contract: Address,
        token_id: U256,
        _block: u64,
    ) -> Result<Address, ChainError> {
        self.request()?;
        self.owners
            .read()
            .get(&(contract, token_id))
            .copied()
            .ok_or_else(|| ChainError::NotFound(format!("owner of {token_id}")))
    }
}
