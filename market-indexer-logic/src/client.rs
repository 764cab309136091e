//! Chain collaborator: the narrow RPC surface the ingestor depends on.

use crate::{
    chains::ChainConfig, decoder::RawLog, settings::RetrySettings, utils::unix_to_datetime,
};
use alloy::{
    eips::BlockId,
    network::Ethereum,
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{Filter, Log},
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::{stream, StreamExt, TryStreamExt};
use itertools::Itertools;
use std::{collections::HashMap, future::Future};
use thiserror::Error;

use crate::abi::{IClockAuction, IERC721};

/// Concurrent block header requests issued while resolving log timestamps.
const BLOCK_FETCH_CONCURRENCY: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl ChainError {
    fn is_transient(&self) -> bool {
        matches!(self, ChainError::Rpc(_))
    }
}

/// Complete log set of one blockchain transaction, in on-chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionLogs {
    pub district: i32,
    pub tx_hash: B256,
    pub block_number: u64,
    pub block_timestamp: NaiveDateTime,
    pub logs: Vec<RawLog>,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn receipt_logs(&self, tx_hash: B256) -> Result<TransactionLogs, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Logs of `addresses` in `[from, to]`, grouped per transaction in block order.
    async fn logs_in_range(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
    ) -> Result<Vec<TransactionLogs>, ChainError>;

    /// `getCurrentPriceInToken` of an auction contract as of `block`.
    async fn auction_price(
        &self,
        contract: Address,
        token_id: U256,
        block: u64,
    ) -> Result<U256, ChainError>;

    async fn owner_of(
        &self,
        contract: Address,
        token_id: U256,
        block: u64,
    ) -> Result<Address, ChainError>;
}

fn rpc_error(err: impl std::fmt::Display) -> ChainError {
    ChainError::Rpc(err.to_string())
}

pub struct AlloyChainClient {
    district: i32,
    provider: DynProvider<Ethereum>,
}

impl AlloyChainClient {
    pub fn new(district: i32, provider: DynProvider<Ethereum>) -> Self {
        Self { district, provider }
    }

    pub fn from_config(chain: &ChainConfig) -> anyhow::Result<Self> {
        let provider = ProviderBuilder::new()
            .connect_http(chain.rpc_url.parse()?)
            .erased();
        Ok(Self::new(chain.district, provider))
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<NaiveDateTime, ChainError> {
        let block = self
            .provider
            .get_block_by_number(block_number.into())
            .await
            .map_err(rpc_error)?
            .ok_or_else(|| ChainError::NotFound(format!("block {block_number}")))?;
        unix_to_datetime(block.header.timestamp)
            .ok_or_else(|| ChainError::Rpc(format!("block {block_number} has invalid timestamp")))
    }

    async fn group_logs(&self, mut logs: Vec<Log>) -> Result<Vec<TransactionLogs>, ChainError> {
        logs.sort_by_key(|log| (log.block_number, log.log_index));

        let missing = logs
            .iter()
            .filter(|log| log.block_timestamp.is_none())
            .filter_map(|log| log.block_number)
            .unique()
            .collect::<Vec<_>>();
        let timestamps: HashMap<u64, NaiveDateTime> = stream::iter(missing)
            .map(|number| async move {
                Ok::<_, ChainError>((number, self.block_timestamp(number).await?))
            })
            .buffer_unordered(BLOCK_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let mut grouped = Vec::new();
        for ((block_number, tx_hash), logs) in &logs
            .iter()
            .chunk_by(|log| (log.block_number, log.transaction_hash))
        {
            let (Some(block_number), Some(tx_hash)) = (block_number, tx_hash) else {
                tracing::warn!(district = self.district, "skipping pending log");
                continue;
            };
            let logs = logs.collect::<Vec<_>>();
            let block_timestamp = logs
                .iter()
                .find_map(|log| log.block_timestamp)
                .and_then(unix_to_datetime)
                .or_else(|| timestamps.get(&block_number).copied())
                .ok_or_else(|| {
                    ChainError::NotFound(format!("timestamp of block {block_number}"))
                })?;

            grouped.push(TransactionLogs {
                district: self.district,
                tx_hash,
                block_number,
                block_timestamp,
                logs: logs.into_iter().map(RawLog::from).collect(),
            });
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn receipt_logs(&self, tx_hash: B256) -> Result<TransactionLogs, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_error)?
            .ok_or_else(|| ChainError::NotFound(format!("receipt of {tx_hash}")))?;
        let block_number = receipt
            .block_number
            .ok_or_else(|| ChainError::NotFound(format!("block of {tx_hash}")))?;

        let mut logs = receipt.inner.logs().iter().map(RawLog::from).collect::<Vec<_>>();
        logs.sort_by_key(|log| log.log_index);

        Ok(TransactionLogs {
            district: self.district,
            tx_hash,
            block_number,
            block_timestamp: self.block_timestamp(block_number).await?,
            logs,
        })
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider.get_block_number().await.map_err(rpc_error)
    }

    async fn logs_in_range(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
    ) -> Result<Vec<TransactionLogs>, ChainError> {
        if addresses.is_empty() || from > to {
            return Ok(vec![]);
        }
        let filter = Filter::new()
            .from_block(from)
            .to_block(to)
            .address(addresses.to_vec());
        let logs = self.provider.get_logs(&filter).await.map_err(rpc_error)?;
        self.group_logs(logs).await
    }

    async fn auction_price(
        &self,
        contract: Address,
        token_id: U256,
        block: u64,
    ) -> Result<U256, ChainError> {
        IClockAuction::new(contract, self.provider.clone())
            .getCurrentPriceInToken(token_id)
            .block(BlockId::number(block))
            .call()
            .await
            .map_err(rpc_error)
    }

    async fn owner_of(
        &self,
        contract: Address,
        token_id: U256,
        block: u64,
    ) -> Result<Address, ChainError> {
        IERC721::new(contract, self.provider.clone())
            .ownerOf(token_id)
            .block(BlockId::number(block))
            .call()
            .await
            .map_err(rpc_error)
    }
}

/// Bounded exponential backoff around any [`ChainClient`].
pub struct RetryingChainClient<C> {
    inner: C,
    settings: RetrySettings,
}

impl<C: ChainClient> RetryingChainClient<C> {
    pub fn new(inner: C, settings: RetrySettings) -> Self {
        Self { inner, settings }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn retry<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T, ChainError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ChainError>> + Send,
        T: Send,
    {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut delay = self.settings.initial_delay;
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempt >= max_attempts => {
                    tracing::error!(operation, attempt, err = ?err, "chain request failed");
                    return Err(ChainError::RetriesExhausted {
                        attempts: attempt,
                        last: err.to_string(),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        err = ?err,
                        "chain request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.settings.max_delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<C: ChainClient> ChainClient for RetryingChainClient<C> {
    async fn receipt_logs(&self, tx_hash: B256) -> Result<TransactionLogs, ChainError> {
        self.retry("receipt_logs", || self.inner.receipt_logs(tx_hash))
            .await
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.retry("block_number", || self.inner.block_number()).await
    }

    async fn logs_in_range(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
    ) -> Result<Vec<TransactionLogs>, ChainError> {
        self.retry("logs_in_range", || {
            self.inner.logs_in_range(from, to, addresses)
        })
        .await
    }

    async fn auction_price(
        &self,
        contract: Address,
        token_id: U256,
        block: u64,
    ) -> Result<U256, ChainError> {
        self.retry("auction_price", || {
            self.inner.auction_price(contract, token_id, block)
        })
        .await
    }

    async fn owner_of(
        &self,
        contract: Address,
        token_id: U256,
        block: u64,
    ) -> Result<Address, ChainError> {
        self.retry("owner_of", || self.inner.owner_of(contract, token_id, block))
            .await
    }
}
