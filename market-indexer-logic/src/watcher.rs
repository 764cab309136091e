use crate::{
    client::{ChainClient, TransactionLogs},
    error::IngestError,
    ingest::Ingestor,
    metrics, repository,
    settings::IndexerSettings,
};
use futures::{stream, StreamExt};
use sea_orm::DatabaseConnection;
use std::{collections::HashMap, hash::Hash, sync::Arc};

/// Polls one chain for marketplace logs and feeds them to the ingestor.
pub struct Watcher {
    district: i32,
    start_block: u64,
    db: Arc<DatabaseConnection>,
    client: Arc<dyn ChainClient>,
    ingestor: Arc<Ingestor>,
    settings: IndexerSettings,
}

impl Watcher {
    pub fn new(
        district: i32,
        start_block: u64,
        db: Arc<DatabaseConnection>,
        client: Arc<dyn ChainClient>,
        ingestor: Arc<Ingestor>,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            district,
            start_block,
            db,
            client,
            ingestor,
            settings,
        }
    }

    pub async fn run(self) {
        tracing::info!(
            district = self.district,
            start_block = self.start_block,
            "starting watcher"
        );
        loop {
            match self.poll_once().await {
                // more blocks may be waiting, continue without delay
                Ok(Some(_)) => {}
                Ok(None) => tokio::time::sleep(self.settings.poll_interval).await,
                Err(err) => {
                    tracing::error!(
                        district = self.district,
                        err = ?err,
                        delay_secs = self.settings.restart_delay.as_secs(),
                        "block range failed, retrying later"
                    );
                    tokio::time::sleep(self.settings.restart_delay).await;
                }
            }
        }
    }

    /// Ingests the next block range. Returns the new checkpoint, or `None`
    /// when the chain head has not moved.
    pub async fn poll_once(&self) -> Result<Option<u64>, IngestError> {
        let from = match repository::checkpoints::get(self.db.as_ref(), self.district).await? {
            Some(last_block) => last_block + 1,
            None => self.start_block,
        };
        let head = self.client.block_number().await?;
        if from > head {
            return Ok(None);
        }
        let to = head.min(from + self.settings.batch_size.max(1) - 1);

        let addresses = self.ingestor.router().watched_addresses(self.district);
        let transactions = self.client.logs_in_range(from, to, addresses).await?;
        tracing::debug!(
            district = self.district,
            from,
            to,
            transactions = transactions.len(),
            "fetched block range"
        );

        self.ingest_all(transactions).await?;

        repository::checkpoints::save(self.db.as_ref(), self.district, to).await?;
        metrics::CHECKPOINT_BLOCK
            .with_label_values(&[self.district.to_string().as_str()])
            .set(to as i64);
        Ok(Some(to))
    }

    /// Ingests transactions touching the same asset one after another in
    /// on-chain order. Unrelated groups run concurrently. A transaction that
    /// fails with a permanent error is skipped; transient errors fail the
    /// whole range.
    async fn ingest_all(&self, transactions: Vec<TransactionLogs>) -> Result<(), IngestError> {
        let keys = transactions
            .iter()
            .map(|tx| self.ingestor.touched_assets(tx))
            .collect();
        let groups = partition(keys);
        let transactions = &transactions;

        stream::iter(groups)
            .map(|group| async move {
                self.ingest_in_order(group.into_iter().map(|index| &transactions[index]))
                    .await
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }

    async fn ingest_in_order<'a>(
        &self,
        transactions: impl Iterator<Item = &'a TransactionLogs>,
    ) -> Result<(), IngestError> {
        for tx in transactions {
            match self.ingestor.process(tx.clone()).await {
                Ok(_) => {}
                Err(err) if err.is_retryable() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        district = self.district,
                        tx_hash = %tx.tx_hash,
                        err = %err,
                        "skipping transaction that cannot be applied"
                    );
                }
            }
        }
        Ok(())
    }
}

/// Groups item indices so that items sharing any key end up in one group.
/// Every group lists its indices in ascending order.
fn partition<K: Eq + Hash>(keys: Vec<Vec<K>>) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut owners: HashMap<K, usize> = HashMap::new();

    for (index, item_keys) in keys.into_iter().enumerate() {
        let mut touched = item_keys
            .iter()
            .filter_map(|key| owners.get(key).copied())
            .collect::<Vec<_>>();
        touched.sort_unstable();
        touched.dedup();

        let group = match touched.split_first() {
            None => {
                groups.push(Vec::new());
                groups.len() - 1
            }
            Some((&first, merged)) => {
                for &other in merged {
                    let moved = std::mem::take(&mut groups[other]);
                    groups[first].extend(moved);
                }
                for owner in owners.values_mut() {
                    if merged.contains(owner) {
                        *owner = first;
                    }
                }
                groups[first].sort_unstable();
                first
            }
        };
        groups[group].push(index);
        for key in item_keys {
            owners.insert(key, group);
        }
    }

    groups.retain(|group| !group.is_empty());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chains::{format_token_id, tests::CREATURE_SALE},
        repository::auctions,
        test_utils::{fixtures::*, init_db, MockChainClient},
    };
    use alloy::primitives::U256;
    use entity::sea_orm_active_enums::AuctionCategory;
    use pretty_assertions::assert_eq;

    fn watcher(
        db: Arc<DatabaseConnection>,
        client: MockChainClient,
        batch_size: u64,
    ) -> Watcher {
        let ingestor = Arc::new(ingestor(db.clone(), client.clone()));
        let settings = IndexerSettings {
            batch_size,
            ..Default::default()
        };
        Watcher::new(1, 1, db, Arc::new(client), ingestor, settings)
    }

    async fn last_bidder(db: &DatabaseConnection, token_id: u64) -> Option<String> {
        auctions::find_going(
            db,
            1,
            &format_token_id(U256::from(token_id)),
            AuctionCategory::CreatureSale,
        )
        .await
        .unwrap()
        .and_then(|auction| auction.last_bidder)
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn polls_in_batches_and_saves_checkpoint() {
        let guard = init_db("watcher_polls_in_batches_and_saves_checkpoint").await;
        let db = guard.client();
        let client = MockChainClient::new(1);
        client.set_block_number(10);
        client.add_transaction(transaction(1, 3, vec![(CREATURE_SALE, created(1, 10, 100, 1000))]));
        client.add_transaction(transaction(2, 8, vec![(CREATURE_SALE, bid(1, ALICE, 20, 8, 0))]));
        let watcher = watcher(db.clone(), client.clone(), 5);

        assert_eq!(watcher.poll_once().await.unwrap(), Some(5));
        assert_eq!(repository::checkpoints::get(db.as_ref(), 1).await.unwrap(), Some(5));
        assert_eq!(last_bidder(&db, 1).await, None);

        assert_eq!(watcher.poll_once().await.unwrap(), Some(10));
        assert_eq!(last_bidder(&db, 1).await, Some(hex_address(ALICE)));

        // head has not moved
        assert_eq!(watcher.poll_once().await.unwrap(), None);
        client.set_block_number(12);
        assert_eq!(watcher.poll_once().await.unwrap(), Some(12));
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn dependent_transactions_in_one_range_are_applied() {
        let guard = init_db("watcher_dependent_transactions_in_one_range_are_applied").await;
        let db = guard.client();
        let client = MockChainClient::new(1);
        client.set_block_number(4);
        client.add_transaction(transaction(1, 2, vec![(CREATURE_SALE, created(1, 10, 100, 1000))]));
        client.add_transaction(transaction(2, 3, vec![(CREATURE_SALE, bid(1, ALICE, 20, 3, 0))]));
        client.add_transaction(transaction(3, 4, vec![(CREATURE_SALE, bid(1, BOB, 30, 4, 20))]));

        watcher(db.clone(), client, 100).poll_once().await.unwrap();

        assert_eq!(last_bidder(&db, 1).await, Some(hex_address(BOB)));
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn transactions_on_one_token_keep_chain_order() {
        let guard = init_db("watcher_transactions_on_one_token_keep_chain_order").await;
        let db = guard.client();
        let client = MockChainClient::new(1);
        client.set_block_number(4);
        client.add_transaction(transaction(1, 2, vec![(CREATURE_SALE, created(1, 10, 100, 1000))]));
        // a slow transaction: many listings followed by the first bid
        let mut slow = (20..30)
            .map(|id| (CREATURE_SALE, created(id, 10, 100, 1000)))
            .collect::<Vec<_>>();
        slow.push((CREATURE_SALE, bid(1, ALICE, 20, 3, 0)));
        client.add_transaction(transaction(2, 3, slow));
        client.add_transaction(transaction(3, 4, vec![(CREATURE_SALE, bid(1, BOB, 30, 4, 20))]));

        let watcher = Watcher::new(
            1,
            1,
            db.clone(),
            Arc::new(client.clone()),
            Arc::new(ingestor(db.clone(), client)),
            IndexerSettings {
                batch_size: 100,
                concurrency: 10,
                ..Default::default()
            },
        );
        assert_eq!(watcher.poll_once().await.unwrap(), Some(4));

        assert_eq!(last_bidder(&db, 1).await, Some(hex_address(BOB)));
        let auction = auctions::find_going(
            db.as_ref(),
            1,
            &format_token_id(U256::from(1)),
            AuctionCategory::CreatureSale,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(auctions::bids_of(db.as_ref(), auction.id).await.unwrap().len(), 2);
        for id in 20..30u64 {
            assert!(auctions::find_going(
                db.as_ref(),
                1,
                &format_token_id(U256::from(id)),
                AuctionCategory::CreatureSale
            )
            .await
            .unwrap()
            .is_some());
        }
    }

    #[test]
    fn transactions_sharing_an_asset_are_grouped() {
        let keys = vec![vec![1], vec![2], vec![1, 3], vec![4], vec![3, 2], vec![]];
        assert_eq!(
            partition(keys),
            vec![vec![0, 1, 2, 4], vec![3], vec![5]]
        );
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn permanent_failures_do_not_block_the_range() {
        let guard = init_db("watcher_permanent_failures_do_not_block_the_range").await;
        let db = guard.client();
        let client = MockChainClient::new(1);
        client.set_block_number(3);
        // bid on an auction created before the start block
        client.add_transaction(transaction(1, 2, vec![(CREATURE_SALE, bid(7, ALICE, 20, 2, 0))]));
        client.add_transaction(transaction(2, 3, vec![(CREATURE_SALE, created(1, 10, 100, 1000))]));

        let watcher = watcher(db.clone(), client, 100);
        assert_eq!(watcher.poll_once().await.unwrap(), Some(3));
        assert!(auctions::find_going(
            db.as_ref(),
            1,
            &format_token_id(U256::from(1)),
            AuctionCategory::CreatureSale
        )
        .await
        .unwrap()
        .is_some());
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn unavailable_chain_keeps_checkpoint() {
        let guard = init_db("watcher_unavailable_chain_keeps_checkpoint").await;
        let db = guard.client();
        let client = MockChainClient::new(1);
        client.set_block_number(3);
        client.fail_next(1);

        let watcher = watcher(db.clone(), client, 100);
        let err = watcher.poll_once().await.unwrap_err();

        assert!(matches!(err, IngestError::UpstreamUnavailable(_)));
        assert_eq!(repository::checkpoints::get(db.as_ref(), 1).await.unwrap(), None);
        assert_eq!(watcher.poll_once().await.unwrap(), Some(3));
    }
}
