//! Unit of work: one blockchain transaction applied atomically.

use crate::{
    chains::{ChainConfig, ChainContext},
    client::{ChainClient, TransactionLogs},
    decoder::decode_log,
    error::{IngestError, IngestOutcome},
    events::{AuctionEvent, EventKind},
    guard,
    handlers::{self, category, category::PriceSource, HandlerContext, SettlementFacts},
    metrics,
    router::{EventRouter, Route},
};
use alloy::primitives::{Address, B256, U256};
use entity::sea_orm_active_enums::AssetKind;
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::{collections::HashMap, sync::Arc};
use tracing::instrument;

/// One routed and decoded log of a transaction.
#[derive(Debug, Clone)]
struct Step {
    route: Route,
    contract: Address,
    log_index: u64,
    event: AuctionEvent,
    action: String,
}

pub struct Ingestor {
    db: Arc<DatabaseConnection>,
    context: Arc<ChainContext>,
    router: Arc<EventRouter>,
    clients: HashMap<i32, Arc<dyn ChainClient>>,
}

impl Ingestor {
    pub fn new(
        db: Arc<DatabaseConnection>,
        context: Arc<ChainContext>,
        clients: HashMap<i32, Arc<dyn ChainClient>>,
    ) -> Self {
        let router = Arc::new(EventRouter::new(&context));
        Self {
            db,
            context,
            router,
            clients,
        }
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn context(&self) -> &ChainContext {
        &self.context
    }

    /// Assets a transaction touches. Logs that do not decode touch nothing,
    /// since such a transaction is rejected as a whole.
    pub fn touched_assets(&self, tx: &TransactionLogs) -> Vec<(AssetKind, U256)> {
        tx.logs
            .iter()
            .filter_map(|log| self.router.route(tx.district, log).map(|route| (route, log)))
            .filter_map(|(route, log)| {
                let decoded = decode_log(log).ok()?;
                let event = AuctionEvent::decode(route.kind, &decoded).ok()?;
                Some((category::asset_kind(route.category), event.token_id()))
            })
            .collect()
    }

    fn client(&self, district: i32) -> Result<&Arc<dyn ChainClient>, IngestError> {
        self.clients
            .get(&district)
            .ok_or(IngestError::UnknownDistrict(district))
    }

    /// Fetches the receipt of `tx_hash` and processes its logs.
    pub async fn fetch_and_process(
        &self,
        district: i32,
        tx_hash: B256,
    ) -> Result<IngestOutcome, IngestError> {
        let tx = self.client(district)?.receipt_logs(tx_hash).await?;
        self.process(tx).await
    }

    #[instrument(
        name = "ingest_transaction",
        skip_all,
        fields(district = tx.district, tx_hash = %tx.tx_hash, block_number = tx.block_number)
    )]
    pub async fn process(&self, tx: TransactionLogs) -> Result<IngestOutcome, IngestError> {
        let district = tx.district.to_string();
        let timer = metrics::INGEST_DURATION
            .with_label_values(&[district.as_str()])
            .start_timer();
        let result = self.process_inner(&tx).await;
        timer.observe_duration();

        let outcome = match &result {
            Ok(outcome) => {
                tracing::debug!(outcome = outcome.label(), "transaction processed");
                outcome.label()
            }
            Err(err) => {
                tracing::error!(
                    err = ?err,
                    retryable = err.is_retryable(),
                    "transaction aborted"
                );
                err.kind()
            }
        };
        metrics::INGESTED_TRANSACTIONS
            .with_label_values(&[district.as_str(), outcome])
            .inc();
        result
    }

    async fn process_inner(&self, tx: &TransactionLogs) -> Result<IngestOutcome, IngestError> {
        let chain = self
            .context
            .chain(tx.district)
            .ok_or(IngestError::UnknownDistrict(tx.district))?;

        let steps = self.steps(tx)?;
        if steps.is_empty() {
            return Ok(IngestOutcome::Irrelevant);
        }

        let tx_hash = tx.tx_hash.to_string();
        if self.all_applied(&tx_hash, &steps).await? {
            return Ok(IngestOutcome::Duplicate);
        }

        let facts = self.settlement_facts(chain, tx, &steps).await?;

        let db_tx = self.db.begin().await?;
        let mut applied = Vec::with_capacity(steps.len());
        for step in &steps {
            if guard::check_applied(&db_tx, &tx_hash, &step.action)
                .await?
                .is_some()
            {
                continue;
            }

            let ctx = HandlerContext {
                chain,
                contract: step.contract,
                tx_hash: &tx_hash,
                log_index: step.log_index,
                block_timestamp: tx.block_timestamp,
                settlement: facts.get(&step.log_index),
            };
            handlers::apply(&db_tx, step.route.category, &ctx, &step.event).await?;
            guard::mark_applied(
                &db_tx,
                &tx_hash,
                &step.action,
                tx.district,
                tx.block_number as i64,
            )
            .await?;
            applied.push(step);
        }
        db_tx.commit().await?;

        if applied.is_empty() {
            return Ok(IngestOutcome::Duplicate);
        }
        for step in &applied {
            metrics::APPLIED_EVENTS
                .with_label_values(&[
                    guard::category_name(step.route.category),
                    step.route.kind.name(),
                ])
                .inc();
        }
        tracing::info!(events = applied.len(), "transaction applied");
        Ok(IngestOutcome::Applied {
            events: applied.len(),
        })
    }

    /// Routes and decodes the logs of a transaction in on-chain order.
    fn steps(&self, tx: &TransactionLogs) -> Result<Vec<Step>, IngestError> {
        let mut logs = tx.logs.iter().collect::<Vec<_>>();
        logs.sort_by_key(|log| log.log_index);

        logs.into_iter()
            .filter_map(|log| self.router.route(tx.district, log).map(|route| (route, log)))
            .map(|(route, log)| {
                let decoded = decode_log(log)?;
                let event = AuctionEvent::decode(route.kind, &decoded)?;
                Ok::<_, IngestError>(Step {
                    route,
                    contract: log.address,
                    log_index: log.log_index,
                    event,
                    action: guard::action_key(route.category, route.kind, log.log_index),
                })
            })
            .collect()
    }

    async fn all_applied(&self, tx_hash: &str, steps: &[Step]) -> Result<bool, IngestError> {
        for step in steps {
            if guard::check_applied(self.db.as_ref(), tx_hash, &step.action)
                .await?
                .is_none()
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Chain lookups needed by settlements, done before any database
    /// transaction is opened.
    async fn settlement_facts(
        &self,
        chain: &ChainConfig,
        tx: &TransactionLogs,
        steps: &[Step],
    ) -> Result<HashMap<u64, SettlementFacts>, IngestError> {
        let mut facts = HashMap::new();
        for step in steps {
            if step.route.kind != EventKind::Successful {
                continue;
            }
            let token_id = step.event.token_id();
            let client = self.client(tx.district)?;
            let mut settlement = SettlementFacts::default();

            if category::price_source(step.route.category) == PriceSource::OnChain {
                let block = tx.block_number.saturating_sub(1);
                settlement.price =
                    Some(client.auction_price(step.contract, token_id, block).await?);
            }
            if category::settlement_custody(step.route.category)
                == category::SettlementCustody::Winner
            {
                // the owner only cross-checks custody, so settlement does not wait for it
                if let Some(asset) = chain.contract(category::asset_contract(step.route.category))
                {
                    settlement.owner = match client.owner_of(asset, token_id, tx.block_number).await
                    {
                        Ok(owner) => Some(owner),
                        Err(err) => {
                            tracing::warn!(
                                district = tx.district,
                                tx_hash = %tx.tx_hash,
                                err = %err,
                                "token owner lookup failed, skipping custody check"
                            );
                            None
                        }
                    };
                }
            }
            facts.insert(step.log_index, settlement);
        }
        Ok(facts)
    }
}
