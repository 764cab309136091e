use crate::Settings;
use anyhow::Context;
use market_indexer_logic::{
    AlloyChainClient, ChainClient, ChainContext, Ingestor, RetryingChainClient, RetrySettings,
    Watcher,
};
use sea_orm::DatabaseConnection;
use std::{collections::HashMap, sync::Arc};
use tokio::task::JoinSet;

/// One retrying RPC client per configured district.
pub fn build_clients(
    context: &ChainContext,
    retry: &RetrySettings,
) -> anyhow::Result<HashMap<i32, Arc<dyn ChainClient>>> {
    context
        .chains()
        .map(|chain| {
            let client = AlloyChainClient::from_config(chain)
                .with_context(|| format!("failed to build rpc client for chain {}", chain.name))?;
            let client: Arc<dyn ChainClient> =
                Arc::new(RetryingChainClient::new(client, retry.clone()));
            Ok((chain.district, client))
        })
        .collect()
}

pub async fn run(settings: Settings, db_connection: DatabaseConnection) -> anyhow::Result<()> {
    let context = Arc::new(ChainContext::load_from_file(&settings.chains_config)?);
    let db = Arc::new(db_connection);
    let clients = build_clients(&context, &settings.indexer.retry)?;
    let ingestor = Arc::new(Ingestor::new(db.clone(), context.clone(), clients.clone()));

    let mut watchers = JoinSet::new();
    for chain in context.chains() {
        let Some(client) = clients.get(&chain.district) else {
            tracing::warn!(chain = %chain.name, "no rpc client configured, skipping");
            continue;
        };
        let watcher = Watcher::new(
            chain.district,
            chain.start_block,
            db.clone(),
            client.clone(),
            ingestor.clone(),
            settings.indexer.clone(),
        );
        tracing::info!(
            chain = %chain.name,
            district = chain.district,
            start_block = chain.start_block,
            "spawning watcher"
        );
        watchers.spawn(watcher.run());
    }

    if watchers.is_empty() {
        anyhow::bail!("no chains configured in {:?}", settings.chains_config);
    }

    // watchers never return on their own
    while let Some(result) = watchers.join_next().await {
        result.context("watcher task failed")?;
    }
    Ok(())
}
