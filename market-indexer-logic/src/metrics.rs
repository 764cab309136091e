use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

// Keep labels low-cardinality: district, category, event and outcome only.
lazy_static! {
    /// Processed transactions with outcome {applied, duplicate, irrelevant, <error kind>}.
    pub static ref INGESTED_TRANSACTIONS: IntCounterVec = register_int_counter_vec!(
        "market_indexer_ingested_transactions_total",
        "processed blockchain transactions by outcome",
        &["district", "outcome"],
    )
    .unwrap();

    /// Events applied to the projection.
    pub static ref APPLIED_EVENTS: IntCounterVec = register_int_counter_vec!(
        "market_indexer_applied_events_total",
        "marketplace events applied to the projection",
        &["category", "event"],
    )
    .unwrap();

    /// Time spent on one transaction, including chain lookups.
    pub static ref INGEST_DURATION: HistogramVec = register_histogram_vec!(
        "market_indexer_ingest_duration_seconds",
        "time spent processing one blockchain transaction",
        &["district"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    /// Settlements whose on-chain token owner disagrees with the projection.
    pub static ref CUSTODY_MISMATCHES: IntCounterVec = register_int_counter_vec!(
        "market_indexer_custody_mismatches_total",
        "settlements whose on-chain owner differs from the custody holder",
        &["district"],
    )
    .unwrap();

    /// Last block whose logs are fully committed.
    pub static ref CHECKPOINT_BLOCK: IntGaugeVec = register_int_gauge_vec!(
        "market_indexer_checkpoint_block",
        "last fully indexed block per district",
        &["district"],
    )
    .unwrap();
}
