pub mod abi;
pub mod chains;
pub mod claim;
pub mod client;
pub mod decoder;
mod error;
pub mod events;
pub mod guard;
pub mod handlers;
pub mod ingest;
pub mod metrics;
pub mod pricing;
pub mod repository;
pub mod router;
pub mod settings;
#[cfg(test)]
pub mod test_utils;
pub mod utils;
pub mod watcher;

pub use chains::{ChainConfig, ChainContext};
pub use client::{AlloyChainClient, ChainClient, ChainError, RetryingChainClient, TransactionLogs};
pub use error::{IngestError, IngestOutcome};
pub use ingest::Ingestor;
pub use settings::{IndexerSettings, RetrySettings};
pub use watcher::Watcher;
