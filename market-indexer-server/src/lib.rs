mod indexer;
mod settings;

pub use indexer::{build_clients, run as run_indexer};
pub use settings::Settings;
