use blockscout_service_launcher::{database, launcher::ConfigSettings};
use market_indexer_server::{run_indexer, Settings};
use migration::Migrator;

const SERVICE_NAME: &str = "market_indexer";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let settings = Settings::build()?;

    blockscout_service_launcher::tracing::init_logs(
        SERVICE_NAME,
        &settings.tracing,
        &settings.jaeger,
    )?;

    let db_connection = database::initialize_postgres::<Migrator>(&settings.database).await?;

    run_indexer(settings, db_connection).await
}
