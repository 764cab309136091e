use blockscout_service_launcher::test_database::TestDbGuard;

pub mod fixtures;
pub mod mock_chain_client;

pub use mock_chain_client::MockChainClient;

pub async fn init_db(name: &str) -> TestDbGuard {
    TestDbGuard::new::<migration::Migrator>(name).await
}
