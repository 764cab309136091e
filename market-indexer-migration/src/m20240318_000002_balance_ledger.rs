use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TYPE "ledger_reason" AS ENUM (
                'bid_locked',
                'bid_refunded',
                'bid_released',
                'settlement_paid',
                'settlement_proceeds',
                'settlement_tax'
            );

            CREATE TABLE "balance_ledger" (
                "id" bigserial PRIMARY KEY,
                "district" integer NOT NULL,
                "account" varchar NOT NULL,
                "currency" varchar NOT NULL,
                "amount" numeric(78, 18) NOT NULL,
                "reason" ledger_reason NOT NULL,
                "auction_id" bigint NOT NULL REFERENCES "auctions" ("id"),
                "tx_hash" varchar NOT NULL,
                "created_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            CREATE INDEX "balance_ledger_account_idx"
                ON "balance_ledger" ("district", "account", "currency");
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP TABLE "balance_ledger";
            DROP TYPE "ledger_reason";
        "#;
        crate::from_sql(manager, sql).await
    }
}
