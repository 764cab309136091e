use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TYPE "auction_category" AS ENUM (
                'land_sale',
                'land_lease',
                'creature_sale',
                'creature_breeding',
                'creature_lease'
            );

            CREATE TYPE "auction_status" AS ENUM ('going', 'cancel', 'finish', 'over');

            CREATE TYPE "custody_status" AS ENUM (
                'free',
                'on_sale',
                'on_breeding',
                'on_lease',
                'leased',
                'claimed'
            );

            CREATE TYPE "asset_kind" AS ENUM ('land', 'creature');

            CREATE TABLE "auctions" (
                "id" bigserial PRIMARY KEY,
                "district" integer NOT NULL,
                "token_id" varchar NOT NULL,
                "category" auction_category NOT NULL,
                "seller" varchar NOT NULL,
                "start_price" numeric(78, 18) NOT NULL,
                "end_price" numeric(78, 18) NOT NULL,
                "duration" bigint NOT NULL,
                "start_at" timestamp NOT NULL,
                "currency" varchar NOT NULL,
                "fee_rate" numeric(8, 6) NOT NULL,
                "status" auction_status NOT NULL,
                "last_bidder" varchar,
                "last_price" numeric(78, 18),
                "last_bid_at" timestamp,
                "winner" varchar,
                "final_price" numeric(78, 18),
                "claim_reference_at" timestamp,
                "created_tx_hash" varchar NOT NULL,
                "created_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc'),
                "updated_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            CREATE UNIQUE INDEX "auctions_single_going_idx"
                ON "auctions" ("district", "token_id", "category")
                WHERE "status" = 'going';

            CREATE INDEX "auctions_district_category_status_idx"
                ON "auctions" ("district", "category", "status", "id");

            CREATE TABLE "auction_bids" (
                "id" bigserial PRIMARY KEY,
                "auction_id" bigint NOT NULL REFERENCES "auctions" ("id"),
                "bidder" varchar NOT NULL,
                "price" numeric(78, 18) NOT NULL,
                "bid_at" timestamp NOT NULL,
                "tx_hash" varchar NOT NULL,
                "log_index" integer NOT NULL,
                "created_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            CREATE INDEX "auction_bids_auction_id_idx" ON "auction_bids" ("auction_id", "id");

            CREATE TABLE "asset_custody" (
                "district" integer NOT NULL,
                "asset" asset_kind NOT NULL,
                "token_id" varchar NOT NULL,
                "holder" varchar NOT NULL,
                "origin_owner" varchar NOT NULL,
                "status" custody_status NOT NULL,
                "updated_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc'),
                PRIMARY KEY ("district", "asset", "token_id")
            );

            CREATE TABLE "applied_actions" (
                "tx_hash" varchar NOT NULL,
                "action" varchar NOT NULL,
                "district" integer NOT NULL,
                "block_number" bigint NOT NULL,
                "created_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc'),
                PRIMARY KEY ("tx_hash", "action")
            );

            CREATE TABLE "indexer_checkpoints" (
                "district" integer PRIMARY KEY,
                "last_block" bigint NOT NULL,
                "updated_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            COMMENT ON TABLE "auctions" IS 'One row per auction lifecycle, kept as an audit trail';

            COMMENT ON TABLE "applied_actions" IS 'Idempotency records of (transaction, action) pairs';
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP TABLE "indexer_checkpoints";
            DROP TABLE "applied_actions";
            DROP TABLE "asset_custody";
            DROP TABLE "auction_bids";
            DROP TABLE "auctions";
            DROP TYPE "asset_kind";
            DROP TYPE "custody_status";
            DROP TYPE "auction_status";
            DROP TYPE "auction_category";
        "#;
        crate::from_sql(manager, sql).await
    }
}
