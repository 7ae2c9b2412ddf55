//! Database migration runner for Tresor.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! Reads `DATABASE_URL`, from the environment or `.env`.

use sea_orm_migration::prelude::*;
use tresor_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli sets up its own tracing
    cli::run_cli(Migrator).await;
}
