//! Database seeder for Tresor development and testing.
//!
//! Seeds vault groups, vaults and bank accounts through the repositories so
//! the same validation applies as in production. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tresor_db::repositories::{
    AccountRepository, CreateAccountInput, CreateVaultInput, VaultRepository,
};
use tresor_shared::AppConfig;
use tresor_shared::types::VaultGroupId;

/// Vault groups: name, fund transfers allowed, vaults (name, code, opening balance).
const VAULT_GROUPS: &[(&str, bool, &[(&str, &str, &str)])] = &[
    (
        "Caisse centrale",
        true,
        &[("Coffre principal", "CP", "25000.00"), ("Coffre secours", "CS", "5000.00")],
    ),
    ("Caisses agences", false, &[("Caisse agence nord", "AN", "1200.00")]),
];

/// Bank accounts: name, number, opening balance.
const ACCOUNTS: &[(&str, &str, &str)] = &[
    ("Compte courant BNA", "0300100012345678", "150000.00"),
    ("Compte Tresor", "0100200098765432", "80000.00"),
    ("Compte CCP", "0079999000123456", "0.00"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tresor=debug,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = tresor_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    seed_vaults(&VaultRepository::new(db.clone())).await?;
    seed_accounts(&AccountRepository::new(db)).await?;

    info!("seeding complete");
    Ok(())
}

async fn seed_vaults(repo: &VaultRepository) -> anyhow::Result<()> {
    if !repo.list_groups().await?.is_empty() {
        info!("vault groups already exist, skipping");
        return Ok(());
    }

    for (group_name, can_fund_transfer, vaults) in VAULT_GROUPS {
        let group = repo.create_group(group_name, *can_fund_transfer).await?;
        for (name, code, balance) in *vaults {
            repo.create(CreateVaultInput {
                name: (*name).to_string(),
                code: (*code).to_string(),
                opening_balance: Decimal::from_str(balance)?,
                group_id: VaultGroupId::from_uuid(group.id),
            })
            .await
            .with_context(|| format!("Failed to seed vault {name}"))?;
        }
    }
    Ok(())
}

async fn seed_accounts(repo: &AccountRepository) -> anyhow::Result<()> {
    if !repo.list().await?.is_empty() {
        info!("accounts already exist, skipping");
        return Ok(());
    }

    for (name, number, balance) in ACCOUNTS {
        repo.create(CreateAccountInput {
            name: (*name).to_string(),
            number: (*number).to_string(),
            opening_balance: Decimal::from_str(balance)?,
        })
        .await
        .with_context(|| format!("Failed to seed account {name}"))?;
    }
    Ok(())
}
