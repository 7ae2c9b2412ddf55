//! Row and advisory locks used inside write transactions.
//!
//! Lock order within one transaction: reference advisory lock, then
//! account rows by ascending id, then vault rows.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use tracing::debug;
use tresor_core::LedgerError;
use tresor_shared::types::{AccountId, VaultId};

use crate::entities::{accounts, vault_groups, vaults};
use crate::error::TreasuryError;

/// Takes a transaction-scoped advisory lock on `key`.
pub(crate) async fn advisory_lock(txn: &DatabaseTransaction, key: &str) -> Result<(), TreasuryError> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtext($1))",
        [key.into()],
    ))
    .await?;
    debug!(key, "advisory lock acquired");
    Ok(())
}

/// Locks account rows `FOR UPDATE` in ascending id order.
///
/// Fails with `AccountNotFound` if any id is missing.
pub(crate) async fn lock_accounts(
    txn: &DatabaseTransaction,
    ids: &BTreeSet<AccountId>,
) -> Result<BTreeMap<AccountId, accounts::Model>, TreasuryError> {
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let rows = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
        .order_by_asc(accounts::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await?;

    let locked: BTreeMap<AccountId, accounts::Model> = rows
        .into_iter()
        .map(|row| (AccountId::from_uuid(row.id), row))
        .collect();

    if let Some(missing) = ids.iter().find(|id| !locked.contains_key(id)) {
        return Err(LedgerError::AccountNotFound(missing.into_inner()).into());
    }
    debug!(count = locked.len(), "account rows locked");
    Ok(locked)
}

/// Locks one account row `FOR UPDATE`.
pub(crate) async fn lock_account(
    txn: &DatabaseTransaction,
    id: AccountId,
) -> Result<accounts::Model, TreasuryError> {
    let mut locked = lock_accounts(txn, &BTreeSet::from([id])).await?;
    locked
        .remove(&id)
        .ok_or_else(|| LedgerError::AccountNotFound(id.into_inner()).into())
}

/// Locks a vault row `FOR UPDATE` and reads its group.
pub(crate) async fn lock_vault(
    txn: &DatabaseTransaction,
    id: VaultId,
) -> Result<(vaults::Model, vault_groups::Model), TreasuryError> {
    let vault = vaults::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(LedgerError::VaultNotFound(id.into_inner()))?;

    let group = vault_groups::Entity::find_by_id(vault.vault_group_id)
        .one(txn)
        .await?
        .ok_or(LedgerError::VaultGroupNotFound(vault.vault_group_id))?;

    debug!(vault_id = %id, "vault row locked");
    Ok((vault, group))
}

/// Writes a new balance to a locked account row.
pub(crate) async fn store_account_balance(
    txn: &DatabaseTransaction,
    account: accounts::Model,
    balance: Decimal,
) -> Result<accounts::Model, TreasuryError> {
    let mut active: accounts::ActiveModel = account.into();
    active.balance = Set(balance);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

/// Writes a new balance to a locked vault row.
pub(crate) async fn store_vault_balance(
    txn: &DatabaseTransaction,
    vault: vaults::Model,
    balance: Decimal,
) -> Result<vaults::Model, TreasuryError> {
    let mut active: vaults::ActiveModel = vault.into();
    active.balance = Set(balance);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}
