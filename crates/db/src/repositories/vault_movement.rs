//! Vault deposits and withdrawals, including fund transfers into accounts.

use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use tresor_core::ledger::{
    CreateVaultDepositInput, CreateVaultWithdrawalInput, LedgerError, LedgerService, MovementKind,
    WithdrawalKind,
};
use tresor_shared::types::{AccountId, VaultDepositId, VaultId, VaultWithdrawalId};

use super::locks::{lock_accounts, lock_vault, store_account_balance, store_vault_balance};
use crate::entities::{vault_deposits, vault_withdrawals};
use crate::error::TreasuryError;

/// Repository for vault deposits and withdrawals.
#[derive(Debug, Clone)]
pub struct VaultMovementRepository {
    db: DatabaseConnection,
}

impl VaultMovementRepository {
    /// Creates a new vault movement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a deposit and increases the vault balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` when the amount is not strictly positive whole cents
    /// - `VaultNotFound` if the vault does not exist
    pub async fn create_deposit(
        &self,
        input: CreateVaultDepositInput,
    ) -> Result<vault_deposits::Model, TreasuryError> {
        LedgerService::validate_amount(input.amount)?;

        let txn = self.db.begin().await?;
        let (vault, _) = lock_vault(&txn, input.vault_id).await?;
        let change = LedgerService::apply(vault.balance, MovementKind::VaultDeposit, input.amount)?;

        let deposit = vault_deposits::ActiveModel {
            id: Set(VaultDepositId::new().into_inner()),
            vault_id: Set(input.vault_id.into_inner()),
            amount: Set(input.amount),
            motif: Set(input.motif),
            date: Set(input.date),
            deposit_number: Set(input.deposit_number),
            external_reference: Set(input.external_reference),
            created_by: Set(input.created_by.into_inner()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;
        store_vault_balance(&txn, vault, change.after).await?;
        txn.commit().await?;

        info!(
            deposit_id = %deposit.id,
            vault_id = %deposit.vault_id,
            amount = %deposit.amount,
            balance = %change.after,
            "vault deposit created"
        );
        Ok(deposit)
    }

    /// Deletes a deposit and takes its amount back out of the vault.
    ///
    /// # Errors
    ///
    /// - `OperationNotFound` if the deposit does not exist
    /// - `NotEnoughBalance` if the vault no longer holds the amount
    pub async fn delete_deposit(&self, id: VaultDepositId) -> Result<(), TreasuryError> {
        let txn = self.db.begin().await?;
        let deposit = vault_deposits::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(LedgerError::OperationNotFound(id.into_inner()))?;

        let (vault, _) = lock_vault(&txn, VaultId::from_uuid(deposit.vault_id)).await?;
        let change = LedgerService::reverse(vault.balance, MovementKind::VaultDeposit, deposit.amount)
            .inspect_err(|e| warn!(deposit_id = %id, error = %e, "vault deposit delete rejected"))?;

        store_vault_balance(&txn, vault, change.after).await?;
        vault_deposits::Entity::delete_by_id(deposit.id).exec(&txn).await?;
        txn.commit().await?;

        info!(deposit_id = %id, amount = %deposit.amount, balance = %change.after, "vault deposit deleted");
        Ok(())
    }

    /// Records a withdrawal. A fund transfer also credits the target account.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` when the amount is not strictly positive whole cents
    /// - `VaultNotFound` / `AccountNotFound` for unknown ids
    /// - `FundTransferNotAllowed` when the vault's group forbids transfers
    /// - `NotEnoughBalance` when the vault does not hold the amount
    pub async fn create_withdrawal(
        &self,
        input: CreateVaultWithdrawalInput,
    ) -> Result<vault_withdrawals::Model, TreasuryError> {
        LedgerService::validate_amount(input.amount)?;

        let txn = self.db.begin().await?;
        let target: BTreeSet<AccountId> = input.kind.target_account().into_iter().collect();
        let mut accounts = lock_accounts(&txn, &target).await?;
        let (vault, group) = lock_vault(&txn, input.vault_id).await?;

        let vault_change =
            LedgerService::plan_withdrawal(&input, vault.balance, group.can_fund_transfer)
                .inspect_err(|e| {
                    warn!(vault_id = %input.vault_id, amount = %input.amount, error = %e, "vault withdrawal rejected");
                })?;

        if let WithdrawalKind::FundTransfer { account_id } = input.kind {
            let account = accounts
                .remove(&account_id)
                .ok_or(LedgerError::AccountNotFound(account_id.into_inner()))?;
            let account_change =
                LedgerService::apply(account.balance, MovementKind::FundTransferIn, input.amount)?;
            store_account_balance(&txn, account, account_change.after).await?;
        }
        store_vault_balance(&txn, vault, vault_change.after).await?;

        let withdrawal = vault_withdrawals::ActiveModel {
            id: Set(VaultWithdrawalId::new().into_inner()),
            vault_id: Set(input.vault_id.into_inner()),
            account_id: Set(input.kind.target_account().map(AccountId::into_inner)),
            amount: Set(input.amount),
            motif: Set(input.motif),
            date: Set(input.date),
            external_reference: Set(input.external_reference),
            created_by: Set(input.created_by.into_inner()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(
            withdrawal_id = %withdrawal.id,
            vault_id = %withdrawal.vault_id,
            account_id = ?withdrawal.account_id,
            amount = %withdrawal.amount,
            balance = %vault_change.after,
            "vault withdrawal created"
        );
        Ok(withdrawal)
    }

    /// Deletes a withdrawal, returning the cash to the vault and taking a
    /// fund transfer back out of its account.
    ///
    /// # Errors
    ///
    /// - `OperationNotFound` if the withdrawal does not exist
    /// - `NotEnoughBalance` if the credited account can no longer absorb the reversal
    pub async fn delete_withdrawal(&self, id: VaultWithdrawalId) -> Result<(), TreasuryError> {
        let txn = self.db.begin().await?;
        let withdrawal = vault_withdrawals::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(LedgerError::OperationNotFound(id.into_inner()))?;

        let target: BTreeSet<AccountId> =
            withdrawal.account_id.map(AccountId::from_uuid).into_iter().collect();
        let accounts = lock_accounts(&txn, &target).await?;
        let (vault, _) = lock_vault(&txn, VaultId::from_uuid(withdrawal.vault_id)).await?;

        for account in accounts.into_values() {
            let change = LedgerService::reverse(
                account.balance,
                MovementKind::FundTransferIn,
                withdrawal.amount,
            )
            .inspect_err(|e| warn!(withdrawal_id = %id, error = %e, "fund transfer delete rejected"))?;
            store_account_balance(&txn, account, change.after).await?;
        }
        let vault_change =
            LedgerService::reverse(vault.balance, MovementKind::VaultWithdrawal, withdrawal.amount)?;
        store_vault_balance(&txn, vault, vault_change.after).await?;

        vault_withdrawals::Entity::delete_by_id(withdrawal.id).exec(&txn).await?;
        txn.commit().await?;

        info!(withdrawal_id = %id, amount = %withdrawal.amount, "vault withdrawal deleted");
        Ok(())
    }

    /// Finds a deposit by id.
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFound` if it does not exist.
    pub async fn find_deposit(&self, id: VaultDepositId) -> Result<vault_deposits::Model, TreasuryError> {
        vault_deposits::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::OperationNotFound(id.into_inner()).into())
    }

    /// Finds a withdrawal by id.
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFound` if it does not exist.
    pub async fn find_withdrawal(
        &self,
        id: VaultWithdrawalId,
    ) -> Result<vault_withdrawals::Model, TreasuryError> {
        vault_withdrawals::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::OperationNotFound(id.into_inner()).into())
    }

    /// Lists deposits of a vault, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_deposits(&self, vault_id: VaultId) -> Result<Vec<vault_deposits::Model>, TreasuryError> {
        Ok(vault_deposits::Entity::find()
            .filter(vault_deposits::Column::VaultId.eq(vault_id.into_inner()))
            .order_by_desc(vault_deposits::Column::Date)
            .order_by_desc(vault_deposits::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Lists withdrawals of a vault, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_withdrawals(
        &self,
        vault_id: VaultId,
    ) -> Result<Vec<vault_withdrawals::Model>, TreasuryError> {
        Ok(vault_withdrawals::Entity::find()
            .filter(vault_withdrawals::Column::VaultId.eq(vault_id.into_inner()))
            .order_by_desc(vault_withdrawals::Column::Date)
            .order_by_desc(vault_withdrawals::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
