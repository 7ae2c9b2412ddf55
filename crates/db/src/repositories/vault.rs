//! Vault repository: vault groups and cash vaults.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use tresor_core::{LedgerError, LedgerService};
use tresor_shared::types::{VaultGroupId, VaultId};

use super::locks::lock_vault;
use crate::entities::{vault_deposits, vault_groups, vault_withdrawals, vaults};
use crate::error::{TreasuryError, delete_error};

/// Input for creating a vault.
#[derive(Debug, Clone)]
pub struct CreateVaultInput {
    /// Display name.
    pub name: String,
    /// Short code.
    pub code: String,
    /// Seed balance.
    pub opening_balance: Decimal,
    /// Owning group.
    pub group_id: VaultGroupId,
}

/// Vault with its group.
#[derive(Debug, Clone)]
pub struct VaultWithGroup {
    /// The vault.
    pub vault: vaults::Model,
    /// Its group.
    pub group: vault_groups::Model,
}

/// Vault repository.
#[derive(Debug, Clone)]
pub struct VaultRepository {
    db: DatabaseConnection,
}

impl VaultRepository {
    /// Creates a new vault repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a vault group.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (for example a duplicate name).
    pub async fn create_group(
        &self,
        name: &str,
        can_fund_transfer: bool,
    ) -> Result<vault_groups::Model, TreasuryError> {
        let group = vault_groups::ActiveModel {
            id: Set(VaultGroupId::new().into_inner()),
            name: Set(name.trim().to_string()),
            can_fund_transfer: Set(can_fund_transfer),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(group_id = %group.id, name = %group.name, can_fund_transfer, "vault group created");
        Ok(group)
    }

    /// Finds a vault group by id.
    ///
    /// # Errors
    ///
    /// Returns `VaultGroupNotFound` if it does not exist.
    pub async fn find_group(&self, id: VaultGroupId) -> Result<vault_groups::Model, TreasuryError> {
        vault_groups::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::VaultGroupNotFound(id.into_inner()).into())
    }

    /// Lists vault groups by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_groups(&self) -> Result<Vec<vault_groups::Model>, TreasuryError> {
        Ok(vault_groups::Entity::find()
            .order_by_asc(vault_groups::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Creates a vault in an existing group.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a negative opening balance
    /// - `VaultGroupNotFound` if the group does not exist
    pub async fn create(&self, input: CreateVaultInput) -> Result<vaults::Model, TreasuryError> {
        LedgerService::validate_opening_balance(input.opening_balance)?;
        self.find_group(input.group_id).await?;

        let now = Utc::now().into();
        let vault = vaults::ActiveModel {
            id: Set(VaultId::new().into_inner()),
            name: Set(input.name),
            code: Set(input.code),
            balance: Set(input.opening_balance),
            vault_group_id: Set(input.group_id.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(vault_id = %vault.id, name = %vault.name, balance = %vault.balance, "vault created");
        Ok(vault)
    }

    /// Finds a vault and its group.
    ///
    /// # Errors
    ///
    /// Returns `VaultNotFound` if it does not exist.
    pub async fn find(&self, id: VaultId) -> Result<VaultWithGroup, TreasuryError> {
        let (vault, group) = vaults::Entity::find_by_id(id.into_inner())
            .find_also_related(vault_groups::Entity)
            .one(&self.db)
            .await?
            .ok_or(LedgerError::VaultNotFound(id.into_inner()))?;
        let group = group.ok_or(LedgerError::VaultGroupNotFound(vault.vault_group_id))?;
        Ok(VaultWithGroup { vault, group })
    }

    /// Lists vaults ordered by group, then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<VaultWithGroup>, TreasuryError> {
        let rows = vaults::Entity::find()
            .find_also_related(vault_groups::Entity)
            .order_by_asc(vault_groups::Column::Name)
            .order_by_asc(vaults::Column::Name)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(vault, group)| -> Result<VaultWithGroup, TreasuryError> {
                let group = group.ok_or(LedgerError::VaultGroupNotFound(vault.vault_group_id))?;
                Ok(VaultWithGroup { vault, group })
            })
            .collect()
    }

    /// Deletes a vault no deposit or withdrawal references.
    ///
    /// # Errors
    ///
    /// - `VaultNotFound` if it does not exist
    /// - `EntityInUse` while deposits or withdrawals reference it
    pub async fn delete(&self, id: VaultId) -> Result<(), TreasuryError> {
        let txn = self.db.begin().await?;
        let (vault, _) = lock_vault(&txn, id).await?;

        let uuid = id.into_inner();
        let references = vault_deposits::Entity::find()
            .filter(vault_deposits::Column::VaultId.eq(uuid))
            .count(&txn)
            .await?
            + vault_withdrawals::Entity::find()
                .filter(vault_withdrawals::Column::VaultId.eq(uuid))
                .count(&txn)
                .await?;
        if references > 0 {
            warn!(vault_id = %id, references, "vault delete rejected, still referenced");
            return Err(LedgerError::EntityInUse(format!("Vault {}", vault.name)).into());
        }

        vaults::Entity::delete_by_id(uuid)
            .exec(&txn)
            .await
            .map_err(|e| delete_error(e, "Vault"))?;
        txn.commit().await?;

        info!(vault_id = %id, "vault deleted");
        Ok(())
    }
}
