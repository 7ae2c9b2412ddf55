//! Account repository: bank accounts of the balance store.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::{info, warn};
use tresor_core::{LedgerError, LedgerService};
use tresor_shared::types::AccountId;

use super::locks::lock_account;
use crate::entities::{accounts, collection_operation_details, disbursement_operations, vault_withdrawals};
use crate::error::{TreasuryError, delete_error};

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Unique display name.
    pub name: String,
    /// Bank account number.
    pub number: String,
    /// Seed balance.
    pub opening_balance: Decimal,
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account with its seed balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a negative opening balance
    /// - `DuplicateAccountName` if the name is taken
    pub async fn create(&self, input: CreateAccountInput) -> Result<accounts::Model, TreasuryError> {
        LedgerService::validate_opening_balance(input.opening_balance)?;

        let name = input.name.trim().to_string();
        let taken = accounts::Entity::find()
            .filter(accounts::Column::Name.eq(name.as_str()))
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(LedgerError::DuplicateAccountName(name).into());
        }

        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            name: Set(name.clone()),
            number: Set(input.number),
            balance: Set(input.opening_balance),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                TreasuryError::from(LedgerError::DuplicateAccountName(name.clone()))
            }
            _ => e.into(),
        })?;

        info!(account_id = %account.id, name = %account.name, balance = %account.balance, "account created");
        Ok(account)
    }

    /// Finds an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist.
    pub async fn find(&self, id: AccountId) -> Result<accounts::Model, TreasuryError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(id.into_inner()).into())
    }

    /// Lists accounts, largest balance first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<accounts::Model>, TreasuryError> {
        Ok(accounts::Entity::find()
            .order_by_desc(accounts::Column::Balance)
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Deletes an account no operation references.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if it does not exist
    /// - `EntityInUse` while collections, disbursements or fund transfers reference it
    pub async fn delete(&self, id: AccountId) -> Result<(), TreasuryError> {
        let txn = self.db.begin().await?;
        let account = lock_account(&txn, id).await?;

        let uuid = id.into_inner();
        let references = collection_operation_details::Entity::find()
            .filter(collection_operation_details::Column::AccountId.eq(uuid))
            .count(&txn)
            .await?
            + disbursement_operations::Entity::find()
                .filter(disbursement_operations::Column::AccountId.eq(uuid))
                .count(&txn)
                .await?
            + vault_withdrawals::Entity::find()
                .filter(vault_withdrawals::Column::AccountId.eq(uuid))
                .count(&txn)
                .await?;
        if references > 0 {
            warn!(account_id = %id, references, "account delete rejected, still referenced");
            return Err(LedgerError::EntityInUse(format!("Account {}", account.name)).into());
        }

        accounts::Entity::delete_by_id(uuid)
            .exec(&txn)
            .await
            .map_err(|e| delete_error(e, "Account"))?;
        txn.commit().await?;

        info!(account_id = %id, "account deleted");
        Ok(())
    }
}
