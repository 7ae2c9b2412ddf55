//! Collection operation repository.
//!
//! A collection credits one or more accounts through its detail rows. The
//! header, the details and every balance update commit together.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, JoinType,
    LoaderTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::{info, warn};
use tresor_core::ledger::{
    self, CollectionPlan, CreateCollectionInput, LedgerError, LedgerService, MovementKind,
    UpdateOperationHeader,
};
use tresor_core::reference::{ReferenceKind, UNASSIGNED_REFERENCE};
use tresor_shared::types::{AccountId, CollectionOperationId};

use super::filter::OperationFilter;
use super::locks::{lock_accounts, store_account_balance};
use super::reference::ReferenceAllocator;
use crate::entities::{
    collection_operation_details, collection_operations, sea_orm_active_enums::CollectionType,
};
use crate::error::{TreasuryError, insert_error};

/// Collection header with its details and derived total.
#[derive(Debug, Clone)]
pub struct CollectionOperation {
    /// Header row.
    pub header: collection_operations::Model,
    /// Detail rows in entry order.
    pub details: Vec<collection_operation_details::Model>,
    /// Sum of detail amounts.
    pub total: Decimal,
}

impl CollectionOperation {
    fn new(
        header: collection_operations::Model,
        mut details: Vec<collection_operation_details::Model>,
    ) -> Self {
        details.sort_by_key(|d| d.position);
        let total = details.iter().map(|d| d.amount).sum();
        Self {
            header,
            details,
            total,
        }
    }

    /// Amount credited per destination account.
    #[must_use]
    pub fn credits(&self) -> BTreeMap<AccountId, Decimal> {
        let mut credits = BTreeMap::new();
        for detail in &self.details {
            *credits
                .entry(AccountId::from_uuid(detail.account_id))
                .or_insert(Decimal::ZERO) += detail.amount;
        }
        credits
    }
}

/// Collection operation repository.
#[derive(Debug, Clone)]
pub struct CollectionRepository {
    db: DatabaseConnection,
    references: ReferenceAllocator,
}

impl CollectionRepository {
    /// Creates a new collection repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, references: ReferenceAllocator) -> Self {
        Self { db, references }
    }

    /// Creates a collection and credits every destination account.
    ///
    /// A reference collision with a concurrent writer is retried once.
    ///
    /// # Errors
    ///
    /// - `EmptyDetails`, `RejectedOperationMultipleDetails`, `InvalidAmount`
    /// - `AccountNotFound` for an unknown destination account
    /// - `ReferenceConflict` if the retry collides again
    pub async fn create(
        &self,
        input: CreateCollectionInput,
    ) -> Result<CollectionOperation, TreasuryError> {
        let plan = LedgerService::plan_collection(&input)
            .inspect_err(|e| warn!(error = %e, "collection rejected"))?;

        match self.try_create(&input, &plan).await {
            Err(err) if err.is_retryable() => {
                warn!(error = %err, "collection reference collided, retrying once");
                self.try_create(&input, &plan).await
            }
            result => result,
        }
    }

    async fn try_create(
        &self,
        input: &CreateCollectionInput,
        plan: &CollectionPlan,
    ) -> Result<CollectionOperation, TreasuryError> {
        let txn = self.db.begin().await?;

        let reference = if input.operation_type.receives_reference() {
            self.references
                .lock(&txn, ReferenceKind::Collection, input.date)
                .await?;
            self.references.next_collection(&txn, input.date).await?
        } else {
            UNASSIGNED_REFERENCE.to_string()
        };

        let account_ids: BTreeSet<AccountId> = plan.credits.keys().copied().collect();
        let mut accounts = lock_accounts(&txn, &account_ids).await?;

        let now = Utc::now().into();
        let header = collection_operations::ActiveModel {
            id: Set(CollectionOperationId::new().into_inner()),
            date: Set(input.date),
            motif: Set(input.motif.clone()),
            beneficiary: Set(input.beneficiary.clone()),
            operation_type: Set(input.operation_type.into()),
            reference: Set(reference.clone()),
            attachment: Set(input.attachment.clone()),
            created_by: Set(input.created_by.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| insert_error(e, &reference))?;

        let details = insert_details(&txn, header.id, input).await?;

        for (account_id, amount) in &plan.credits {
            let account = accounts
                .remove(account_id)
                .ok_or(LedgerError::AccountNotFound(account_id.into_inner()))?;
            let change = LedgerService::apply(account.balance, MovementKind::Collection, *amount)?;
            store_account_balance(&txn, account, change.after).await?;
        }

        txn.commit().await?;

        info!(
            operation_id = %header.id,
            reference = %header.reference,
            operation_type = %input.operation_type,
            total = %plan.total,
            accounts = plan.credits.len(),
            "collection created"
        );
        Ok(CollectionOperation::new(header, details))
    }

    /// Finds a collection with its details.
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFound` if it does not exist.
    pub async fn get(&self, id: CollectionOperationId) -> Result<CollectionOperation, TreasuryError> {
        let header = collection_operations::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::OperationNotFound(id.into_inner()))?;
        let details = collection_operation_details::Entity::find()
            .filter(collection_operation_details::Column::OperationId.eq(header.id))
            .all(&self.db)
            .await?;
        Ok(CollectionOperation::new(header, details))
    }

    /// Lists collections, newest date first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateFilter` for an unusable date filter.
    pub async fn list(
        &self,
        filter: &OperationFilter<ledger::CollectionType>,
    ) -> Result<Vec<CollectionOperation>, TreasuryError> {
        let mut query = collection_operations::Entity::find();

        if let Some((from, to)) = filter.date_range()? {
            query = query
                .filter(collection_operations::Column::Date.gte(from))
                .filter(collection_operations::Column::Date.lt(to));
        }
        if let Some(operation_type) = filter.operation_type {
            query = query.filter(
                collection_operations::Column::OperationType.eq(CollectionType::from(operation_type)),
            );
        }
        if let Some(created_by) = filter.created_by {
            query = query.filter(collection_operations::Column::CreatedBy.eq(created_by.into_inner()));
        }
        if let Some(account_id) = filter.account_id {
            query = query
                .join(
                    JoinType::InnerJoin,
                    collection_operations::Relation::CollectionOperationDetails.def(),
                )
                .filter(collection_operation_details::Column::AccountId.eq(account_id.into_inner()))
                .distinct();
        }

        let headers = query
            .order_by_desc(collection_operations::Column::Date)
            .order_by_desc(collection_operations::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let details = headers
            .load_many(collection_operation_details::Entity, &self.db)
            .await?;

        Ok(headers
            .into_iter()
            .zip(details)
            .map(|(header, details)| CollectionOperation::new(header, details))
            .collect())
    }

    /// Changes motif, beneficiary or attachment. Balances are untouched.
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFound` if the collection does not exist.
    pub async fn update_header(
        &self,
        id: CollectionOperationId,
        update: UpdateOperationHeader,
    ) -> Result<CollectionOperation, TreasuryError> {
        if update.is_empty() {
            return self.get(id).await;
        }

        let header = collection_operations::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::OperationNotFound(id.into_inner()))?;

        let mut active: collection_operations::ActiveModel = header.into();
        if let Some(motif) = update.motif {
            active.motif = Set(motif);
        }
        if let Some(beneficiary) = update.beneficiary {
            active.beneficiary = Set(beneficiary);
        }
        if let Some(attachment) = update.attachment {
            active.attachment = Set(attachment);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;

        info!(operation_id = %id, "collection header updated");
        self.get(id).await
    }

    /// Deletes a collection and takes its amounts back out of every credited account.
    ///
    /// Nothing changes if any credited account can no longer absorb its share.
    ///
    /// # Errors
    ///
    /// - `OperationNotFound` if the collection does not exist
    /// - `NotEnoughBalance` if a credited account was drawn down since
    pub async fn delete(&self, id: CollectionOperationId) -> Result<(), TreasuryError> {
        let txn = self.db.begin().await?;

        let header = collection_operations::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(LedgerError::OperationNotFound(id.into_inner()))?;
        let details = collection_operation_details::Entity::find()
            .filter(collection_operation_details::Column::OperationId.eq(header.id))
            .all(&txn)
            .await?;
        let operation = CollectionOperation::new(header, details);
        let credits = operation.credits();

        let account_ids: BTreeSet<AccountId> = credits.keys().copied().collect();
        let mut accounts = lock_accounts(&txn, &account_ids).await?;
        let balances: BTreeMap<AccountId, Decimal> =
            accounts.iter().map(|(id, a)| (*id, a.balance)).collect();

        let changes = LedgerService::plan_collection_reversal(&credits, &balances)
            .inspect_err(|e| warn!(operation_id = %id, error = %e, "collection delete rejected"))?;

        for (account_id, change) in changes {
            let account = accounts
                .remove(&account_id)
                .ok_or(LedgerError::AccountNotFound(account_id.into_inner()))?;
            store_account_balance(&txn, account, change.after).await?;
        }
        collection_operations::Entity::delete_by_id(operation.header.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            operation_id = %id,
            reference = %operation.header.reference,
            total = %operation.total,
            "collection deleted"
        );
        Ok(())
    }
}

async fn insert_details(
    txn: &DatabaseTransaction,
    operation_id: uuid::Uuid,
    input: &CreateCollectionInput,
) -> Result<Vec<collection_operation_details::Model>, TreasuryError> {
    let now = Utc::now();
    let mut details = Vec::with_capacity(input.details.len());
    for (position, detail) in input.details.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| LedgerError::InvalidDetails("too many details".to_string()))?;
        let row = collection_operation_details::ActiveModel {
            id: Set(uuid::Uuid::now_v7()),
            operation_id: Set(operation_id),
            position: Set(position),
            account_id: Set(detail.account_id.into_inner()),
            amount: Set(detail.amount),
            cheque_number: Set(detail.cheque_number.clone()),
            name: Set(detail.name.clone()),
            bank_name: Set(detail.bank_name.clone()),
            created_at: Set(now.into()),
        }
        .insert(txn)
        .await?;
        details.push(row);
    }
    Ok(details)
}
