//! Disbursement operation repository.
//!
//! A disbursement debits a single source account by the sum of its details.
//! The balance check runs against the row locked inside the transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    LoaderTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use tresor_core::ledger::{
    self, CreateDisbursementInput, LedgerError, LedgerService, MovementKind, UpdateOperationHeader,
};
use tresor_core::reference::{ReferenceKind, UNASSIGNED_REFERENCE};
use tresor_shared::types::{AccountId, DisbursementOperationId};

use super::filter::OperationFilter;
use super::locks::{lock_account, store_account_balance};
use super::reference::ReferenceAllocator;
use crate::entities::{
    disbursement_operation_details, disbursement_operations,
    sea_orm_active_enums::DisbursementType,
};
use crate::error::{TreasuryError, insert_error};

/// Disbursement header with its details and derived total.
#[derive(Debug, Clone)]
pub struct DisbursementOperation {
    /// Header row.
    pub header: disbursement_operations::Model,
    /// Detail rows in entry order.
    pub details: Vec<disbursement_operation_details::Model>,
    /// Sum of detail amounts.
    pub total: Decimal,
}

impl DisbursementOperation {
    fn new(
        header: disbursement_operations::Model,
        mut details: Vec<disbursement_operation_details::Model>,
    ) -> Self {
        details.sort_by_key(|d| d.position);
        let total = details.iter().map(|d| d.amount).sum();
        Self {
            header,
            details,
            total,
        }
    }
}

/// Disbursement operation repository.
#[derive(Debug, Clone)]
pub struct DisbursementRepository {
    db: DatabaseConnection,
    references: ReferenceAllocator,
}

impl DisbursementRepository {
    /// Creates a new disbursement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, references: ReferenceAllocator) -> Self {
        Self { db, references }
    }

    /// Creates a disbursement and debits its source account.
    ///
    /// A reference collision with a concurrent writer is retried once.
    ///
    /// # Errors
    ///
    /// - `EmptyDetails`, `InvalidDetails`, `InvalidAmount`
    /// - `AccountNotFound` if the source account does not exist
    /// - `NotEnoughBalance` if the source account cannot cover the total
    /// - `ReferenceConflict` if the retry collides again
    pub async fn create(
        &self,
        input: CreateDisbursementInput,
    ) -> Result<DisbursementOperation, TreasuryError> {
        match self.try_create(&input).await {
            Err(err) if err.is_retryable() => {
                warn!(error = %err, "disbursement reference collided, retrying once");
                self.try_create(&input).await
            }
            result => result,
        }
    }

    async fn try_create(
        &self,
        input: &CreateDisbursementInput,
    ) -> Result<DisbursementOperation, TreasuryError> {
        let txn = self.db.begin().await?;

        if input.operation_type.receives_reference() {
            self.references
                .lock(&txn, ReferenceKind::Disbursement, input.date)
                .await?;
        }
        let account = lock_account(&txn, input.account_id).await?;

        let plan = LedgerService::plan_disbursement(input, account.balance).inspect_err(|e| {
            warn!(account_id = %input.account_id, balance = %account.balance, error = %e, "disbursement rejected");
        })?;

        let reference = if input.operation_type.receives_reference() {
            self.references.next_disbursement(&txn, input.date).await?
        } else {
            UNASSIGNED_REFERENCE.to_string()
        };

        let now = Utc::now().into();
        let header = disbursement_operations::ActiveModel {
            id: Set(DisbursementOperationId::new().into_inner()),
            date: Set(input.date),
            account_id: Set(input.account_id.into_inner()),
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
        store_account_balance(&txn, account, plan.balance_after).await?;
        txn.commit().await?;

        info!(
            operation_id = %header.id,
            reference = %header.reference,
            account_id = %input.account_id,
            total = %plan.total,
            balance = %plan.balance_after,
            "disbursement created"
        );
        Ok(DisbursementOperation::new(header, details))
    }

    /// Finds a disbursement with its details.
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFound` if it does not exist.
    pub async fn get(
        &self,
        id: DisbursementOperationId,
    ) -> Result<DisbursementOperation, TreasuryError> {
        let header = disbursement_operations::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::OperationNotFound(id.into_inner()))?;
        let details = disbursement_operation_details::Entity::find()
            .filter(disbursement_operation_details::Column::OperationId.eq(header.id))
            .all(&self.db)
            .await?;
        Ok(DisbursementOperation::new(header, details))
    }

    /// Lists disbursements, newest date first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateFilter` for an unusable date filter.
    pub async fn list(
        &self,
        filter: &OperationFilter<ledger::DisbursementType>,
    ) -> Result<Vec<DisbursementOperation>, TreasuryError> {
        let mut query = disbursement_operations::Entity::find();

        if let Some((from, to)) = filter.date_range()? {
            query = query
                .filter(disbursement_operations::Column::Date.gte(from))
                .filter(disbursement_operations::Column::Date.lt(to));
        }
        if let Some(operation_type) = filter.operation_type {
            query = query.filter(
                disbursement_operations::Column::OperationType
                    .eq(DisbursementType::from(operation_type)),
            );
        }
        if let Some(created_by) = filter.created_by {
            query = query
                .filter(disbursement_operations::Column::CreatedBy.eq(created_by.into_inner()));
        }
        if let Some(account_id) = filter.account_id {
            query = query
                .filter(disbursement_operations::Column::AccountId.eq(account_id.into_inner()));
        }

        let headers = query
            .order_by_desc(disbursement_operations::Column::Date)
            .order_by_desc(disbursement_operations::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let details = headers
            .load_many(disbursement_operation_details::Entity, &self.db)
            .await?;

        Ok(headers
            .into_iter()
            .zip(details)
            .map(|(header, details)| DisbursementOperation::new(header, details))
            .collect())
    }

    /// Changes motif, beneficiary or attachment. Balances are untouched.
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFound` if the disbursement does not exist.
    pub async fn update_header(
        &self,
        id: DisbursementOperationId,
        update: UpdateOperationHeader,
    ) -> Result<DisbursementOperation, TreasuryError> {
        if update.is_empty() {
            return self.get(id).await;
        }

        let header = disbursement_operations::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::OperationNotFound(id.into_inner()))?;

        let mut active: disbursement_operations::ActiveModel = header.into();
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

        info!(operation_id = %id, "disbursement header updated");
        self.get(id).await
    }

    /// Deletes a disbursement and returns its total to the source account.
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFound` if the disbursement does not exist.
    pub async fn delete(&self, id: DisbursementOperationId) -> Result<(), TreasuryError> {
        let txn = self.db.begin().await?;

        let header = disbursement_operations::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(LedgerError::OperationNotFound(id.into_inner()))?;
        let details = disbursement_operation_details::Entity::find()
            .filter(disbursement_operation_details::Column::OperationId.eq(header.id))
            .all(&txn)
            .await?;
        let operation = DisbursementOperation::new(header, details);

        let account = lock_account(&txn, AccountId::from_uuid(operation.header.account_id)).await?;
        let change =
            LedgerService::reverse(account.balance, MovementKind::Disbursement, operation.total)?;
        store_account_balance(&txn, account, change.after).await?;

        disbursement_operations::Entity::delete_by_id(operation.header.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            operation_id = %id,
            reference = %operation.header.reference,
            total = %operation.total,
            balance = %change.after,
            "disbursement deleted"
        );
        Ok(())
    }
}

async fn insert_details(
    txn: &DatabaseTransaction,
    operation_id: uuid::Uuid,
    input: &CreateDisbursementInput,
) -> Result<Vec<disbursement_operation_details::Model>, TreasuryError> {
    let now = Utc::now();
    let mut details = Vec::with_capacity(input.details.len());
    for (position, detail) in input.details.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| LedgerError::InvalidDetails("too many details".to_string()))?;
        let row = disbursement_operation_details::ActiveModel {
            id: Set(uuid::Uuid::now_v7()),
            operation_id: Set(operation_id),
            position: Set(position),
            amount: Set(detail.amount),
            name: Set(detail.name.clone()),
            bank_name: Set(detail.bank_name.clone()),
            bank_account_number: Set(detail.bank_account_number.clone()),
            created_at: Set(now.into()),
        }
        .insert(txn)
        .await?;
        details.push(row);
    }
    Ok(details)
}
