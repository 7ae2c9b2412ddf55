//! Aggregate treasury figures and the monthly attachment listing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use tracing::debug;
use tresor_core::reference::ReferenceKind;
use tresor_core::{DateFilter, TreasurySummary};
use uuid::Uuid;

use crate::entities::{
    accounts, collection_operation_details, collection_operations,
    disbursement_operation_details, disbursement_operations, vaults,
};
use crate::error::TreasuryError;

/// Attachment of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationAttachment {
    /// Operation family.
    pub kind: ReferenceKind,
    /// Operation id.
    pub operation_id: Uuid,
    /// Operation reference, `-` when none.
    pub reference: String,
    /// Operation date.
    pub date: NaiveDate,
    /// Stored attachment path or handle.
    pub path: String,
}

/// Read-only repository for treasury figures.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    db: DatabaseConnection,
}

impl StatsRepository {
    /// Creates a new stats repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Current balances plus collection and disbursement figures inside `filter`.
    ///
    /// Balances are always the current stored ones; only operation figures
    /// are filtered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateFilter` for an unusable date filter.
    pub async fn summary(&self, filter: Option<DateFilter>) -> Result<TreasurySummary, TreasuryError> {
        let range = filter.map(|f| f.range()).transpose()?;

        let account_balances: Vec<Decimal> = accounts::Entity::find()
            .select_only()
            .column(accounts::Column::Balance)
            .into_tuple()
            .all(&self.db)
            .await?;
        let vault_balances: Vec<Decimal> = vaults::Entity::find()
            .select_only()
            .column(vaults::Column::Balance)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut collections = collection_operations::Entity::find();
        let mut collection_amounts = collection_operation_details::Entity::find().join(
            JoinType::InnerJoin,
            collection_operation_details::Relation::CollectionOperations.def(),
        );
        let mut disbursements = disbursement_operations::Entity::find();
        let mut disbursement_amounts = disbursement_operation_details::Entity::find().join(
            JoinType::InnerJoin,
            disbursement_operation_details::Relation::DisbursementOperations.def(),
        );
        if let Some((from, to)) = range {
            collections = collections
                .filter(collection_operations::Column::Date.gte(from))
                .filter(collection_operations::Column::Date.lt(to));
            collection_amounts = collection_amounts
                .filter(collection_operations::Column::Date.gte(from))
                .filter(collection_operations::Column::Date.lt(to));
            disbursements = disbursements
                .filter(disbursement_operations::Column::Date.gte(from))
                .filter(disbursement_operations::Column::Date.lt(to));
            disbursement_amounts = disbursement_amounts
                .filter(disbursement_operations::Column::Date.gte(from))
                .filter(disbursement_operations::Column::Date.lt(to));
        }

        let collection_amounts: Vec<Decimal> = collection_amounts
            .select_only()
            .column(collection_operation_details::Column::Amount)
            .into_tuple()
            .all(&self.db)
            .await?;
        let disbursement_amounts: Vec<Decimal> = disbursement_amounts
            .select_only()
            .column(disbursement_operation_details::Column::Amount)
            .into_tuple()
            .all(&self.db)
            .await?;

        let summary = TreasurySummary {
            filter,
            total_account_balance: account_balances.iter().copied().sum(),
            total_vault_balance: vault_balances.iter().copied().sum(),
            total_collection: collection_amounts.iter().copied().sum(),
            collection_count: collections.count(&self.db).await?,
            total_disbursement: disbursement_amounts.iter().copied().sum(),
            disbursement_count: disbursements.count(&self.db).await?,
            account_count: u64::try_from(account_balances.len()).unwrap_or(u64::MAX),
        };

        debug!(
            filter = ?filter,
            collections = summary.collection_count,
            disbursements = summary.disbursement_count,
            "summary computed"
        );
        Ok(summary)
    }

    /// Attachments of collections and disbursements dated in the given month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateFilter` if the month is out of range.
    pub async fn attachments_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<OperationAttachment>, TreasuryError> {
        let (from, to) = DateFilter::month(year, month)?.range()?;

        let collections = collection_operations::Entity::find()
            .filter(collection_operations::Column::Date.gte(from))
            .filter(collection_operations::Column::Date.lt(to))
            .filter(collection_operations::Column::Attachment.is_not_null())
            .order_by_asc(collection_operations::Column::Date)
            .all(&self.db)
            .await?;
        let disbursements = disbursement_operations::Entity::find()
            .filter(disbursement_operations::Column::Date.gte(from))
            .filter(disbursement_operations::Column::Date.lt(to))
            .filter(disbursement_operations::Column::Attachment.is_not_null())
            .order_by_asc(disbursement_operations::Column::Date)
            .all(&self.db)
            .await?;

        let mut attachments: Vec<OperationAttachment> = collections
            .into_iter()
            .filter_map(|op| {
                Some(OperationAttachment {
                    kind: ReferenceKind::Collection,
                    operation_id: op.id,
                    reference: op.reference,
                    date: op.date,
                    path: op.attachment?,
                })
            })
            .collect();
        attachments.extend(disbursements.into_iter().filter_map(|op| {
            Some(OperationAttachment {
                kind: ReferenceKind::Disbursement,
                operation_id: op.id,
                reference: op.reference,
                date: op.date,
                path: op.attachment?,
            })
        }));

        debug!(year, month, count = attachments.len(), "attachments listed");
        Ok(attachments)
    }
}
