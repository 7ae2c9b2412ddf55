//! Reference allocation inside the creating transaction.

use chrono::{Datelike, NaiveDate};
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;
use tresor_core::reference::{ReferenceKind, ReferencePolicy};

use super::locks::advisory_lock;
use crate::entities::{
    collection_operations, disbursement_operations,
    sea_orm_active_enums::{CollectionType, DisbursementType},
};
use crate::error::TreasuryError;

/// Allocates yearly sequential references.
#[derive(Debug, Clone)]
pub struct ReferenceAllocator {
    policy: ReferencePolicy,
}

impl ReferenceAllocator {
    /// Creates an allocator for `policy`.
    #[must_use]
    pub const fn new(policy: ReferencePolicy) -> Self {
        Self { policy }
    }

    /// Returns the numbering policy.
    #[must_use]
    pub const fn policy(&self) -> &ReferencePolicy {
        &self.policy
    }

    /// Serializes allocation for `kind` in the year of `date` until `txn` ends.
    pub(crate) async fn lock(
        &self,
        txn: &DatabaseTransaction,
        kind: ReferenceKind,
        date: NaiveDate,
    ) -> Result<(), TreasuryError> {
        advisory_lock(txn, &format!("{kind}_operations:{}", date.year())).await
    }

    /// Next collection reference for the year of `date`.
    ///
    /// Must run after [`Self::lock`] in the same transaction.
    pub(crate) async fn next_collection(
        &self,
        txn: &DatabaseTransaction,
        date: NaiveDate,
    ) -> Result<String, TreasuryError> {
        let (from, to) = year_bounds(date);
        let last: Option<String> = collection_operations::Entity::find()
            .filter(collection_operations::Column::OperationType.eq(CollectionType::Operation))
            .filter(collection_operations::Column::Date.gte(from))
            .filter(collection_operations::Column::Date.lt(to))
            .order_by_desc(collection_operations::Column::CreatedAt)
            .order_by_desc(collection_operations::Column::Id)
            .select_only()
            .column(collection_operations::Column::Reference)
            .into_tuple()
            .one(txn)
            .await?;

        let reference =
            self.policy
                .next_reference(ReferenceKind::Collection, date.year(), last.as_deref());
        debug!(%reference, last = ?last, "collection reference allocated");
        Ok(reference)
    }

    /// Next disbursement reference for the year of `date`.
    ///
    /// Must run after [`Self::lock`] in the same transaction.
    pub(crate) async fn next_disbursement(
        &self,
        txn: &DatabaseTransaction,
        date: NaiveDate,
    ) -> Result<String, TreasuryError> {
        let (from, to) = year_bounds(date);
        let last: Option<String> = disbursement_operations::Entity::find()
            .filter(disbursement_operations::Column::OperationType.eq(DisbursementType::Operation))
            .filter(disbursement_operations::Column::Date.gte(from))
            .filter(disbursement_operations::Column::Date.lt(to))
            .order_by_desc(disbursement_operations::Column::CreatedAt)
            .order_by_desc(disbursement_operations::Column::Id)
            .select_only()
            .column(disbursement_operations::Column::Reference)
            .into_tuple()
            .one(txn)
            .await?;

        let reference =
            self.policy
                .next_reference(ReferenceKind::Disbursement, date.year(), last.as_deref());
        debug!(%reference, last = ?last, "disbursement reference allocated");
        Ok(reference)
    }
}

impl Default for ReferenceAllocator {
    fn default() -> Self {
        Self::new(ReferencePolicy::default())
    }
}

fn year_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let year = date.year();
    let from = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(date);
    let to = NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap_or(NaiveDate::MAX);
    (from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds() {
        let (from, to) = year_bounds(NaiveDate::from_ymd_opt(2025, 7, 14).unwrap());
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_default_allocator_uses_historical_policy() {
        let allocator = ReferenceAllocator::default();
        assert_eq!(allocator.policy().suffix(), "DTNDB");
    }
}
