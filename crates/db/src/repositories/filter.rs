//! Listing filters shared by the operation repositories.

use chrono::NaiveDate;
use tresor_core::DateFilter;
use tresor_shared::types::{AccountId, UserId};

use crate::error::TreasuryError;

/// Filter for listing collections or disbursements.
///
/// `T` is the operation type enum of the listed family. `account_id` matches
/// the destination account of any detail for collections and the source
/// account for disbursements.
#[derive(Debug, Clone)]
pub struct OperationFilter<T> {
    /// Partial date (year, month or day).
    pub date: Option<DateFilter>,
    /// Operation type.
    pub operation_type: Option<T>,
    /// Creator.
    pub created_by: Option<UserId>,
    /// Account involved.
    pub account_id: Option<AccountId>,
}

impl<T> Default for OperationFilter<T> {
    fn default() -> Self {
        Self {
            date: None,
            operation_type: None,
            created_by: None,
            account_id: None,
        }
    }
}

impl<T> OperationFilter<T> {
    /// Half-open date range of the date filter, if any.
    pub(crate) fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, TreasuryError> {
        Ok(self.date.map(|f| f.range()).transpose()?)
    }
}
