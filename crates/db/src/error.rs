//! Error type returned by every repository.

use sea_orm::{DbErr, SqlErr};
use tresor_core::{ErrorCategory, LedgerError};

/// Repository error: a ledger rejection or a store failure.
#[derive(Debug, thiserror::Error)]
pub enum TreasuryError {
    /// Business or integrity rule from the ledger core.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl TreasuryError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Ledger(err) => err.category(),
            Self::Database(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.category().http_status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(err) if err.is_retryable())
    }

    /// Returns the ledger error, if this is one.
    #[must_use]
    pub fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(err) => Some(err),
            Self::Database(_) => None,
        }
    }
}

/// Maps a failed operation insert. A unique violation can only come from
/// the reference index.
pub(crate) fn insert_error(err: DbErr, reference: &str) -> TreasuryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            LedgerError::ReferenceConflict(reference.to_string()).into()
        }
        _ => err.into(),
    }
}

/// Maps a failed delete of a protected row.
pub(crate) fn delete_error(err: DbErr, entity: &str) -> TreasuryError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            LedgerError::EntityInUse(entity.to_string()).into()
        }
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_ledger_errors_delegate() {
        let err: TreasuryError = LedgerError::NotEnoughBalance {
            available: Decimal::ZERO,
            required: Decimal::ONE,
        }
        .into();
        assert_eq!(err.error_code(), "NOT_ENOUGH_BALANCE");
        assert_eq!(err.http_status_code(), 400);
        assert!(!err.is_retryable());
        assert!(err.as_ledger().is_some());
    }

    #[test]
    fn test_database_errors_are_internal() {
        let err: TreasuryError = DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_reference_conflict_is_retryable() {
        let err: TreasuryError = LedgerError::ReferenceConflict("0001/2025/DTNDB".to_string()).into();
        assert!(err.is_retryable());
        assert_eq!(err.http_status_code(), 409);
    }

    #[test]
    fn test_non_constraint_errors_pass_through() {
        let err = insert_error(DbErr::Custom("io".to_string()), "0001/2025/DTNDB");
        assert!(matches!(err, TreasuryError::Database(_)));
        let err = delete_error(DbErr::Custom("io".to_string()), "Account");
        assert!(matches!(err, TreasuryError::Database(_)));
    }
}
