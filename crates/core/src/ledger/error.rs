//! Ledger error types for validation and state errors.
//!
//! Every error carries a machine-readable code and a category so the
//! calling shell can decide how to report it without matching on variants.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Broad classification of ledger errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Client-correctable input or business rejection.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// A store-level integrity rule was hit (reference race, protected row).
    Integrity,
    /// Anything else.
    Internal,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// An operation must carry at least one detail row.
    #[error("Operation must have at least one detail")]
    EmptyDetails,

    /// A rejected collection must carry exactly one detail row.
    #[error("Rejected operation must have exactly one detail, got {0}")]
    RejectedOperationMultipleDetails(usize),

    /// Detail rows are inconsistent with the operation type.
    #[error("Invalid details: {0}")]
    InvalidDetails(String),

    /// Amounts must be strictly positive with at most two decimal places.
    #[error("Amount must be strictly positive with at most two decimal places, got {0}")]
    InvalidAmount(Decimal),

    /// The mutation would drive a balance below zero.
    #[error("Not enough balance. Available: {available}, required: {required}")]
    NotEnoughBalance {
        /// Balance before the mutation.
        available: Decimal,
        /// Amount the mutation needs to take out.
        required: Decimal,
    },

    /// Start date is after end date.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// Date filter is not `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    #[error("Invalid date filter: {0}")]
    InvalidDateFilter(String),

    /// The vault's group does not allow withdrawals into accounts.
    #[error("Vault {0} does not allow fund transfers")]
    FundTransferNotAllowed(Uuid),

    /// An account with this name already exists.
    #[error("Account name '{0}' already exists")]
    DuplicateAccountName(String),

    // ========== Not Found Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Vault not found.
    #[error("Vault not found: {0}")]
    VaultNotFound(Uuid),

    /// Vault group not found.
    #[error("Vault group not found: {0}")]
    VaultGroupNotFound(Uuid),

    /// Operation (collection, disbursement, deposit or withdrawal) not found.
    #[error("Operation not found: {0}")]
    OperationNotFound(Uuid),

    // ========== Integrity Errors ==========
    /// Two writers produced the same reference.
    #[error("Reference {0} is already taken")]
    ReferenceConflict(String),

    /// The entity is still referenced by operations and cannot be deleted.
    #[error("{0} is still referenced by operations")]
    EntityInUse(String),

    // ========== Internal Errors ==========
    /// Ledger configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDetails => "EMPTY_DETAILS",
            Self::RejectedOperationMultipleDetails(_) => "REJECTED_OPERATION_MULTIPLE_DETAILS",
            Self::InvalidDetails(_) => "INVALID_DETAILS",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::NotEnoughBalance { .. } => "NOT_ENOUGH_BALANCE",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::InvalidDateFilter(_) => "INVALID_DATE_FILTER",
            Self::FundTransferNotAllowed(_) => "FUND_TRANSFER_NOT_ALLOWED",
            Self::DuplicateAccountName(_) => "DUPLICATE_ACCOUNT_NAME",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::VaultNotFound(_) => "VAULT_NOT_FOUND",
            Self::VaultGroupNotFound(_) => "VAULT_GROUP_NOT_FOUND",
            Self::OperationNotFound(_) => "OPERATION_NOT_FOUND",
            Self::ReferenceConflict(_) => "REFERENCE_CONFLICT",
            Self::EntityInUse(_) => "ENTITY_IN_USE",
            Self::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyDetails
            | Self::RejectedOperationMultipleDetails(_)
            | Self::InvalidDetails(_)
            | Self::InvalidAmount(_)
            | Self::NotEnoughBalance { .. }
            | Self::InvalidDateRange { .. }
            | Self::InvalidDateFilter(_)
            | Self::FundTransferNotAllowed(_)
            | Self::DuplicateAccountName(_) => ErrorCategory::Validation,

            Self::AccountNotFound(_)
            | Self::VaultNotFound(_)
            | Self::VaultGroupNotFound(_)
            | Self::OperationNotFound(_) => ErrorCategory::NotFound,

            Self::ReferenceConflict(_) | Self::EntityInUse(_) => ErrorCategory::Integrity,

            Self::InvalidConfiguration(_) | Self::Internal(_) => ErrorCategory::Internal,
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
        matches!(self, Self::ReferenceConflict(_))
    }
}

impl ErrorCategory {
    /// Returns the HTTP status code used for errors of this category.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Integrity => 409,
            Self::Internal => 500,
        }
    }
}
