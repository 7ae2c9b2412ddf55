//! Treasury ledger logic.
//!
//! This module implements the write-side rules of the ledger core:
//! - Operation types and inputs
//! - Balance movements and point-in-time reconstruction
//! - Validation and balance planning for every write
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::{BalanceMovement, Direction, EntityKind, MovementKind, balance_as_of, net_change};
pub use error::{ErrorCategory, LedgerError};
pub use service::LedgerService;
pub use types::{
    BalanceChange, CollectionDetailInput, CollectionPlan, CollectionType, CreateCollectionInput,
    CreateDisbursementInput, CreateVaultDepositInput, CreateVaultWithdrawalInput,
    DisbursementDetailInput, DisbursementPlan, DisbursementType, EntityRef, UpdateOperationHeader,
    WithdrawalKind,
};
