//! Ledger domain types for operation creation and validation.
//!
//! These are the inputs the persistence layer hands to [`super::LedgerService`]
//! and the plans it gets back before touching any balance row.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tresor_shared::types::{AccountId, UserId, VaultId};

use super::error::LedgerError;

/// Collection operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    /// Returned cheque. Exactly one detail, no reference.
    Rejected,
    /// Cash or transfer deposit. No reference.
    Versement,
    /// Regular cheque collection. Receives a sequential reference.
    Operation,
}

impl CollectionType {
    /// Returns the stored name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::Versement => "versement",
            Self::Operation => "operation",
        }
    }

    /// Returns true if operations of this type get a sequential reference.
    #[must_use]
    pub const fn receives_reference(self) -> bool {
        matches!(self, Self::Operation)
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rejected" => Ok(Self::Rejected),
            "versement" => Ok(Self::Versement),
            "operation" => Ok(Self::Operation),
            other => Err(LedgerError::InvalidDetails(format!(
                "unknown collection type '{other}'"
            ))),
        }
    }
}

/// Disbursement operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisbursementType {
    /// Bank fees. Exactly one detail, no reference.
    Frais,
    /// Regular payment. Receives a sequential reference.
    Operation,
}

impl DisbursementType {
    /// Returns the stored name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Frais => "frais",
            Self::Operation => "operation",
        }
    }

    /// Returns true if operations of this type get a sequential reference.
    #[must_use]
    pub const fn receives_reference(self) -> bool {
        matches!(self, Self::Operation)
    }
}

impl fmt::Display for DisbursementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisbursementType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frais" => Ok(Self::Frais),
            "operation" => Ok(Self::Operation),
            other => Err(LedgerError::InvalidDetails(format!(
                "unknown disbursement type '{other}'"
            ))),
        }
    }
}

/// Either side of the balance store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    /// A bank account.
    Account(AccountId),
    /// A cash vault.
    Vault(VaultId),
}

/// One detail row of a collection.
#[derive(Debug, Clone)]
pub struct CollectionDetailInput {
    /// Amount credited to the destination account.
    pub amount: Decimal,
    /// Account receiving the amount.
    pub account_id: AccountId,
    /// Cheque number, when the detail is a cheque.
    pub cheque_number: Option<String>,
    /// Drawer name.
    pub name: Option<String>,
    /// Drawer's bank.
    pub bank_name: Option<String>,
}

/// Input for creating a collection operation.
#[derive(Debug, Clone)]
pub struct CreateCollectionInput {
    /// Operation date.
    pub date: NaiveDate,
    /// Free-text purpose.
    pub motif: String,
    /// Who the money is collected for.
    pub beneficiary: String,
    /// Operation type.
    pub operation_type: CollectionType,
    /// Optional attachment path or handle.
    pub attachment: Option<String>,
    /// Actor creating the operation.
    pub created_by: UserId,
    /// Detail rows, in entry order.
    pub details: Vec<CollectionDetailInput>,
}

/// One detail row of a disbursement.
#[derive(Debug, Clone)]
pub struct DisbursementDetailInput {
    /// Amount paid out.
    pub amount: Decimal,
    /// Payee name.
    pub name: Option<String>,
    /// Payee bank.
    pub bank_name: Option<String>,
    /// Payee bank account number.
    pub bank_account_number: Option<String>,
}

/// Input for creating a disbursement operation.
#[derive(Debug, Clone)]
pub struct CreateDisbursementInput {
    /// Operation date.
    pub date: NaiveDate,
    /// Account the money leaves from.
    pub account_id: AccountId,
    /// Free-text purpose.
    pub motif: String,
    /// Who receives the money.
    pub beneficiary: String,
    /// Operation type.
    pub operation_type: DisbursementType,
    /// Optional attachment path or handle.
    pub attachment: Option<String>,
    /// Actor creating the operation.
    pub created_by: UserId,
    /// Detail rows, in entry order.
    pub details: Vec<DisbursementDetailInput>,
}

/// Input for creating a vault deposit.
#[derive(Debug, Clone)]
pub struct CreateVaultDepositInput {
    /// Vault receiving the cash.
    pub vault_id: VaultId,
    /// Deposited amount.
    pub amount: Decimal,
    /// Free-text purpose.
    pub motif: String,
    /// Deposit date.
    pub date: NaiveDate,
    /// Deposit slip number.
    pub deposit_number: Option<String>,
    /// External reference, free text.
    pub external_reference: Option<String>,
    /// Actor creating the deposit.
    pub created_by: UserId,
}

/// What a vault withdrawal does on the account side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WithdrawalKind {
    /// Cash leaves the vault and nothing else moves.
    Pure,
    /// Cash leaves the vault and is credited to an account.
    FundTransfer {
        /// Account credited by the transfer.
        account_id: AccountId,
    },
}

impl WithdrawalKind {
    /// Builds the kind from an optional target account.
    #[must_use]
    pub const fn from_target(account_id: Option<AccountId>) -> Self {
        match account_id {
            Some(account_id) => Self::FundTransfer { account_id },
            None => Self::Pure,
        }
    }

    /// Returns the credited account for fund transfers.
    #[must_use]
    pub const fn target_account(self) -> Option<AccountId> {
        match self {
            Self::Pure => None,
            Self::FundTransfer { account_id } => Some(account_id),
        }
    }
}

/// Input for creating a vault withdrawal.
#[derive(Debug, Clone)]
pub struct CreateVaultWithdrawalInput {
    /// Vault the cash leaves from.
    pub vault_id: VaultId,
    /// Withdrawn amount.
    pub amount: Decimal,
    /// Free-text purpose.
    pub motif: String,
    /// Withdrawal date.
    pub date: NaiveDate,
    /// Pure withdrawal or fund transfer.
    pub kind: WithdrawalKind,
    /// External reference, free text.
    pub external_reference: Option<String>,
    /// Actor creating the withdrawal.
    pub created_by: UserId,
}

/// Header fields that may change after creation.
///
/// `None` leaves a field untouched. `attachment: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateOperationHeader {
    /// New motif.
    pub motif: Option<String>,
    /// New beneficiary.
    pub beneficiary: Option<String>,
    /// New attachment.
    pub attachment: Option<Option<String>>,
}

impl UpdateOperationHeader {
    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.motif.is_none() && self.beneficiary.is_none() && self.attachment.is_none()
    }
}

/// Validated collection ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPlan {
    /// Sum of all detail amounts.
    pub total: Decimal,
    /// Amount credited per destination account, one entry per distinct account.
    pub credits: BTreeMap<AccountId, Decimal>,
}

/// Validated disbursement ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisbursementPlan {
    /// Sum of all detail amounts.
    pub total: Decimal,
    /// Source account balance after the debit.
    pub balance_after: Decimal,
}

/// Before/after pair for one balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    /// Balance read under lock.
    pub before: Decimal,
    /// Balance to write back.
    pub after: Decimal,
}

impl BalanceChange {
    /// Signed difference applied by the change.
    #[must_use]
    pub fn delta(&self) -> Decimal {
        self.after - self.before
    }
}
