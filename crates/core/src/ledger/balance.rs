//! Balance movements and point-in-time reconstruction.
//!
//! Every way a balance can move is a [`MovementKind`]. The same sign table
//! drives the forward mutation in [`super::LedgerService`] and the backward
//! replay in [`balance_as_of`], so the two cannot drift apart.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a movement relative to the entity it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increases the balance.
    Incoming,
    /// Decreases the balance.
    Outgoing,
}

/// Side of the balance store a movement touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Bank account.
    Account,
    /// Cash vault.
    Vault,
}

/// Every kind of balance movement the ledger knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Collection detail credited to its destination account.
    Collection,
    /// Vault withdrawal credited to an account.
    FundTransferIn,
    /// Disbursement total debited from its source account.
    Disbursement,
    /// Cash deposited into a vault.
    VaultDeposit,
    /// Cash withdrawn from a vault (pure or fund transfer).
    VaultWithdrawal,
}

impl MovementKind {
    /// Returns the direction of the movement.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Collection | Self::FundTransferIn | Self::VaultDeposit => Direction::Incoming,
            Self::Disbursement | Self::VaultWithdrawal => Direction::Outgoing,
        }
    }

    /// Returns the entity side the movement touches.
    #[must_use]
    pub const fn entity(self) -> EntityKind {
        match self {
            Self::Collection | Self::FundTransferIn | Self::Disbursement => EntityKind::Account,
            Self::VaultDeposit | Self::VaultWithdrawal => EntityKind::Vault,
        }
    }

    /// Signed effect of `amount` on the touched balance.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self.direction() {
            Direction::Incoming => amount,
            Direction::Outgoing => -amount,
        }
    }
}

/// A dated movement that has already been applied to a stored balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMovement {
    /// Kind of movement.
    pub kind: MovementKind,
    /// Logical date of the operation.
    pub date: NaiveDate,
    /// Unsigned amount.
    pub amount: Decimal,
}

impl BalanceMovement {
    /// Creates a movement.
    #[must_use]
    pub const fn new(kind: MovementKind, date: NaiveDate, amount: Decimal) -> Self {
        Self { kind, date, amount }
    }

    /// Signed effect of the movement.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// Balance after applying `movement` forward.
#[must_use]
pub fn apply(balance: Decimal, movement: &BalanceMovement) -> Decimal {
    balance + movement.signed_amount()
}

/// Balance after undoing `movement`.
#[must_use]
pub fn revert(balance: Decimal, movement: &BalanceMovement) -> Decimal {
    balance - movement.signed_amount()
}

/// Sum of the signed effects of `movements`.
#[must_use]
pub fn net_change(movements: &[BalanceMovement]) -> Decimal {
    movements.iter().map(BalanceMovement::signed_amount).sum()
}

/// Reconstructs the balance at the start of `as_of`.
///
/// `current` is the stored balance and `movements` everything already
/// applied to it. Movements dated on or after `as_of` are undone; older ones
/// are ignored, so callers may pass either the full history or only the
/// tail they fetched.
#[must_use]
pub fn balance_as_of(current: Decimal, movements: &[BalanceMovement], as_of: NaiveDate) -> Decimal {
    movements
        .iter()
        .filter(|m| m.date >= as_of)
        .fold(current, revert)
}
