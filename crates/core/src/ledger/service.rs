//! Ledger service for operation validation and balance planning.
//!
//! The service never touches storage. The persistence layer locks the
//! balance rows, hands the locked values in, and writes back whatever plan
//! comes out. A rejected plan means nothing is written.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tresor_shared::types::AccountId;

use super::balance::MovementKind;
use super::error::LedgerError;
use super::types::{
    BalanceChange, CollectionDetailInput, CollectionPlan, CollectionType, CreateCollectionInput,
    CreateDisbursementInput, CreateVaultWithdrawalInput, DisbursementPlan, DisbursementType,
    WithdrawalKind,
};

/// Decimal places kept by every stored amount and balance.
pub const AMOUNT_SCALE: u32 = 2;

/// Ledger service for operation validation and balance planning.
pub struct LedgerService;

impl LedgerService {
    /// Validates a collection and groups its credits per destination account.
    ///
    /// # Errors
    ///
    /// - `EmptyDetails` when there is no detail row
    /// - `RejectedOperationMultipleDetails` when a rejected collection has more than one
    /// - `InvalidAmount` when any detail amount is not strictly positive whole cents
    pub fn plan_collection(input: &CreateCollectionInput) -> Result<CollectionPlan, LedgerError> {
        if input.details.is_empty() {
            return Err(LedgerError::EmptyDetails);
        }
        if input.operation_type == CollectionType::Rejected && input.details.len() != 1 {
            return Err(LedgerError::RejectedOperationMultipleDetails(
                input.details.len(),
            ));
        }
        for detail in &input.details {
            Self::validate_amount(detail.amount)?;
        }

        let credits = Self::credits_per_account(&input.details);
        let total = credits.values().copied().sum();

        Ok(CollectionPlan { total, credits })
    }

    /// Validates a disbursement against the locked source balance.
    ///
    /// # Errors
    ///
    /// - `EmptyDetails` when there is no detail row
    /// - `InvalidDetails` when a fee disbursement has more than one detail
    /// - `InvalidAmount` when any detail amount is not strictly positive whole cents
    /// - `NotEnoughBalance` when the total exceeds `source_balance`
    pub fn plan_disbursement(
        input: &CreateDisbursementInput,
        source_balance: Decimal,
    ) -> Result<DisbursementPlan, LedgerError> {
        if input.details.is_empty() {
            return Err(LedgerError::EmptyDetails);
        }
        if input.operation_type == DisbursementType::Frais && input.details.len() != 1 {
            return Err(LedgerError::InvalidDetails(format!(
                "fee disbursement must have exactly one detail, got {}",
                input.details.len()
            )));
        }
        for detail in &input.details {
            Self::validate_amount(detail.amount)?;
        }

        let total: Decimal = input.details.iter().map(|d| d.amount).sum();
        let change = Self::apply(source_balance, MovementKind::Disbursement, total)?;

        Ok(DisbursementPlan {
            total,
            balance_after: change.after,
        })
    }

    /// Plans the reversal of a collection across every credited account.
    ///
    /// `balances` holds the locked balance of each account in `credits`. The
    /// whole reversal is rejected if any single account would go negative.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` when a credited account has no locked balance
    /// - `NotEnoughBalance` for the first account that cannot absorb its reversal
    pub fn plan_collection_reversal(
        credits: &BTreeMap<AccountId, Decimal>,
        balances: &BTreeMap<AccountId, Decimal>,
    ) -> Result<BTreeMap<AccountId, BalanceChange>, LedgerError> {
        credits
            .iter()
            .map(|(account_id, amount)| -> Result<(AccountId, BalanceChange), LedgerError> {
                let balance = balances
                    .get(account_id)
                    .copied()
                    .ok_or(LedgerError::AccountNotFound(account_id.into_inner()))?;
                let change = Self::reverse(balance, MovementKind::Collection, *amount)?;
                Ok((*account_id, change))
            })
            .collect()
    }

    /// Validates a vault withdrawal against the locked vault balance.
    ///
    /// `can_fund_transfer` is the flag of the vault's group; it only matters
    /// when the withdrawal targets an account.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` when the amount is not strictly positive whole cents
    /// - `FundTransferNotAllowed` when the group forbids transfers into accounts
    /// - `NotEnoughBalance` when the amount exceeds `vault_balance`
    pub fn plan_withdrawal(
        input: &CreateVaultWithdrawalInput,
        vault_balance: Decimal,
        can_fund_transfer: bool,
    ) -> Result<BalanceChange, LedgerError> {
        Self::validate_amount(input.amount)?;
        if matches!(input.kind, WithdrawalKind::FundTransfer { .. }) && !can_fund_transfer {
            return Err(LedgerError::FundTransferNotAllowed(
                input.vault_id.into_inner(),
            ));
        }
        Self::apply(vault_balance, MovementKind::VaultWithdrawal, input.amount)
    }

    /// Checks that an amount is strictly positive and holds whole cents.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for zero or negative amounts, or amounts with
    /// more than two decimal places.
    pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO || !Self::is_whole_cents(amount) {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(())
    }

    /// Checks an opening balance given when creating an account or vault.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a negative balance or one with more than
    /// two decimal places.
    pub fn validate_opening_balance(balance: Decimal) -> Result<(), LedgerError> {
        if balance < Decimal::ZERO || !Self::is_whole_cents(balance) {
            return Err(LedgerError::InvalidAmount(balance));
        }
        Ok(())
    }

    /// Amount columns are `NUMERIC(14,2)`; anything finer would be rounded
    /// per row and drift from the stored balance.
    fn is_whole_cents(amount: Decimal) -> bool {
        amount.normalize().scale() <= AMOUNT_SCALE
    }

    /// Applies a movement forward to a locked balance.
    ///
    /// # Errors
    ///
    /// Returns `NotEnoughBalance` if the result would be negative.
    pub fn apply(
        balance: Decimal,
        kind: MovementKind,
        amount: Decimal,
    ) -> Result<BalanceChange, LedgerError> {
        Self::change(balance, kind.signed(amount))
    }

    /// Undoes a movement on a locked balance (used by deletes).
    ///
    /// # Errors
    ///
    /// Returns `NotEnoughBalance` if the result would be negative.
    pub fn reverse(
        balance: Decimal,
        kind: MovementKind,
        amount: Decimal,
    ) -> Result<BalanceChange, LedgerError> {
        Self::change(balance, -kind.signed(amount))
    }

    fn change(before: Decimal, delta: Decimal) -> Result<BalanceChange, LedgerError> {
        let after = before + delta;
        if after < Decimal::ZERO {
            return Err(LedgerError::NotEnoughBalance {
                available: before,
                required: -delta,
            });
        }
        Ok(BalanceChange { before, after })
    }

    /// Sums detail amounts per destination account.
    #[must_use]
    pub fn credits_per_account(
        details: &[CollectionDetailInput],
    ) -> BTreeMap<AccountId, Decimal> {
        let mut credits = BTreeMap::new();
        for detail in details {
            *credits.entry(detail.account_id).or_insert(Decimal::ZERO) += detail.amount;
        }
        credits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::DisbursementDetailInput;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tresor_shared::types::{UserId, VaultId};

    fn collection(
        operation_type: CollectionType,
        details: Vec<CollectionDetailInput>,
    ) -> CreateCollectionInput {
        CreateCollectionInput {
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            motif: "Encaissement".to_string(),
            beneficiary: "Tresor".to_string(),
            operation_type,
            attachment: None,
            created_by: UserId::new(),
            details,
        }
    }

    fn detail(account_id: AccountId, amount: Decimal) -> CollectionDetailInput {
        CollectionDetailInput {
            amount,
            account_id,
            cheque_number: Some("123456".to_string()),
            name: None,
            bank_name: None,
        }
    }

    fn disbursement(
        operation_type: DisbursementType,
        amounts: &[Decimal],
    ) -> CreateDisbursementInput {
        CreateDisbursementInput {
            date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            account_id: AccountId::new(),
            motif: "Paiement".to_string(),
            beneficiary: "Fournisseur".to_string(),
            operation_type,
            attachment: None,
            created_by: UserId::new(),
            details: amounts
                .iter()
                .map(|amount| DisbursementDetailInput {
                    amount: *amount,
                    name: None,
                    bank_name: None,
                    bank_account_number: None,
                })
                .collect(),
        }
    }

    fn withdrawal(amount: Decimal, kind: WithdrawalKind) -> CreateVaultWithdrawalInput {
        CreateVaultWithdrawalInput {
            vault_id: VaultId::new(),
            amount,
            motif: "Retrait".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            kind,
            external_reference: None,
            created_by: UserId::new(),
        }
    }

    #[test]
    fn test_collection_groups_credits_per_account() {
        let a = AccountId::new();
        let b = AccountId::new();
        let input = collection(
            CollectionType::Operation,
            vec![detail(a, dec!(100)), detail(b, dec!(50)), detail(a, dec!(25.50))],
        );

        let plan = LedgerService::plan_collection(&input).unwrap();

        assert_eq!(plan.total, dec!(175.50));
        assert_eq!(plan.credits.len(), 2);
        assert_eq!(plan.credits[&a], dec!(125.50));
        assert_eq!(plan.credits[&b], dec!(50));
    }

    #[test]
    fn test_collection_without_details_is_rejected() {
        let input = collection(CollectionType::Operation, vec![]);
        assert!(matches!(
            LedgerService::plan_collection(&input),
            Err(LedgerError::EmptyDetails)
        ));
    }

    #[test]
    fn test_rejected_collection_needs_single_detail() {
        let a = AccountId::new();
        let input = collection(
            CollectionType::Rejected,
            vec![detail(a, dec!(10)), detail(a, dec!(20))],
        );
        assert!(matches!(
            LedgerService::plan_collection(&input),
            Err(LedgerError::RejectedOperationMultipleDetails(2))
        ));

        let single = collection(CollectionType::Rejected, vec![detail(a, dec!(10))]);
        assert!(LedgerService::plan_collection(&single).is_ok());
    }

    #[test]
    fn test_collection_rejects_non_positive_amount() {
        let input = collection(
            CollectionType::Versement,
            vec![detail(AccountId::new(), dec!(0))],
        );
        assert!(matches!(
            LedgerService::plan_collection(&input),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_disbursement_within_balance() {
        let input = disbursement(DisbursementType::Operation, &[dec!(30), dec!(50)]);
        let plan = LedgerService::plan_disbursement(&input, dec!(500)).unwrap();
        assert_eq!(plan.total, dec!(80));
        assert_eq!(plan.balance_after, dec!(420));
    }

    #[test]
    fn test_disbursement_exceeding_balance() {
        let input = disbursement(DisbursementType::Operation, &[dec!(150.00)]);
        let err = LedgerService::plan_disbursement(&input, dec!(100.00)).unwrap_err();
        assert_eq!(err.error_code(), "NOT_ENOUGH_BALANCE");
    }

    #[test]
    fn test_disbursement_of_exact_balance_is_allowed() {
        let input = disbursement(DisbursementType::Operation, &[dec!(100.00)]);
        let plan = LedgerService::plan_disbursement(&input, dec!(100.00)).unwrap();
        assert_eq!(plan.balance_after, Decimal::ZERO);
    }

    #[test]
    fn test_fee_disbursement_needs_single_detail() {
        let input = disbursement(DisbursementType::Frais, &[dec!(1), dec!(2)]);
        assert!(matches!(
            LedgerService::plan_disbursement(&input, dec!(100)),
            Err(LedgerError::InvalidDetails(_))
        ));
    }

    #[test]
    fn test_disbursement_without_details() {
        let input = disbursement(DisbursementType::Operation, &[]);
        assert!(matches!(
            LedgerService::plan_disbursement(&input, dec!(100)),
            Err(LedgerError::EmptyDetails)
        ));
    }

    #[test]
    fn test_collection_reversal_is_all_or_nothing() {
        let a = AccountId::new();
        let b = AccountId::new();
        let credits = BTreeMap::from([(a, dec!(100)), (b, dec!(50))]);

        let ok = BTreeMap::from([(a, dec!(100)), (b, dec!(70))]);
        let plan = LedgerService::plan_collection_reversal(&credits, &ok).unwrap();
        assert_eq!(plan[&a].after, Decimal::ZERO);
        assert_eq!(plan[&b].after, dec!(20));

        let drawn_down = BTreeMap::from([(a, dec!(100)), (b, dec!(10))]);
        let err = LedgerService::plan_collection_reversal(&credits, &drawn_down).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NotEnoughBalance { available, required }
                if available == dec!(10) && required == dec!(50)
        ));
    }

    #[test]
    fn test_withdrawal_rules() {
        let pure = withdrawal(dec!(300), WithdrawalKind::Pure);
        let change = LedgerService::plan_withdrawal(&pure, dec!(1000), false).unwrap();
        assert_eq!(change.after, dec!(700));

        let too_much = withdrawal(dec!(1001), WithdrawalKind::Pure);
        assert!(matches!(
            LedgerService::plan_withdrawal(&too_much, dec!(1000), true),
            Err(LedgerError::NotEnoughBalance { .. })
        ));

        let transfer = withdrawal(
            dec!(10),
            WithdrawalKind::FundTransfer {
                account_id: AccountId::new(),
            },
        );
        assert!(matches!(
            LedgerService::plan_withdrawal(&transfer, dec!(1000), false),
            Err(LedgerError::FundTransferNotAllowed(_))
        ));
        assert!(LedgerService::plan_withdrawal(&transfer, dec!(1000), true).is_ok());

        let zero = withdrawal(Decimal::ZERO, WithdrawalKind::Pure);
        assert!(matches!(
            LedgerService::plan_withdrawal(&zero, dec!(1000), true),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_reverse_deposit_needs_vault_balance() {
        assert!(LedgerService::reverse(dec!(50), MovementKind::VaultDeposit, dec!(50)).is_ok());
        assert!(matches!(
            LedgerService::reverse(dec!(49.99), MovementKind::VaultDeposit, dec!(50)),
            Err(LedgerError::NotEnoughBalance { .. })
        ));
    }

    #[test]
    fn test_reverse_outgoing_never_fails() {
        let change = LedgerService::reverse(dec!(0), MovementKind::Disbursement, dec!(80)).unwrap();
        assert_eq!(change.after, dec!(80));
        assert_eq!(change.delta(), dec!(80));
    }

    #[test]
    fn test_opening_balance() {
        assert!(LedgerService::validate_opening_balance(Decimal::ZERO).is_ok());
        assert!(LedgerService::validate_opening_balance(dec!(-0.01)).is_err());
        assert!(LedgerService::validate_opening_balance(dec!(1200.50)).is_ok());
        assert!(matches!(
            LedgerService::validate_opening_balance(dec!(10.005)),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_amount_must_hold_whole_cents() {
        assert!(LedgerService::validate_amount(dec!(0.01)).is_ok());
        assert!(LedgerService::validate_amount(dec!(12.5)).is_ok());
        // Trailing zeros beyond the cent are not extra precision.
        assert!(LedgerService::validate_amount(dec!(7.2500)).is_ok());

        for amount in [dec!(0.001), dec!(0.005), dec!(100.999)] {
            let err = LedgerService::validate_amount(amount).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_AMOUNT");
        }
    }

    #[test]
    fn test_sub_cent_details_reject_the_whole_operation() {
        let a = AccountId::new();
        let input = collection(
            CollectionType::Versement,
            vec![detail(a, dec!(0.005)), detail(a, dec!(0.005))],
        );
        assert!(matches!(
            LedgerService::plan_collection(&input),
            Err(LedgerError::InvalidAmount(amount)) if amount == dec!(0.005)
        ));

        let input = disbursement(DisbursementType::Operation, &[dec!(10), dec!(0.001)]);
        assert!(matches!(
            LedgerService::plan_disbursement(&input, dec!(100)),
            Err(LedgerError::InvalidAmount(_))
        ));
    }
}
