//! Property-based tests for LedgerService and balance reconstruction.
//!
//! - Forward/reverse symmetry of every movement kind
//! - Balances never go negative through the service
//! - Reconstruction is the exact inverse of forward application

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tresor_shared::types::{AccountId, UserId};

use super::balance::{BalanceMovement, MovementKind, apply, balance_as_of, net_change};
use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{
    CollectionDetailInput, CollectionType, CreateDisbursementInput, DisbursementDetailInput,
    DisbursementType,
};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate non-negative balances (0.00 to 100,000.00).
fn balance() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate any movement kind.
fn movement_kind() -> impl Strategy<Value = MovementKind> {
    prop_oneof![
        Just(MovementKind::Collection),
        Just(MovementKind::FundTransferIn),
        Just(MovementKind::Disbursement),
        Just(MovementKind::VaultDeposit),
        Just(MovementKind::VaultWithdrawal),
    ]
}

/// Strategy to generate account-side movement kinds.
fn account_movement_kind() -> impl Strategy<Value = MovementKind> {
    prop_oneof![
        Just(MovementKind::Collection),
        Just(MovementKind::FundTransferIn),
        Just(MovementKind::Disbursement),
    ]
}

/// Strategy to generate dates within 2025.
fn date_2025() -> impl Strategy<Value = NaiveDate> {
    (1u32..=365).prop_map(|ordinal| NaiveDate::from_yo_opt(2025, ordinal).unwrap())
}

fn make_disbursement(amounts: &[Decimal]) -> CreateDisbursementInput {
    CreateDisbursementInput {
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        account_id: AccountId::new(),
        motif: "Paiement".to_string(),
        beneficiary: "Fournisseur".to_string(),
        operation_type: DisbursementType::Operation,
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

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Applying then reversing any movement restores the balance.
    #[test]
    fn prop_apply_reverse_round_trip(
        start in balance(),
        kind in movement_kind(),
        amount in positive_amount(),
    ) {
        if let Ok(forward) = LedgerService::apply(start, kind, amount) {
            let back = LedgerService::reverse(forward.after, kind, amount)
                .expect("reversing an applied movement must succeed");
            prop_assert_eq!(back.after, start);
        }
    }

    /// The service never produces a negative balance.
    #[test]
    fn prop_service_never_goes_negative(
        start in balance(),
        kind in movement_kind(),
        amount in positive_amount(),
        reverse in any::<bool>(),
    ) {
        let result = if reverse {
            LedgerService::reverse(start, kind, amount)
        } else {
            LedgerService::apply(start, kind, amount)
        };
        match result {
            Ok(change) => prop_assert!(change.after >= Decimal::ZERO),
            Err(LedgerError::NotEnoughBalance { available, required }) => {
                prop_assert_eq!(available, start);
                prop_assert!(required > available);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// A disbursement is accepted iff its total fits in the balance.
    #[test]
    fn prop_disbursement_respects_balance(
        start in balance(),
        amounts in prop::collection::vec(positive_amount(), 1..6),
    ) {
        let input = make_disbursement(&amounts);
        let total: Decimal = amounts.iter().copied().sum();
        match LedgerService::plan_disbursement(&input, start) {
            Ok(plan) => {
                prop_assert!(total <= start);
                prop_assert_eq!(plan.total, total);
                prop_assert_eq!(plan.balance_after, start - total);
            }
            Err(LedgerError::NotEnoughBalance { .. }) => prop_assert!(total > start),
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// Per-account credits always add up to the collection total.
    #[test]
    fn prop_collection_credits_sum_to_total(
        rows in prop::collection::vec((0usize..3, positive_amount()), 1..10),
    ) {
        let accounts = [AccountId::new(), AccountId::new(), AccountId::new()];
        let details: Vec<CollectionDetailInput> = rows
            .iter()
            .map(|(idx, amount)| CollectionDetailInput {
                amount: *amount,
                account_id: accounts[*idx],
                cheque_number: None,
                name: None,
                bank_name: None,
            })
            .collect();
        let input = super::types::CreateCollectionInput {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            motif: "Versement".to_string(),
            beneficiary: "Tresor".to_string(),
            operation_type: CollectionType::Operation,
            attachment: None,
            created_by: UserId::new(),
            details,
        };

        let plan = LedgerService::plan_collection(&input).unwrap();
        let expected: Decimal = rows.iter().map(|(_, a)| *a).sum();
        prop_assert_eq!(plan.total, expected);
        prop_assert_eq!(plan.credits.values().copied().sum::<Decimal>(), expected);
        prop_assert!(plan.credits.len() <= 3);
    }

    /// Replaying history forward from the seed and reconstructing backward
    /// from the current balance agree on every date.
    #[test]
    fn prop_reconstruction_inverts_history(
        seed in balance(),
        history in prop::collection::vec(
            (account_movement_kind(), date_2025(), positive_amount()),
            0..20,
        ),
        as_of in date_2025(),
    ) {
        let movements: Vec<BalanceMovement> = history
            .iter()
            .map(|(kind, date, amount)| BalanceMovement::new(*kind, *date, *amount))
            .collect();

        let current = movements.iter().fold(seed, apply);
        let expected = movements
            .iter()
            .filter(|m| m.date < as_of)
            .fold(seed, apply);

        prop_assert_eq!(balance_as_of(current, &movements, as_of), expected);
    }

    /// Reconstruction at a date after all movements returns the current balance.
    #[test]
    fn prop_reconstruction_after_history_is_current(
        current in balance(),
        history in prop::collection::vec(
            (movement_kind(), date_2025(), positive_amount()),
            0..20,
        ),
    ) {
        let movements: Vec<BalanceMovement> = history
            .iter()
            .map(|(kind, date, amount)| BalanceMovement::new(*kind, *date, *amount))
            .collect();
        let after_all = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

        prop_assert_eq!(balance_as_of(current, &movements, after_all), current);
        prop_assert_eq!(
            balance_as_of(current, &movements, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            current - net_change(&movements)
        );
    }
}
