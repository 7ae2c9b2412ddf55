//! Property-based tests for StatementBuilder.
//!
//! - Opening plus net change equals closing
//! - Entries are sorted and the last running balance is the closing balance
//! - The opening balance agrees with reconstruction at the start date

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tresor_shared::types::AccountId;
use uuid::Uuid;

use super::builder::StatementBuilder;
use super::types::StatementLine;
use crate::ledger::{BalanceMovement, EntityRef, MovementKind, balance_as_of};

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_kind() -> impl Strategy<Value = MovementKind> {
    prop_oneof![
        Just(MovementKind::Collection),
        Just(MovementKind::FundTransferIn),
        Just(MovementKind::Disbursement),
    ]
}

fn date_2025() -> impl Strategy<Value = NaiveDate> {
    (1u32..=365).prop_map(|ordinal| NaiveDate::from_yo_opt(2025, ordinal).unwrap())
}

fn created_at(offset: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(1_735_689_600 + i64::from(offset), 0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_statement_is_consistent(
        history in prop::collection::vec(
            (account_kind(), date_2025(), positive_amount(), 0u32..100_000),
            0..30,
        ),
        current in (0i64..10_000_000i64).prop_map(|c| Decimal::new(c, 2)),
        a in date_2025(),
        b in date_2025(),
    ) {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let movements: Vec<BalanceMovement> = history
            .iter()
            .map(|(kind, date, amount, _)| BalanceMovement::new(*kind, *date, *amount))
            .collect();
        let lines: Vec<StatementLine> = history
            .iter()
            .map(|(kind, date, amount, offset)| StatementLine {
                source_id: Uuid::now_v7(),
                kind: *kind,
                date: *date,
                created_at: created_at(*offset),
                amount: *amount,
                label: String::new(),
                metadata: serde_json::Value::Null,
            })
            .collect();

        let closing_as_of = StatementBuilder::closing_as_of(end).unwrap();
        let closing = balance_as_of(current, &movements, closing_as_of);
        let statement = StatementBuilder::build(
            EntityRef::Account(AccountId::new()),
            start,
            end,
            closing,
            lines,
        )
        .unwrap();

        prop_assert_eq!(statement.opening_balance + statement.net_change(), statement.closing_balance);
        prop_assert_eq!(statement.opening_balance, balance_as_of(current, &movements, start));

        for pair in statement.entries.windows(2) {
            let left = (pair[0].line.date, pair[0].line.created_at, pair[0].line.source_id);
            let right = (pair[1].line.date, pair[1].line.created_at, pair[1].line.source_id);
            prop_assert!(left <= right);
        }
        match statement.entries.last() {
            Some(last) => prop_assert_eq!(last.running_balance, statement.closing_balance),
            None => prop_assert_eq!(statement.opening_balance, statement.closing_balance),
        }
    }
}
