//! Statement assembly.
//!
//! The persistence layer fetches every movement of the entity inside the
//! range plus the reconstructed closing balance; the builder orders them,
//! signs them and derives the opening balance from the net change.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use super::types::{Statement, StatementEntry, StatementLine};
use crate::ledger::{CollectionType, Direction, EntityRef, LedgerError};

/// Builds statements from fetched lines.
pub struct StatementBuilder;

impl StatementBuilder {
    /// Checks that the range is not inverted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start > end`.
    pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), LedgerError> {
        if start > end {
            return Err(LedgerError::InvalidDateRange { start, end });
        }
        Ok(())
    }

    /// Date at which the reconstructor yields the end-of-day balance of `end`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` when `end` is the last representable date.
    pub fn closing_as_of(end: NaiveDate) -> Result<NaiveDate, LedgerError> {
        end.checked_add_days(Days::new(1))
            .ok_or(LedgerError::InvalidDateRange { start: end, end })
    }

    /// Orders and signs `lines` and derives the opening balance.
    ///
    /// Lines dated outside `[start, end]` are dropped. `closing_balance` must
    /// be the balance at the end of `end`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start > end`.
    pub fn build(
        entity: EntityRef,
        start: NaiveDate,
        end: NaiveDate,
        closing_balance: Decimal,
        lines: Vec<StatementLine>,
    ) -> Result<Statement, LedgerError> {
        Self::validate_range(start, end)?;

        let mut lines: Vec<StatementLine> = lines
            .into_iter()
            .filter(|l| l.date >= start && l.date <= end)
            .collect();
        lines.sort_by(|a, b| {
            (a.date, a.created_at, a.source_id).cmp(&(b.date, b.created_at, b.source_id))
        });

        let mut total_incoming = Decimal::ZERO;
        let mut total_outgoing = Decimal::ZERO;
        for line in &lines {
            match line.kind.direction() {
                Direction::Incoming => total_incoming += line.amount,
                Direction::Outgoing => total_outgoing += line.amount,
            }
        }
        let opening_balance = closing_balance - (total_incoming - total_outgoing);

        let mut running = opening_balance;
        let entries = lines
            .into_iter()
            .map(|line| {
                let signed_amount = line.kind.signed(line.amount);
                running += signed_amount;
                StatementEntry {
                    direction: line.kind.direction(),
                    signed_amount,
                    running_balance: running,
                    line,
                }
            })
            .collect();

        Ok(Statement {
            entity,
            start_date: start,
            end_date: end,
            opening_balance,
            closing_balance,
            total_incoming,
            total_outgoing,
            entries,
        })
    }
}

/// Label of a collection detail line.
#[must_use]
pub fn collection_label(
    operation_type: CollectionType,
    cheque_number: Option<&str>,
    motif: &str,
) -> String {
    match operation_type {
        CollectionType::Operation => {
            format!("Versement de cheque N° {}", cheque_number.unwrap_or_default())
        }
        CollectionType::Rejected | CollectionType::Versement => motif.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MovementKind;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tresor_shared::types::AccountId;
    use uuid::Uuid;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_735_689_600 + seconds, 0).unwrap()
    }

    fn line(kind: MovementKind, date: NaiveDate, created: i64, amount: Decimal) -> StatementLine {
        StatementLine {
            source_id: Uuid::now_v7(),
            kind,
            date,
            created_at: at(created),
            amount,
            label: format!("{kind:?}"),
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_releve_scenario() {
        // Seed 500, +200 on Jan 10, -80 on Jan 20.
        let entity = EntityRef::Account(AccountId::new());
        let lines = vec![
            line(MovementKind::Disbursement, date(1, 20), 2, dec!(80.00)),
            line(MovementKind::Collection, date(1, 10), 1, dec!(200.00)),
        ];

        let statement =
            StatementBuilder::build(entity, date(1, 1), date(1, 31), dec!(620.00), lines).unwrap();

        assert_eq!(statement.opening_balance, dec!(500.00));
        assert_eq!(statement.closing_balance, dec!(620.00));
        assert_eq!(statement.entries.len(), 2);
        assert_eq!(statement.entries[0].line.date, date(1, 10));
        assert_eq!(statement.entries[0].running_balance, dec!(700.00));
        assert_eq!(statement.entries[1].signed_amount, dec!(-80.00));
        assert_eq!(statement.entries[1].running_balance, dec!(620.00));
        assert_eq!(statement.net_change(), dec!(120.00));
    }

    #[test]
    fn test_same_day_entries_ordered_by_insertion() {
        let entity = EntityRef::Account(AccountId::new());
        let first = line(MovementKind::Collection, date(2, 1), 10, dec!(5));
        let second = line(MovementKind::Disbursement, date(2, 1), 20, dec!(3));
        let lines = vec![second.clone(), first.clone()];

        let statement =
            StatementBuilder::build(entity, date(2, 1), date(2, 1), dec!(2), lines).unwrap();

        assert_eq!(statement.entries[0].line.source_id, first.source_id);
        assert_eq!(statement.entries[1].line.source_id, second.source_id);
        assert_eq!(statement.opening_balance, Decimal::ZERO);
    }

    #[test]
    fn test_lines_outside_range_are_dropped() {
        let entity = EntityRef::Account(AccountId::new());
        let lines = vec![
            line(MovementKind::Collection, date(1, 31), 1, dec!(10)),
            line(MovementKind::Collection, date(2, 1), 2, dec!(20)),
        ];
        let statement =
            StatementBuilder::build(entity, date(2, 1), date(2, 28), dec!(30), lines).unwrap();
        assert_eq!(statement.entries.len(), 1);
        assert_eq!(statement.opening_balance, dec!(10));
    }

    #[test]
    fn test_empty_range() {
        let entity = EntityRef::Account(AccountId::new());
        let statement =
            StatementBuilder::build(entity, date(3, 1), date(3, 31), dec!(42), vec![]).unwrap();
        assert_eq!(statement.opening_balance, dec!(42));
        assert!(statement.entries.is_empty());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let entity = EntityRef::Account(AccountId::new());
        let err = StatementBuilder::build(entity, date(2, 1), date(1, 1), dec!(0), vec![])
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
    }

    #[test]
    fn test_closing_as_of_is_next_day() {
        assert_eq!(
            StatementBuilder::closing_as_of(date(1, 31)).unwrap(),
            date(2, 1)
        );
    }

    #[test]
    fn test_collection_labels() {
        assert_eq!(
            collection_label(CollectionType::Operation, Some("778899"), "ignored"),
            "Versement de cheque N° 778899"
        );
        assert_eq!(
            collection_label(CollectionType::Versement, Some("1"), "Versement espece"),
            "Versement espece"
        );
        assert_eq!(
            collection_label(CollectionType::Rejected, None, "Cheque rejete"),
            "Cheque rejete"
        );
    }
}
