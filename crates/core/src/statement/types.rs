//! Statement ("releve") types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{Direction, EntityRef, MovementKind};

/// One movement fetched for a statement, before ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Row the movement comes from (collection detail, disbursement, deposit, withdrawal).
    pub source_id: Uuid,
    /// Kind of movement.
    pub kind: MovementKind,
    /// Logical date.
    pub date: NaiveDate,
    /// Insertion time, used to order same-day lines.
    pub created_at: DateTime<Utc>,
    /// Unsigned amount.
    pub amount: Decimal,
    /// Human-readable label.
    pub label: String,
    /// Supporting fields shown next to the label.
    pub metadata: serde_json::Value,
}

/// A statement line with its sign and the balance after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    /// The underlying line.
    #[serde(flatten)]
    pub line: StatementLine,
    /// Incoming or outgoing.
    pub direction: Direction,
    /// Signed effect on the balance.
    pub signed_amount: Decimal,
    /// Balance right after this entry.
    pub running_balance: Decimal,
}

/// Ordered history of one entity over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Account or vault the statement is for.
    pub entity: EntityRef,
    /// First day included.
    pub start_date: NaiveDate,
    /// Last day included.
    pub end_date: NaiveDate,
    /// Balance at the start of `start_date`.
    pub opening_balance: Decimal,
    /// Balance at the end of `end_date`.
    pub closing_balance: Decimal,
    /// Sum of incoming amounts.
    pub total_incoming: Decimal,
    /// Sum of outgoing amounts.
    pub total_outgoing: Decimal,
    /// Entries ordered by date, then insertion time, then id.
    pub entries: Vec<StatementEntry>,
}

impl Statement {
    /// Net signed change over the range.
    #[must_use]
    pub fn net_change(&self) -> Decimal {
        self.total_incoming - self.total_outgoing
    }
}
