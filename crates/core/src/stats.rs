//! Aggregate treasury figures and partial-date filters.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// A year, a month or a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "granularity", rename_all = "lowercase")]
pub enum DateFilter {
    /// A whole calendar year.
    Year {
        /// Year.
        year: i32,
    },
    /// A whole calendar month.
    Month {
        /// Year.
        year: i32,
        /// Month, 1-12.
        month: u32,
    },
    /// A single day.
    Day {
        /// The day.
        date: NaiveDate,
    },
}

impl DateFilter {
    /// Filter for a whole month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateFilter` if the month is out of range.
    pub fn month(year: i32, month: u32) -> Result<Self, LedgerError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|_| Self::Month { year, month })
            .ok_or_else(|| LedgerError::InvalidDateFilter(format!("{year:04}-{month:02}")))
    }

    /// Half-open range `[from, to)` covered by the filter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateFilter` if the filter does not denote a real date
    /// or its end is not representable.
    pub fn range(&self) -> Result<(NaiveDate, NaiveDate), LedgerError> {
        let invalid = || LedgerError::InvalidDateFilter(self.to_string());
        let (from, to) = match *self {
            Self::Year { year } => {
                let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
                (from, from.checked_add_months(Months::new(12)))
            }
            Self::Month { year, month } => {
                let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                (from, from.checked_add_months(Months::new(1)))
            }
            Self::Day { date } => (date, date.checked_add_days(Days::new(1))),
        };
        Ok((from, to.ok_or_else(invalid)?))
    }

    /// Returns true if `date` falls inside the filter.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Self::Year { year } => date.year() == year,
            Self::Month { year, month } => date.year() == year && date.month() == month,
            Self::Day { date: day } => date == day,
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year { year } => write!(f, "{year:04}"),
            Self::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::Day { date } => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for DateFilter {
    type Err = LedgerError;

    /// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidDateFilter(s.to_string());
        let parts: Vec<&str> = s.trim().split('-').collect();

        let number = |part: &str, width: usize| -> Result<u32, LedgerError> {
            if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        match parts.as_slice() {
            [y] => {
                let year = i32::try_from(number(y, 4)?).map_err(|_| invalid())?;
                Ok(Self::Year { year })
            }
            [y, m] => {
                let year = i32::try_from(number(y, 4)?).map_err(|_| invalid())?;
                let month = number(m, 2)?;
                Self::month(year, month).map_err(|_| invalid())
            }
            [y, m, d] => {
                let year = i32::try_from(number(y, 4)?).map_err(|_| invalid())?;
                let date = NaiveDate::from_ymd_opt(year, number(m, 2)?, number(d, 2)?)
                    .ok_or_else(invalid)?;
                Ok(Self::Day { date })
            }
            _ => Err(invalid()),
        }
    }
}

/// Headline figures of the treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasurySummary {
    /// Filter the operation figures were computed for.
    pub filter: Option<DateFilter>,
    /// Sum of current account balances.
    pub total_account_balance: Decimal,
    /// Sum of current vault balances.
    pub total_vault_balance: Decimal,
    /// Sum of collection detail amounts inside the filter.
    pub total_collection: Decimal,
    /// Number of collections inside the filter.
    pub collection_count: u64,
    /// Sum of disbursement detail amounts inside the filter.
    pub total_disbursement: Decimal,
    /// Number of disbursements inside the filter.
    pub disbursement_count: u64,
    /// Number of accounts.
    pub account_count: u64,
}

impl TreasurySummary {
    /// Collections minus disbursements inside the filter.
    #[must_use]
    pub fn net_flow(&self) -> Decimal {
        self.total_collection - self.total_disbursement
    }
}
