//! Treasury ledger core for Tresor.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Operation validation, balance planning and reconstruction
//! - `reference` - Yearly sequential reference numbering
//! - `statement` - Ordered statements with opening and closing balances
//! - `stats` - Partial-date filters and headline figures

pub mod ledger;
pub mod reference;
pub mod statement;
pub mod stats;

pub use ledger::{ErrorCategory, LedgerError, LedgerService};
pub use reference::ReferencePolicy;
pub use statement::{Statement, StatementBuilder};
pub use stats::{DateFilter, TreasurySummary};
