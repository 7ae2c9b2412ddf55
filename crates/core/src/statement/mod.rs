//! Statements: ordered history of an account or vault with opening and
//! closing balances.

pub mod builder;
pub mod types;

#[cfg(test)]
mod builder_props;

pub use builder::{StatementBuilder, collection_label};
pub use types::{Statement, StatementEntry, StatementLine};
