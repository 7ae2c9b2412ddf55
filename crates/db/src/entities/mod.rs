//! `SeaORM` entity definitions.

pub mod accounts;
pub mod collection_operation_details;
pub mod collection_operations;
pub mod disbursement_operation_details;
pub mod disbursement_operations;
pub mod sea_orm_active_enums;
pub mod vault_deposits;
pub mod vault_groups;
pub mod vault_withdrawals;
pub mod vaults;
