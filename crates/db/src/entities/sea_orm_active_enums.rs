//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tresor_core::ledger;

/// Postgres `collection_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "collection_type")]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    /// Returned cheque.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Cash or transfer deposit.
    #[sea_orm(string_value = "versement")]
    Versement,
    /// Regular cheque collection.
    #[sea_orm(string_value = "operation")]
    Operation,
}

/// Postgres `disbursement_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "disbursement_type")]
#[serde(rename_all = "lowercase")]
pub enum DisbursementType {
    /// Bank fees.
    #[sea_orm(string_value = "frais")]
    Frais,
    /// Regular payment.
    #[sea_orm(string_value = "operation")]
    Operation,
}

impl From<ledger::CollectionType> for CollectionType {
    fn from(value: ledger::CollectionType) -> Self {
        match value {
            ledger::CollectionType::Rejected => Self::Rejected,
            ledger::CollectionType::Versement => Self::Versement,
            ledger::CollectionType::Operation => Self::Operation,
        }
    }
}

impl From<CollectionType> for ledger::CollectionType {
    fn from(value: CollectionType) -> Self {
        match value {
            CollectionType::Rejected => Self::Rejected,
            CollectionType::Versement => Self::Versement,
            CollectionType::Operation => Self::Operation,
        }
    }
}

impl From<ledger::DisbursementType> for DisbursementType {
    fn from(value: ledger::DisbursementType) -> Self {
        match value {
            ledger::DisbursementType::Frais => Self::Frais,
            ledger::DisbursementType::Operation => Self::Operation,
        }
    }
}

impl From<DisbursementType> for ledger::DisbursementType {
    fn from(value: DisbursementType) -> Self {
        match value {
            DisbursementType::Frais => Self::Frais,
            DisbursementType::Operation => Self::Operation,
        }
    }
}
