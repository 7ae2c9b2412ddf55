//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub number: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub balance: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::collection_operation_details::Entity")]
    CollectionOperationDetails,
    #[sea_orm(has_many = "super::disbursement_operations::Entity")]
    DisbursementOperations,
    #[sea_orm(has_many = "super::vault_withdrawals::Entity")]
    VaultWithdrawals,
}

impl Related<super::collection_operation_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CollectionOperationDetails.def()
    }
}

impl Related<super::disbursement_operations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisbursementOperations.def()
    }
}

impl Related<super::vault_withdrawals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VaultWithdrawals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
