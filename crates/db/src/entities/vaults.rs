//! `SeaORM` Entity for vaults table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vaults")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub code: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub balance: Decimal,
    pub vault_group_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vault_groups::Entity",
        from = "Column::VaultGroupId",
        to = "super::vault_groups::Column::Id"
    )]
    VaultGroups,
    #[sea_orm(has_many = "super::vault_deposits::Entity")]
    VaultDeposits,
    #[sea_orm(has_many = "super::vault_withdrawals::Entity")]
    VaultWithdrawals,
}

impl Related<super::vault_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VaultGroups.def()
    }
}

impl Related<super::vault_deposits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VaultDeposits.def()
    }
}

impl Related<super::vault_withdrawals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VaultWithdrawals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
