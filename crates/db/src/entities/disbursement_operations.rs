//! `SeaORM` Entity for disbursement_operations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::DisbursementType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "disbursement_operations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: Date,
    pub account_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub motif: String,
    #[sea_orm(column_type = "Text")]
    pub beneficiary: String,
    pub operation_type: DisbursementType,
    pub reference: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub attachment: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_delete = "Restrict"
    )]
    Accounts,
    #[sea_orm(has_many = "super::disbursement_operation_details::Entity")]
    DisbursementOperationDetails,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::disbursement_operation_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisbursementOperationDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
