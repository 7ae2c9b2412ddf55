//! `SeaORM` Entity for disbursement_operation_details table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "disbursement_operation_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub operation_id: Uuid,
    pub position: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub name: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::disbursement_operations::Entity",
        from = "Column::OperationId",
        to = "super::disbursement_operations::Column::Id",
        on_delete = "Cascade"
    )]
    DisbursementOperations,
}

impl Related<super::disbursement_operations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisbursementOperations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
