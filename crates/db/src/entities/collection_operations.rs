//! `SeaORM` Entity for collection_operations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::CollectionType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "collection_operations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: Date,
    #[sea_orm(column_type = "Text")]
    pub motif: String,
    #[sea_orm(column_type = "Text")]
    pub beneficiary: String,
    pub operation_type: CollectionType,
    pub reference: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub attachment: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::collection_operation_details::Entity")]
    CollectionOperationDetails,
}

impl Related<super::collection_operation_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CollectionOperationDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
