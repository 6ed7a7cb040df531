use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String, // ADMIN | LEADER | WORKER
    pub constituency_id: Option<i64>,
    /// Opaque bearer token, provisioned by the external identity system.
    #[serde(skip_serializing)]
    pub api_token: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::constituency::Entity",
        from = "Column::ConstituencyId",
        to = "super::constituency::Column::Id"
    )]
    Constituency,
    #[sea_orm(has_many = "super::prediction::Entity")]
    Prediction,
    #[sea_orm(has_many = "super::booth_assignment::Entity")]
    BoothAssignment,
}

impl Related<super::constituency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Constituency.def()
    }
}

impl Related<super::prediction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prediction.def()
    }
}

impl Related<super::booth_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BoothAssignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
