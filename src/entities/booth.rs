use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booths")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub booth_number: String,
    pub name: Option<String>,
    pub constituency_id: i64,
    /// Voter count is the aggregation weight; 0 means "not recorded".
    pub voter_count: i64,
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

impl ActiveModelBehavior for ActiveModel {}
