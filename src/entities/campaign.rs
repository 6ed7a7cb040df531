use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Short join code handed out to field workers.
    pub code: String,
    pub party_id: i64,
    pub state: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::PartyId",
        to = "super::party::Column::Id"
    )]
    Party,
    #[sea_orm(has_many = "super::constituency::Entity")]
    Constituency,
    #[sea_orm(has_many = "super::campaign_member::Entity")]
    CampaignMember,
}

impl Related<super::party::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Party.def()
    }
}

impl Related<super::constituency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Constituency.def()
    }
}

impl Related<super::campaign_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CampaignMember.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
