use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{app_user, booth, campaign, campaign_member, constituency, party};

pub const KIND_LOK_SABHA: &str = "LOK_SABHA";
pub const KIND_VIDHAN_SABHA: &str = "VIDHAN_SABHA";

pub const SCOPE_CAMPAIGN: &str = "CAMPAIGN";
pub const SCOPE_STATE: &str = "STATE";
pub const SCOPE_CONSTITUENCY: &str = "CONSTITUENCY";
pub const SCOPE_BOOTH: &str = "BOOTH";

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_APPROVED: &str = "APPROVED";
pub const STATUS_REJECTED: &str = "REJECTED";

/// Normalize a constituency kind; the value is round-tripped verbatim and is
/// immaterial to aggregation.
pub fn normalize_kind(value: &str) -> Result<&'static str> {
    match value.trim().to_ascii_uppercase().as_str() {
        KIND_LOK_SABHA => Ok(KIND_LOK_SABHA),
        KIND_VIDHAN_SABHA => Ok(KIND_VIDHAN_SABHA),
        other => Err(anyhow!("Unsupported constituency kind {other}")),
    }
}

pub fn normalize_scope(value: &str) -> Result<&'static str> {
    match value.trim().to_ascii_uppercase().as_str() {
        SCOPE_CAMPAIGN => Ok(SCOPE_CAMPAIGN),
        SCOPE_STATE => Ok(SCOPE_STATE),
        SCOPE_CONSTITUENCY => Ok(SCOPE_CONSTITUENCY),
        SCOPE_BOOTH => Ok(SCOPE_BOOTH),
        other => Err(anyhow!("Unsupported membership scope {other}")),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstituencyView {
    pub id: i64,
    pub name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub campaign_id: Option<i64>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConstituencyView {
    pub fn from_model(model: constituency::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            state: model.state,
            kind: model.kind,
            campaign_id: model.campaign_id,
            is_locked: model.is_locked,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Admin overview row: lock state plus coverage at a glance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstituencyOverview {
    pub id: i64,
    pub name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_locked: bool,
    pub total_booths: u64,
    pub updated_booths: u64,
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConstituencyRequest {
    pub name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub campaign_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateConstituencyRequest {
    pub name: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub campaign_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoothView {
    pub id: i64,
    pub booth_number: String,
    pub name: Option<String>,
    pub constituency_id: i64,
    pub voter_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoothView {
    pub fn from_model(model: booth::Model) -> Self {
        Self {
            id: model.id,
            booth_number: model.booth_number,
            name: model.name,
            constituency_id: model.constituency_id,
            voter_count: model.voter_count,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoothRequest {
    pub booth_number: String,
    pub name: Option<String>,
    pub constituency_id: i64,
    pub voter_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBoothRequest {
    pub booth_number: Option<String>,
    pub name: Option<String>,
    pub voter_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyView {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartyView {
    pub fn from_model(model: party::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            short_name: model.short_name,
            logo_url: model.logo_url,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartyRequest {
    pub name: String,
    pub short_name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePartyRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub constituency_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl UserView {
    pub fn from_model(model: app_user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            role: model.role,
            constituency_id: model.constituency_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub constituency_id: Option<i64>,
    /// Bearer token minted by the external identity system.
    pub api_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBoothsRequest {
    pub booth_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignView {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub party_id: i64,
    pub state: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CampaignView {
    pub fn from_model(model: campaign::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            party_id: model.party_id,
            state: model.state,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub name: String,
    pub party_id: i64,
    pub state: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinCampaignRequest {
    pub role: Option<String>,
    pub scope: Option<String>,
    pub constituency_id: Option<i64>,
    pub booth_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMemberView {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub role: String,
    pub scope: String,
    pub constituency_id: Option<i64>,
    pub booth_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl CampaignMemberView {
    pub fn from_model(model: campaign_member::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            user_id: model.user_id,
            role: model.role,
            scope: model.scope,
            constituency_id: model.constituency_id,
            booth_id: model.booth_id,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MyCampaignsView {
    pub campaigns: Vec<CampaignView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_normalization() {
        assert_eq!(normalize_kind("lok_sabha").unwrap(), KIND_LOK_SABHA);
        assert_eq!(normalize_kind(" VIDHAN_SABHA ").unwrap(), KIND_VIDHAN_SABHA);
        assert!(normalize_kind("PANCHAYAT").is_err());
    }

    #[test]
    fn scope_normalization() {
        assert_eq!(normalize_scope("booth").unwrap(), SCOPE_BOOTH);
        assert!(normalize_scope("WARD").is_err());
    }
}
