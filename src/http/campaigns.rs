use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
};
use tracing::info;

use crate::auth::Caller;
use crate::entities::{app_user, campaign, campaign_member, party};
use crate::models::directory::{
    CampaignMemberView, CampaignView, CreateCampaignRequest, JoinCampaignRequest, MyCampaignsView,
    SCOPE_BOOTH, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED, normalize_scope,
};
use crate::state::AppState;

use super::HttpError;

const MAX_CODE_ATTEMPTS: usize = 8;
const MAX_MEMBER_ROLE_LEN: usize = 40;
const DEFAULT_MEMBER_ROLE: &str = "BOOTH_WORKER";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_campaign))
        .route("/my", get(my_campaigns))
        .route("/code/{code}", get(campaign_by_code))
        .route("/{campaign_id}/join", post(join_campaign))
        .route("/{campaign_id}/members", get(list_members))
        .route("/members/{member_id}/approve", post(approve_member))
        .route("/members/{member_id}/reject", post(reject_member))
}

async fn create_campaign(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignView>), HttpError> {
    caller.require_admin()?;

    let name = request.name.trim();
    let state_name = request.state.trim();
    if name.is_empty() || state_name.is_empty() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "name and state must not be empty".to_string(),
        ));
    }

    party::Entity::find_by_id(request.party_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("Party {} not found", request.party_id),
            )
        })?;

    // Join codes are short, so regenerate on the rare collision.
    let mut code = generate_campaign_code();
    for attempt in 0.. {
        assert!(attempt < MAX_CODE_ATTEMPTS, "Join code space exhausted");
        let taken = campaign::Entity::find()
            .filter(campaign::Column::Code.eq(code.clone()))
            .one(&state.database)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
        if taken.is_none() {
            break;
        }
        code = generate_campaign_code();
    }

    let now = Utc::now().fixed_offset();
    let model = campaign::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        code: Set(code),
        party_id: Set(request.party_id),
        state: Set(state_name.to_string()),
        description: Set(request.description),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let stored = model
        .insert(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(campaign_id = stored.id, code = %stored.code, "Created campaign");

    Ok((StatusCode::CREATED, Json(CampaignView::from_model(stored))))
}

/// Campaigns where the caller is an approved member.
async fn my_campaigns(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<MyCampaignsView>, HttpError> {
    let memberships = campaign_member::Entity::find()
        .filter(campaign_member::Column::UserId.eq(caller.user_id))
        .filter(campaign_member::Column::Status.eq(STATUS_APPROVED))
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    if memberships.is_empty() {
        return Ok(Json(MyCampaignsView {
            campaigns: Vec::new(),
        }));
    }

    let campaign_ids: Vec<i64> = memberships.iter().map(|m| m.campaign_id).collect();
    let campaigns = campaign::Entity::find()
        .filter(campaign::Column::Id.is_in(campaign_ids))
        .order_by_asc(campaign::Column::Name)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok(Json(MyCampaignsView {
        campaigns: campaigns.into_iter().map(CampaignView::from_model).collect(),
    }))
}

async fn campaign_by_code(
    Path(code): Path<String>,
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<CampaignView>, HttpError> {
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "code must not be empty".to_string(),
        ));
    }

    let row = campaign::Entity::find()
        .filter(campaign::Column::Code.eq(code.clone()))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("Campaign {code} not found"))
        })?;

    Ok(Json(CampaignView::from_model(row)))
}

/// File a membership request; an admin approves or rejects it later.
async fn join_campaign(
    Path(campaign_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<JoinCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignMemberView>), HttpError> {
    campaign::Entity::find_by_id(campaign_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("Campaign {campaign_id} not found"),
            )
        })?;

    let existing = campaign_member::Entity::find()
        .filter(campaign_member::Column::CampaignId.eq(campaign_id))
        .filter(campaign_member::Column::UserId.eq(caller.user_id))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    if existing.is_some() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "A membership request for this campaign already exists".to_string(),
        ));
    }

    let role = request
        .role
        .as_deref()
        .unwrap_or(DEFAULT_MEMBER_ROLE)
        .trim()
        .to_ascii_uppercase();
    if role.is_empty() || role.len() > MAX_MEMBER_ROLE_LEN {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("role must be 1 to {MAX_MEMBER_ROLE_LEN} characters"),
        ));
    }

    let scope = match request.scope.as_deref() {
        Some(value) => normalize_scope(value)
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?,
        None => SCOPE_BOOTH,
    };

    let now = Utc::now().fixed_offset();
    let model = campaign_member::ActiveModel {
        id: NotSet,
        campaign_id: Set(campaign_id),
        user_id: Set(caller.user_id),
        role: Set(role),
        scope: Set(scope.to_string()),
        constituency_id: Set(request.constituency_id),
        booth_id: Set(request.booth_id),
        status: Set(STATUS_PENDING.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let stored = model
        .insert(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(
        campaign_id,
        user_id = caller.user_id,
        "Filed campaign join request"
    );

    Ok((StatusCode::CREATED, Json(CampaignMemberView::from_model(stored))))
}

async fn list_members(
    Path(campaign_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<CampaignMemberView>>, HttpError> {
    caller.require_admin()?;

    let rows = campaign_member::Entity::find()
        .filter(campaign_member::Column::CampaignId.eq(campaign_id))
        .order_by_asc(campaign_member::Column::CreatedAt)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let views = rows
        .into_iter()
        .map(CampaignMemberView::from_model)
        .collect::<Vec<_>>();
    Ok(Json(views))
}

async fn approve_member(
    Path(member_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<CampaignMemberView>, HttpError> {
    review_member(state, caller, member_id, STATUS_APPROVED).await
}

async fn reject_member(
    Path(member_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<CampaignMemberView>, HttpError> {
    review_member(state, caller, member_id, STATUS_REJECTED).await
}

async fn review_member(
    state: AppState,
    caller: Caller,
    member_id: i64,
    status: &'static str,
) -> Result<Json<CampaignMemberView>, HttpError> {
    caller.require_admin()?;

    let row = campaign_member::Entity::find_by_id(member_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("Membership request {member_id} not found"),
            )
        })?;

    // Sanity: the requesting user must still exist.
    app_user::Entity::find_by_id(row.user_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("User {} behind this request no longer exists", row.user_id),
            )
        })?;

    let mut model = row.into_active_model();
    model.status = Set(status.to_string());
    model.updated_at = Set(Utc::now().fixed_offset());

    let stored = model
        .update(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(member_id, status, admin = caller.user_id, "Reviewed campaign member");

    Ok(Json(CampaignMemberView::from_model(stored)))
}

/// Six uppercase hex characters, the shape field workers are used to typing.
fn generate_campaign_code() -> String {
    let bytes: [u8; 3] = rand::random();
    format!("{:02X}{:02X}{:02X}", bytes[0], bytes[1], bytes[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_code_shape() {
        for _ in 0..32 {
            let code = generate_campaign_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(code, code.to_ascii_uppercase());
        }
    }
}
