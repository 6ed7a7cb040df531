use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use tracing::info;

use crate::auth::Caller;
use crate::entities::{booth, constituency, prediction};
use crate::models::directory::{
    ConstituencyOverview, ConstituencyView, CreateConstituencyRequest, UpdateConstituencyRequest,
    normalize_kind,
};
use crate::rollup;
use crate::state::AppState;

use super::HttpError;

const MAX_NAME_LEN: usize = 128;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_constituencies).post(create_constituency))
        .route(
            "/{constituency_id}",
            get(get_constituency)
                .put(update_constituency)
                .delete(delete_constituency),
        )
        .route("/{constituency_id}/lock", post(lock_constituency))
        .route("/{constituency_id}/unlock", post(unlock_constituency))
}

/// Admin/leader overview: every constituency with its lock flag and booth
/// coverage, the way the dashboards render the campaign map.
async fn list_constituencies(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<ConstituencyOverview>>, HttpError> {
    caller.require_leadership()?;

    let rows = constituency::Entity::find()
        .order_by_asc(constituency::Column::Name)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let mut overviews = Vec::with_capacity(rows.len());
    for row in rows {
        let booth_ids: Vec<i64> = booth::Entity::find()
            .select_only()
            .column(booth::Column::Id)
            .filter(booth::Column::ConstituencyId.eq(row.id))
            .into_tuple()
            .all(&state.database)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

        let total_booths = booth_ids.len() as u64;
        let updated_booths = if booth_ids.is_empty() {
            0
        } else {
            let covered: Vec<i64> = prediction::Entity::find()
                .select_only()
                .column(prediction::Column::BoothId)
                .filter(prediction::Column::BoothId.is_in(booth_ids))
                .distinct()
                .into_tuple()
                .all(&state.database)
                .await
                .map_err(|err| {
                    HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                })?;
            covered.len() as u64
        };

        overviews.push(ConstituencyOverview {
            id: row.id,
            name: row.name,
            state: row.state,
            kind: row.kind,
            is_locked: row.is_locked,
            total_booths,
            updated_booths,
            coverage_pct: rollup::coverage_pct(total_booths, updated_booths),
        });
    }

    Ok(Json(overviews))
}

async fn get_constituency(
    Path(constituency_id): Path<i64>,
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<ConstituencyView>, HttpError> {
    let row = find_constituency(&state, constituency_id).await?;
    Ok(Json(ConstituencyView::from_model(row)))
}

async fn create_constituency(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateConstituencyRequest>,
) -> Result<(StatusCode, Json<ConstituencyView>), HttpError> {
    caller.require_admin()?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "name must not be empty".to_string(),
        ));
    }
    assert!(name.len() <= MAX_NAME_LEN, "Name exceeds defensive bound");

    let kind = normalize_kind(&request.kind)
        .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;

    let now = Utc::now().fixed_offset();
    let model = constituency::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        state: Set(request.state.trim().to_string()),
        kind: Set(kind.to_string()),
        campaign_id: Set(request.campaign_id),
        is_locked: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let stored = model
        .insert(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok((StatusCode::CREATED, Json(ConstituencyView::from_model(stored))))
}

async fn update_constituency(
    Path(constituency_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<UpdateConstituencyRequest>,
) -> Result<Json<ConstituencyView>, HttpError> {
    caller.require_admin()?;

    let row = find_constituency(&state, constituency_id).await?;
    let mut model = row.into_active_model();

    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(HttpError::new(
                StatusCode::BAD_REQUEST,
                "name must not be empty".to_string(),
            ));
        }
        model.name = Set(name);
    }
    if let Some(state_name) = request.state {
        model.state = Set(state_name.trim().to_string());
    }
    if let Some(kind) = request.kind {
        let kind = normalize_kind(&kind)
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        model.kind = Set(kind.to_string());
    }
    if let Some(campaign_id) = request.campaign_id {
        model.campaign_id = Set(Some(campaign_id));
    }
    model.updated_at = Set(Utc::now().fixed_offset());

    let stored = model
        .update(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok(Json(ConstituencyView::from_model(stored)))
}

async fn delete_constituency(
    Path(constituency_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<StatusCode, HttpError> {
    caller.require_admin()?;

    let row = find_constituency(&state, constituency_id).await?;
    let booth_count = booth::Entity::find()
        .filter(booth::Column::ConstituencyId.eq(constituency_id))
        .count(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    constituency::Entity::delete_by_id(row.id)
        .exec(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(
        constituency_id,
        cascaded_booths = booth_count,
        "Deleted constituency"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn lock_constituency(
    Path(constituency_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ConstituencyView>, HttpError> {
    set_lock(state, caller, constituency_id, true).await
}

async fn unlock_constituency(
    Path(constituency_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ConstituencyView>, HttpError> {
    set_lock(state, caller, constituency_id, false).await
}

/// Flip the lock flag. Locking freezes every prediction write under this
/// constituency; the store re-checks the flag inside its write transaction.
async fn set_lock(
    state: AppState,
    caller: Caller,
    constituency_id: i64,
    locked: bool,
) -> Result<Json<ConstituencyView>, HttpError> {
    caller.require_admin()?;

    let row = find_constituency(&state, constituency_id).await?;
    let mut model = row.into_active_model();
    model.is_locked = Set(locked);
    model.updated_at = Set(Utc::now().fixed_offset());

    let stored = model
        .update(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(
        constituency_id,
        locked,
        admin = caller.user_id,
        "Constituency lock changed"
    );

    Ok(Json(ConstituencyView::from_model(stored)))
}

async fn find_constituency(
    state: &AppState,
    constituency_id: i64,
) -> Result<constituency::Model, HttpError> {
    constituency::Entity::find_by_id(constituency_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("Constituency {constituency_id} not found"),
            )
        })
}
