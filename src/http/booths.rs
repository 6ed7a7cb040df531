use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::Caller;
use crate::entities::{booth, booth_assignment, constituency};
use crate::models::directory::{BoothView, CreateBoothRequest, UpdateBoothRequest};
use crate::state::AppState;

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_booths).post(create_booth))
        .route(
            "/{booth_id}",
            get(get_booth).put(update_booth).delete(delete_booth),
        )
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ListBoothsQuery {
    constituency_id: Option<i64>,
}

/// Workers see only their assigned booths; leaders and admins see the full
/// directory, optionally filtered by constituency.
async fn list_booths(
    Query(query): Query<ListBoothsQuery>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<BoothView>>, HttpError> {
    let mut select = booth::Entity::find();

    if caller.is_worker() {
        let assigned_ids: Vec<i64> = booth_assignment::Entity::find()
            .select_only()
            .column(booth_assignment::Column::BoothId)
            .filter(booth_assignment::Column::UserId.eq(caller.user_id))
            .into_tuple()
            .all(&state.database)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

        if assigned_ids.is_empty() {
            return Ok(Json(Vec::new()));
        }
        select = select.filter(booth::Column::Id.is_in(assigned_ids));
    }

    if let Some(constituency_id) = query.constituency_id {
        select = select.filter(booth::Column::ConstituencyId.eq(constituency_id));
    }

    let rows = select
        .order_by_asc(booth::Column::BoothNumber)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let views = rows.into_iter().map(BoothView::from_model).collect::<Vec<_>>();
    Ok(Json(views))
}

async fn get_booth(
    Path(booth_id): Path<i64>,
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<BoothView>, HttpError> {
    let row = find_booth(&state, booth_id).await?;
    Ok(Json(BoothView::from_model(row)))
}

async fn create_booth(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateBoothRequest>,
) -> Result<(StatusCode, Json<BoothView>), HttpError> {
    caller.require_admin()?;

    let booth_number = request.booth_number.trim();
    if booth_number.is_empty() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "boothNumber must not be empty".to_string(),
        ));
    }

    let voter_count = request.voter_count.unwrap_or(0);
    if voter_count < 0 {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "voterCount must not be negative".to_string(),
        ));
    }

    constituency::Entity::find_by_id(request.constituency_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("Constituency {} not found", request.constituency_id),
            )
        })?;

    let now = Utc::now().fixed_offset();
    let model = booth::ActiveModel {
        id: NotSet,
        booth_number: Set(booth_number.to_string()),
        name: Set(request.name.map(|n| n.trim().to_string())),
        constituency_id: Set(request.constituency_id),
        voter_count: Set(voter_count),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let stored = model
        .insert(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok((StatusCode::CREATED, Json(BoothView::from_model(stored))))
}

async fn update_booth(
    Path(booth_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<UpdateBoothRequest>,
) -> Result<Json<BoothView>, HttpError> {
    caller.require_admin()?;

    let row = find_booth(&state, booth_id).await?;
    let mut model = row.into_active_model();

    if let Some(booth_number) = request.booth_number {
        let booth_number = booth_number.trim().to_string();
        if booth_number.is_empty() {
            return Err(HttpError::new(
                StatusCode::BAD_REQUEST,
                "boothNumber must not be empty".to_string(),
            ));
        }
        model.booth_number = Set(booth_number);
    }
    if let Some(name) = request.name {
        model.name = Set(Some(name.trim().to_string()));
    }
    if let Some(voter_count) = request.voter_count {
        if voter_count < 0 {
            return Err(HttpError::new(
                StatusCode::BAD_REQUEST,
                "voterCount must not be negative".to_string(),
            ));
        }
        model.voter_count = Set(voter_count);
    }
    model.updated_at = Set(Utc::now().fixed_offset());

    let stored = model
        .update(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok(Json(BoothView::from_model(stored)))
}

async fn delete_booth(
    Path(booth_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<StatusCode, HttpError> {
    caller.require_admin()?;

    let row = find_booth(&state, booth_id).await?;
    booth::Entity::delete_by_id(row.id)
        .exec(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(booth_id, "Deleted booth");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_booth(state: &AppState, booth_id: i64) -> Result<booth::Model, HttpError> {
    booth::Entity::find_by_id(booth_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("Booth {booth_id} not found"))
        })
}
