use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder};
use tracing::info;

use crate::auth::Caller;
use crate::entities::party;
use crate::models::directory::{CreatePartyRequest, PartyView, UpdatePartyRequest};
use crate::state::AppState;

use super::HttpError;

const MAX_SHORT_NAME_LEN: usize = 32;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_parties).post(create_party))
        .route(
            "/{party_id}",
            get(get_party).put(update_party).delete(delete_party),
        )
}

async fn list_parties(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<Vec<PartyView>>, HttpError> {
    let rows = party::Entity::find()
        .order_by_asc(party::Column::ShortName)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let views = rows.into_iter().map(PartyView::from_model).collect::<Vec<_>>();
    Ok(Json(views))
}

async fn get_party(
    Path(party_id): Path<i64>,
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<PartyView>, HttpError> {
    let row = find_party(&state, party_id).await?;
    Ok(Json(PartyView::from_model(row)))
}

async fn create_party(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreatePartyRequest>,
) -> Result<(StatusCode, Json<PartyView>), HttpError> {
    caller.require_admin()?;

    let name = request.name.trim();
    let short_name = request.short_name.trim().to_ascii_uppercase();
    if name.is_empty() || short_name.is_empty() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "name and shortName must not be empty".to_string(),
        ));
    }
    assert!(
        short_name.len() <= MAX_SHORT_NAME_LEN,
        "Short name exceeds defensive bound"
    );

    let existing = party::Entity::find()
        .filter(party::Column::ShortName.eq(short_name.clone()))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    if existing.is_some() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("Party {short_name} already exists"),
        ));
    }

    let now = Utc::now().fixed_offset();
    let model = party::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        short_name: Set(short_name),
        logo_url: Set(request.logo_url),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let stored = model
        .insert(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok((StatusCode::CREATED, Json(PartyView::from_model(stored))))
}

async fn update_party(
    Path(party_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<UpdatePartyRequest>,
) -> Result<Json<PartyView>, HttpError> {
    caller.require_admin()?;

    let row = find_party(&state, party_id).await?;
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
    if let Some(logo_url) = request.logo_url {
        model.logo_url = Set(Some(logo_url));
    }
    model.updated_at = Set(Utc::now().fixed_offset());

    let stored = model
        .update(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    Ok(Json(PartyView::from_model(stored)))
}

async fn delete_party(
    Path(party_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<StatusCode, HttpError> {
    caller.require_admin()?;

    let row = find_party(&state, party_id).await?;
    party::Entity::delete_by_id(row.id)
        .exec(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(party_id, "Deleted party");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_party(state: &AppState, party_id: i64) -> Result<party::Model, HttpError> {
    party::Entity::find_by_id(party_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("Party {party_id} not found"))
        })
}
