use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::info;

use crate::auth::{Caller, MAX_TOKEN_LEN, Role};
use crate::entities::{app_user, booth, booth_assignment};
use crate::models::directory::{AssignBoothsRequest, CreateUserRequest, UserView};
use crate::state::AppState;

use super::HttpError;

const MAX_BOOTHS_PER_WORKER: usize = 512;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(me))
        .route("/{user_id}", get(get_user).delete(delete_user))
        .route("/{user_id}/booths", post(assign_booths))
}

async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<UserView>>, HttpError> {
    caller.require_admin()?;

    let rows = app_user::Entity::find()
        .order_by_asc(app_user::Column::Name)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let views = rows.into_iter().map(UserView::from_model).collect::<Vec<_>>();
    Ok(Json(views))
}

async fn me(State(state): State<AppState>, caller: Caller) -> Result<Json<UserView>, HttpError> {
    let row = find_user(&state, caller.user_id).await?;
    Ok(Json(UserView::from_model(row)))
}

async fn get_user(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<UserView>, HttpError> {
    caller.require_admin()?;
    let row = find_user(&state, user_id).await?;
    Ok(Json(UserView::from_model(row)))
}

async fn create_user(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), HttpError> {
    caller.require_admin()?;

    let name = request.name.trim();
    let email = request.email.trim().to_ascii_lowercase();
    if name.is_empty() || email.is_empty() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "name and email must not be empty".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "email must be a valid address".to_string(),
        ));
    }

    let role = Role::parse(&request.role)
        .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;

    let api_token = request.api_token.trim();
    if api_token.is_empty() || api_token.len() > MAX_TOKEN_LEN {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("apiToken must be 1 to {MAX_TOKEN_LEN} characters"),
        ));
    }

    let existing = app_user::Entity::find()
        .filter(app_user::Column::Email.eq(email.clone()))
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    if existing.is_some() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("User with email {email} already exists"),
        ));
    }

    let now = Utc::now().fixed_offset();
    let model = app_user::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        email: Set(email),
        phone: Set(request.phone),
        role: Set(role.as_str().to_string()),
        constituency_id: Set(request.constituency_id),
        api_token: Set(api_token.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let stored = model
        .insert(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(user_id = stored.id, role = role.as_str(), "Created user");

    Ok((StatusCode::CREATED, Json(UserView::from_model(stored))))
}

/// Replace a user's booth assignments wholesale: delete the old set, insert
/// the new one, in a single transaction.
async fn assign_booths(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<AssignBoothsRequest>,
) -> Result<Json<Vec<i64>>, HttpError> {
    caller.require_admin()?;

    if request.booth_ids.len() > MAX_BOOTHS_PER_WORKER {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("at most {MAX_BOOTHS_PER_WORKER} booths per worker"),
        ));
    }

    let user = find_user(&state, user_id).await?;

    let mut booth_ids = request.booth_ids;
    booth_ids.sort_unstable();
    booth_ids.dedup();

    if !booth_ids.is_empty() {
        let known = booth::Entity::find()
            .filter(booth::Column::Id.is_in(booth_ids.clone()))
            .all(&state.database)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
        if known.len() != booth_ids.len() {
            return Err(HttpError::new(
                StatusCode::NOT_FOUND,
                "One or more booth ids do not exist".to_string(),
            ));
        }
    }

    let txn = state
        .database
        .begin()
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    booth_assignment::Entity::delete_many()
        .filter(booth_assignment::Column::UserId.eq(user.id))
        .exec(&txn)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    if !booth_ids.is_empty() {
        let now = Utc::now().fixed_offset();
        let models = booth_ids
            .iter()
            .map(|&booth_id| booth_assignment::ActiveModel {
                user_id: Set(user.id),
                booth_id: Set(booth_id),
                assigned_at: Set(now),
            })
            .collect::<Vec<_>>();

        booth_assignment::Entity::insert_many(models)
            .exec(&txn)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    }

    txn.commit()
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    info!(
        user_id,
        booth_count = booth_ids.len(),
        "Replaced booth assignments"
    );

    Ok(Json(booth_ids))
}

async fn delete_user(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<StatusCode, HttpError> {
    caller.require_admin()?;

    if user_id == caller.user_id {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Cannot delete your own account".to_string(),
        ));
    }

    let row = find_user(&state, user_id).await?;
    app_user::Entity::delete_by_id(row.id)
        .exec(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    // The deleted user's token may still be cached.
    state.cache.invalidate_callers();

    info!(user_id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_user(state: &AppState, user_id: i64) -> Result<app_user::Model, HttpError> {
    app_user::Entity::find_by_id(user_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("User {user_id} not found"))
        })
}
