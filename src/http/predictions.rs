use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::auth::Caller;
use crate::entities::{booth, booth_assignment, prediction};
use crate::models::prediction::{AssignedBoothView, PredictionView, SubmitPredictionRequest};
use crate::models::summary::ConstituencySummaryView;
use crate::state::AppState;
use crate::store::{self, PredictionInput};

use super::HttpError;
use super::analytics::load_constituency_summary;

const MAX_ASSIGNED_BOOTHS: usize = 512;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_prediction).get(list_predictions))
        .route("/my-booths", get(my_booths))
        .route("/summary", get(constituency_summary))
        .route("/{prediction_id}", get(get_prediction))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SummaryQuery {
    constituency_id: Option<i64>,
}

async fn submit_prediction(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<SubmitPredictionRequest>,
) -> Result<(StatusCode, Json<PredictionView>), HttpError> {
    assert!(request.booth_id != 0, "Booth id zero is never assigned");

    // Workers may only write against booths assigned to them; leaders and
    // admins can correct any booth.
    if caller.is_worker() {
        let assigned = booth_assignment::Entity::find_by_id((caller.user_id, request.booth_id))
            .one(&state.database)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
        if assigned.is_none() {
            return Err(HttpError::new(
                StatusCode::FORBIDDEN,
                format!("Booth {} is not assigned to you", request.booth_id),
            ));
        }
    }

    let input = PredictionInput {
        turnout_pct: request.turnout_percentage,
        share_by_party: request.data,
        confidence: request.confidence_level,
    };

    let stored = store::upsert_prediction(&state.database, request.booth_id, caller.user_id, input)
        .await
        .map_err(HttpError::from_store)?;

    Ok((StatusCode::CREATED, Json(PredictionView::from_model(stored))))
}

async fn my_booths(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<AssignedBoothView>>, HttpError> {
    let assignments = booth_assignment::Entity::find()
        .filter(booth_assignment::Column::UserId.eq(caller.user_id))
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    assert!(
        assignments.len() <= MAX_ASSIGNED_BOOTHS,
        "Assigned booth fan-out exceeds defensive bound"
    );

    if assignments.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let booth_ids: Vec<i64> = assignments.iter().map(|a| a.booth_id).collect();

    let booths = booth::Entity::find()
        .filter(booth::Column::Id.is_in(booth_ids.clone()))
        .order_by_asc(booth::Column::BoothNumber)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let own_predictions = prediction::Entity::find()
        .filter(prediction::Column::BoothId.is_in(booth_ids))
        .filter(prediction::Column::UserId.eq(caller.user_id))
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let mut by_booth: HashMap<i64, PredictionView> = own_predictions
        .into_iter()
        .map(|row| (row.booth_id, PredictionView::from_model(row)))
        .collect();

    let views = booths
        .into_iter()
        .map(|b| AssignedBoothView {
            booth_id: b.id,
            booth_number: b.booth_number,
            name: b.name,
            voter_count: b.voter_count,
            prediction: by_booth.remove(&b.id),
        })
        .collect::<Vec<_>>();

    Ok(Json(views))
}

async fn constituency_summary(
    Query(query): Query<SummaryQuery>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ConstituencySummaryView>, HttpError> {
    caller.require_leadership()?;

    let constituency_id = query
        .constituency_id
        .or(caller.constituency_id)
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::BAD_REQUEST,
                "constituencyId is required for callers without a home constituency".to_string(),
            )
        })?;

    let summary = load_constituency_summary(&state.database, constituency_id).await?;
    Ok(Json(summary))
}

async fn list_predictions(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<PredictionView>>, HttpError> {
    caller.require_leadership()?;

    let rows = prediction::Entity::find()
        .order_by_desc(prediction::Column::UpdatedAt)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let views = rows
        .into_iter()
        .map(PredictionView::from_model)
        .collect::<Vec<_>>();

    Ok(Json(views))
}

async fn get_prediction(
    Path(prediction_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<PredictionView>, HttpError> {
    assert!(prediction_id >= 0, "Prediction id must be non-negative");

    let row = prediction::Entity::find_by_id(prediction_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("Prediction {prediction_id} not found"),
            )
        })?;

    // Workers only see their own submissions.
    if caller.is_worker() && row.user_id != caller.user_id {
        return Err(HttpError::new(
            StatusCode::FORBIDDEN,
            "Predictions of other workers are not visible".to_string(),
        ));
    }

    Ok(Json(PredictionView::from_model(row)))
}
