use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::auth::Caller;
use crate::entities::{booth, campaign, constituency, prediction};
use crate::models::directory::BoothView;
use crate::models::prediction::PredictionView;
use crate::models::summary::{
    BoothSummaryView, CampaignRef, CampaignSummaryView, ConstituencyRef, ConstituencySummaryView,
};
use crate::rollup::{self, constituency_rollup};
use crate::state::AppState;

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/campaign/{campaign_id}", get(campaign_summary))
        .route("/constituency/{constituency_id}", get(constituency_summary))
        .route("/booth/{booth_id}", get(booth_summary))
}

/// Load booths and predictions for one constituency and run the rollup.
/// Shared by the analytics and dashboard summary endpoints.
pub(super) async fn load_constituency_summary(
    database: &DatabaseConnection,
    constituency_id: i64,
) -> Result<ConstituencySummaryView, HttpError> {
    let constituency_row = constituency::Entity::find_by_id(constituency_id)
        .one(database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("Constituency {constituency_id} not found"),
            )
        })?;

    let booths = booth::Entity::find()
        .filter(booth::Column::ConstituencyId.eq(constituency_id))
        .all(database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let predictions = if booths.is_empty() {
        Vec::new()
    } else {
        let booth_ids: Vec<i64> = booths.iter().map(|b| b.id).collect();
        prediction::Entity::find()
            .filter(prediction::Column::BoothId.is_in(booth_ids))
            .all(database)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
    };

    let last_updated = predictions
        .iter()
        .map(|row| row.updated_at)
        .max()
        .map(|at| at.with_timezone(&Utc));

    let outcome = constituency_rollup(&booths, &predictions);

    Ok(ConstituencySummaryView::from_outcome(
        ConstituencyRef {
            id: constituency_row.id,
            name: constituency_row.name,
        },
        outcome,
        last_updated,
    ))
}

async fn constituency_summary(
    Path(constituency_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ConstituencySummaryView>, HttpError> {
    caller.require_leadership()?;
    let summary = load_constituency_summary(&state.database, constituency_id).await?;
    Ok(Json(summary))
}

async fn campaign_summary(
    Path(campaign_id): Path<i64>,
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<CampaignSummaryView>, HttpError> {
    caller.require_leadership()?;

    let campaign_row = campaign::Entity::find_by_id(campaign_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(
                StatusCode::NOT_FOUND,
                format!("Campaign {campaign_id} not found"),
            )
        })?;

    let constituencies = constituency::Entity::find()
        .filter(constituency::Column::CampaignId.eq(campaign_id))
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let constituency_ids: Vec<i64> = constituencies.iter().map(|c| c.id).collect();

    let (total_booths, updated_booths) = if constituency_ids.is_empty() {
        (0, 0)
    } else {
        let booth_ids: Vec<i64> = booth::Entity::find()
            .select_only()
            .column(booth::Column::Id)
            .filter(booth::Column::ConstituencyId.is_in(constituency_ids))
            .into_tuple()
            .all(&state.database)
            .await
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

        if booth_ids.is_empty() {
            (0, 0)
        } else {
            let total = booth_ids.len() as u64;
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
            (total, covered.len() as u64)
        }
    };

    assert!(
        updated_booths <= total_booths,
        "Covered booths cannot exceed campaign booth universe"
    );

    let view = CampaignSummaryView {
        campaign: CampaignRef {
            id: campaign_row.id,
            name: campaign_row.name,
        },
        total_constituencies: constituencies.len() as u64,
        total_booths,
        updated_booths,
        coverage_pct: rollup::coverage_pct(total_booths, updated_booths),
    };

    Ok(Json(view))
}

async fn booth_summary(
    Path(booth_id): Path<i64>,
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<BoothSummaryView>, HttpError> {
    let booth_row = booth::Entity::find_by_id(booth_id)
        .one(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("Booth {booth_id} not found"))
        })?;

    let predictions = prediction::Entity::find()
        .filter(prediction::Column::BoothId.eq(booth_id))
        .order_by_desc(prediction::Column::UpdatedAt)
        .all(&state.database)
        .await
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let view = BoothSummaryView {
        booth: BoothView::from_model(booth_row),
        predictions: predictions
            .into_iter()
            .map(PredictionView::from_model)
            .collect(),
    };

    Ok(Json(view))
}
