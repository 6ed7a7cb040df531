use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entities::prediction;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPredictionRequest {
    pub booth_id: i64,
    pub turnout_percentage: f64,
    /// Party short-name -> expected vote-share percent.
    pub data: BTreeMap<String, f64>,
    pub confidence_level: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionView {
    pub id: i64,
    pub booth_id: i64,
    pub user_id: i64,
    pub turnout_percentage: f64,
    pub data: BTreeMap<String, f64>,
    pub confidence_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PredictionView {
    pub fn from_model(model: prediction::Model) -> Self {
        let data = serde_json::from_value(model.share_by_party.clone()).unwrap_or_else(|err| {
            warn!(
                prediction_id = model.id,
                "Stored share payload failed to parse: {err}"
            );
            BTreeMap::new()
        });
        Self {
            id: model.id,
            booth_id: model.booth_id,
            user_id: model.user_id,
            turnout_percentage: model.turnout_pct,
            data,
            confidence_level: model.confidence,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedBoothView {
    pub booth_id: i64,
    pub booth_number: String,
    pub name: Option<String>,
    pub voter_count: i64,
    pub prediction: Option<PredictionView>,
}
