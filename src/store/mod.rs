//! Prediction store: validated, lock-gated upsert of booth predictions.
//!
//! One prediction row exists per (booth, worker) pair. Resubmission replaces
//! the stored row in place; the `uq_predictions_booth_user` unique index plus
//! `ON CONFLICT DO UPDATE` make concurrent resubmissions for the same key
//! serialize as last-write-wins instead of producing duplicates. The lock
//! flag of the owning constituency is re-read inside the same transaction as
//! the write, so a lock flipped mid-request cannot be raced past.

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::entities::{booth, constituency, prediction};

pub const MIN_CONFIDENCE: i32 = 1;
pub const MAX_CONFIDENCE: i32 = 5;
pub const MAX_PARTIES_PER_PREDICTION: usize = 64;
pub const MAX_PARTY_KEY_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("predictions are locked for constituency {name}")]
    Locked { name: String },
    #[error("booth {0} not found")]
    BoothNotFound(i64),
    #[error("constituency {0} not found")]
    ConstituencyNotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl StoreError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// A worker's submission, prior to validation.
#[derive(Debug, Clone)]
pub struct PredictionInput {
    pub turnout_pct: f64,
    pub share_by_party: BTreeMap<String, f64>,
    pub confidence: i32,
}

/// Validate ranges and normalize party keys. Returns the canonical share map.
///
/// Party names are free-form by design (party lists evolve faster than any
/// registry), so keys are only trimmed and bounded, never matched against the
/// parties table. A share sum above 100 is accepted but logged.
pub fn validate_input(input: &PredictionInput) -> Result<BTreeMap<String, f64>, StoreError> {
    if !input.turnout_pct.is_finite() || !(0.0..=100.0).contains(&input.turnout_pct) {
        return Err(StoreError::validation(
            "turnoutPercentage",
            format!("must be between 0 and 100, got {}", input.turnout_pct),
        ));
    }
    if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&input.confidence) {
        return Err(StoreError::validation(
            "confidenceLevel",
            format!(
                "must be between {MIN_CONFIDENCE} and {MAX_CONFIDENCE}, got {}",
                input.confidence
            ),
        ));
    }
    if input.share_by_party.len() > MAX_PARTIES_PER_PREDICTION {
        return Err(StoreError::validation(
            "data",
            format!("at most {MAX_PARTIES_PER_PREDICTION} parties per submission"),
        ));
    }

    let mut shares = BTreeMap::new();
    let mut sum = 0.0_f64;
    for (raw_key, &pct) in &input.share_by_party {
        let key = raw_key.trim();
        if key.is_empty() {
            return Err(StoreError::validation("data", "party name must not be empty"));
        }
        if key.chars().count() > MAX_PARTY_KEY_LEN {
            return Err(StoreError::validation(
                "data",
                format!("party name exceeds {MAX_PARTY_KEY_LEN} characters"),
            ));
        }
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(StoreError::validation(
                "data",
                format!("share for {key} must be between 0 and 100, got {pct}"),
            ));
        }
        if shares.insert(key.to_string(), pct).is_some() {
            return Err(StoreError::validation(
                "data",
                format!("duplicate party name {key}"),
            ));
        }
        sum += pct;
    }

    if sum > 100.0 + f64::EPSILON {
        warn!(sum, "Prediction shares sum above 100 percent");
    }

    Ok(shares)
}

/// Lock gate decision on an already-resolved constituency.
pub fn ensure_writable(row: &constituency::Model) -> Result<(), StoreError> {
    if row.is_locked {
        return Err(StoreError::Locked {
            name: row.name.clone(),
        });
    }
    Ok(())
}

/// Resolve a constituency and apply the lock gate.
pub async fn check_writable<C: ConnectionTrait>(
    conn: &C,
    constituency_id: i64,
) -> Result<constituency::Model, StoreError> {
    let row = constituency::Entity::find_by_id(constituency_id)
        .one(conn)
        .await?
        .ok_or(StoreError::ConstituencyNotFound(constituency_id))?;
    ensure_writable(&row)?;
    Ok(row)
}

/// Create or replace the caller's prediction for a booth.
///
/// The booth lookup, lock check and write commit as one transaction;
/// `created_at` is preserved when an existing row is replaced.
pub async fn upsert_prediction(
    database: &DatabaseConnection,
    booth_id: i64,
    user_id: i64,
    input: PredictionInput,
) -> Result<prediction::Model, StoreError> {
    let shares = validate_input(&input)?;
    let payload = serde_json::to_value(&shares)
        .map_err(|err| StoreError::validation("data", err.to_string()))?;

    let txn = database.begin().await?;

    let booth_row = booth::Entity::find_by_id(booth_id)
        .one(&txn)
        .await?
        .ok_or(StoreError::BoothNotFound(booth_id))?;
    check_writable(&txn, booth_row.constituency_id).await?;

    let now = Utc::now().fixed_offset();
    let model = prediction::ActiveModel {
        id: NotSet,
        booth_id: Set(booth_id),
        user_id: Set(user_id),
        turnout_pct: Set(input.turnout_pct),
        share_by_party: Set(payload),
        confidence: Set(input.confidence),
        created_at: Set(now),
        updated_at: Set(now),
    };

    prediction::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([prediction::Column::BoothId, prediction::Column::UserId])
                .update_columns([
                    prediction::Column::TurnoutPct,
                    prediction::Column::ShareByParty,
                    prediction::Column::Confidence,
                    prediction::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(&txn)
        .await?;

    let stored = prediction::Entity::find()
        .filter(prediction::Column::BoothId.eq(booth_id))
        .filter(prediction::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| {
            StoreError::Database(DbErr::RecordNotFound(
                "prediction row missing after upsert".to_string(),
            ))
        })?;

    txn.commit().await?;

    info!(
        booth_id,
        user_id,
        prediction_id = stored.id,
        "Stored booth prediction"
    );

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn input(turnout: f64, confidence: i32, shares: &[(&str, f64)]) -> PredictionInput {
        PredictionInput {
            turnout_pct: turnout,
            share_by_party: shares
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            confidence,
        }
    }

    fn constituency(is_locked: bool) -> constituency::Model {
        let now = Utc::now().fixed_offset();
        constituency::Model {
            id: 1,
            name: "Lucknow".to_string(),
            state: "Uttar Pradesh".to_string(),
            kind: "LOK_SABHA".to_string(),
            campaign_id: None,
            is_locked,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn accepts_in_range_submission() {
        let shares = validate_input(&input(60.0, 3, &[("BJP", 50.0), ("INC", 50.0)]))
            .expect("valid input");
        assert_eq!(shares.len(), 2);
        assert_eq!(shares["BJP"], 50.0);
    }

    #[test]
    fn rejects_out_of_range_turnout() {
        let err = validate_input(&input(150.0, 3, &[("BJP", 50.0)])).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation { field: "turnoutPercentage", .. }
        ));
    }

    #[test]
    fn rejects_negative_share() {
        let err = validate_input(&input(50.0, 3, &[("BJP", -5.0)])).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "data", .. }));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        assert!(validate_input(&input(50.0, 0, &[("BJP", 10.0)])).is_err());
        assert!(validate_input(&input(50.0, 6, &[("BJP", 10.0)])).is_err());
        assert!(validate_input(&input(50.0, 1, &[("BJP", 10.0)])).is_ok());
        assert!(validate_input(&input(50.0, 5, &[("BJP", 10.0)])).is_ok());
    }

    #[test]
    fn trims_party_keys() {
        let shares = validate_input(&input(50.0, 3, &[("  BJP ", 40.0)])).expect("valid");
        assert_eq!(shares.keys().next().map(String::as_str), Some("BJP"));
    }

    #[test]
    fn rejects_party_keys_colliding_after_trim() {
        let err = validate_input(&input(50.0, 3, &[("BJP", 40.0), (" BJP", 30.0)])).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "data", .. }));
    }

    #[test]
    fn rejects_empty_party_key() {
        let err = validate_input(&input(50.0, 3, &[("   ", 40.0)])).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "data", .. }));
    }

    #[test]
    fn unknown_parties_and_oversubscribed_sums_are_accepted() {
        // Party names are not checked against the registry, and a sum above
        // 100 only warns.
        let shares = validate_input(&input(50.0, 3, &[("NEWPARTY", 80.0), ("OTHER", 60.0)]))
            .expect("accepted");
        assert_eq!(shares.len(), 2);
    }

    #[test]
    fn lock_gate_rejects_locked_constituency() {
        let err = ensure_writable(&constituency(true)).unwrap_err();
        match err {
            StoreError::Locked { name } => assert_eq!(name, "Lucknow"),
            other => panic!("expected Locked, got {other:?}"),
        }
    }

    #[test]
    fn lock_gate_allows_unlocked_constituency() {
        assert!(ensure_writable(&constituency(false)).is_ok());
    }
}
