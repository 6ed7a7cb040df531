//! Vote-share rollup engine.
//!
//! Turns booth-level, party-keyed prediction rows into a constituency-level
//! weighted vote-share estimate plus coverage statistics. The engine is a
//! pure fold over already-loaded rows: it never touches the database and it
//! never fails on empty or partial data — missing data degrades to zeroed
//! output, malformed rows are skipped with a warning.
//!
//! Weighting: each prediction contributes
//! `turnout/100 * share/100 * voter_count` votes per party, so a booth with
//! ten times the voters moves the estimate ten times as much. Every worker's
//! submission contributes; submissions are not deduplicated per booth.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;
use tracing::warn;

use crate::entities::{booth, prediction};

/// Aggregation weight for a booth with no recorded voter count.
const DEFAULT_BOOTH_WEIGHT: f64 = 1.0;

/// Constituency-level aggregation result.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupOutcome {
    pub total_booths: u64,
    /// Booths with at least one usable prediction, counted once each.
    pub updated_booths: u64,
    /// `updated_booths / total_booths` as a percentage, 0 when no booths.
    pub update_progress: f64,
    /// Party short-name -> estimated vote share percent, 2 decimal places.
    pub vote_share_pct: BTreeMap<String, f64>,
    pub predicted_winner: Option<PredictedWinner>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictedWinner {
    pub party: String,
    pub vote_share_pct: f64,
}

/// Aggregate all predictions for the given booths.
///
/// Predictions referencing a booth outside `booths`, and rows whose share
/// payload does not parse as a `{party: percent}` object, are skipped and do
/// not count toward coverage.
pub fn constituency_rollup(
    booths: &[booth::Model],
    predictions: &[prediction::Model],
) -> RollupOutcome {
    let total_booths = booths.len() as u64;

    let weights: HashMap<i64, f64> = booths
        .iter()
        .map(|b| (b.id, booth_weight(b.voter_count)))
        .collect();

    let mut covered: HashSet<i64> = HashSet::new();
    let mut contributions: BTreeMap<String, f64> = BTreeMap::new();
    let mut total_votes = 0.0_f64;

    for row in predictions {
        let Some(&weight) = weights.get(&row.booth_id) else {
            warn!(
                prediction_id = row.id,
                booth_id = row.booth_id,
                "Skipping prediction for booth outside rollup scope"
            );
            continue;
        };
        let Some(shares) = parse_share_map(&row.share_by_party) else {
            warn!(
                prediction_id = row.id,
                booth_id = row.booth_id,
                "Skipping prediction with malformed share payload"
            );
            continue;
        };

        covered.insert(row.booth_id);
        let turnout = row.turnout_pct / 100.0;
        for (party, share_pct) in shares {
            let contribution = turnout * (share_pct / 100.0) * weight;
            *contributions.entry(party).or_insert(0.0) += contribution;
            total_votes += contribution;
        }
    }

    let updated_booths = covered.len() as u64;
    assert!(
        updated_booths <= total_booths,
        "Covered booths cannot exceed booth universe"
    );

    let mut vote_share_pct = BTreeMap::new();
    let mut winner: Option<(&str, f64)> = None;
    for (party, contribution) in &contributions {
        let share = if total_votes > 0.0 {
            round2(contribution / total_votes * 100.0)
        } else {
            0.0
        };
        vote_share_pct.insert(party.clone(), share);

        // Strict comparison over ascending BTreeMap order: on a tied
        // contribution the lexicographically smallest party key wins.
        match winner {
            Some((_, best)) if *contribution <= best => {}
            _ => winner = Some((party.as_str(), *contribution)),
        }
    }

    let predicted_winner = winner.map(|(party, _)| PredictedWinner {
        party: party.to_string(),
        vote_share_pct: vote_share_pct.get(party).copied().unwrap_or(0.0),
    });

    RollupOutcome {
        total_booths,
        updated_booths,
        update_progress: coverage_pct(total_booths, updated_booths),
        vote_share_pct,
        predicted_winner,
    }
}

/// Coverage percentage shared by the constituency and campaign rollups.
pub fn coverage_pct(total_booths: u64, updated_booths: u64) -> f64 {
    if total_booths == 0 {
        return 0.0;
    }
    assert!(
        updated_booths <= total_booths,
        "Coverage numerator exceeds denominator"
    );
    round2(updated_booths as f64 / total_booths as f64 * 100.0)
}

fn booth_weight(voter_count: i64) -> f64 {
    if voter_count > 0 {
        voter_count as f64
    } else {
        DEFAULT_BOOTH_WEIGHT
    }
}

fn parse_share_map(value: &Value) -> Option<BTreeMap<String, f64>> {
    serde_json::from_value(value.clone()).ok()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn booth(id: i64, voter_count: i64) -> booth::Model {
        let now = Utc::now().fixed_offset();
        booth::Model {
            id,
            booth_number: format!("B-{id}"),
            name: None,
            constituency_id: 1,
            voter_count,
            created_at: now,
            updated_at: now,
        }
    }

    fn prediction(id: i64, booth_id: i64, user_id: i64, turnout: f64, shares: Value) -> prediction::Model {
        let now = Utc::now().fixed_offset();
        prediction::Model {
            id,
            booth_id,
            user_id,
            turnout_pct: turnout,
            share_by_party: shares,
            confidence: 3,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn zero_data_yields_zeroed_outcome() {
        let outcome = constituency_rollup(&[], &[]);
        assert_eq!(outcome.total_booths, 0);
        assert_eq!(outcome.updated_booths, 0);
        assert_eq!(outcome.update_progress, 0.0);
        assert!(outcome.vote_share_pct.is_empty());
        assert!(outcome.predicted_winner.is_none());
    }

    #[test]
    fn booths_without_predictions_report_zero_progress() {
        let booths = vec![booth(1, 800), booth(2, 900)];
        let outcome = constituency_rollup(&booths, &[]);
        assert_eq!(outcome.total_booths, 2);
        assert_eq!(outcome.updated_booths, 0);
        assert_eq!(outcome.update_progress, 0.0);
        assert!(outcome.predicted_winner.is_none());
    }

    #[test]
    fn weighted_shares_favor_high_voter_count() {
        let booths = vec![booth(1, 1000), booth(2, 0)];
        let rows = vec![
            prediction(1, 1, 10, 50.0, json!({"X": 100.0})),
            prediction(2, 2, 11, 50.0, json!({"Y": 100.0})),
        ];
        let outcome = constituency_rollup(&booths, &rows);

        // X contributes 1000 * 0.5 = 500 votes, Y (unit weight) 0.5.
        assert_eq!(outcome.vote_share_pct["X"], 99.9);
        assert_eq!(outcome.vote_share_pct["Y"], 0.1);
        let winner = outcome.predicted_winner.expect("winner");
        assert_eq!(winner.party, "X");
        assert_eq!(winner.vote_share_pct, 99.9);
    }

    #[test]
    fn two_booth_rollup_matches_hand_computation() {
        let booths = vec![booth(1, 500), booth(2, 1500)];
        let rows = vec![
            prediction(1, 1, 10, 60.0, json!({"BJP": 50.0, "INC": 50.0})),
            prediction(2, 2, 11, 40.0, json!({"BJP": 30.0, "INC": 70.0})),
        ];
        let outcome = constituency_rollup(&booths, &rows);

        // BJP: 500*0.6*0.5 + 1500*0.4*0.3 = 330; INC: 150 + 420 = 570.
        assert_eq!(outcome.total_booths, 2);
        assert_eq!(outcome.updated_booths, 2);
        assert_eq!(outcome.update_progress, 100.0);
        assert_eq!(outcome.vote_share_pct["BJP"], 36.67);
        assert_eq!(outcome.vote_share_pct["INC"], 63.33);
        assert_eq!(outcome.predicted_winner.expect("winner").party, "INC");
    }

    #[test]
    fn coverage_counts_distinct_booths() {
        let booths = vec![booth(1, 100), booth(2, 100)];
        let rows = vec![
            prediction(1, 1, 10, 50.0, json!({"A": 60.0})),
            prediction(2, 1, 11, 55.0, json!({"A": 40.0})),
        ];
        let outcome = constituency_rollup(&booths, &rows);
        assert_eq!(outcome.updated_booths, 1);
        assert_eq!(outcome.update_progress, 50.0);
    }

    #[test]
    fn repeat_submissions_add_contribution() {
        // Two workers on one booth double that booth's influence.
        let booths = vec![booth(1, 100), booth(2, 100)];
        let rows = vec![
            prediction(1, 1, 10, 50.0, json!({"A": 100.0})),
            prediction(2, 1, 11, 50.0, json!({"A": 100.0})),
            prediction(3, 2, 12, 50.0, json!({"B": 100.0})),
        ];
        let outcome = constituency_rollup(&booths, &rows);
        assert_eq!(outcome.vote_share_pct["A"], 66.67);
        assert_eq!(outcome.vote_share_pct["B"], 33.33);
    }

    #[test]
    fn tie_breaks_to_lexicographically_smallest_party() {
        let booths = vec![booth(1, 200)];
        let rows = vec![prediction(1, 1, 10, 50.0, json!({"ZPP": 50.0, "AAP": 50.0}))];
        let outcome = constituency_rollup(&booths, &rows);
        assert_eq!(outcome.predicted_winner.expect("winner").party, "AAP");
    }

    #[test]
    fn malformed_share_rows_are_skipped() {
        let booths = vec![booth(1, 100), booth(2, 100)];
        let rows = vec![
            prediction(1, 1, 10, 50.0, json!("not a map")),
            prediction(2, 2, 11, 50.0, json!({"A": 100.0})),
        ];
        let outcome = constituency_rollup(&booths, &rows);
        assert_eq!(outcome.updated_booths, 1);
        assert_eq!(outcome.vote_share_pct.len(), 1);
        assert_eq!(outcome.predicted_winner.expect("winner").party, "A");
    }

    #[test]
    fn out_of_scope_predictions_are_ignored() {
        let booths = vec![booth(1, 100)];
        let rows = vec![
            prediction(1, 1, 10, 50.0, json!({"A": 100.0})),
            prediction(2, 99, 11, 50.0, json!({"B": 100.0})),
        ];
        let outcome = constituency_rollup(&booths, &rows);
        assert_eq!(outcome.updated_booths, 1);
        assert!(!outcome.vote_share_pct.contains_key("B"));
    }

    #[test]
    fn zero_turnout_still_counts_as_coverage() {
        let booths = vec![booth(1, 100)];
        let rows = vec![prediction(1, 1, 10, 0.0, json!({"A": 100.0}))];
        let outcome = constituency_rollup(&booths, &rows);
        assert_eq!(outcome.updated_booths, 1);
        // All contributions are zero; shares stay zero rather than dividing.
        assert_eq!(outcome.vote_share_pct["A"], 0.0);
    }

    #[test]
    fn coverage_pct_rounds_to_two_decimals() {
        assert_eq!(coverage_pct(0, 0), 0.0);
        assert_eq!(coverage_pct(3, 1), 33.33);
        assert_eq!(coverage_pct(3, 2), 66.67);
        assert_eq!(coverage_pct(8, 8), 100.0);
    }
}
