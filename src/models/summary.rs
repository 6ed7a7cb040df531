use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::directory::BoothView;
use crate::models::prediction::PredictionView;
use crate::rollup::RollupOutcome;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstituencySummaryView {
    pub constituency: ConstituencyRef,
    pub predicted_winner: Option<PredictedWinnerView>,
    pub party_vote_share: Vec<PartyShareView>,
    pub booth_stats: BoothStatsView,
    pub update_progress: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstituencyRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedWinnerView {
    pub party: String,
    pub vote_share: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyShareView {
    pub party: String,
    pub vote_share: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoothStatsView {
    pub total_booths: u64,
    pub updated_booths: u64,
}

impl ConstituencySummaryView {
    /// Shape an engine outcome for dashboard consumption. Party shares are
    /// listed strongest first; ties keep name order.
    pub fn from_outcome(
        constituency: ConstituencyRef,
        outcome: RollupOutcome,
        last_updated: Option<DateTime<Utc>>,
    ) -> Self {
        let mut party_vote_share: Vec<PartyShareView> = outcome
            .vote_share_pct
            .into_iter()
            .map(|(party, vote_share)| PartyShareView { party, vote_share })
            .collect();
        party_vote_share.sort_by(|a, b| {
            b.vote_share
                .partial_cmp(&a.vote_share)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.party.cmp(&b.party))
        });

        Self {
            constituency,
            predicted_winner: outcome.predicted_winner.map(|winner| PredictedWinnerView {
                party: winner.party,
                vote_share: winner.vote_share_pct,
            }),
            party_vote_share,
            booth_stats: BoothStatsView {
                total_booths: outcome.total_booths,
                updated_booths: outcome.updated_booths,
            },
            update_progress: outcome.update_progress,
            last_updated,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummaryView {
    pub campaign: CampaignRef,
    pub total_constituencies: u64,
    pub total_booths: u64,
    pub updated_booths: u64,
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoothSummaryView {
    pub booth: BoothView,
    pub predictions: Vec<PredictionView>,
}
