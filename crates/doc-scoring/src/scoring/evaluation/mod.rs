mod criteria;
mod filters;

pub use criteria::{CriterionEvaluation, FilterTrace};

use serde::{Deserialize, Serialize};

use super::document::DocumentSnapshot;
use super::domain::{CriterionId, ProfileId, ScoringProfile};

/// Scores a document against a profile. Pure: the same inputs always give the same outcome.
pub fn score(profile: &ScoringProfile, document: &DocumentSnapshot) -> ScoreOutcome {
    let mut total_score: u32 = 0;
    let mut breakdown = Vec::with_capacity(profile.criteria.len());

    for criterion in &profile.criteria {
        let evaluation = criterion.evaluate(document);
        let points = criterion.points.value();
        if evaluation.satisfied {
            total_score += points;
        }
        breakdown.push(CriterionScore {
            criterion_id: criterion.id.clone(),
            name: criterion.name.clone(),
            awarded: evaluation.satisfied,
            points,
            filters: evaluation.filters,
        });
    }

    ScoreOutcome {
        profile_id: profile.id.clone(),
        total_score,
        max_possible_score: profile.max_possible_points(),
        breakdown,
    }
}

/// Contribution of one criterion, in profile order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub criterion_id: CriterionId,
    pub name: String,
    pub awarded: bool,
    pub points: u32,
    pub filters: Vec<FilterTrace>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub profile_id: ProfileId,
    pub total_score: u32,
    pub max_possible_score: u32,
    pub breakdown: Vec<CriterionScore>,
}

impl ScoreOutcome {
    /// Share of the attainable points, rounded to two decimals; 0 for an empty profile.
    pub fn percentage(&self) -> f64 {
        if self.max_possible_score == 0 {
            return 0.0;
        }
        let ratio = f64::from(self.total_score) / f64::from(self.max_possible_score) * 100.0;
        (ratio * 100.0).round() / 100.0
    }

    pub fn awarded(&self) -> impl Iterator<Item = &CriterionScore> {
        self.breakdown.iter().filter(|entry| entry.awarded)
    }
}
