use serde::{Deserialize, Serialize};

use super::super::document::DocumentSnapshot;
use super::super::domain::{Criterion, FilterId, MatchCondition};

/// Outcome of one filter inside a criterion, kept for audit trails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTrace {
    pub filter_id: FilterId,
    pub description: String,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionEvaluation {
    pub satisfied: bool,
    pub filters: Vec<FilterTrace>,
}

impl Criterion {
    /// ALL over no filters is vacuously true; SOME over no filters is false.
    pub fn evaluate(&self, document: &DocumentSnapshot) -> CriterionEvaluation {
        let filters: Vec<FilterTrace> = self
            .filters
            .iter()
            .map(|filter| FilterTrace {
                filter_id: filter.id.clone(),
                description: filter.to_string(),
                matched: filter.evaluate(document),
            })
            .collect();

        let satisfied = match self.match_condition {
            MatchCondition::All => filters.iter().all(|trace| trace.matched),
            MatchCondition::Some => filters.iter().any(|trace| trace.matched),
        };

        CriterionEvaluation { satisfied, filters }
    }
}
