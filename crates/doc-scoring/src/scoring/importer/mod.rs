mod grouping;
mod parser;

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    Criterion, CriterionId, ExtractionCondition, Filter, FilterId, MatchCondition, Points,
    ProfileId, ScoringProfile,
};
use super::validation::{self, FilterDraft, ValidationError};

const FOUND_CONDITION: &str = "is_found";
const DEFAULT_PROFILE_NAME: &str = "Scoring Profile";

/// One externally supplied rule: a field, a condition and an optional expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRule {
    pub field_name: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

impl FlatRule {
    fn is_found_check(&self) -> bool {
        let normalized: String = self
            .condition
            .trim()
            .chars()
            .map(|ch| if ch == ' ' || ch == '-' { '_' } else { ch })
            .collect::<String>()
            .to_ascii_lowercase();
        normalized == FOUND_CONDITION
    }

    /// Field filter payload for this rule under `field_name`, or `None` when the rule has
    /// neither an is-found condition nor an answer.
    fn filter_draft(&self, field_name: &str) -> Option<FilterDraft> {
        if self.is_found_check() {
            return Some(FilterDraft::field(
                field_name,
                ExtractionCondition::IsFound.as_str(),
                None,
            ));
        }
        self.answer
            .as_deref()
            .map(str::trim)
            .filter(|answer| !answer.is_empty())
            .map(|answer| {
                FilterDraft::field(
                    field_name,
                    ExtractionCondition::ExtractionContains.as_str(),
                    Some(answer),
                )
            })
    }
}

/// Flat rules belonging to one source profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<FlatRule>,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleImportError {
    #[error("failed to read rule export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rule CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid rule JSON data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rule for field '{field_name}' awards {points} points, which is not in the points catalog")]
    InvalidPoints { field_name: String, points: u32 },
    #[error("rule for field '{field_name}' is invalid: {source}")]
    InvalidRule {
        field_name: String,
        #[source]
        source: ValidationError,
    },
    #[error("profile id '{0}' appears more than once in the import")]
    DuplicateProfileId(ProfileId),
    #[error("import contained no scoring profiles")]
    Empty,
}

/// Converts flat rule lists into nested scoring profiles.
pub struct RuleImporter;

impl RuleImporter {
    /// Reads a CSV export with `Profile,Field Name,Condition,Answer,Points` headers.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RuleTemplate>, RuleImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RuleTemplate>, RuleImportError> {
        let rules = parser::parse_rules(reader)?;
        Ok(grouping::group_by_profile(rules))
    }

    /// Reads JSON templates: `[{ "id"?, "name", "rules": [...] }]`.
    pub fn from_json<R: Read>(reader: R) -> Result<Vec<RuleTemplate>, RuleImportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Builds one profile per template. Within a profile, rules sharing a field name become
    /// one criterion: a single rule matches with ALL, several rules are alternatives (SOME).
    pub fn build_profiles(
        templates: &[RuleTemplate],
    ) -> Result<Vec<ScoringProfile>, RuleImportError> {
        if templates.is_empty() {
            return Err(RuleImportError::Empty);
        }

        let mut profiles: Vec<ScoringProfile> = Vec::with_capacity(templates.len());
        for (profile_index, template) in templates.iter().enumerate() {
            let id = template
                .id
                .clone()
                .unwrap_or_else(|| ProfileId(format!("profile-{profile_index}")));
            if profiles.iter().any(|profile| profile.id == id) {
                return Err(RuleImportError::DuplicateProfileId(id));
            }

            let criteria = grouping::group_by_field(&template.rules)
                .into_iter()
                .enumerate()
                .map(|(criterion_index, (field_name, rules))| {
                    build_criterion(profile_index, criterion_index, field_name, &rules)
                })
                .collect::<Result<Vec<_>, _>>()?;

            profiles.push(ScoringProfile {
                id,
                name: template
                    .name
                    .clone()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
                criteria,
            });
        }

        info!(
            profiles = profiles.len(),
            criteria = profiles
                .iter()
                .map(|profile| profile.criteria.len())
                .sum::<usize>(),
            "scoring rules imported"
        );

        Ok(profiles)
    }
}

fn build_criterion(
    profile_index: usize,
    criterion_index: usize,
    field_name: &str,
    rules: &[&FlatRule],
) -> Result<Criterion, RuleImportError> {
    let invalid = |source: ValidationError| RuleImportError::InvalidRule {
        field_name: field_name.to_string(),
        source,
    };
    let name = validation::criterion_name(field_name).map_err(invalid)?;
    let points = group_points(&name, rules)?;
    let match_condition = if rules.len() > 1 {
        MatchCondition::Some
    } else {
        MatchCondition::All
    };

    let mut filters = Vec::with_capacity(rules.len());
    for (rule_index, rule) in rules.iter().enumerate() {
        match rule.filter_draft(&name) {
            Some(draft) => filters.push(Filter {
                id: FilterId(format!(
                    "filter-{profile_index}-{criterion_index}-{rule_index}"
                )),
                predicate: draft.validate().map_err(invalid)?,
            }),
            None => warn!(
                field_name = %name,
                condition = %rule.condition,
                "rule has neither an is_found condition nor an answer; skipped"
            ),
        }
    }

    Ok(Criterion {
        id: CriterionId(format!("criterion-{profile_index}-{criterion_index}")),
        name,
        points,
        match_condition,
        description: String::new(),
        filters,
    })
}

/// The first rule's points win; missing or zero points mean 1.
fn group_points(field_name: &str, rules: &[&FlatRule]) -> Result<Points, RuleImportError> {
    let resolve = |rule: &FlatRule| match rule.points {
        None | Some(0) => 1,
        Some(points) => points,
    };

    let Some(first) = rules.first() else {
        return Ok(Points::default());
    };
    let value = resolve(first);
    if rules.iter().any(|rule| resolve(rule) != value) {
        warn!(
            field_name,
            points = value,
            "rules grouped under one field disagree on points; using the first rule's value"
        );
    }

    Points::new(value).map_err(|_| RuleImportError::InvalidPoints {
        field_name: field_name.to_string(),
        points: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rule(field_name: &str, condition: &str, answer: Option<&str>, points: u32) -> FlatRule {
        FlatRule {
            field_name: field_name.to_string(),
            condition: condition.to_string(),
            answer: answer.map(str::to_string),
            points: Some(points),
        }
    }

    #[test]
    fn csv_rows_group_by_profile_in_first_appearance_order() {
        let csv = "Profile,Field Name,Condition,Answer,Points\n\
Due Diligence Scoring,Title,is_found,,5\n\
Credit Review,Parties,equals,Acme,10\n\
Due Diligence Scoring,Date,is_found,,5\n";
        let templates = RuleImporter::from_reader(Cursor::new(csv)).expect("parses");

        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].name.as_deref(), Some("Due Diligence Scoring"));
        assert_eq!(templates[0].rules.len(), 2);
        assert_eq!(templates[1].rules[0].answer.as_deref(), Some("Acme"));
        assert_eq!(templates[0].rules[0].answer, None);
    }

    #[test]
    fn condition_spelling_variants_count_as_is_found() {
        for condition in ["is_found", "Is Found", " is-found "] {
            assert!(rule("Title", condition, None, 1).is_found_check());
        }
        assert!(!rule("Title", "is not found", None, 1).is_found_check());
    }

    #[test]
    fn is_found_takes_precedence_over_an_answer() {
        let draft = rule("Title", "is_found", Some("MSA"), 1).filter_draft("Title");
        assert_eq!(draft, Some(FilterDraft::field("Title", "is found", None)));
    }

    #[test]
    fn answers_become_extraction_contains_filters() {
        let draft = rule("Parties", "equals", Some(" Acme "), 1).filter_draft("Parties");
        assert_eq!(
            draft,
            Some(FilterDraft::field("Parties", "extraction contains", Some("Acme")))
        );
        assert_eq!(rule("Parties", "equals", None, 1).filter_draft("Parties"), None);
    }

    #[test]
    fn disagreeing_points_resolve_to_first_rule() {
        let first = rule("Parties", "equals", Some("Acme"), 10);
        let second = rule("Parties", "equals", Some("Globex"), 25);
        let points = group_points("Parties", &[&first, &second]).expect("catalog points");
        assert_eq!(points.value(), 10);
    }

    #[test]
    fn missing_points_default_to_one_and_unknown_points_fail() {
        let mut unset = rule("Title", "is_found", None, 0);
        unset.points = None;
        assert_eq!(group_points("Title", &[&unset]).expect("defaults").value(), 1);

        let odd = rule("Title", "is_found", None, 7);
        assert!(matches!(
            group_points("Title", &[&odd]),
            Err(RuleImportError::InvalidPoints { points: 7, .. })
        ));
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = RuleImporter::from_path("./does-not-exist.csv").expect_err("io error");
        match error {
            RuleImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
