use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{FilterDraft, ValidationError};

/// Identifier wrapper for scoring profiles, unique within a profile store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(pub String);

/// Identifier wrapper for criteria, unique within their profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

/// Identifier wrapper for filters, unique within their criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterId(pub String);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Weight awarded by a satisfied criterion. Only values from [`Points::CATALOG`] exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Points(u32);

impl Points {
    pub const CATALOG: [u32; 11] = [1, 2, 3, 4, 5, 10, 15, 20, 25, 50, 100];

    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if Self::CATALOG.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::PointsOutOfCatalog(value))
        }
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Default for Points {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u32> for Points {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Points> for u32 {
    fn from(points: Points) -> Self {
        points.0
    }
}

/// Boolean combinator applied to a criterion's filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchCondition {
    #[default]
    All,
    Some,
}

impl MatchCondition {
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Some => "SOME",
        }
    }
}

/// Document classifications a `DocumentType` filter may compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "NDA")]
    Nda,
    #[serde(rename = "Purchase Agreement")]
    PurchaseAgreement,
    #[serde(rename = "Employment Agreement")]
    EmploymentAgreement,
    #[serde(rename = "Service Agreement")]
    ServiceAgreement,
    #[serde(rename = "License Agreement")]
    LicenseAgreement,
    #[serde(rename = "Lease Agreement")]
    LeaseAgreement,
    #[serde(rename = "Partnership Agreement")]
    PartnershipAgreement,
    #[serde(rename = "Consulting Agreement")]
    ConsultingAgreement,
    #[serde(rename = "Sales Agreement")]
    SalesAgreement,
    #[serde(rename = "Settlement Agreement")]
    SettlementAgreement,
}

impl DocumentType {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Nda,
            Self::PurchaseAgreement,
            Self::EmploymentAgreement,
            Self::ServiceAgreement,
            Self::LicenseAgreement,
            Self::LeaseAgreement,
            Self::PartnershipAgreement,
            Self::ConsultingAgreement,
            Self::SalesAgreement,
            Self::SettlementAgreement,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Nda => "NDA",
            Self::PurchaseAgreement => "Purchase Agreement",
            Self::EmploymentAgreement => "Employment Agreement",
            Self::ServiceAgreement => "Service Agreement",
            Self::LicenseAgreement => "License Agreement",
            Self::LeaseAgreement => "Lease Agreement",
            Self::PartnershipAgreement => "Partnership Agreement",
            Self::ConsultingAgreement => "Consulting Agreement",
            Self::SalesAgreement => "Sales Agreement",
            Self::SettlementAgreement => "Settlement Agreement",
        }
    }

    /// Exact label lookup; catalog labels are part of the persisted contract.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|candidate| candidate.label() == label)
    }
}

/// Wire tag of a filter, as stored under the `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    DocumentText,
    Field,
    UploadedDate,
    DocumentType,
    FilePath,
    Language,
    FileName,
}

impl FilterKind {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::DocumentText,
            Self::Field,
            Self::UploadedDate,
            Self::DocumentType,
            Self::FilePath,
            Self::Language,
            Self::FileName,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::DocumentText => "Document Text",
            Self::Field => "Field",
            Self::UploadedDate => "Uploaded Date",
            Self::DocumentType => "Document Type",
            Self::FilePath => "File Path",
            Self::Language => "Language",
            Self::FileName => "File Name",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared by the document text, file path, file name and language filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextCondition {
    Contains,
    DoesNotContain,
}

impl TextCondition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::DoesNotContain => "does not contain",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_condition(raw).as_str() {
            "contains" => Some(Self::Contains),
            "does not contain" => Some(Self::DoesNotContain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionCondition {
    ExtractionContains,
    ExtractionDoesNotContain,
    IsFound,
    IsNotFound,
}

impl ExtractionCondition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtractionContains => "extraction contains",
            Self::ExtractionDoesNotContain => "extraction does not contain",
            Self::IsFound => "is found",
            Self::IsNotFound => "is not found",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_condition(raw).as_str() {
            "extraction contains" => Some(Self::ExtractionContains),
            "extraction does not contain" => Some(Self::ExtractionDoesNotContain),
            "is found" => Some(Self::IsFound),
            "is not found" => Some(Self::IsNotFound),
            _ => None,
        }
    }

    pub const fn requires_comparison(self) -> bool {
        matches!(
            self,
            Self::ExtractionContains | Self::ExtractionDoesNotContain
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateCondition {
    Is,
    IsBefore,
    IsAfter,
    IsOnOrBefore,
    IsOnOrAfter,
}

impl DateCondition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::IsBefore => "is before",
            Self::IsAfter => "is after",
            Self::IsOnOrBefore => "is on or before",
            Self::IsOnOrAfter => "is on or after",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_condition(raw).as_str() {
            "is" => Some(Self::Is),
            "is before" => Some(Self::IsBefore),
            "is after" => Some(Self::IsAfter),
            "is on or before" => Some(Self::IsOnOrBefore),
            "is on or after" => Some(Self::IsOnOrAfter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCondition {
    Is,
    IsNot,
}

impl TypeCondition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::IsNot => "is not",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_condition(raw).as_str() {
            "is" => Some(Self::Is),
            "is not" => Some(Self::IsNot),
            _ => None,
        }
    }
}

fn normalize_condition(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Case-insensitive substring test against one document attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub condition: TextCondition,
    pub value: String,
}

/// What a `Field` filter checks about an extracted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    Contains(String),
    DoesNotContain(String),
    IsFound,
    IsNotFound,
}

impl FieldCheck {
    pub fn condition(&self) -> ExtractionCondition {
        match self {
            Self::Contains(_) => ExtractionCondition::ExtractionContains,
            Self::DoesNotContain(_) => ExtractionCondition::ExtractionDoesNotContain,
            Self::IsFound => ExtractionCondition::IsFound,
            Self::IsNotFound => ExtractionCondition::IsNotFound,
        }
    }

    pub fn comparison(&self) -> Option<&str> {
        match self {
            Self::Contains(value) | Self::DoesNotContain(value) => Some(value),
            Self::IsFound | Self::IsNotFound => None,
        }
    }
}

/// A validated predicate; each variant carries exactly the operands its type needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPredicate {
    DocumentText(TextMatch),
    Field {
        field_name: String,
        check: FieldCheck,
    },
    UploadedDate {
        condition: DateCondition,
        date: NaiveDate,
    },
    DocumentType {
        condition: TypeCondition,
        document_type: DocumentType,
    },
    FilePath(TextMatch),
    FileName(TextMatch),
    Language(TextMatch),
}

impl FilterPredicate {
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::DocumentText(_) => FilterKind::DocumentText,
            Self::Field { .. } => FilterKind::Field,
            Self::UploadedDate { .. } => FilterKind::UploadedDate,
            Self::DocumentType { .. } => FilterKind::DocumentType,
            Self::FilePath(_) => FilterKind::FilePath,
            Self::FileName(_) => FilterKind::FileName,
            Self::Language(_) => FilterKind::Language,
        }
    }
}

/// A filter owned by a criterion. Serialized through [`FilterDraft`], so every filter read
/// back from storage passes the same validation as a freshly added one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FilterDraft", into = "FilterDraft")]
pub struct Filter {
    pub id: FilterId,
    pub predicate: FilterPredicate,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predicate {
            FilterPredicate::DocumentText(text)
            | FilterPredicate::FilePath(text)
            | FilterPredicate::FileName(text)
            | FilterPredicate::Language(text) => write!(
                f,
                "{} {} \"{}\"",
                self.predicate.kind().label(),
                text.condition.as_str(),
                text.value
            ),
            FilterPredicate::Field { field_name, check } => match check.comparison() {
                Some(value) => write!(
                    f,
                    "{} {} \"{}\"",
                    field_name,
                    check.condition().as_str(),
                    value
                ),
                None => write!(f, "{} {}", field_name, check.condition().as_str()),
            },
            FilterPredicate::UploadedDate { condition, date } => {
                write!(f, "Uploaded Date {} {}", condition.as_str(), date)
            }
            FilterPredicate::DocumentType {
                condition,
                document_type,
            } => write!(
                f,
                "Document Type {} {}",
                condition.as_str(),
                document_type.label()
            ),
        }
    }
}

/// Weighted boolean rule over an ordered list of filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    #[serde(default)]
    pub points: Points,
    #[serde(default)]
    pub match_condition: MatchCondition,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Criterion {
    pub fn filter(&self, id: &FilterId) -> Option<&Filter> {
        self.filters.iter().find(|filter| &filter.id == id)
    }
}

/// Named, ordered collection of criteria representing one scoring scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringProfile {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

impl ScoringProfile {
    pub fn criterion(&self, id: &CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| &criterion.id == id)
    }

    pub fn max_possible_points(&self) -> u32 {
        self.criteria
            .iter()
            .map(|criterion| criterion.points.value())
            .sum()
    }
}

/// The persisted unit: every profile plus the active selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSet {
    pub profiles: Vec<ScoringProfile>,
    pub active_profile_id: ProfileId,
}

impl ProfileSet {
    pub const DEFAULT_PROFILE_ID: &'static str = "profile-1";
    pub const DEFAULT_PROFILE_NAME: &'static str = "Scoring Profile A";

    /// Restores the store invariants on hydrated data. Ids must be unique in their scope and
    /// names non-blank; a dangling active id is repaired to the first profile.
    pub(crate) fn into_consistent(mut self) -> Result<Self, InconsistentProfileSet> {
        let first = self
            .profiles
            .first()
            .map(|profile| profile.id.clone())
            .ok_or(InconsistentProfileSet::Empty)?;

        let mut profile_ids = HashSet::new();
        for profile in &self.profiles {
            if !profile_ids.insert(&profile.id) {
                return Err(InconsistentProfileSet::DuplicateProfileId(profile.id.clone()));
            }
            if profile.name.trim().is_empty() {
                return Err(InconsistentProfileSet::BlankProfileName(profile.id.clone()));
            }
            check_criteria(profile)?;
        }

        if !profile_ids.contains(&self.active_profile_id) {
            self.active_profile_id = first;
        }
        Ok(self)
    }
}

fn check_criteria(profile: &ScoringProfile) -> Result<(), InconsistentProfileSet> {
    let mut criterion_ids = HashSet::new();
    for criterion in &profile.criteria {
        if !criterion_ids.insert(&criterion.id) {
            return Err(InconsistentProfileSet::DuplicateCriterionId {
                profile_id: profile.id.clone(),
                criterion_id: criterion.id.clone(),
            });
        }
        if criterion.name.trim().is_empty() {
            return Err(InconsistentProfileSet::BlankCriterionName {
                profile_id: profile.id.clone(),
                criterion_id: criterion.id.clone(),
            });
        }

        let mut filter_ids = HashSet::new();
        if let Some(filter) = criterion
            .filters
            .iter()
            .find(|filter| !filter_ids.insert(&filter.id))
        {
            return Err(InconsistentProfileSet::DuplicateFilterId {
                criterion_id: criterion.id.clone(),
                filter_id: filter.id.clone(),
            });
        }
    }
    Ok(())
}

/// Why a decoded profile set cannot be taken as the store's state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InconsistentProfileSet {
    #[error("profile set contains no profiles")]
    Empty,
    #[error("profile id '{0}' appears more than once")]
    DuplicateProfileId(ProfileId),
    #[error("profile '{0}' has a blank name")]
    BlankProfileName(ProfileId),
    #[error("criterion id '{criterion_id}' appears more than once in profile '{profile_id}'")]
    DuplicateCriterionId {
        profile_id: ProfileId,
        criterion_id: CriterionId,
    },
    #[error("criterion '{criterion_id}' in profile '{profile_id}' has a blank name")]
    BlankCriterionName {
        profile_id: ProfileId,
        criterion_id: CriterionId,
    },
    #[error("filter id '{filter_id}' appears more than once in criterion '{criterion_id}'")]
    DuplicateFilterId {
        criterion_id: CriterionId,
        filter_id: FilterId,
    },
}

impl Default for ProfileSet {
    fn default() -> Self {
        let id = ProfileId(Self::DEFAULT_PROFILE_ID.to_string());
        Self {
            profiles: vec![ScoringProfile {
                id: id.clone(),
                name: Self::DEFAULT_PROFILE_NAME.to_string(),
                criteria: Vec::new(),
            }],
            active_profile_id: id,
        }
    }
}

/// Field names offered when no extraction schema has been selected yet.
pub const DEFAULT_FIELD_NAMES: [&str; 7] = [
    "40 Act Assignment",
    "Absence of Certain Change",
    "Absence of Litigation",
    "Date",
    "Parties",
    "Representation",
    "Title",
];
