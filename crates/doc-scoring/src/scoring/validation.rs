use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    DateCondition, DocumentType, ExtractionCondition, FieldCheck, Filter, FilterId, FilterKind,
    FilterPredicate, TextCondition, TextMatch, TypeCondition,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Loose filter payload as supplied by callers and as stored on disk. Which keys matter
/// depends on `type`; [`FilterDraft::validate`] turns it into a typed predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FilterId>,
    #[serde(rename = "type")]
    pub kind: FilterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

impl FilterDraft {
    fn empty(kind: FilterKind) -> Self {
        Self {
            id: None,
            kind,
            text_condition: None,
            text_value: None,
            field_name: None,
            extraction_condition: None,
            field_value: None,
            date_condition: None,
            date_value: None,
            document_condition: None,
            document_type: None,
        }
    }

    /// Payload for the document text, file path, file name and language filters.
    pub fn text(kind: FilterKind, condition: &str, value: &str) -> Self {
        Self {
            text_condition: Some(condition.to_string()),
            text_value: Some(value.to_string()),
            ..Self::empty(kind)
        }
    }

    pub fn field(field_name: &str, condition: &str, value: Option<&str>) -> Self {
        Self {
            field_name: Some(field_name.to_string()),
            extraction_condition: Some(condition.to_string()),
            field_value: value.map(str::to_string),
            ..Self::empty(FilterKind::Field)
        }
    }

    pub fn uploaded_date(condition: &str, date: &str) -> Self {
        Self {
            date_condition: Some(condition.to_string()),
            date_value: Some(date.to_string()),
            ..Self::empty(FilterKind::UploadedDate)
        }
    }

    pub fn document_type(condition: &str, label: &str) -> Self {
        Self {
            document_condition: Some(condition.to_string()),
            document_type: Some(label.to_string()),
            ..Self::empty(FilterKind::DocumentType)
        }
    }

    /// Checks condition and operands against the legal set for the draft's type.
    pub fn validate(&self) -> Result<FilterPredicate, ValidationError> {
        let kind = self.kind;
        match kind {
            FilterKind::DocumentText => self.text_match(kind).map(FilterPredicate::DocumentText),
            FilterKind::FilePath => self.text_match(kind).map(FilterPredicate::FilePath),
            FilterKind::FileName => self.text_match(kind).map(FilterPredicate::FileName),
            FilterKind::Language => self.text_match(kind).map(FilterPredicate::Language),
            FilterKind::Field => {
                let field_name = required(&self.field_name, kind, "field name")?;
                let raw = required(&self.extraction_condition, kind, "extraction condition")?;
                let condition = ExtractionCondition::parse(raw)
                    .ok_or_else(|| unsupported(kind, raw))?;
                let check = match condition {
                    ExtractionCondition::IsFound => FieldCheck::IsFound,
                    ExtractionCondition::IsNotFound => FieldCheck::IsNotFound,
                    ExtractionCondition::ExtractionContains => {
                        FieldCheck::Contains(required(&self.field_value, kind, "field value")?.to_string())
                    }
                    ExtractionCondition::ExtractionDoesNotContain => FieldCheck::DoesNotContain(
                        required(&self.field_value, kind, "field value")?.to_string(),
                    ),
                };
                Ok(FilterPredicate::Field {
                    field_name: field_name.trim().to_string(),
                    check,
                })
            }
            FilterKind::UploadedDate => {
                let raw = required(&self.date_condition, kind, "date condition")?;
                let condition = DateCondition::parse(raw).ok_or_else(|| unsupported(kind, raw))?;
                let value = required(&self.date_value, kind, "date")?;
                let date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
                    ValidationError::InvalidDate {
                        value: value.to_string(),
                    }
                })?;
                Ok(FilterPredicate::UploadedDate { condition, date })
            }
            FilterKind::DocumentType => {
                let raw = required(&self.document_condition, kind, "document condition")?;
                let condition = TypeCondition::parse(raw).ok_or_else(|| unsupported(kind, raw))?;
                let label = required(&self.document_type, kind, "document type")?;
                let document_type = DocumentType::from_label(label).ok_or_else(|| {
                    ValidationError::UnknownDocumentType {
                        value: label.to_string(),
                    }
                })?;
                Ok(FilterPredicate::DocumentType {
                    condition,
                    document_type,
                })
            }
        }
    }

    fn text_match(&self, kind: FilterKind) -> Result<TextMatch, ValidationError> {
        let raw = required(&self.text_condition, kind, "text condition")?;
        let condition = TextCondition::parse(raw).ok_or_else(|| unsupported(kind, raw))?;
        let value = required(&self.text_value, kind, "text value")?;
        Ok(TextMatch {
            condition,
            value: value.to_string(),
        })
    }
}

fn required<'a>(
    value: &'a Option<String>,
    kind: FilterKind,
    operand: &'static str,
) -> Result<&'a str, ValidationError> {
    match value.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Ok(raw),
        _ => Err(ValidationError::MissingOperand { kind, operand }),
    }
}

fn unsupported(kind: FilterKind, condition: &str) -> ValidationError {
    ValidationError::UnsupportedCondition {
        kind,
        condition: condition.to_string(),
    }
}

impl TryFrom<FilterDraft> for Filter {
    type Error = ValidationError;

    fn try_from(draft: FilterDraft) -> Result<Self, Self::Error> {
        let predicate = draft.validate()?;
        let id = draft.id.ok_or(ValidationError::MissingFilterId)?;
        Ok(Filter { id, predicate })
    }
}

impl From<Filter> for FilterDraft {
    fn from(filter: Filter) -> Self {
        let kind = filter.predicate.kind();
        let mut draft = match filter.predicate {
            FilterPredicate::DocumentText(text)
            | FilterPredicate::FilePath(text)
            | FilterPredicate::FileName(text)
            | FilterPredicate::Language(text) => {
                FilterDraft::text(kind, text.condition.as_str(), &text.value)
            }
            FilterPredicate::Field { field_name, check } => {
                FilterDraft::field(&field_name, check.condition().as_str(), check.comparison())
            }
            FilterPredicate::UploadedDate { condition, date } => FilterDraft::uploaded_date(
                condition.as_str(),
                &date.format(DATE_FORMAT).to_string(),
            ),
            FilterPredicate::DocumentType {
                condition,
                document_type,
            } => FilterDraft::document_type(condition.as_str(), document_type.label()),
        };
        draft.id = Some(filter.id);
        draft
    }
}

/// Trimmed criterion name, rejected when blank.
pub fn criterion_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankCriterionName);
    }
    Ok(trimmed.to_string())
}

pub fn profile_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankProfileName);
    }
    Ok(trimmed.to_string())
}

/// Reasons a mutation payload is rejected before it touches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{kind} filters require a non-empty {operand}")]
    MissingOperand {
        kind: FilterKind,
        operand: &'static str,
    },
    #[error("'{condition}' is not a valid condition for {kind} filters")]
    UnsupportedCondition { kind: FilterKind, condition: String },
    #[error("'{value}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate { value: String },
    #[error("'{value}' is not a known document type")]
    UnknownDocumentType { value: String },
    #[error("stored filter is missing its id")]
    MissingFilterId,
    #[error("criterion name must not be blank")]
    BlankCriterionName,
    #[error("profile name must not be blank")]
    BlankProfileName,
    #[error("{0} points is not in the points catalog")]
    PointsOutOfCatalog(u32),
}
