use super::super::document::DocumentSnapshot;
use super::super::domain::{
    DateCondition, FieldCheck, Filter, FilterPredicate, TextCondition, TextMatch, TypeCondition,
};

impl Filter {
    /// Evaluates the predicate against a document. Filters are validated on construction,
    /// so evaluation cannot fail.
    pub fn evaluate(&self, document: &DocumentSnapshot) -> bool {
        self.predicate.evaluate(document)
    }
}

impl FilterPredicate {
    pub fn evaluate(&self, document: &DocumentSnapshot) -> bool {
        match self {
            FilterPredicate::DocumentText(text) => text.evaluate(&document.text),
            FilterPredicate::FilePath(text) => text.evaluate(&document.file_path),
            FilterPredicate::FileName(text) => text.evaluate(&document.file_name),
            FilterPredicate::Language(text) => text.evaluate(&document.language),
            FilterPredicate::Field { field_name, check } => {
                let extracted = document.field(field_name);
                match check {
                    FieldCheck::IsFound => extracted.is_some(),
                    FieldCheck::IsNotFound => extracted.is_none(),
                    FieldCheck::Contains(needle) => {
                        extracted.is_some_and(|value| contains_ignore_case(value, needle))
                    }
                    FieldCheck::DoesNotContain(needle) => {
                        extracted.map_or(true, |value| !contains_ignore_case(value, needle))
                    }
                }
            }
            FilterPredicate::UploadedDate { condition, date } => {
                let uploaded_on = document.uploaded_on();
                match condition {
                    DateCondition::Is => uploaded_on == *date,
                    DateCondition::IsBefore => uploaded_on < *date,
                    DateCondition::IsAfter => uploaded_on > *date,
                    DateCondition::IsOnOrBefore => uploaded_on <= *date,
                    DateCondition::IsOnOrAfter => uploaded_on >= *date,
                }
            }
            FilterPredicate::DocumentType {
                condition,
                document_type,
            } => {
                let matches = document.document_type.as_deref() == Some(document_type.label());
                match condition {
                    TypeCondition::Is => matches,
                    TypeCondition::IsNot => !matches,
                }
            }
        }
    }
}

impl TextMatch {
    fn evaluate(&self, haystack: &str) -> bool {
        let found = contains_ignore_case(haystack, &self.value);
        match self.condition {
            TextCondition::Contains => found,
            TextCondition::DoesNotContain => !found,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
