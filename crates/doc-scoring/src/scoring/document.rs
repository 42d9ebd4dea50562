use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Read-only view of a document as supplied by the extraction service.
///
/// `fields` distinguishes an absent field from one extracted with an empty value; a `null`
/// value in the payload counts as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "present_fields")]
    pub fields: BTreeMap<String, String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub language: String,
}

impl DocumentSnapshot {
    pub fn new(uploaded_at: DateTime<Utc>) -> Self {
        Self {
            text: String::new(),
            fields: BTreeMap::new(),
            uploaded_at,
            document_type: None,
            file_name: String::new(),
            file_path: String::new(),
            language: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_document_type(mut self, label: impl Into<String>) -> Self {
        self.document_type = Some(label.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, name: impl Into<String>) -> Self {
        self.file_path = path.into();
        self.file_name = name.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Upload timestamp truncated to a calendar date (UTC).
    pub fn uploaded_on(&self) -> NaiveDate {
        self.uploaded_at.date_naive()
    }
}

fn present_fields<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn null_field_values_are_treated_as_absent() {
        let raw = serde_json::json!({
            "text": "Master services agreement",
            "fields": { "Title": "MSA", "Parties": null, "Date": "" },
            "uploadedAt": "2025-03-04T23:30:00Z",
            "documentType": "Service Agreement",
            "fileName": "msa.pdf",
            "filePath": "/contracts/2025/msa.pdf",
            "language": "en"
        });
        let document: DocumentSnapshot = serde_json::from_value(raw).expect("parses");

        assert_eq!(document.field("Title"), Some("MSA"));
        assert_eq!(document.field("Parties"), None);
        assert_eq!(document.field("Date"), Some(""));
        assert_eq!(
            document.uploaded_on(),
            NaiveDate::from_ymd_opt(2025, 3, 4).expect("valid date")
        );
    }

    #[test]
    fn builder_fills_every_attribute() {
        let uploaded_at = Utc
            .with_ymd_and_hms(2025, 1, 2, 8, 0, 0)
            .single()
            .expect("valid timestamp");
        let document = DocumentSnapshot::new(uploaded_at)
            .with_text("Confidential")
            .with_field("Title", "NDA")
            .with_document_type("NDA")
            .with_file("/legal/nda.docx", "nda.docx")
            .with_language("en-US");

        assert_eq!(document.text, "Confidential");
        assert_eq!(document.document_type.as_deref(), Some("NDA"));
        assert_eq!(document.file_name, "nda.docx");
        assert_eq!(document.file_path, "/legal/nda.docx");
        assert_eq!(document.language, "en-US");
    }
}
