use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::FlatRule;

/// A CSV row: one flat rule tagged with the profile it belongs to.
#[derive(Debug)]
pub(crate) struct SourcedRule {
    pub(crate) profile: String,
    pub(crate) rule: FlatRule,
}

pub(crate) fn parse_rules<R: Read>(reader: R) -> Result<Vec<SourcedRule>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rules = Vec::new();

    for record in csv_reader.deserialize::<RuleRow>() {
        let row = record?;
        rules.push(SourcedRule {
            profile: row.profile,
            rule: FlatRule {
                field_name: row.field_name,
                condition: row.condition,
                answer: row.answer,
                points: row.points,
            },
        });
    }

    Ok(rules)
}

#[derive(Debug, Deserialize)]
struct RuleRow {
    #[serde(rename = "Profile")]
    profile: String,
    #[serde(rename = "Field Name")]
    field_name: String,
    #[serde(rename = "Condition", default)]
    condition: String,
    #[serde(rename = "Answer", default, deserialize_with = "empty_string_as_none")]
    answer: Option<String>,
    #[serde(rename = "Points", default)]
    points: Option<u32>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
