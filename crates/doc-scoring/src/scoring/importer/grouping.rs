use super::parser::SourcedRule;
use super::{FlatRule, RuleTemplate};

/// Groups CSV rules into templates by profile name, in order of first appearance.
pub(crate) fn group_by_profile(rules: Vec<SourcedRule>) -> Vec<RuleTemplate> {
    let mut templates: Vec<RuleTemplate> = Vec::new();

    for SourcedRule { profile, rule } in rules {
        match templates
            .iter_mut()
            .find(|template| template.name.as_deref() == Some(profile.as_str()))
        {
            Some(template) => template.rules.push(rule),
            None => templates.push(RuleTemplate {
                id: None,
                name: Some(profile),
                rules: vec![rule],
            }),
        }
    }

    templates
}

/// Groups a profile's rules by trimmed field name, preserving first-appearance order.
pub(crate) fn group_by_field(rules: &[FlatRule]) -> Vec<(&str, Vec<&FlatRule>)> {
    let mut groups: Vec<(&str, Vec<&FlatRule>)> = Vec::new();

    for rule in rules {
        let key = rule.field_name.trim();
        match groups.iter_mut().find(|(field_name, _)| *field_name == key) {
            Some((_, members)) => members.push(rule),
            None => groups.push((key, vec![rule])),
        }
    }

    groups
}
