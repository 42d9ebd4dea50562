use super::common::*;
use chrono::NaiveDate;

use crate::scoring::domain::{
    DateCondition, DocumentType, FieldCheck, Filter, FilterId, FilterPredicate, MatchCondition,
    TextCondition, TextMatch, TypeCondition,
};
use crate::scoring::evaluation::score;

fn predicate(predicate: FilterPredicate) -> Filter {
    Filter {
        id: FilterId("filter-1".to_string()),
        predicate,
    }
}

fn text(condition: TextCondition, value: &str) -> TextMatch {
    TextMatch {
        condition,
        value: value.to_string(),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

#[test]
fn field_is_found_tracks_presence_of_the_key() {
    let filter = found_filter("filter-1", "Title");
    assert!(filter.evaluate(&document()));

    let mut untitled = document();
    untitled.fields.remove("Title");
    assert!(!filter.evaluate(&untitled));

    let empty_title = document().with_field("Title", "");
    assert!(filter.evaluate(&empty_title));
}

#[test]
fn document_text_does_not_contain_ignores_case() {
    let filter = predicate(FilterPredicate::DocumentText(text(
        TextCondition::DoesNotContain,
        "confidential",
    )));
    assert!(!filter.evaluate(&document()));

    let public = document().with_text("Public press release");
    assert!(filter.evaluate(&public));
}

#[test]
fn field_contains_variants_treat_absent_fields_asymmetrically() {
    let contains = predicate(FilterPredicate::Field {
        field_name: "Governing Law".to_string(),
        check: FieldCheck::Contains("delaware".to_string()),
    });
    let does_not_contain = predicate(FilterPredicate::Field {
        field_name: "Governing Law".to_string(),
        check: FieldCheck::DoesNotContain("delaware".to_string()),
    });

    assert!(!contains.evaluate(&document()));
    assert!(does_not_contain.evaluate(&document()));

    let governed = document().with_field("Governing Law", "State of Delaware");
    assert!(contains.evaluate(&governed));
    assert!(!does_not_contain.evaluate(&governed));
}

#[test]
fn uploaded_date_compares_calendar_days() {
    let uploaded = document();
    let cases = [
        (DateCondition::Is, date(2025, 3, 14), true),
        (DateCondition::IsBefore, date(2025, 3, 14), false),
        (DateCondition::IsOnOrBefore, date(2025, 3, 14), true),
        (DateCondition::IsAfter, date(2025, 3, 13), true),
        (DateCondition::IsOnOrAfter, date(2025, 3, 15), false),
    ];

    for (condition, date, expected) in cases {
        let filter = predicate(FilterPredicate::UploadedDate { condition, date });
        assert_eq!(filter.evaluate(&uploaded), expected, "{filter}");
    }
}

#[test]
fn document_type_requires_exact_label_match() {
    let is_service = predicate(FilterPredicate::DocumentType {
        condition: TypeCondition::Is,
        document_type: DocumentType::ServiceAgreement,
    });
    let is_not_nda = predicate(FilterPredicate::DocumentType {
        condition: TypeCondition::IsNot,
        document_type: DocumentType::Nda,
    });

    assert!(is_service.evaluate(&document()));
    assert!(is_not_nda.evaluate(&document()));

    let lowercase = document().with_document_type("service agreement");
    assert!(!is_service.evaluate(&lowercase));

    let mut unclassified = document();
    unclassified.document_type = None;
    assert!(!is_service.evaluate(&unclassified));
    assert!(is_not_nda.evaluate(&unclassified));
}

#[test]
fn file_and_language_filters_read_their_own_attribute() {
    let path = predicate(FilterPredicate::FilePath(text(TextCondition::Contains, "/2025/")));
    let name = predicate(FilterPredicate::FileName(text(TextCondition::Contains, "MSA")));
    let language = predicate(FilterPredicate::Language(text(
        TextCondition::DoesNotContain,
        "fr",
    )));

    assert!(path.evaluate(&document()));
    assert!(name.evaluate(&document()));
    assert!(language.evaluate(&document()));
}

#[test]
fn all_matches_iff_every_filter_matches_and_agrees_with_negated_some() {
    let doc = document();
    let filter_sets = vec![
        vec![found_filter("f1", "Title"), found_filter("f2", "Parties")],
        vec![found_filter("f1", "Title"), found_filter("f2", "Signature")],
        vec![found_filter("f1", "Signature")],
    ];

    for filters in filter_sets {
        let every = filters.iter().all(|filter| filter.evaluate(&doc));
        let all = criterion("c1", 5, MatchCondition::All, filters.clone());
        assert_eq!(all.evaluate(&doc).satisfied, every);

        let negated: Vec<_> = filters
            .iter()
            .map(|filter| match &filter.predicate {
                FilterPredicate::Field { field_name, .. } => {
                    not_found_filter(&filter.id.0, field_name)
                }
                _ => unreachable!("fixtures only use field filters"),
            })
            .collect();
        let some_negated = criterion("c2", 5, MatchCondition::Some, negated);
        assert_eq!(some_negated.evaluate(&doc).satisfied, !every);
    }
}

#[test]
fn empty_filter_lists_follow_the_combinator() {
    let doc = document();
    assert!(criterion("c1", 1, MatchCondition::All, Vec::new())
        .evaluate(&doc)
        .satisfied);
    assert!(!criterion("c2", 1, MatchCondition::Some, Vec::new())
        .evaluate(&doc)
        .satisfied);
}

#[test]
fn some_scores_when_only_one_alternative_is_present() {
    let doc = document().with_field("B", "present");
    let profile = profile(
        "profile-1",
        vec![criterion(
            "c1",
            10,
            MatchCondition::Some,
            vec![found_filter("f1", "A"), found_filter("f2", "B")],
        )],
    );

    let outcome = score(&profile, &doc);
    assert_eq!(outcome.total_score, 10);
    let traces: Vec<bool> = outcome.breakdown[0]
        .filters
        .iter()
        .map(|trace| trace.matched)
        .collect();
    assert_eq!(traces, vec![false, true]);
}

#[test]
fn total_is_the_sum_of_satisfied_criteria_only() {
    let doc = document();
    let profile = profile(
        "profile-1",
        vec![
            criterion("c1", 5, MatchCondition::All, vec![found_filter("f1", "Title")]),
            criterion("c2", 25, MatchCondition::All, vec![found_filter("f1", "Signature")]),
            criterion(
                "c3",
                10,
                MatchCondition::Some,
                vec![found_filter("f1", "Parties"), found_filter("f2", "Title")],
            ),
        ],
    );

    let outcome = score(&profile, &doc);
    let expected: u32 = profile
        .criteria
        .iter()
        .filter(|criterion| criterion.evaluate(&doc).satisfied)
        .map(|criterion| criterion.points.value())
        .sum();

    assert_eq!(outcome.total_score, expected);
    assert_eq!(outcome.total_score, 15);
    assert_eq!(outcome.max_possible_score, 40);
    assert_eq!(outcome.percentage(), 37.5);
    let awarded: Vec<&str> = outcome
        .awarded()
        .map(|entry| entry.criterion_id.0.as_str())
        .collect();
    assert_eq!(awarded, vec!["c1", "c3"]);
    assert_eq!(
        outcome.breakdown[1].filters[0].description,
        "Signature is found"
    );
}

#[test]
fn empty_profile_scores_zero_percent() {
    let outcome = score(&profile("profile-1", Vec::new()), &document());
    assert_eq!(outcome.total_score, 0);
    assert_eq!(outcome.max_possible_score, 0);
    assert_eq!(outcome.percentage(), 0.0);
}
