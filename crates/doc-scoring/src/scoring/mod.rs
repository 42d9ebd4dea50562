//! Scoring profiles, criteria and filters, plus the store that keeps them persisted.

pub mod document;
pub mod domain;
pub mod evaluation;
pub mod importer;
pub mod persistence;
pub mod router;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use document::DocumentSnapshot;
pub use domain::{
    Criterion, CriterionId, DocumentType, Filter, FilterId, FilterKind, FilterPredicate,
    InconsistentProfileSet, MatchCondition, Points, ProfileId, ProfileSet, ScoringProfile,
    DEFAULT_FIELD_NAMES,
};
pub use evaluation::{score, CriterionScore, ScoreOutcome};
pub use importer::{FlatRule, RuleImportError, RuleImporter, RuleTemplate};
pub use persistence::{FileSnapshotStore, InMemorySnapshotStore, SnapshotStore, StoreError};
pub use router::scoring_router;
pub use store::{
    CriterionDraft, CriterionPatch, EntityKind, ProfilePatch, ProfileStore, ProfileStoreError,
};
pub use validation::{FilterDraft, ValidationError};
