use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::document::DocumentSnapshot;
use super::domain::{
    Criterion, CriterionId, Filter, FilterId, MatchCondition, Points, ProfileId, ProfileSet,
    ScoringProfile,
};
use super::evaluation::{self, ScoreOutcome};
use super::importer::{RuleImportError, RuleImporter, RuleTemplate};
use super::persistence::{SnapshotStore, StoreError};
use super::validation::{self, FilterDraft, ValidationError};

const DEFAULT_CRITERION_NAME: &str = "New Criterion";

/// Fields a caller may change on a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default)]
    pub name: Option<String>,
}

/// Payload for a new criterion; omitted fields take the defaults (ALL, 1 point).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub points: Option<Points>,
    #[serde(default)]
    pub match_condition: Option<MatchCondition>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub points: Option<Points>,
    #[serde(default)]
    pub match_condition: Option<MatchCondition>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Profile,
    Criterion,
    Filter,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Profile => write!(f, "scoring profile"),
            EntityKind::Criterion => write!(f, "criterion"),
            EntityKind::Filter => write!(f, "filter"),
        }
    }
}

/// Error raised by the profile store.
///
/// `NotFound`, `Invalid`, `LastProfile` and `Import` are expected outcomes and leave the
/// store untouched. `Persistence` means the in-memory mutation succeeded but could not be
/// written out.
#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityKind, id: String },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("the last remaining scoring profile cannot be deleted")]
    LastProfile,
    #[error(transparent)]
    Import(#[from] RuleImportError),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl ProfileStoreError {
    fn not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True when the call was refused without changing state.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }
}

/// Owns every scoring profile and the active selection, and writes the whole set to the
/// snapshot store after each successful mutation.
///
/// Mutations take `&mut self`; callers sharing a store across threads serialize access
/// themselves (the HTTP router wraps it in a mutex).
pub struct ProfileStore<S> {
    backend: S,
    key: String,
    state: ProfileSet,
    sequence: u64,
}

impl<S> ProfileStore<S>
where
    S: SnapshotStore,
{
    /// Loads the last persisted set. A missing, unreadable or invalid snapshot falls back to
    /// a single empty default profile.
    pub fn hydrate(backend: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = match backend.read(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<ProfileSet>(&raw) {
                Ok(set) => set.into_consistent().unwrap_or_else(|err| {
                    warn!(key = %key, error = %err, "persisted profile set is inconsistent; using default profile");
                    ProfileSet::default()
                }),
                Err(err) => {
                    warn!(key = %key, error = %err, "persisted profile set is corrupt; using default profile");
                    ProfileSet::default()
                }
            },
            Ok(None) => {
                debug!(key = %key, "no persisted profile set; using default profile");
                ProfileSet::default()
            }
            Err(err) => {
                warn!(key = %key, error = %err, "profile set unavailable; using default profile");
                ProfileSet::default()
            }
        };

        Self {
            backend,
            key,
            state,
            sequence: 1,
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn snapshot(&self) -> &ProfileSet {
        &self.state
    }

    pub fn profiles(&self) -> &[ScoringProfile] {
        &self.state.profiles
    }

    pub fn active_profile_id(&self) -> &ProfileId {
        &self.state.active_profile_id
    }

    pub fn active_profile(&self) -> Option<&ScoringProfile> {
        self.profile(&self.state.active_profile_id)
    }

    pub fn profile(&self, id: &ProfileId) -> Option<&ScoringProfile> {
        self.state.profiles.iter().find(|profile| &profile.id == id)
    }

    pub fn criterion(&self, profile_id: &ProfileId, criterion_id: &CriterionId) -> Option<&Criterion> {
        self.profile(profile_id)
            .and_then(|profile| profile.criterion(criterion_id))
    }

    /// Appends a profile and makes it active. A missing or blank name becomes
    /// `Scoring Profile <n+1>`.
    pub fn add_profile(&mut self, name: Option<&str>) -> Result<ScoringProfile, ProfileStoreError> {
        let name = match name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("Scoring Profile {}", self.state.profiles.len() + 1),
        };
        let profiles = &self.state.profiles;
        let id = allocate_id(&mut self.sequence, "profile", |candidate| {
            profiles.iter().any(|profile| profile.id.0 == candidate)
        });

        let profile = ScoringProfile {
            id: ProfileId(id),
            name,
            criteria: Vec::new(),
        };
        self.state.profiles.push(profile.clone());
        self.state.active_profile_id = profile.id.clone();

        debug!(profile_id = %profile.id, "scoring profile added");
        self.persist()?;
        Ok(profile)
    }

    pub fn update_profile(
        &mut self,
        id: &ProfileId,
        patch: ProfilePatch,
    ) -> Result<ScoringProfile, ProfileStoreError> {
        let name = patch
            .name
            .as_deref()
            .map(validation::profile_name)
            .transpose()?;

        let profile = profile_mut(&mut self.state.profiles, id)?;
        if let Some(name) = name {
            profile.name = name;
        }
        let updated = profile.clone();

        debug!(profile_id = %id, "scoring profile updated");
        self.persist()?;
        Ok(updated)
    }

    /// Refuses to remove the last profile. Deleting the active profile hands the active
    /// selection to the first remaining one.
    pub fn delete_profile(&mut self, id: &ProfileId) -> Result<(), ProfileStoreError> {
        let index = self
            .state
            .profiles
            .iter()
            .position(|profile| &profile.id == id)
            .ok_or_else(|| ProfileStoreError::not_found(EntityKind::Profile, id))?;
        if self.state.profiles.len() == 1 {
            warn!(profile_id = %id, "refusing to delete the last scoring profile");
            return Err(ProfileStoreError::LastProfile);
        }
        self.state.profiles.remove(index);

        if &self.state.active_profile_id == id {
            if let Some(first) = self.state.profiles.first() {
                self.state.active_profile_id = first.id.clone();
            }
        }

        debug!(profile_id = %id, "scoring profile deleted");
        self.persist()?;
        Ok(())
    }

    pub fn set_active_profile(&mut self, id: &ProfileId) -> Result<(), ProfileStoreError> {
        if self.profile(id).is_none() {
            return Err(ProfileStoreError::not_found(EntityKind::Profile, id));
        }
        self.state.active_profile_id = id.clone();

        debug!(profile_id = %id, "active scoring profile changed");
        self.persist()?;
        Ok(())
    }

    pub fn add_criterion(
        &mut self,
        profile_id: &ProfileId,
        draft: CriterionDraft,
    ) -> Result<Criterion, ProfileStoreError> {
        let name = match draft.name.as_deref() {
            Some(raw) => validation::criterion_name(raw)?,
            None => DEFAULT_CRITERION_NAME.to_string(),
        };

        let profile = profile_mut(&mut self.state.profiles, profile_id)?;
        let criteria = &profile.criteria;
        let id = allocate_id(&mut self.sequence, "criterion", |candidate| {
            criteria.iter().any(|criterion| criterion.id.0 == candidate)
        });

        let criterion = Criterion {
            id: CriterionId(id),
            name,
            points: draft.points.unwrap_or_default(),
            match_condition: draft.match_condition.unwrap_or_default(),
            description: draft.description.unwrap_or_default(),
            filters: Vec::new(),
        };
        profile.criteria.push(criterion.clone());

        debug!(profile_id = %profile_id, criterion_id = %criterion.id, "criterion added");
        self.persist()?;
        Ok(criterion)
    }

    pub fn update_criterion(
        &mut self,
        profile_id: &ProfileId,
        criterion_id: &CriterionId,
        patch: CriterionPatch,
    ) -> Result<Criterion, ProfileStoreError> {
        let name = patch
            .name
            .as_deref()
            .map(validation::criterion_name)
            .transpose()?;

        let criterion = criterion_mut(&mut self.state.profiles, profile_id, criterion_id)?;
        if let Some(name) = name {
            criterion.name = name;
        }
        if let Some(points) = patch.points {
            criterion.points = points;
        }
        if let Some(match_condition) = patch.match_condition {
            criterion.match_condition = match_condition;
        }
        if let Some(description) = patch.description {
            criterion.description = description;
        }
        let updated = criterion.clone();

        debug!(profile_id = %profile_id, criterion_id = %criterion_id, "criterion updated");
        self.persist()?;
        Ok(updated)
    }

    pub fn delete_criterion(
        &mut self,
        profile_id: &ProfileId,
        criterion_id: &CriterionId,
    ) -> Result<(), ProfileStoreError> {
        let profile = profile_mut(&mut self.state.profiles, profile_id)?;
        let index = profile
            .criteria
            .iter()
            .position(|criterion| &criterion.id == criterion_id)
            .ok_or_else(|| ProfileStoreError::not_found(EntityKind::Criterion, criterion_id))?;
        profile.criteria.remove(index);

        debug!(profile_id = %profile_id, criterion_id = %criterion_id, "criterion deleted");
        self.persist()?;
        Ok(())
    }

    /// Validates the payload before touching the criterion; the stored filter gets a fresh id.
    pub fn add_filter(
        &mut self,
        profile_id: &ProfileId,
        criterion_id: &CriterionId,
        draft: FilterDraft,
    ) -> Result<Filter, ProfileStoreError> {
        let criterion = criterion_mut(&mut self.state.profiles, profile_id, criterion_id)?;
        let predicate = draft.validate()?;

        let filters = &criterion.filters;
        let id = allocate_id(&mut self.sequence, "filter", |candidate| {
            filters.iter().any(|filter| filter.id.0 == candidate)
        });
        let filter = Filter {
            id: FilterId(id),
            predicate,
        };
        criterion.filters.push(filter.clone());

        debug!(
            profile_id = %profile_id,
            criterion_id = %criterion_id,
            filter_id = %filter.id,
            "filter added"
        );
        self.persist()?;
        Ok(filter)
    }

    /// Swaps a filter wholesale, keeping its id and position.
    pub fn replace_filter(
        &mut self,
        profile_id: &ProfileId,
        criterion_id: &CriterionId,
        filter_id: &FilterId,
        draft: FilterDraft,
    ) -> Result<Filter, ProfileStoreError> {
        let criterion = criterion_mut(&mut self.state.profiles, profile_id, criterion_id)?;
        let slot = criterion
            .filters
            .iter_mut()
            .find(|filter| &filter.id == filter_id)
            .ok_or_else(|| ProfileStoreError::not_found(EntityKind::Filter, filter_id))?;
        let predicate = draft.validate()?;
        slot.predicate = predicate;
        let replaced = slot.clone();

        debug!(
            profile_id = %profile_id,
            criterion_id = %criterion_id,
            filter_id = %filter_id,
            "filter replaced"
        );
        self.persist()?;
        Ok(replaced)
    }

    pub fn remove_filter(
        &mut self,
        profile_id: &ProfileId,
        criterion_id: &CriterionId,
        filter_id: &FilterId,
    ) -> Result<(), ProfileStoreError> {
        let criterion = criterion_mut(&mut self.state.profiles, profile_id, criterion_id)?;
        let index = criterion
            .filters
            .iter()
            .position(|filter| &filter.id == filter_id)
            .ok_or_else(|| ProfileStoreError::not_found(EntityKind::Filter, filter_id))?;
        criterion.filters.remove(index);

        debug!(
            profile_id = %profile_id,
            criterion_id = %criterion_id,
            filter_id = %filter_id,
            "filter removed"
        );
        self.persist()?;
        Ok(())
    }

    /// Replaces every profile with the imported ones and activates the first. Nothing
    /// changes when the import fails or yields no profile.
    pub fn import_rules(
        &mut self,
        templates: &[RuleTemplate],
    ) -> Result<Vec<ScoringProfile>, ProfileStoreError> {
        let profiles = RuleImporter::build_profiles(templates)?;
        let active_profile_id = profiles
            .first()
            .map(|profile| profile.id.clone())
            .ok_or(RuleImportError::Empty)?;

        self.state = ProfileSet {
            profiles: profiles.clone(),
            active_profile_id,
        };

        info!(
            profiles = profiles.len(),
            active_profile_id = %self.state.active_profile_id,
            "profile set replaced by import"
        );
        self.persist()?;
        Ok(profiles)
    }

    /// Scores a document with the given profile, or the active one when `None`.
    pub fn score(
        &self,
        profile_id: Option<&ProfileId>,
        document: &DocumentSnapshot,
    ) -> Result<ScoreOutcome, ProfileStoreError> {
        let id = profile_id.unwrap_or(&self.state.active_profile_id);
        let profile = self
            .profile(id)
            .ok_or_else(|| ProfileStoreError::not_found(EntityKind::Profile, id))?;
        Ok(evaluation::score(profile, document))
    }

    fn persist(&self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&self.state)?;
        self.backend.write(&self.key, &encoded).map_err(|err| {
            warn!(key = %self.key, error = %err, "failed to persist profile set");
            err
        })
    }
}

/// Next `<prefix>-<n>` not already taken in the owning scope.
fn allocate_id(sequence: &mut u64, prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = format!("{prefix}-{}", *sequence);
        *sequence += 1;
        if !taken(&candidate) {
            return candidate;
        }
    }
}

fn profile_mut<'a>(
    profiles: &'a mut [ScoringProfile],
    id: &ProfileId,
) -> Result<&'a mut ScoringProfile, ProfileStoreError> {
    profiles
        .iter_mut()
        .find(|profile| &profile.id == id)
        .ok_or_else(|| ProfileStoreError::not_found(EntityKind::Profile, id))
}

fn criterion_mut<'a>(
    profiles: &'a mut [ScoringProfile],
    profile_id: &ProfileId,
    criterion_id: &CriterionId,
) -> Result<&'a mut Criterion, ProfileStoreError> {
    profile_mut(profiles, profile_id)?
        .criteria
        .iter_mut()
        .find(|criterion| &criterion.id == criterion_id)
        .ok_or_else(|| ProfileStoreError::not_found(EntityKind::Criterion, criterion_id))
}
