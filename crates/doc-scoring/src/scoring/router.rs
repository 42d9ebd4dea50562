use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::document::DocumentSnapshot;
use super::domain::{
    CriterionId, DocumentType, FilterId, FilterKind, MatchCondition, Points, ProfileId,
    DEFAULT_FIELD_NAMES,
};
use super::evaluation::ScoreOutcome;
use super::importer::{RuleImporter, RuleTemplate};
use super::persistence::SnapshotStore;
use super::store::{CriterionDraft, CriterionPatch, ProfilePatch, ProfileStore, ProfileStoreError};
use super::validation::FilterDraft;
use crate::error::store_status;

/// Profile store shared between request handlers. Every mutation runs under the lock.
pub type SharedProfileStore<S> = Arc<Mutex<ProfileStore<S>>>;

/// Router builder exposing profile management, rule import and scoring endpoints.
pub fn scoring_router<S>(store: SharedProfileStore<S>) -> Router
where
    S: SnapshotStore + 'static,
{
    Router::new()
        .route("/api/v1/scoring/catalog", get(catalog_handler))
        .route(
            "/api/v1/scoring/profiles",
            get(list_profiles_handler::<S>).post(add_profile_handler::<S>),
        )
        .route(
            "/api/v1/scoring/profiles/:profile_id",
            get(get_profile_handler::<S>)
                .patch(update_profile_handler::<S>)
                .delete(delete_profile_handler::<S>),
        )
        .route(
            "/api/v1/scoring/active",
            get(active_profile_handler::<S>).put(set_active_handler::<S>),
        )
        .route(
            "/api/v1/scoring/profiles/:profile_id/criteria",
            post(add_criterion_handler::<S>),
        )
        .route(
            "/api/v1/scoring/profiles/:profile_id/criteria/:criterion_id",
            patch(update_criterion_handler::<S>).delete(delete_criterion_handler::<S>),
        )
        .route(
            "/api/v1/scoring/profiles/:profile_id/criteria/:criterion_id/filters",
            post(add_filter_handler::<S>),
        )
        .route(
            "/api/v1/scoring/profiles/:profile_id/criteria/:criterion_id/filters/:filter_id",
            put(replace_filter_handler::<S>).delete(remove_filter_handler::<S>),
        )
        .route("/api/v1/scoring/import", post(import_handler::<S>))
        .route("/api/v1/scoring/score", post(score_handler::<S>))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActiveProfileRequest {
    profile_id: ProfileId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImportRequest {
    #[serde(default)]
    templates: Option<Vec<RuleTemplate>>,
    #[serde(default)]
    csv: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScoreRequest {
    #[serde(default)]
    profile_id: Option<ProfileId>,
    document: DocumentSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse<'a> {
    #[serde(flatten)]
    outcome: &'a ScoreOutcome,
    percentage: f64,
}

fn lock<S>(store: &SharedProfileStore<S>) -> MutexGuard<'_, ProfileStore<S>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn error_response(error: ProfileStoreError) -> Response {
    let status = store_status(&error);
    if !error.is_rejection() {
        warn!(error = %error, "profile store mutation could not be persisted");
    }
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ProfileStoreError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

fn no_content(result: Result<(), ProfileStoreError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn catalog_handler() -> Response {
    let filter_types: Vec<_> = FilterKind::ordered()
        .into_iter()
        .map(|kind| json!({ "type": kind, "label": kind.label() }))
        .collect();
    let document_types: Vec<&str> = DocumentType::ordered()
        .into_iter()
        .map(DocumentType::label)
        .collect();
    let payload = json!({
        "documentTypes": document_types,
        "points": Points::CATALOG,
        "filterTypes": filter_types,
        "matchConditions": [MatchCondition::All, MatchCondition::Some],
        "defaultFieldNames": DEFAULT_FIELD_NAMES,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn list_profiles_handler<S>(
    State(store): State<SharedProfileStore<S>>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let store = lock(&store);
    (StatusCode::OK, Json(store.snapshot())).into_response()
}

pub(crate) async fn add_profile_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    body: Option<Json<ProfilePatch>>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let patch = body.map(|Json(patch)| patch).unwrap_or_default();
    let mut store = lock(&store);
    respond(StatusCode::CREATED, store.add_profile(patch.name.as_deref()))
}

pub(crate) async fn get_profile_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path(profile_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = ProfileId(profile_id);
    let store = lock(&store);
    match store.profile(&id) {
        Some(profile) => (StatusCode::OK, Json(profile)).into_response(),
        None => {
            let payload = json!({
                "error": format!("scoring profile '{id}' not found"),
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn update_profile_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path(profile_id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let mut store = lock(&store);
    respond(
        StatusCode::OK,
        store.update_profile(&ProfileId(profile_id), patch),
    )
}

pub(crate) async fn delete_profile_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path(profile_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let mut store = lock(&store);
    no_content(store.delete_profile(&ProfileId(profile_id)))
}

pub(crate) async fn active_profile_handler<S>(
    State(store): State<SharedProfileStore<S>>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let store = lock(&store);
    match store.active_profile() {
        Some(profile) => (StatusCode::OK, Json(profile)).into_response(),
        None => {
            let payload = json!({
                "error": "no active scoring profile",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn set_active_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Json(request): Json<ActiveProfileRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let mut store = lock(&store);
    match store.set_active_profile(&request.profile_id) {
        Ok(()) => (StatusCode::OK, Json(store.snapshot())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_criterion_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path(profile_id): Path<String>,
    body: Option<Json<CriterionDraft>>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let draft = body.map(|Json(draft)| draft).unwrap_or_default();
    let mut store = lock(&store);
    respond(
        StatusCode::CREATED,
        store.add_criterion(&ProfileId(profile_id), draft),
    )
}

pub(crate) async fn update_criterion_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path((profile_id, criterion_id)): Path<(String, String)>,
    Json(patch): Json<CriterionPatch>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let mut store = lock(&store);
    respond(
        StatusCode::OK,
        store.update_criterion(&ProfileId(profile_id), &CriterionId(criterion_id), patch),
    )
}

pub(crate) async fn delete_criterion_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path((profile_id, criterion_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let mut store = lock(&store);
    no_content(store.delete_criterion(&ProfileId(profile_id), &CriterionId(criterion_id)))
}

pub(crate) async fn add_filter_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path((profile_id, criterion_id)): Path<(String, String)>,
    Json(draft): Json<FilterDraft>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let mut store = lock(&store);
    respond(
        StatusCode::CREATED,
        store.add_filter(&ProfileId(profile_id), &CriterionId(criterion_id), draft),
    )
}

pub(crate) async fn replace_filter_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path((profile_id, criterion_id, filter_id)): Path<(String, String, String)>,
    Json(draft): Json<FilterDraft>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let mut store = lock(&store);
    respond(
        StatusCode::OK,
        store.replace_filter(
            &ProfileId(profile_id),
            &CriterionId(criterion_id),
            &FilterId(filter_id),
            draft,
        ),
    )
}

pub(crate) async fn remove_filter_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Path((profile_id, criterion_id, filter_id)): Path<(String, String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let mut store = lock(&store);
    no_content(store.remove_filter(
        &ProfileId(profile_id),
        &CriterionId(criterion_id),
        &FilterId(filter_id),
    ))
}

pub(crate) async fn import_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Json(request): Json<ImportRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let templates = match (request.templates, request.csv) {
        (Some(templates), _) => templates,
        (None, Some(csv)) => match RuleImporter::from_reader(csv.as_bytes()) {
            Ok(templates) => templates,
            Err(error) => return error_response(ProfileStoreError::Import(error)),
        },
        (None, None) => {
            let payload = json!({
                "error": "import requires either 'templates' or 'csv'",
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };

    let mut store = lock(&store);
    match store.import_rules(&templates) {
        Ok(_) => (StatusCode::OK, Json(store.snapshot())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<S>(
    State(store): State<SharedProfileStore<S>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let store = lock(&store);
    match store.score(request.profile_id.as_ref(), &request.document) {
        Ok(outcome) => {
            let body = ScoreResponse {
                percentage: outcome.percentage(),
                outcome: &outcome,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}
