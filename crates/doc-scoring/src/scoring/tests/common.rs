use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::scoring::document::DocumentSnapshot;
use crate::scoring::domain::{
    Criterion, CriterionId, FieldCheck, Filter, FilterId, FilterPredicate, MatchCondition, Points,
    ProfileId, ScoringProfile,
};
use crate::scoring::persistence::{InMemorySnapshotStore, SnapshotStore, StoreError};
use crate::scoring::router::SharedProfileStore;
use crate::scoring::store::ProfileStore;

pub(super) const STORE_KEY: &str = "omegaScoringData";

pub(super) fn document() -> DocumentSnapshot {
    let uploaded_at = Utc
        .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    DocumentSnapshot::new(uploaded_at)
        .with_text("Master Services Agreement between Acme Corp and Globex. CONFIDENTIAL.")
        .with_field("Title", "Master Agreement")
        .with_field("Parties", "Acme Corp; Globex")
        .with_document_type("Service Agreement")
        .with_file("/contracts/2025/acme-msa.pdf", "acme-msa.pdf")
        .with_language("en")
}

pub(super) fn found_filter(id: &str, field_name: &str) -> Filter {
    Filter {
        id: FilterId(id.to_string()),
        predicate: FilterPredicate::Field {
            field_name: field_name.to_string(),
            check: FieldCheck::IsFound,
        },
    }
}

pub(super) fn not_found_filter(id: &str, field_name: &str) -> Filter {
    Filter {
        id: FilterId(id.to_string()),
        predicate: FilterPredicate::Field {
            field_name: field_name.to_string(),
            check: FieldCheck::IsNotFound,
        },
    }
}

pub(super) fn criterion(
    id: &str,
    points: u32,
    match_condition: MatchCondition,
    filters: Vec<Filter>,
) -> Criterion {
    Criterion {
        id: CriterionId(id.to_string()),
        name: format!("Criterion {id}"),
        points: Points::new(points).expect("catalog points"),
        match_condition,
        description: String::new(),
        filters,
    }
}

pub(super) fn profile(id: &str, criteria: Vec<Criterion>) -> ScoringProfile {
    ScoringProfile {
        id: ProfileId(id.to_string()),
        name: format!("Profile {id}"),
        criteria,
    }
}

pub(super) fn profile_id(raw: &str) -> ProfileId {
    ProfileId(raw.to_string())
}

pub(super) fn memory_store() -> ProfileStore<InMemorySnapshotStore> {
    ProfileStore::hydrate(InMemorySnapshotStore::default(), STORE_KEY)
}

pub(super) fn shared(
    store: ProfileStore<InMemorySnapshotStore>,
) -> SharedProfileStore<InMemorySnapshotStore> {
    Arc::new(Mutex::new(store))
}

/// Backend whose reads succeed empty and whose writes always fail.
#[derive(Debug, Default)]
pub(super) struct FailingStore;

impl SnapshotStore for FailingStore {
    fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }
}

/// Backend that cannot even be read.
#[derive(Debug, Default)]
pub(super) struct UnreadableStore;

impl SnapshotStore for UnreadableStore {
    fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(super) fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
