use crate::config::ConfigError;
use crate::scoring::{ProfileStoreError, RuleImportError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Store(ProfileStoreError),
    Import(RuleImportError),
    Document(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Store(err) => write!(f, "profile store error: {}", err),
            AppError::Import(err) => write!(f, "rule import error: {}", err),
            AppError::Document(err) => write!(f, "invalid document: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Document(err) => Some(err),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(err) => store_status(err),
            AppError::Import(RuleImportError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Import(_) | AppError::Document(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP status for a profile store outcome.
pub fn store_status(error: &ProfileStoreError) -> StatusCode {
    match error {
        ProfileStoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        ProfileStoreError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProfileStoreError::LastProfile => StatusCode::CONFLICT,
        ProfileStoreError::Import(RuleImportError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        ProfileStoreError::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProfileStoreError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ProfileStoreError> for AppError {
    fn from(value: ProfileStoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RuleImportError> for AppError {
    fn from(value: RuleImportError) -> Self {
        Self::Import(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Document(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{EntityKind, ValidationError};

    #[test]
    fn store_errors_map_to_http_statuses() {
        let not_found = ProfileStoreError::NotFound {
            entity: EntityKind::Criterion,
            id: "criterion-9".to_string(),
        };
        assert_eq!(store_status(&not_found), StatusCode::NOT_FOUND);
        assert_eq!(
            store_status(&ProfileStoreError::Invalid(ValidationError::BlankProfileName)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            store_status(&ProfileStoreError::LastProfile),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(RuleImportError::Empty).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn display_prefixes_the_failing_layer() {
        let error = AppError::from(ProfileStoreError::LastProfile);
        assert_eq!(
            error.to_string(),
            "profile store error: the last remaining scoring profile cannot be deleted"
        );
        assert!(std::error::Error::source(&error).is_some());
    }
}
