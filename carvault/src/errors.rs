//! Application error type and the fault normalization pipeline.
//!
//! Every failure raised by extractors, handlers, or stores is an [`Error`]. Each variant maps to
//! exactly one [`FaultKind`], which fixes the HTTP status and whether the failure is
//! *operational* (expected, safe to describe to the caller).
//!
//! Rendering happens in two steps:
//!
//! 1. `IntoResponse for Error` logs the failure under a fresh error id, writes the production body
//!    (`{"status": "fail" | "error", "message": ...}`) and attaches the [`Fault`] to the response
//!    extensions.
//! 2. The [`normalize_faults`] middleware re-renders that fault with full diagnostics when the
//!    service runs in [`Environment::Development`].
//!
//! Non-operational faults never leak detail in production: they collapse to
//! `500 {"status": "error", "message": "Something went wrong!"}`.

use crate::config::Environment;
use crate::db::errors::DbError;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Request, State,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Message returned for non-operational faults in production.
pub const GENERIC_FAULT_MESSAGE: &str = "Something went wrong!";

/// Message returned whenever identity resolution fails.
pub const UNAUTHENTICATED_MESSAGE: &str = "Please log in to access this resource";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    Validation { message: String },

    /// A uniqueness rule was violated (e.g. an email already registered)
    #[error("{message}")]
    DuplicateKey { message: String },

    /// An identifier in the request could not be parsed
    #[error("{message}")]
    MalformedIdentifier { message: String },

    /// Authentication required but not provided, or credentials invalid
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Requested resource not found (or not owned by the caller)
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Storage operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Closed classification of every failure the API can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    ValidationError,
    DuplicateKey,
    MalformedIdentifier,
    Unauthenticated,
    NotFound,
    Unclassified,
}

impl FaultKind {
    pub fn status(self) -> StatusCode {
        match self {
            FaultKind::ValidationError | FaultKind::DuplicateKey | FaultKind::MalformedIdentifier => StatusCode::BAD_REQUEST,
            FaultKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            FaultKind::NotFound => StatusCode::NOT_FOUND,
            FaultKind::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Operational faults are expected outcomes whose message is safe to show to callers.
    pub fn is_operational(self) -> bool {
        !matches!(self, FaultKind::Unclassified)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::ValidationError => "ValidationError",
            FaultKind::DuplicateKey => "DuplicateKey",
            FaultKind::MalformedIdentifier => "MalformedIdentifier",
            FaultKind::Unauthenticated => "Unauthenticated",
            FaultKind::NotFound => "NotFound",
            FaultKind::Unclassified => "Unclassified",
        }
    }
}

impl Error {
    pub fn kind(&self) -> FaultKind {
        match self {
            Error::Validation { .. } => FaultKind::ValidationError,
            Error::DuplicateKey { .. } => FaultKind::DuplicateKey,
            Error::MalformedIdentifier { .. } => FaultKind::MalformedIdentifier,
            Error::Unauthenticated { .. } => FaultKind::Unauthenticated,
            Error::NotFound { .. } => FaultKind::NotFound,
            Error::Internal { .. } | Error::Other(_) => FaultKind::Unclassified,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => FaultKind::NotFound,
                DbError::UniqueViolation { .. } => FaultKind::DuplicateKey,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => FaultKind::ValidationError,
                DbError::Other(_) => FaultKind::Unclassified,
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status()
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { message } | Error::DuplicateKey { message } | Error::MalformedIdentifier { message } => message.clone(),
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| UNAUTHENTICATED_MESSAGE.to_string()),
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "Email already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }
}

/// A classified failure, ready to be rendered for either deployment mode.
#[derive(Debug, Clone)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
    pub detail: String,
    pub error_id: Uuid,
}

impl Fault {
    pub fn from_error(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            detail: format!("{err:#}"),
            error_id: Uuid::new_v4(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// `"fail"` for client errors, `"error"` for server errors.
    fn status_label(&self) -> &'static str {
        if self.status().is_server_error() { "error" } else { "fail" }
    }

    pub fn body(&self, environment: Environment) -> serde_json::Value {
        match environment {
            Environment::Development => json!({
                "status": self.status_label(),
                "message": self.message,
                "kind": self.kind.as_str(),
                "error_id": self.error_id,
                "detail": self.detail,
            }),
            Environment::Production if self.kind.is_operational() => json!({
                "status": self.status_label(),
                "message": self.message,
            }),
            Environment::Production => json!({
                "status": "error",
                "message": GENERIC_FAULT_MESSAGE,
            }),
        }
    }

    pub fn render(&self, environment: Environment) -> Response {
        let status = match environment {
            Environment::Production if !self.kind.is_operational() => StatusCode::INTERNAL_SERVER_ERROR,
            _ => self.status(),
        };
        let mut response = (status, Json(self.body(environment))).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let fault = Fault::from_error(&self);

        // Log full error details for debugging - different log levels based on severity
        match fault.kind {
            FaultKind::Unclassified => {
                tracing::error!(error_id = %fault.error_id, "Internal service error: {:#}", self);
            }
            FaultKind::DuplicateKey => {
                tracing::warn!(error_id = %fault.error_id, "Duplicate key: {}", self);
            }
            FaultKind::Unauthenticated => {
                tracing::info!(error_id = %fault.error_id, "Authentication error: {}", self);
            }
            FaultKind::ValidationError | FaultKind::MalformedIdentifier | FaultKind::NotFound => {
                tracing::debug!(error_id = %fault.error_id, "Client error: {}", self);
            }
        }

        fault.render(Environment::Production)
    }
}

/// Re-renders faults with full diagnostics when running in development mode.
///
/// Production responses are already in their final shape, so this is a pass-through there.
pub async fn normalize_faults(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if state.config.environment != Environment::Development {
        return response;
    }

    if let Some(fault) = response.extensions().get::<Fault>().cloned() {
        return fault.render(Environment::Development);
    }
    response
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::MalformedIdentifier {
            message: format!("Invalid identifier: {}", rejection.body_text()),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_table() {
        let cases = vec![
            (
                Error::Validation {
                    message: "bad".to_string(),
                },
                StatusCode::BAD_REQUEST,
                true,
            ),
            (
                Error::DuplicateKey {
                    message: "dup".to_string(),
                },
                StatusCode::BAD_REQUEST,
                true,
            ),
            (
                Error::MalformedIdentifier {
                    message: "id".to_string(),
                },
                StatusCode::BAD_REQUEST,
                true,
            ),
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED, true),
            (
                Error::NotFound {
                    resource: "Car".to_string(),
                    id: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
                true,
            ),
            (
                Error::Internal {
                    operation: "boom".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
            ),
            (Error::Other(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR, false),
        ];

        for (err, status, operational) in cases {
            assert_eq!(err.status_code(), status, "status for {err:?}");
            assert_eq!(err.kind().is_operational(), operational, "operational for {err:?}");
        }
    }

    #[test]
    fn test_db_errors_are_classified() {
        let unique = Error::Database(DbError::UniqueViolation {
            constraint: Some("users_email_unique".to_string()),
            table: Some("users".to_string()),
            message: "duplicate key value".to_string(),
        });
        assert_eq!(unique.kind(), FaultKind::DuplicateKey);
        assert_eq!(unique.user_message(), "Email already exists");

        let check = Error::Database(DbError::CheckViolation {
            constraint: None,
            table: None,
            message: "violates check".to_string(),
        });
        assert_eq!(check.kind(), FaultKind::ValidationError);

        assert_eq!(Error::Database(DbError::NotFound).kind(), FaultKind::NotFound);
        assert_eq!(Error::Database(DbError::Other(anyhow::anyhow!("io"))).kind(), FaultKind::Unclassified);
    }

    #[tokio::test]
    async fn test_production_collapses_unclassified() {
        let response = Error::Other(anyhow::anyhow!("connection reset by peer")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<Fault>().is_some());

        let body = body_json(response).await;
        assert_eq!(body, json!({ "status": "error", "message": GENERIC_FAULT_MESSAGE }));
    }

    #[tokio::test]
    async fn test_production_operational_message() {
        let response = Error::Validation {
            message: "Title must be at least 3 characters".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Title must be at least 3 characters");
        assert!(body.get("detail").is_none());
        assert!(body.get("error_id").is_none());
    }

    #[tokio::test]
    async fn test_development_includes_detail() {
        let fault = Fault::from_error(&Error::Internal {
            operation: "load car rows".to_string(),
        });
        let response = fault.render(Environment::Development);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "Unclassified");
        assert_eq!(body["detail"], "Failed to load car rows");
        assert_eq!(body["error_id"], json!(fault.error_id));
    }

    #[test]
    fn test_unauthenticated_default_message() {
        assert_eq!(Error::Unauthenticated { message: None }.user_message(), UNAUTHENTICATED_MESSAGE);
    }
}
