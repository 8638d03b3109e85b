use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Error reported by the database driver, carrying the server error code when one exists
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}{}", code_suffix(.code))]
pub struct DatabaseError {
    pub code: Option<u16>,
    pub message: String,
}

fn code_suffix(code: &Option<u16>) -> String {
    code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

impl DatabaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }
}

impl From<mysql_async::Error> for DatabaseError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Server(server) => Self::with_code(server.code, server.message),
            other => Self::new(other.to_string()),
        }
    }
}

/// Failures of the analysis pipeline
///
/// Trace and statistics failures are recoverable: they are caught where they happen and
/// only downgrade the corresponding part of the result.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to connect to database: {0}")]
    Connection(DatabaseError),

    #[error("query execution failed: {0}")]
    Execution(DatabaseError),

    #[error("execution plan unavailable: {0}")]
    PlanUnavailable(DatabaseError),

    #[error("execution trace unavailable: {0}")]
    TraceUnavailable(DatabaseError),

    #[error("server statistics unavailable: {0}")]
    StatisticsUnavailable(DatabaseError),

    #[error("diagnostics snapshot is disabled")]
    SnapshotDisabled,
}

impl AnalysisError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TraceUnavailable(_) | Self::StatisticsUnavailable(_))
    }
}

/// Error body returned to HTTP clients
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// HTTP-facing error
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn database_connection_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "DATABASE_CONNECTION_FAILED", message)
    }

    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "QUERY_FAILED", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let message = err.to_string();
        match err {
            AnalysisError::InvalidRequest(_) => Self::validation_error(message),
            AnalysisError::Connection(_) => Self::database_connection_failed(message),
            AnalysisError::Execution(_) | AnalysisError::PlanUnavailable(_) => {
                Self::query_failed(message)
            },
            AnalysisError::SnapshotDisabled => Self::not_found(message),
            // Never surfaced by the pipeline, kept for completeness
            AnalysisError::TraceUnavailable(_) | AnalysisError::StatisticsUnavailable(_) => {
                Self::internal_error(message)
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}: {}", self.code, self.message);
        } else {
            tracing::warn!("{}: {}", self.code, self.message);
        }
        let body = ErrorBody { code: self.code.to_string(), message: self.message };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_display_with_code() {
        let err = DatabaseError::with_code(1146, "Table 'shop.nope' doesn't exist");
        assert_eq!(err.to_string(), "Table 'shop.nope' doesn't exist (1146)");
    }

    #[test]
    fn test_database_error_display_without_code() {
        let err = DatabaseError::new("connection reset");
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn test_recoverable_errors_are_not_fatal() {
        let db = DatabaseError::new("x");
        assert!(!AnalysisError::TraceUnavailable(db.clone()).is_fatal());
        assert!(!AnalysisError::StatisticsUnavailable(db.clone()).is_fatal());
        assert!(AnalysisError::Execution(db.clone()).is_fatal());
        assert!(AnalysisError::PlanUnavailable(db).is_fatal());
    }

    #[test]
    fn test_api_error_status_mapping() {
        let db = DatabaseError::with_code(1064, "syntax error");
        assert_eq!(
            ApiError::from(AnalysisError::InvalidRequest("blank".into())).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AnalysisError::Connection(db.clone())).status,
            StatusCode::BAD_GATEWAY
        );
        let exec = ApiError::from(AnalysisError::Execution(db));
        assert_eq!(exec.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(exec.message.contains("syntax error (1064)"));
        assert_eq!(ApiError::from(AnalysisError::SnapshotDisabled).status, StatusCode::NOT_FOUND);
    }
}
