/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`. Data-layer errors are classified with the
/// predicates on [`kanban_shared::error::Error`]:
///
/// | data-layer error                                  | status |
/// |---------------------------------------------------|--------|
/// | row not found, id out of range                    | 404    |
/// | unique or foreign key violation                   | 409    |
/// | owner as contributor, parent mismatch, sentinel   | 400    |
/// | cancelled                                         | 503    |
/// | anything else                                     | 500    |
///
/// # Example
///
/// ```no_run
/// use kanban_api::error::ApiResult;
/// use kanban_shared::{database::Database, models::tag::Tag};
/// use axum::Json;
/// use tokio_util::sync::CancellationToken;
///
/// async fn handler(db: Database) -> ApiResult<Json<Tag>> {
///     let tag = db.tag.get_by_id(&CancellationToken::new(), 1).await?;
///     Ok(Json(tag))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kanban_shared::{error::Error, password::PasswordError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409): duplicate username/email or missing referenced row
    Conflict(String),

    /// Unprocessable entity (422): request body failed validation
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "conflict")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_not_found() || matches!(err.root(), Error::IdOutOfRange(_)) {
            ApiError::NotFound("Resource not found".to_string())
        } else if err.is_unique_violation() {
            ApiError::Conflict("Username or email already taken".to_string())
        } else if err.is_foreign_key_violation() {
            ApiError::Conflict("Referenced resource does not exist".to_string())
        } else if err.is_invariant_violation() {
            ApiError::BadRequest(err.root().to_string())
        } else if err.is_cancelled() {
            ApiError::ServiceUnavailable("Server is shutting down".to_string())
        } else {
            ApiError::InternalError(err.to_string())
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort { .. } => ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "password".to_string(),
                message: err.to_string(),
            }]),
            _ => ApiError::InternalError(format!("Password operation failed: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: Error) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Board not found".to_string());
        assert_eq!(err.to_string(), "Not found: Board not found");
    }

    #[test]
    fn test_data_errors_map_to_status() {
        let not_found = Error::from(sqlx::Error::RowNotFound).context("BoardModel.get_by_id");
        assert_eq!(status_of(not_found), StatusCode::NOT_FOUND);

        assert_eq!(status_of(Error::IdOutOfRange(u32::MAX)), StatusCode::NOT_FOUND);

        let owner = Error::OwnerAsContributor {
            board_id: 1,
            person_id: 1,
        }
        .context("BoardModel.add_contributor_to_board");
        assert_eq!(status_of(owner), StatusCode::BAD_REQUEST);

        let cancelled = Error::Cancelled.context("TaskModel.get_by_id");
        assert_eq!(status_of(cancelled), StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(status_of(Error::SentinelMissing), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invariant_message_is_exposed() {
        let err = ApiError::from(
            Error::ParentMismatch {
                child: "tag",
                child_board_id: 2,
                board_id: 5,
            }
            .context("BoardModel.remove_tag_from_board"),
        );
        assert_eq!(err.to_string(), "Bad request: tag.board_id(2) != board.id(5)");
    }

    #[test]
    fn test_short_password_is_validation_error() {
        let err = ApiError::from(PasswordError::TooShort { min: 8 });
        match err {
            ApiError::ValidationError(details) => assert_eq!(details[0].field, "password"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
