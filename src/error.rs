//! The API level error type and its conversion into JSON error responses.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use compute::ComputeError;
use sea_orm::{DbErr, SqlErr};
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::schemas::ErrorResponse;

/// The errors a handler may return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required field is missing or a value is out of range.
    #[error("{0}")]
    Validation(String),

    /// No row with the requested id exists. Holds the resource name.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule was violated.
    #[error("{message}")]
    Duplicate { code: &'static str, message: String },

    /// Any other database failure.
    ///
    /// The details are logged and never sent to the client.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Duplicate { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Duplicate { code, .. } => *code,
            ApiError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Maps a unique constraint violation to [`ApiError::Duplicate`], any
    /// other error to [`ApiError::Database`].
    pub fn unique_violation(err: DbErr, code: &'static str, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                warn!("Unique constraint violated: {}", detail);
                ApiError::Duplicate {
                    code,
                    message: message.into(),
                }
            }
            _ => ApiError::Database(err),
        }
    }
}

impl From<ComputeError> for ApiError {
    fn from(err: ComputeError) -> Self {
        match err {
            ComputeError::Database(db) => ApiError::Database(db),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .iter()
                    .map(|e| e.code.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} ({})", field, reason)
            })
            .collect();
        fields.sort();
        ApiError::Validation(format!("Invalid fields: {}", fields.join("; ")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(err) => {
                error!("Database error: {}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Named {
        #[validate(required, length(min = 1))]
        name: Option<String>,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("Budget").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Database(DbErr::Custom("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_non_unique_error_stays_database_error() {
        let err = ApiError::unique_violation(
            DbErr::Custom("boom".into()),
            "DUPLICATE_CATEGORY",
            "Category already exists",
        );
        assert_eq!(err.code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_validation_errors_name_fields() {
        let err: ApiError = Named { name: None }.validate().unwrap_err().into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("name"));

        let err: ApiError = Named { name: Some(String::new()) }.validate().unwrap_err().into();
        assert!(err.to_string().contains("length"));
    }

    #[test]
    fn test_compute_input_error_is_validation() {
        let err: ApiError = ComputeError::InvalidPeriod { month: 13, year: 2024 }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "13/2024 is not a valid budget period");
    }
}
