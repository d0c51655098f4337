pub mod budgets;
pub mod categories;
pub mod health;
pub mod transactions;
pub mod users;

use axum::{
    async_trait,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Uri, request::Parts},
};
use axum_valid::{HasValidate, Valid, ValidRejection, ValidationRejection};
use serde::de::DeserializeOwned;
use tracing::warn;
use validator::Validate;

use crate::error::ApiError;

/// JSON body extractor whose rejection uses the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejection uses the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameter extractor whose rejection uses the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl<T> HasValidate for ApiQuery<T> {
    type Validate = T;

    fn get_validate(&self) -> &T {
        &self.0
    }
}

/// [`ApiQuery`] checked with `validator`; both failures become a 400 envelope.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Valid(ApiQuery(value)) = Valid::<ApiQuery<T>>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<ValidRejection<ApiError>> for ApiError {
    fn from(rejection: ValidRejection<ApiError>) -> Self {
        match rejection {
            ValidationRejection::Valid(errors) => errors.into(),
            ValidationRejection::Inner(err) => err,
        }
    }
}

/// Answers every unknown route.
pub async fn route_not_found(uri: Uri) -> ApiError {
    warn!("No route for {}", uri);
    ApiError::NotFound("Route")
}

/// Every list, analytics and create call is scoped by an explicit owner.
pub(crate) fn require_owner(user_id: Option<String>) -> Result<String, ApiError> {
    match user_id.map(|id| id.trim().to_string()) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ApiError::Validation("userId is required".to_string())),
    }
}

/// Unwraps a field that `validator` has already checked with `required`.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::Validation(format!("{} is required", field)))
}

/// Dates in request bodies may be plain `YYYY-MM-DD` or full RFC 3339
/// timestamps; only the calendar date is kept.
pub(crate) mod flexible_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, de::Error};

    pub fn parse(value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(value) => parse(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {}", value))),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_accepts_date_and_timestamp() {
            let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
            assert_eq!(parse("2024-03-15"), expected);
            assert_eq!(parse("2024-03-15T10:30:00.000Z"), expected);
            assert_eq!(parse("2024-03-15T23:30:00+01:00"), expected);
            assert_eq!(parse("15/03/2024"), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_owner() {
        assert_eq!(require_owner(Some(" abc ".to_string())).unwrap(), "abc");
        assert!(require_owner(Some("  ".to_string())).is_err());
        assert!(require_owner(None).is_err());
    }
}
