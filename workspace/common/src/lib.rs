//! Common transport-layer types shared by the API and the reporting crate.
//! Report rows are produced by `compute` and serialized unchanged by the
//! HTTP handlers, so their field names are the wire contract.

mod preferences;
mod reports;

pub use preferences::{UserPreferences, DEFAULT_CURRENCY, DEFAULT_DATE_FORMAT, DEFAULT_THEME};
pub use reports::{BudgetVsActual, CategoryTotal, MonthlyTotal};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by every successful endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` in a successful response carrying `message`.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_ok_serializes_envelope() {
        let response = ApiResponse::ok(vec![1, 2, 3], "Numbers retrieved");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Numbers retrieved");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }
}
