use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_DATE_FORMAT: &str = "MM/DD/YYYY";
pub const DEFAULT_THEME: &str = "dark";

/// Display preferences stored on a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    /// ISO 4217 currency code, e.g. "USD"
    pub currency: String,
    /// Date format used by the dashboard, e.g. "MM/DD/YYYY"
    pub date_format: String,
    /// UI theme name
    pub theme: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl UserPreferences {
    /// Returns true if `currency` is a known ISO 4217 code.
    pub fn has_known_currency(&self) -> bool {
        let known = rusty_money::iso::find(&self.currency).is_some();
        if !known {
            debug!("Unknown currency code in preferences: {}", self.currency);
        }
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.currency, "USD");
        assert_eq!(prefs.date_format, "MM/DD/YYYY");
        assert_eq!(prefs.theme, "dark");
        assert!(prefs.has_known_currency());
    }

    #[test]
    fn test_unknown_currency_is_rejected() {
        let prefs = UserPreferences {
            currency: "XYZW".to_string(),
            ..Default::default()
        };
        assert!(!prefs.has_known_currency());
    }

    #[test]
    fn test_preferences_deserialize_from_camel_case() {
        let prefs: UserPreferences = serde_json::from_str(
            r#"{"currency":"EUR","dateFormat":"DD/MM/YYYY","theme":"light"}"#,
        )
        .unwrap();
        assert_eq!(prefs.date_format, "DD/MM/YYYY");
        assert!(prefs.has_known_currency());
    }

    #[test]
    fn test_missing_preference_fields_use_defaults() {
        let prefs: UserPreferences = serde_json::from_str(r#"{"theme":"light"}"#).unwrap();
        assert_eq!(prefs.currency, DEFAULT_CURRENCY);
        assert_eq!(prefs.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(prefs.theme, "light");
    }
}
