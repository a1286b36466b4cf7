//! Locale profiles describing the environment a target is launched into

use crate::exceptions::{LaunchError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_LOCATION: &str = "ja-JP";
pub const DEFAULT_TIMEZONE: &str = "Tokyo Standard Time";

/// Read-only snapshot of the user's emulation settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocaleProfile {
    /// Display name of the profile
    #[serde(default)]
    pub name: String,
    /// Locale name such as `ja-JP`
    pub location: String,
    /// Windows timezone key name such as `Tokyo Standard Time`
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Replaces the user's trailing arguments when non-empty
    #[serde(default)]
    pub parameter: String,
    #[serde(default = "default_true")]
    pub redirect_registry: bool,
    #[serde(default)]
    pub is_advanced_redirection: bool,
    #[serde(default)]
    pub run_with_suspend: bool,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LocaleProfile {
    fn default() -> Self {
        Self {
            name: "Run in Japanese".to_string(),
            location: DEFAULT_LOCATION.to_string(),
            timezone: default_timezone(),
            parameter: String::new(),
            redirect_registry: true,
            is_advanced_redirection: false,
            run_with_suspend: false,
        }
    }
}

impl LocaleProfile {
    /// Parse a profile from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let profile: LocaleProfile = serde_json::from_str(text)?;
        if profile.location.trim().is_empty() {
            return Err(LaunchError::Config(
                "profile Location must not be empty".to_string(),
            ));
        }
        Ok(profile)
    }

    /// Load a profile from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("📄 Loading profile from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| {
            LaunchError::Config(format!("cannot read profile {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_profile_is_japanese() {
        let profile = LocaleProfile::default();
        assert_eq!(profile.location, "ja-JP");
        assert_eq!(profile.timezone, "Tokyo Standard Time");
        assert!(profile.redirect_registry);
        assert!(!profile.is_advanced_redirection);
        assert!(!profile.run_with_suspend);
    }

    #[test]
    fn test_from_json_pascal_case_keys() {
        let profile = LocaleProfile::from_json(
            r#"{
                "Name": "Run in Korean",
                "Location": "ko-KR",
                "Timezone": "Korea Standard Time",
                "Parameter": "-lang kr",
                "RedirectRegistry": true,
                "IsAdvancedRedirection": true,
                "RunWithSuspend": false
            }"#,
        )
        .unwrap();
        assert_eq!(profile.location, "ko-KR");
        assert_eq!(profile.parameter, "-lang kr");
        assert!(profile.is_advanced_redirection);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let profile = LocaleProfile::from_json(r#"{"Location": "zh-TW"}"#).unwrap();
        assert_eq!(profile.timezone, DEFAULT_TIMEZONE);
        assert!(profile.redirect_registry);
        assert!(profile.parameter.is_empty());
    }

    #[test]
    fn test_empty_location_rejected() {
        let err = LocaleProfile::from_json(r#"{"Location": "  "}"#).unwrap_err();
        assert!(matches!(err, LaunchError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Location": "zh-CN", "RunWithSuspend": true}}"#).unwrap();

        let profile = LocaleProfile::load(file.path()).unwrap();
        assert_eq!(profile.location, "zh-CN");
        assert!(profile.run_with_suspend);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocaleProfile::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, LaunchError::Config(_)));
    }
}
