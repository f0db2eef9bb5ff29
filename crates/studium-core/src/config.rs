//! Client configuration.
//!
//! Configuration is loaded from `~/.config/studium/config.toml` when the file
//! exists, with the backend base URL overridable through the
//! `STUDIUM_BASE_URL` environment variable. Every field has a default so an
//! empty file (or none at all) yields a working local setup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudiumError};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_ASK_PATH: &str = "/qa/ask";
/// Request timeout covers large uploads, so it is deliberately generous.
const DEFAULT_TIMEOUT_SECS: u64 = 5 * 60;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;
const DEFAULT_MAX_QUESTION_CHARS: usize = 1000;
const DEFAULT_HISTORY_WINDOW: usize = 10;
const DEFAULT_FINGERPRINT_PREFIX: usize = 20;

/// The valid domain for the `marks` (answer length) parameter.
///
/// Exactly one profile is active at a time; validation consults the active
/// profile and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarksProfile {
    /// The closed set {3, 5, 12} used by the study panel.
    #[default]
    Preset,
    /// A continuous range 1..=100.
    Range,
}

impl MarksProfile {
    /// Whether `marks` is acceptable under this profile.
    pub fn allows(&self, marks: u32) -> bool {
        match self {
            Self::Preset => matches!(marks, 3 | 5 | 12),
            Self::Range => (1..=100).contains(&marks),
        }
    }

    /// Human-readable description of the valid domain, used in rejection
    /// messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Preset => "one of 3, 5 or 12",
            Self::Range => "between 1 and 100",
        }
    }

    /// Short label for a preset marks value (answer length hint shown next
    /// to the selection). Returns `None` outside the preset set.
    pub fn answer_length_hint(marks: u32) -> Option<&'static str> {
        match marks {
            3 => Some("short (~100 words)"),
            5 => Some("medium (~250 words)"),
            12 => Some("long (~500 words)"),
            _ => None,
        }
    }
}

/// Validation ceilings enforced before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Maximum question length in characters, after trimming.
    #[serde(default = "default_max_question_chars")]
    pub max_question_chars: usize,
    /// Number of most-recent messages sent as conversational history.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Length of the question prefix used for duplicate detection.
    #[serde(default = "default_fingerprint_prefix")]
    pub fingerprint_prefix: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_question_chars: DEFAULT_MAX_QUESTION_CHARS,
            history_window: DEFAULT_HISTORY_WINDOW,
            fingerprint_prefix: DEFAULT_FINGERPRINT_PREFIX,
        }
    }
}

/// Deployment-time configuration for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base address.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the ask endpoint; some deployments expose `/qa` instead of
    /// `/qa/ask`.
    #[serde(default = "default_ask_path")]
    pub ask_path: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Active marks profile.
    #[serde(default)]
    pub marks_profile: MarksProfile,
    /// Validation ceilings.
    #[serde(default)]
    pub limits: Limits,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            ask_path: DEFAULT_ASK_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            marks_profile: MarksProfile::default(),
            limits: Limits::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the user config file, then applies
    /// environment overrides.
    ///
    /// Priority:
    /// 1. `STUDIUM_BASE_URL` environment variable (base URL only)
    /// 2. `~/.config/studium/config.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path)?;
                toml::from_str(&raw)?
            }
            _ => Self::default(),
        };

        if let Ok(base_url) = env::var("STUDIUM_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url.trim().trim_end_matches('/').to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string and validates it.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Absolute URL for the ask endpoint.
    pub fn ask_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.ask_path.trim_start_matches('/')
        )
    }

    /// Absolute URL for `path` under the configured base address.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(StudiumError::config("base_url must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(StudiumError::config("timeout_secs must be positive"));
        }
        if self.limits.history_window == 0 {
            return Err(StudiumError::config("limits.history_window must be positive"));
        }
        if self.limits.fingerprint_prefix == 0 {
            return Err(StudiumError::config(
                "limits.fingerprint_prefix must be positive",
            ));
        }
        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("studium").join("config.toml"))
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_ask_path() -> String {
    DEFAULT_ASK_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_max_question_chars() -> usize {
    DEFAULT_MAX_QUESTION_CHARS
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

fn default_fingerprint_prefix() -> usize {
    DEFAULT_FINGERPRINT_PREFIX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.ask_url(), "http://localhost:8000/qa/ask");
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.limits.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.marks_profile, MarksProfile::Preset);
    }

    #[test]
    fn test_preset_profile_is_closed() {
        let profile = MarksProfile::Preset;
        assert!(profile.allows(3));
        assert!(profile.allows(5));
        assert!(profile.allows(12));
        assert!(!profile.allows(4));
        assert!(!profile.allows(100));
    }

    #[test]
    fn test_range_profile_bounds() {
        let profile = MarksProfile::Range;
        assert!(profile.allows(1));
        assert!(profile.allows(100));
        assert!(!profile.allows(0));
        assert!(!profile.allows(101));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ClientConfig::from_toml(
            r#"
            base_url = "http://backend.internal:9000"
            marks_profile = "range"

            [limits]
            max_upload_bytes = 1048576
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://backend.internal:9000");
        assert_eq!(config.marks_profile, MarksProfile::Range);
        assert_eq!(config.limits.max_upload_bytes, 1_048_576);
        // untouched fields keep their defaults
        assert_eq!(config.limits.history_window, 10);
        assert_eq!(config.ask_path, "/qa/ask");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let err = ClientConfig::from_toml(r#"base_url = """#).unwrap_err();
        assert!(matches!(err, StudiumError::Config(_)));
    }

    #[test]
    fn test_endpoint_joins_slashes() {
        let mut config = ClientConfig::default();
        config.base_url = "http://localhost:8000/".to_string();
        assert_eq!(
            config.endpoint("/ingest/status"),
            "http://localhost:8000/ingest/status"
        );
    }

    #[test]
    fn test_answer_length_hint() {
        assert_eq!(
            MarksProfile::answer_length_hint(3),
            Some("short (~100 words)")
        );
        assert_eq!(MarksProfile::answer_length_hint(7), None);
    }
}
