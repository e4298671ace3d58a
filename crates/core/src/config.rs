//! Run configuration, loaded from a TOML file.
//!
//! Every section may be omitted at parse time. Callers validate only what
//! they are about to use: `validate_delivery` before sending anything,
//! `validate_workflow` before driving the target application.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::correction::CorrectionRule;
use crate::record::DEFAULT_SOURCE_ID;

pub const DEFAULT_CONFIG_FILE: &str = "bpwatch.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// A screen position in absolute pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A screen rectangle in absolute pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub application: ApplicationConfig,
    pub credentials: Option<Credentials>,
    pub login: LoginConfig,
    pub extraction: ExtractionConfig,
    pub delivery: DeliveryConfig,
    pub ocr: OcrConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Command line used to launch the target application.
    pub executable: Option<String>,
    /// Case-insensitive title regex; derived from the executable when absent.
    pub window_title: Option<String>,
    pub launch_wait_secs: u64,
    pub focus_wait_ms: u64,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            executable: None,
            window_title: None,
            launch_wait_secs: 10,
            focus_wait_ms: 500,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub username_field: Option<Point>,
    pub password_field: Option<Point>,
    pub login_button: Option<Point>,
    /// Region that shows `success_text` once the login went through.
    pub success_region: Option<Region>,
    pub success_text: String,
    pub keystroke_delay_ms: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username_field: None,
            password_field: None,
            login_button: None,
            success_region: None,
            success_text: "Login OK".to_string(),
            keystroke_delay_ms: 100,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub patient_list_region: Option<Region>,
    pub source_id: String,
    /// Extra substrings that mark a captured line as rendering noise.
    pub noise_markers: Vec<String>,
    pub corrections: Vec<CorrectionRule>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            patient_list_region: None,
            source_id: DEFAULT_SOURCE_ID.to_string(),
            noise_markers: Vec::new(),
            corrections: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub endpoint: Option<String>,
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_retries: 3,
            retry_delay_secs: 5.0,
            timeout_secs: 10,
        }
    }
}

impl DeliveryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay_secs).unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract: PathBuf,
    pub language: String,
    pub page_segmentation_mode: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation_mode: 6,
        }
    }
}

impl WatcherConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks everything the Delivery Client needs.
    pub fn validate_delivery(&self) -> Result<(), ConfigError> {
        let d = &self.delivery;
        if d.endpoint.as_deref().map_or(true, |e| e.trim().is_empty()) {
            return Err(ConfigError::Missing(vec!["delivery.endpoint"]));
        }
        if d.max_retries == 0 {
            return Err(ConfigError::Invalid {
                key: "delivery.max_retries",
                reason: "must be at least 1".into(),
            });
        }
        if !d.retry_delay_secs.is_finite() || d.retry_delay_secs < 0.0 {
            return Err(ConfigError::Invalid {
                key: "delivery.retry_delay_secs",
                reason: format!("must be a non-negative number, got {}", d.retry_delay_secs),
            });
        }
        if d.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "delivery.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Checks everything the full login-and-capture run needs, reporting
    /// every missing key at once.
    pub fn validate_workflow(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();

        if self
            .application
            .executable
            .as_deref()
            .map_or(true, |e| e.trim().is_empty())
        {
            missing.push("application.executable");
        }
        match &self.credentials {
            None => missing.push("credentials"),
            Some(c) if c.username.is_empty() => missing.push("credentials.username"),
            Some(c) if c.password.is_empty() => missing.push("credentials.password"),
            Some(_) => {}
        }
        let login = &self.login;
        if login.username_field.is_none() {
            missing.push("login.username_field");
        }
        if login.password_field.is_none() {
            missing.push("login.password_field");
        }
        if login.login_button.is_none() {
            missing.push("login.login_button");
        }
        if login.success_region.is_none() {
            missing.push("login.success_region");
        }
        if self.extraction.patient_list_region.is_none() {
            missing.push("extraction.patient_list_region");
        }
        if self
            .delivery
            .endpoint
            .as_deref()
            .map_or(true, |e| e.trim().is_empty())
        {
            missing.push("delivery.endpoint");
        }

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        for (key, region) in [
            ("login.success_region", login.success_region),
            ("extraction.patient_list_region", self.extraction.patient_list_region),
        ] {
            if region.is_some_and(|r| r.is_empty()) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "width and height must be non-zero".into(),
                });
            }
        }

        self.validate_delivery()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::CorrectionAction;

    const FULL: &str = r#"
        [application]
        executable = "xterm -T bpwatch"
        launch_wait_secs = 3

        [credentials]
        username = "clinic"
        password = "hunter2"

        [login]
        username_field = { x = 100, y = 200 }
        password_field = { x = 100, y = 240 }
        login_button = { x = 150, y = 300 }
        success_region = { x = 0, y = 0, width = 640, height = 80 }

        [extraction]
        patient_list_region = { x = 0, y = 80, width = 640, height = 400 }
        noise_markers = ["devbox"]

        [[extraction.corrections]]
        name = "S read as o"
        trigger = { name_contains = ["omith"] }
        action = { replace = { from = "omith", to = "Smith" } }

        [delivery]
        endpoint = "http://localhost:8000"
        retry_delay_secs = 0.5
    "#;

    #[test]
    fn full_config_parses_and_validates() {
        let cfg = WatcherConfig::from_toml_str(FULL).unwrap();
        cfg.validate_workflow().unwrap();

        assert_eq!(cfg.application.launch_wait_secs, 3);
        assert_eq!(cfg.application.focus_wait_ms, 500);
        assert_eq!(cfg.login.success_text, "Login OK");
        assert_eq!(cfg.login.username_field, Some(Point { x: 100, y: 200 }));
        assert_eq!(cfg.extraction.source_id, DEFAULT_SOURCE_ID);
        assert_eq!(cfg.extraction.noise_markers, vec!["devbox".to_string()]);
        assert!(matches!(
            cfg.extraction.corrections[0].action,
            CorrectionAction::Replace { .. }
        ));
        assert_eq!(cfg.delivery.max_retries, 3);
        assert_eq!(cfg.delivery.retry_delay(), Duration::from_millis(500));
        assert_eq!(cfg.delivery.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.ocr.language, "eng");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = WatcherConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.delivery.max_retries, 3);
        assert_eq!(cfg.delivery.retry_delay(), Duration::from_secs(5));
        assert!(cfg.extraction.corrections.is_empty());
        assert!(cfg.credentials.is_none());
    }

    #[test]
    fn workflow_validation_reports_every_missing_key() {
        let cfg = WatcherConfig::from_toml_str("").unwrap();
        match cfg.validate_workflow() {
            Err(ConfigError::Missing(keys)) => {
                assert!(keys.contains(&"application.executable"));
                assert!(keys.contains(&"credentials"));
                assert!(keys.contains(&"login.login_button"));
                assert!(keys.contains(&"extraction.patient_list_region"));
                assert!(keys.contains(&"delivery.endpoint"));
            }
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn delivery_validation_rejects_empty_endpoint() {
        let cfg = WatcherConfig::from_toml_str("[delivery]\nendpoint = \"  \"").unwrap();
        assert!(matches!(cfg.validate_delivery(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn delivery_validation_rejects_zero_retries() {
        let cfg = WatcherConfig::from_toml_str(
            "[delivery]\nendpoint = \"http://x\"\nmax_retries = 0",
        )
        .unwrap();
        assert!(matches!(
            cfg.validate_delivery(),
            Err(ConfigError::Invalid { key: "delivery.max_retries", .. })
        ));
    }

    #[test]
    fn delivery_validation_rejects_negative_delay() {
        let cfg = WatcherConfig::from_toml_str(
            "[delivery]\nendpoint = \"http://x\"\nretry_delay_secs = -1.0",
        )
        .unwrap();
        assert!(matches!(
            cfg.validate_delivery(),
            Err(ConfigError::Invalid { key: "delivery.retry_delay_secs", .. })
        ));
    }

    #[test]
    fn zero_sized_region_is_invalid() {
        let src = FULL.replace(
            "success_region = { x = 0, y = 0, width = 640, height = 80 }",
            "success_region = { x = 0, y = 0, width = 0, height = 80 }",
        );
        let cfg = WatcherConfig::from_toml_str(&src).unwrap();
        assert!(matches!(
            cfg.validate_workflow(),
            Err(ConfigError::Invalid { key: "login.success_region", .. })
        ));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, FULL).unwrap();
        let cfg = WatcherConfig::load(&path).unwrap();
        assert_eq!(cfg.delivery.endpoint.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WatcherConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let c = Credentials { username: "u".into(), password: "secret".into() };
        assert!(!format!("{c:?}").contains("secret"));
    }

    #[test]
    fn shipped_example_config_is_complete() {
        let config = WatcherConfig::from_toml_str(include_str!("../../../config/bpwatch.example.toml")).unwrap();
        config.validate_workflow().unwrap();
        assert_eq!(config.extraction.corrections.len(), 4);
        assert_eq!(config.delivery.retry_delay(), Duration::from_secs(5));
    }
}
