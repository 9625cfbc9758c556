//! AI configuration
//!
//! Configuration is resolved in two layers:
//! 1. An optional TOML file (explicit path, or
//!    ~/.local/share/ledgerlens/config.toml when present)
//! 2. Environment variables, which override the file
//!
//! ```toml
//! [ai]
//! backend = "openrouter"
//! base_url = "https://openrouter.ai/api/v1"
//! model = "deepseek/deepseek-chat-v3-0324:free"
//! timeout_secs = 30
//! site_url = "http://localhost:3000"
//! app_name = "LedgerLens"
//! ```
//!
//! The API key is never read from the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_NAME: &str = "LedgerLens";

/// Credential sources, in priority order
const API_KEY_VARS: &[&str] = &["OPENROUTER_API_KEY", "OPENAI_API_KEY"];

/// Which backend implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Any OpenAI-compatible HTTP endpoint (OpenRouter by default)
    #[default]
    OpenAICompatible,
    /// In-process mock, no network
    Mock,
}

impl BackendKind {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openrouter" | "openai" | "openai_compatible" => Some(BackendKind::OpenAICompatible),
            "mock" => Some(BackendKind::Mock),
            _ => None,
        }
    }
}

/// Resolved AI configuration
#[derive(Clone, PartialEq)]
pub struct AIConfig {
    pub backend: BackendKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Sent as `HTTP-Referer` to identify the calling application
    pub site_url: String,
    /// Sent as `X-Title`
    pub app_name: String,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            site_url: DEFAULT_SITE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

// Hand-written so the key never ends up in logs
impl fmt::Debug for AIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AIConfig")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.redacted_key())
            .field("timeout_secs", &self.timeout_secs)
            .field("site_url", &self.site_url)
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl AIConfig {
    /// Load from file (if any) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML content over the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();
        let Some(ai) = raw.ai else {
            return Ok(config);
        };

        if let Some(backend) = ai.backend {
            config.backend = BackendKind::parse(&backend)
                .ok_or_else(|| Error::Config(format!("Unknown backend: {}", backend)))?;
        }
        if let Some(base_url) = ai.base_url {
            config.base_url = base_url;
        }
        if let Some(model) = ai.model {
            config.model = model;
        }
        if let Some(timeout) = ai.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(site_url) = ai.site_url {
            config.site_url = site_url;
        }
        if let Some(app_name) = ai.app_name {
            config.app_name = app_name;
        }

        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = get("AI_BACKEND") {
            match BackendKind::parse(&backend) {
                Some(kind) => self.backend = kind,
                None => tracing::warn!(backend = %backend, "Unknown AI_BACKEND, keeping {:?}", self.backend),
            }
        }
        if let Some(base_url) = get("LEDGERLENS_AI_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(model) = get("LEDGERLENS_AI_MODEL") {
            self.model = model;
        }
        if let Some(site_url) = get("LEDGERLENS_SITE_URL") {
            self.site_url = site_url;
        }
        if let Some(app_name) = get("LEDGERLENS_APP_NAME") {
            self.app_name = app_name;
        }
        if let Some(key) = API_KEY_VARS.iter().find_map(|var| get(*var)) {
            self.api_key = Some(key);
        }
    }

    /// API key with all but the last four characters masked
    pub fn redacted_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| {
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("****{}", tail)
        })
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ledgerlens").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    ai: Option<RawAIConfig>,
}

#[derive(Debug, Deserialize)]
struct RawAIConfig {
    backend: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    site_url: Option<String>,
    app_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AIConfig::default();
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "deepseek/deepseek-chat-v3-0324:free");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AIConfig::from_toml(
            r#"
[ai]
model = "openai/gpt-4o-mini"
timeout_secs = 10
"#,
        )
        .unwrap();
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_from_toml_empty() {
        assert_eq!(AIConfig::from_toml("").unwrap(), AIConfig::default());
    }

    #[test]
    fn test_from_toml_unknown_backend() {
        let err = AIConfig::from_toml("[ai]\nbackend = \"carrier-pigeon\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(AIConfig::from_toml("[ai\nmodel=").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AIConfig::from_toml("[ai]\nmodel = \"from-file\"").unwrap();
        config.apply_env(env(&[
            ("LEDGERLENS_AI_MODEL", "from-env"),
            ("OPENROUTER_API_KEY", "sk-or-1234"),
        ]));
        assert_eq!(config.model, "from-env");
        assert_eq!(config.api_key.as_deref(), Some("sk-or-1234"));
    }

    #[test]
    fn test_secondary_key_variable() {
        let mut config = AIConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn test_primary_key_wins() {
        let mut config = AIConfig::default();
        config.apply_env(env(&[
            ("OPENAI_API_KEY", "sk-openai"),
            ("OPENROUTER_API_KEY", "sk-or"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-or"));
    }

    #[test]
    fn test_blank_key_ignored() {
        let mut config = AIConfig::default();
        config.apply_env(env(&[("OPENROUTER_API_KEY", "  ")]));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_mock_backend_from_env() {
        let mut config = AIConfig::default();
        config.apply_env(env(&[("AI_BACKEND", "mock")]));
        assert_eq!(config.backend, BackendKind::Mock);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AIConfig {
            api_key: Some("sk-or-v1-secretvalue-abcd".to_string()),
            ..AIConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secretvalue"));
        assert!(debug.contains("****abcd"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ai]\napp_name = \"Budget Buddy\"").unwrap();

        let config = AIConfig::from_file(&path).unwrap();
        assert_eq!(config.app_name, "Budget Buddy");

        let missing = AIConfig::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
