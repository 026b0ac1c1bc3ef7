//! Configuration system (layered: CLI flags > env > config file > defaults).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TeamError};
use crate::provider::GenerationSettings;
use crate::types::KeywordMatch;
use crate::util::retry::RetryPolicy;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Product-owner turns per run when nothing else is configured.
pub const MAX_ROUNDS: usize = 10;

const DEFAULT_PROJECT: &str = "a chatbot API that turns plain-language questions about \
uploaded datasets into charts. Users import data in common formats, ask questions in natural \
language and get back a fitting graph. It supports several chart types, filtering and \
aggregation of the data, short generated insights about what the chart shows, and export of \
the result so it can be shared in chat platforms";

/// Run configuration for a product-owner/programmer pair.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    /// Provider backend name (only `openai` is built in).
    pub provider: String,
    /// Model id sent with every completion request.
    pub model: String,
    /// Description of what the pair should build.
    pub project: String,
    pub max_rounds: usize,
    pub keyword_match: KeywordMatch,
    /// Feedback turns the programmer gets after a block fails to merge.
    pub max_merge_retries: usize,
    pub request_timeout_secs: u64,
    pub test_timeout_secs: u64,
    /// Interpreter used to run the program when the product owner asks for a test.
    pub interpreter: String,
    /// Have a tester model summarise raw run output.
    pub review_tests: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
    pub retry: RetrySettings,
    pub generation: GenerationSettings,
    pub personas: PersonaOverrides,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: DEFAULT_MODEL.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            max_rounds: MAX_ROUNDS,
            keyword_match: KeywordMatch::default(),
            max_merge_retries: 2,
            request_timeout_secs: 120,
            test_timeout_secs: 30,
            interpreter: "python3".to_string(),
            review_tests: true,
            transcript_path: None,
            retry: RetrySettings::default(),
            generation: GenerationSettings::default(),
            personas: PersonaOverrides::default(),
        }
    }
}

impl TeamConfig {
    /// Load configuration.
    ///
    /// Reads `path` when given (a missing file is an error), otherwise the
    /// default path if it exists, otherwise built-in defaults. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let source = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        let mut config = match &source {
            Some(p) => {
                debug!(path = %p.display(), "loading config file");
                Self::from_file(p)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TeamError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| TeamError::Configuration(format!("invalid config: {e}")))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TeamError::Configuration(format!("cannot render config: {e}")))
    }

    /// `<config dir>/pairloop/config.toml` for the current platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pairloop").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply `PAIRLOOP_MODEL` and `PAIRLOOP_MAX_ROUNDS`.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(model) = std::env::var("PAIRLOOP_MODEL") {
            if !model.trim().is_empty() {
                self.model = model.trim().to_string();
            }
        }
        if let Ok(rounds) = std::env::var("PAIRLOOP_MAX_ROUNDS") {
            self.max_rounds = rounds.trim().parse().map_err(|_| {
                TeamError::Configuration(format!(
                    "PAIRLOOP_MAX_ROUNDS must be a positive integer, got '{rounds}'"
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(TeamError::Configuration("model must not be empty".into()));
        }
        if self.max_rounds == 0 {
            return Err(TeamError::Configuration("max_rounds must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 || self.test_timeout_secs == 0 {
            return Err(TeamError::Configuration("timeouts must be at least 1 second".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(TeamError::Configuration("retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }
}

/// Retry settings for provider calls, in config-file units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            ..RetryPolicy::default()
        }
    }
}

/// Replacement role instructions; `None` keeps the built-in text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programmer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tester: Option<String>,
}

/// Provider credentials, read from the environment only.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub api_key: Option<String>,
    pub organization: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderCredentials {
    /// Load from environment variables (`OPENAI_API_KEY`, `OPENAI_ORG`, `OPENAI_BASE_URL`).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: read("OPENAI_API_KEY"),
            organization: read("OPENAI_ORG"),
            base_url: read("OPENAI_BASE_URL"),
        }
    }
}
