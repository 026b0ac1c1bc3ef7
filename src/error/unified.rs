//! Error classification and recovery.

use serde::Serialize;
use strum::Display;

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Canceled,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    InspectTranscript,
    None,
}

impl RecoverySuggestion {
    /// Short advice for a person reading the run summary.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::RetryWithBackoff => Some("the service is busy or unreachable; try again later"),
            Self::CheckCredentials => Some("check OPENAI_API_KEY and OPENAI_ORG"),
            Self::CheckConfiguration => Some("check the config file and PAIRLOOP_* variables"),
            Self::IncreaseTimeout => Some("raise request_timeout_secs in the config file"),
            Self::InspectTranscript => Some("the transcript shows the last exchange"),
            Self::None => None,
        }
    }
}
