//! Completion provider trait and implementations.

pub mod http;
pub mod resilient;

#[cfg(feature = "openai")]
pub mod openai;

pub use resilient::ResilientProvider;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::config::{ProviderCredentials, TeamConfig};
use crate::error::TeamError;
use crate::types::Message;

/// Sampling settings sent with every completion request.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A remote chat-completion service.
///
/// One call sends the full prompt and returns exactly one reply. Providers
/// keep no conversation state between calls.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// Complete `messages` with the model `model_id`.
    async fn complete(&self, model_id: &str, messages: &[Message]) -> Result<Message, TeamError>;
}

/// Build the configured provider, wrapped with timeout and retry.
#[allow(unused_variables)]
pub fn create_provider(
    config: &TeamConfig,
    credentials: &ProviderCredentials,
) -> Result<Box<dyn CompletionProvider>, TeamError> {
    match config.provider.as_str() {
        #[cfg(feature = "openai")]
        "openai" => {
            let api_key = credentials
                .api_key
                .clone()
                .ok_or_else(|| TeamError::Authentication("Missing OPENAI_API_KEY".into()))?;
            let provider = openai::OpenAiProvider::new(api_key, credentials.base_url.clone())
                .with_organization(credentials.organization.clone())
                .with_settings(config.generation.clone());
            Ok(Box::new(
                ResilientProvider::new(provider)
                    .with_timeout(config.request_timeout())
                    .with_retry_policy(config.retry.policy()),
            ))
        }
        other => Err(TeamError::Configuration(format!(
            "Unknown provider '{other}' (not built in or not enabled via feature flags)"
        ))),
    }
}
