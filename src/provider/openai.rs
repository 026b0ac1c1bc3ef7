//! OpenAI Chat Completions API provider.

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use tracing::debug;

use crate::error::TeamError;
use crate::types::{Message, Role};

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{CompletionProvider, GenerationSettings};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI and compatible endpoints.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    organization: Option<String>,
    settings: GenerationSettings,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            organization: None,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    fn build_request_body(&self, model_id: &str, messages: &[Message]) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": model_id,
            "messages": messages,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(temp) = self.settings.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if let Some(max) = self.settings.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
        }

        body
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, model_id: &str, messages: &[Message]) -> Result<Message, TeamError> {
        let body = self.build_request_body(model_id, messages);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = model_id, messages = messages.len(), "OpenAI complete");

        let mut headers = bearer_headers(&self.api_key);
        if let Some(org) = &self.organization {
            if let Ok(val) = HeaderValue::from_str(org) {
                headers.insert("openai-organization", val);
            }
        }

        let resp = shared_client()
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let raw = resp.text().await?;
        let data: OpenAiChatResponse = serde_json::from_str(&raw)
            .map_err(|e| TeamError::MalformedResponse(format!("{e}: {raw}")))?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TeamError::MalformedResponse("No choices in OpenAI response".into()))?;

        let role = choice
            .message
            .role
            .as_deref()
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or(Role::Assistant);
        let content = choice.message.content.ok_or_else(|| {
            TeamError::MalformedResponse("OpenAI reply has no text content".into())
        })?;

        Ok(Message::new(role, content))
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    role: Option<String>,
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_roles_and_settings() {
        let provider = OpenAiProvider::new("k".into(), None).with_settings(
            GenerationSettings::builder()
                .temperature(0.2)
                .max_tokens(512)
                .build(),
        );
        let body = provider.build_request_body(
            "gpt-3.5-turbo",
            &[Message::system("persona"), Message::user("hi")],
        );

        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.2,
                "max_tokens": 512
            })
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAiProvider::new("k".into(), Some("http://localhost:8080/v1/".into()));
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }
}
