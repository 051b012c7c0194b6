//! OpenAI-compatible chat-completion client (blocking).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ExtractionError, LlmError};
use crate::models::config::LlmConfig;

use super::CompletionBackend;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `POST {base_url}/chat/completions`.
///
/// Built once per process and shared by every document.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Build a client from configuration.
    ///
    /// Fails with [`ExtractionError::MissingCollaborator`] when no API key is
    /// configured, so callers stop before any document is processed.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ExtractionError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ExtractionError::MissingCollaborator(format!(
                "set {} or llm.api_key in the configuration",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractionError::MissingCollaborator(format!("HTTP client: {}", e)))?;

        info!(url = %config.base_url, model = %config.model, "Using chat-completion backend");

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionBackend for OpenAiClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        debug!(model = %self.model, prompt_chars = user.len(), "Sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json()?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!(response_chars = content.len(), "Received completion");
        Ok(content)
    }

    fn describe(&self) -> String {
        format!("{} via {}", self.model, self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_missing_collaborator() {
        let config = LlmConfig {
            api_key: None,
            api_key_env: "FAKTUR_TEST_NO_SUCH_KEY".to_string(),
            ..Default::default()
        };
        let err = OpenAiClient::from_config(&config).err().unwrap();
        assert!(matches!(err, ExtractionError::MissingCollaborator(_)));
        assert!(err.to_string().contains("FAKTUR_TEST_NO_SUCH_KEY"));
    }

    #[test]
    fn test_endpoint_join() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:11434/v1/".to_string(),
            ..Default::default()
        };
        let client = OpenAiClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": " {\"a\": 1} "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" {\"a\": 1} "));

        let empty: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_empty());
    }
}
