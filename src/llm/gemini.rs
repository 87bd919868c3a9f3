//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatModel, LlmError, LlmResult};
use crate::config::LlmConfig;

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` when the key variable is unset; calls then fail.
    pub api_key: Option<String>,
    /// Variable the key was read from.
    pub api_key_env: String,
    pub model: String,
    pub base_url: String,
    pub temperature: Option<f32>,
}

impl GeminiConfig {
    /// Build from settings, reading the key from the configured variable.
    ///
    /// A missing key is not an error here; it surfaces from
    /// [`GeminiConfig::api_key`] on the first call.
    pub fn from_settings(config: &LlmConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());

        Self {
            api_key,
            api_key_env: config.api_key_env.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        }
    }

    /// The key, or [`LlmError::MissingApiKey`] naming the variable.
    pub fn api_key(&self) -> LlmResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.api_key_env.clone()))
    }
}

#[derive(Serialize, Debug)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

/// Client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn request(&self, system_prompt: &str, user_turn: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(user_turn)],
                role: Some("user".to_string()),
            }],
            system_instruction: Some(Content {
                parts: vec![Part::text(system_prompt)],
                role: None,
            }),
            generation_config: self
                .config
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        }
    }
}

/// Concatenated text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> LlmResult<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(&self, system_prompt: &str, user_turn: &str) -> LlmResult<String> {
        let api_key = self.config.api_key()?;
        let body = self.request(system_prompt, user_turn);
        tracing::debug!(
            target: "llm",
            "calling {} (system prompt {} chars)",
            self.config.model,
            system_prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = extract_text(parsed)?;
        tracing::trace!(target: "llm", "response: {text}");
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
