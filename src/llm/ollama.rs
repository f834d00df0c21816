//! Ollama backend for local inference

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::config::RunConfig;
use crate::core::error::BackendError;
use crate::llm::{LanguageModel, error::LLMError};

/// Configuration for Ollama client
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama server URL (default: http://localhost:11434)
    pub host: String,
    /// Model used when the call does not set a `model` option (default: phi4)
    pub default_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            default_model: "phi4".to_string(),
        }
    }
}

/// Request structure for Ollama chat completions
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// A message in Ollama's chat format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

impl OllamaMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling options, filled from the call's [`RunConfig`] options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl OllamaOptions {
    const KEYS: [&'static str; 5] = ["temperature", "top_p", "top_k", "num_predict", "stop"];

    /// Picks the sampling keys out of the call options; other keys are left alone.
    pub fn from_run_config(config: &RunConfig) -> Result<Option<Self>, LLMError> {
        let picked: serde_json::Map<String, serde_json::Value> = config
            .options()
            .iter()
            .filter(|(k, _)| Self::KEYS.iter().any(|key| *key == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if picked.is_empty() {
            return Ok(None);
        }
        let options = serde_json::from_value(serde_json::Value::Object(picked))?;
        Ok(Some(options))
    }
}

/// Response from Ollama's chat endpoint
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub message: OllamaMessage,
    pub done: bool,
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub eval_count: u32,
}

/// Ollama HTTP client
#[derive(Clone, Debug, Default)]
pub struct OllamaClient {
    http: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Client for the default host (http://localhost:11434) and default model (phi4)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OllamaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Client for a custom host URL
    pub fn at(host: impl Into<String>) -> Self {
        Self::with_config(OllamaConfig {
            host: host.into(),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn resolve_model(&self, config: &RunConfig) -> String {
        config
            .option_str("model")
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_model.clone())
    }

    pub fn build_request(
        &self,
        prompt: &str,
        config: &RunConfig,
    ) -> Result<OllamaChatRequest, LLMError> {
        Ok(OllamaChatRequest {
            model: self.resolve_model(config),
            messages: vec![OllamaMessage::user(prompt)],
            stream: false,
            options: OllamaOptions::from_run_config(config)?,
        })
    }

    pub async fn chat(&self, request: &OllamaChatRequest) -> Result<OllamaChatResponse, LLMError> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.config.host))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::OllamaError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let chat_response: OllamaChatResponse = response.json().await?;
        Ok(chat_response)
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn invoke(&self, prompt: &str, config: &RunConfig) -> Result<String, BackendError> {
        let request = self.build_request(prompt, config)?;
        let response = self.chat(&request).await?;
        log::debug!(
            "Ollama model '{}' answered with {} tokens",
            response.model,
            response.eval_count
        );
        Ok(response.message.content)
    }

    fn model_name(&self, config: &RunConfig) -> String {
        self.resolve_model(config)
    }
}
