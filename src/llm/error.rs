use thiserror::Error;

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Ollama error: {0}")]
    OllamaError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
