//! Language model backends.
//!
//! The core only needs one capability from a backend: turn a prompt into a
//! completion. [`LanguageModel`] is that seam. An HTTP client for Ollama is
//! available behind the `llm` feature.

#[cfg(feature = "llm")]
pub mod error;
#[cfg(feature = "llm")]
pub mod ollama;

use async_trait::async_trait;

use crate::core::config::RunConfig;
use crate::core::error::BackendError;

#[cfg(feature = "llm")]
pub use error::LLMError;
#[cfg(feature = "llm")]
pub use ollama::{OllamaClient, OllamaConfig};

/// A single-shot completion capability.
///
/// Implementations receive the fully formatted prompt and the call-scoped
/// configuration; backend-specific options live in [`RunConfig::options`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, prompt: &str, config: &RunConfig) -> Result<String, BackendError>;

    /// Name reported in traces.
    fn model_name(&self, config: &RunConfig) -> String {
        config
            .option_str("model")
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Adapts a plain function into a [`LanguageModel`].
///
/// Handy for test doubles and for wrapping clients that are not async.
pub struct FnModel<F> {
    name: String,
    func: F,
}

impl<F> FnModel<F>
where
    F: Fn(&str, &RunConfig) -> Result<String, BackendError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> LanguageModel for FnModel<F>
where
    F: Fn(&str, &RunConfig) -> Result<String, BackendError> + Send + Sync,
{
    async fn invoke(&self, prompt: &str, config: &RunConfig) -> Result<String, BackendError> {
        (self.func)(prompt, config)
    }

    fn model_name(&self, _config: &RunConfig) -> String {
        self.name.clone()
    }
}
