//! # langdspy
//!
//! Declarative prompt signatures for large-language-model calls.
//!
//! Declare a [`Signature`] of named input and output fields, pair it with a
//! [`PromptStrategy`] inside a [`Runner`], and every invocation performs one
//! round trip: format the prompt, call the backend once, parse the completion
//! back into a [`Prediction`].
//!
//! ## Features
//!
//! - **Strict contracts**: the supplied inputs must match the declared inputs exactly
//! - **Per-field hooks**: formatter, transformer and validator callbacks with an open option bag
//! - **Pluggable strategies**: swap the prompt layout without touching the signature
//! - **Backend agnostic**: anything implementing [`LanguageModel`] works; Ollama ships behind the `llm` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use langdspy::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> langdspy::Result<()> {
//! let signature = Signature::builder("QuestionAnswer")
//!     .hint("Answer with a single number")
//!     .input("question", "a question")
//!     .output("answer", "the answer")
//!     .build()?;
//! let runner = Runner::new(signature, MarkedOutputPromptStrategy);
//!
//! let llm = Arc::new(FnModel::new("stub", |_prompt: &str, _config: &RunConfig| {
//!     Ok("🔑answer: 4".to_string())
//! }));
//! let config = RunConfig::new(llm);
//!
//! let prediction = runner.call([("question", json!("What is 2+2?"))], &config).await?;
//! assert_eq!(prediction.get_str("answer").as_deref(), Some("4"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`llm`]: the [`LanguageModel`] backend seam and bundled backends
//! - [`prelude`]: Commonly used types and traits (import with `use langdspy::prelude::*`)

// ============================================================================
// Core Module
// ============================================================================

mod core;

pub mod llm;

// ============================================================================
// Public Re-exports
// ============================================================================

// Fields and signatures
pub use crate::core::field::{
    FieldDescriptor, FieldKind, FieldOptions, Formatter, HINT_TOKEN, INPUT_TOKEN, OUTPUT_TOKEN,
    RESERVED_CHARS, Transformer, Validator, display,
};
pub use crate::core::signature::{Signature, SignatureBuilder};
pub use crate::core::{FieldValue, Inputs};

// Prompt strategies
pub use crate::core::strategy::{
    DefaultPromptStrategy, Exemplar, FewShotPromptStrategy, MarkedOutputPromptStrategy,
    PROMPT_HEADER, PROMPT_SEPARATOR, PromptStrategy, parse_marked_outputs,
};

// Execution
pub use crate::core::config::{RunConfig, ValidationMode};
pub use crate::core::model::{Model, ModelBuilder};
pub use crate::core::prediction::Prediction;
pub use crate::core::runner::Runner;
pub use crate::core::telemetry::{MemoryTelemetry, Telemetry, TraceEntry};

// Errors
pub use crate::core::error::{BackendError, ConfigError, Error, InputError, OutputError, Result};

pub use llm::{FnModel, LanguageModel};

#[cfg(feature = "llm")]
pub use llm::{LLMError, OllamaClient, OllamaConfig};

// ============================================================================
// Prelude Module
// ============================================================================

/// The main prelude: everything needed to declare and run signatures.
///
/// # Example
/// ```rust
/// use langdspy::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        DefaultPromptStrategy, Error, Exemplar, FewShotPromptStrategy, FieldDescriptor, FieldKind,
        FieldValue, FnModel, Inputs, LanguageModel, MarkedOutputPromptStrategy, Model, Prediction,
        PromptStrategy, RunConfig, Runner, Signature, ValidationMode,
    };
}

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
