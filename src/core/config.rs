use std::fmt;
use std::sync::Arc;

use crate::core::FieldValue;
use crate::core::telemetry::Telemetry;
use crate::llm::LanguageModel;

/// What a runner does when a parsed output fails its validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Fail the invocation with an output error.
    #[default]
    Strict,
    /// Log a warning and keep the value.
    Advisory,
}

/// Call-scoped configuration handed to [`Runner::invoke`](crate::Runner::invoke).
///
/// Nothing here is stored on the runner, so one runner can be pointed at a
/// different backend on every call.
#[derive(Clone)]
pub struct RunConfig {
    llm: Arc<dyn LanguageModel>,
    options: serde_json::Map<String, FieldValue>,
    validation: ValidationMode,
    echo_inputs: bool,
    telemetry: Option<Arc<dyn Telemetry>>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("options", &self.options)
            .field("validation", &self.validation)
            .field("echo_inputs", &self.echo_inputs)
            .field("telemetry", &self.telemetry.is_some())
            .finish_non_exhaustive()
    }
}

impl RunConfig {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            options: serde_json::Map::new(),
            validation: ValidationMode::default(),
            echo_inputs: false,
            telemetry: None,
        }
    }

    /// Sets a backend option such as `model` or `temperature`.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    /// Copy the call's input values into the returned prediction.
    pub fn echo_inputs(mut self, enabled: bool) -> Self {
        self.echo_inputs = enabled;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn llm(&self) -> &dyn LanguageModel {
        self.llm.as_ref()
    }

    pub fn options(&self) -> &serde_json::Map<String, FieldValue> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&FieldValue> {
        self.options.get(key)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    pub fn validation(&self) -> ValidationMode {
        self.validation
    }

    pub fn echoes_inputs(&self) -> bool {
        self.echo_inputs
    }

    pub fn telemetry(&self) -> Option<&dyn Telemetry> {
        self.telemetry.as_deref()
    }
}
