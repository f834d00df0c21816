use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

use crate::core::config::{RunConfig, ValidationMode};
use crate::core::error::{Error, OutputError, Result};
use crate::core::prediction::Prediction;
use crate::core::signature::Signature;
use crate::core::strategy::{DefaultPromptStrategy, PromptStrategy};
use crate::core::telemetry::TraceEntry;
use crate::core::{FieldValue, Inputs};

const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Binds one signature and one prompt strategy; the backend arrives per call.
///
/// A runner holds no per-call state. Cloning is cheap and clones share the
/// same signature and strategy.
#[derive(Clone)]
pub struct Runner {
    name: String,
    signature: Signature,
    strategy: Arc<dyn PromptStrategy>,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("name", &self.name)
            .field("signature", &self.signature.name())
            .finish_non_exhaustive()
    }
}

impl Runner {
    pub fn new(signature: Signature, strategy: impl PromptStrategy + 'static) -> Self {
        Self::from_shared(signature, Arc::new(strategy))
    }

    /// Shares one strategy instance between several runners.
    pub fn from_shared(signature: Signature, strategy: Arc<dyn PromptStrategy>) -> Self {
        Self {
            name: signature.name().to_string(),
            signature,
            strategy,
        }
    }

    pub fn with_default_strategy(signature: Signature) -> Self {
        Self::new(signature, DefaultPromptStrategy)
    }

    /// Overrides the name reported in traces (defaults to the signature's name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn strategy(&self) -> &dyn PromptStrategy {
        self.strategy.as_ref()
    }

    /// Renders the prompt for `inputs` without calling any backend.
    pub fn format(&self, inputs: &Inputs) -> Result<String> {
        self.strategy.format_prompt(&self.signature, inputs)
    }

    /// Formats, makes exactly one backend call and returns the raw completion.
    pub async fn invoke_raw(&self, inputs: &Inputs, config: &RunConfig) -> Result<String> {
        let prompt = self.format(inputs)?;
        self.complete(&prompt, config).await
    }

    /// Formats, calls the backend once and parses the completion into a [`Prediction`].
    pub async fn invoke(&self, inputs: &Inputs, config: &RunConfig) -> Result<Prediction> {
        let prompt = self.format(inputs)?;
        let completion = self.complete(&prompt, config).await?;
        let prediction = self.collect(inputs, &completion, config)?;

        if let Some(telemetry) = config.telemetry() {
            telemetry.record(self.trace(inputs, &prompt, &prediction, config));
        }
        Ok(prediction)
    }

    /// Keyword-style invocation: `runner.call([("question", json!("..."))], &config)`.
    pub async fn call<I, K>(&self, args: I, config: &RunConfig) -> Result<Prediction>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        let inputs: Inputs = args.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.invoke(&inputs, config).await
    }

    /// Runs independent invocations concurrently; results keep the order of `batch`.
    ///
    /// Each element fails or succeeds on its own and costs exactly one backend call.
    pub async fn batch(&self, batch: &[Inputs], config: &RunConfig) -> Vec<Result<Prediction>> {
        self.batch_with_concurrency(batch, config, DEFAULT_MAX_CONCURRENCY)
            .await
    }

    pub async fn batch_with_concurrency(
        &self,
        batch: &[Inputs],
        config: &RunConfig,
        max_concurrency: usize,
    ) -> Vec<Result<Prediction>> {
        stream::iter(batch.iter().map(|inputs| self.invoke(inputs, config)))
            .buffered(max_concurrency.max(1))
            .collect()
            .await
    }

    async fn complete(&self, prompt: &str, config: &RunConfig) -> Result<String> {
        log::debug!(
            "Runner '{}' sending {} byte prompt to backend",
            self.name,
            prompt.len()
        );
        let completion = config
            .llm()
            .invoke(prompt, config)
            .await
            .map_err(Error::Backend)?;
        log::debug!(
            "Runner '{}' received {} byte completion",
            self.name,
            completion.len()
        );
        Ok(completion)
    }

    fn collect(&self, inputs: &Inputs, completion: &str, config: &RunConfig) -> Result<Prediction> {
        let mut raw = self.strategy.parse_output(&self.signature, completion)?;
        let mut prediction = Prediction::new(self.signature.output_names(), completion);

        for (name, field) in self.signature.output_variables() {
            let value = raw.remove(name).ok_or_else(|| OutputError::Missing {
                field: name.to_string(),
            })?;
            let value = field.transform_value(value);
            if !field.validate_value(inputs, &value) {
                match config.validation() {
                    ValidationMode::Strict => {
                        return Err(OutputError::Invalid {
                            field: name.to_string(),
                        }
                        .into());
                    }
                    ValidationMode::Advisory => {
                        log::warn!(
                            "Runner '{}': output '{}' failed validation, keeping it",
                            self.name,
                            name
                        );
                    }
                }
            }
            prediction.insert(name, value);
        }

        if config.echoes_inputs() {
            for (name, value) in inputs {
                if !prediction.contains(name) {
                    prediction.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(prediction)
    }

    fn trace(
        &self,
        inputs: &Inputs,
        prompt: &str,
        prediction: &Prediction,
        config: &RunConfig,
    ) -> TraceEntry {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        TraceEntry {
            timestamp,
            call_id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            runner: self.name.clone(),
            signature: self.signature.name().to_string(),
            signature_hash: self.signature.structural_hash(),
            model_name: config.llm().model_name(config),
            prompt: prompt.to_string(),
            completion: prediction.completion().to_string(),
            inputs: inputs.clone(),
            outputs: prediction
                .iter()
                .filter(|(name, _)| prediction.is_output(name))
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FnModel;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn qa_runner() -> Runner {
        let signature = Signature::builder("QA")
            .input("question", "a question")
            .field(
                crate::core::field::FieldDescriptor::output("answer", "the answer").map(|f| {
                    f.with_transformer(|v| json!(v.as_str().unwrap_or("").to_lowercase()))
                }),
            )
            .build()
            .unwrap();
        Runner::with_default_strategy(signature)
    }

    fn question(q: &str) -> Inputs {
        Inputs::from([("question".to_string(), json!(q))])
    }

    #[tokio::test]
    async fn test_invoke_parses_and_transforms() {
        let config = RunConfig::new(Arc::new(FnModel::new("stub", |_: &str, _: &RunConfig| {
            Ok("🔑answer: FOUR".to_string())
        })));
        let prediction = qa_runner().invoke(&question("2+2?"), &config).await.unwrap();
        assert_eq!(prediction["answer"], json!("four"));
        assert!(!prediction.contains("question"));
    }

    #[tokio::test]
    async fn test_echo_inputs() {
        let config = RunConfig::new(Arc::new(FnModel::new("stub", |_: &str, _: &RunConfig| {
            Ok("🔑answer: 4".to_string())
        })))
        .echo_inputs(true);
        let prediction = qa_runner().invoke(&question("2+2?"), &config).await.unwrap();
        assert_eq!(prediction["question"], json!("2+2?"));
        assert!(!prediction.is_output("question"));
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_counts_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let config = RunConfig::new(Arc::new(FnModel::new(
            "stub",
            move |prompt: &str, _: &RunConfig| {
                counter.fetch_add(1, Ordering::SeqCst);
                let q = prompt.lines().last().unwrap_or_default().to_string();
                Ok(format!("🔑answer: {}", q.trim_start_matches("✅question: ")))
            },
        )));

        let batch = vec![question("A"), Inputs::new(), question("C")];
        let results = qa_runner().batch(&batch, &config).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap()["answer"], json!("a"));
        assert!(results[1].as_ref().unwrap_err().is_contract_violation());
        assert_eq!(results[2].as_ref().unwrap()["answer"], json!("c"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
