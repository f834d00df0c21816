//! Prompt strategies: how a signature and its input values become prompt text,
//! and how the completion is read back into named outputs.

use std::collections::HashMap;

use crate::core::error::{ConfigError, OutputError, Result};
use crate::core::field::{FieldKind, HINT_TOKEN, INPUT_TOKEN, OUTPUT_TOKEN, display};
use crate::core::signature::Signature;
use crate::core::{FieldValue, Inputs};

pub const PROMPT_HEADER: &str = "Follow the following format.\n\n";
pub const PROMPT_SEPARATOR: &str = "\n---\n\n";

/// The single seam for prompt-format experimentation.
///
/// A strategy never holds per-call state; the same instance is shared by
/// every invocation of a runner.
pub trait PromptStrategy: Send + Sync {
    /// Input validation policy. Defaults to the signature's exact-match rule.
    fn validate_inputs(&self, signature: &Signature, inputs: &Inputs) -> Result<()> {
        signature.validate_inputs(inputs)?;
        Ok(())
    }

    /// Renders the prompt for `inputs`. Must validate before rendering anything.
    fn format_prompt(&self, signature: &Signature, inputs: &Inputs) -> Result<String>;

    /// Recovers the declared outputs from `completion`.
    ///
    /// Values come back raw; transforming and validating them is the runner's job.
    fn parse_output(
        &self,
        signature: &Signature,
        completion: &str,
    ) -> Result<HashMap<String, FieldValue>> {
        Ok(parse_marked_outputs(signature, completion)?)
    }
}

/// Header, input and hint descriptions, separator, input values.
///
/// Output fields are not rendered; the prompt only describes what goes in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPromptStrategy;

impl DefaultPromptStrategy {
    fn description_block(signature: &Signature) -> String {
        let mut block = String::new();
        for field in signature.fields() {
            if field.kind() == FieldKind::Output {
                continue;
            }
            block.push_str(&field.format_prompt_description());
            block.push('\n');
        }
        block
    }

    pub(crate) fn value_block(signature: &Signature, inputs: &Inputs) -> Result<String> {
        let mut block = String::new();
        for (name, field) in signature.input_variables() {
            // validate_inputs guarantees the key is present
            let Some(value) = inputs.get(name) else {
                continue;
            };
            if let Some(lines) = field.format_prompt_value(value)? {
                block.push_str(&lines);
                block.push('\n');
            }
        }
        Ok(block)
    }
}

impl PromptStrategy for DefaultPromptStrategy {
    fn format_prompt(&self, signature: &Signature, inputs: &Inputs) -> Result<String> {
        self.validate_inputs(signature, inputs)?;

        let mut prompt = String::from(PROMPT_HEADER);
        prompt.push_str(&Self::description_block(signature));
        prompt.push_str(PROMPT_SEPARATOR);
        prompt.push_str(&Self::value_block(signature, inputs)?);
        Ok(prompt)
    }
}

/// The default layout plus a `🔑name: desc` line for every output, so the
/// model is told exactly how to mark its answers.
///
/// Pairs with [`parse_marked_outputs`], which reads those markers back.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkedOutputPromptStrategy;

impl MarkedOutputPromptStrategy {
    pub(crate) fn description_block(signature: &Signature) -> String {
        let mut block = String::new();
        for field in signature.fields() {
            block.push_str(&field.format_prompt_description());
            block.push('\n');
        }
        block
    }
}

impl PromptStrategy for MarkedOutputPromptStrategy {
    fn format_prompt(&self, signature: &Signature, inputs: &Inputs) -> Result<String> {
        self.validate_inputs(signature, inputs)?;

        let mut prompt = String::from(PROMPT_HEADER);
        prompt.push_str(&Self::description_block(signature));
        prompt.push_str(PROMPT_SEPARATOR);
        prompt.push_str(&DefaultPromptStrategy::value_block(signature, inputs)?);
        Ok(prompt)
    }

    fn parse_output(
        &self,
        signature: &Signature,
        completion: &str,
    ) -> Result<HashMap<String, FieldValue>> {
        Ok(parse_marked_outputs(signature, completion)?)
    }
}

/// One worked example shown to the model before the live inputs.
#[derive(Debug, Clone, Default)]
pub struct Exemplar {
    pub inputs: Inputs,
    pub outputs: Vec<(String, FieldValue)>,
}

impl Exemplar {
    pub fn new(inputs: Inputs) -> Self {
        Self {
            inputs,
            outputs: Vec::new(),
        }
    }

    pub fn output(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.outputs.push((name.into(), value.into()));
        self
    }

    /// Checks that the outputs name every declared output and nothing else.
    fn check_outputs(&self, signature: &Signature) -> Result<(), ConfigError> {
        let mut missing: Vec<String> = signature
            .output_variables()
            .filter(|(name, _)| !self.outputs.iter().any(|(n, _)| n == name))
            .map(|(name, _)| name.to_string())
            .collect();
        let mut unexpected: Vec<String> = self
            .outputs
            .iter()
            .filter(|(name, _)| signature.output(name).is_none())
            .map(|(name, _)| name.clone())
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }
        missing.sort();
        unexpected.sort();
        Err(ConfigError::ExemplarOutputs {
            missing,
            unexpected,
        })
    }
}

/// The marked-output layout with solved exemplars between the format block
/// and the live inputs.
#[derive(Debug, Clone, Default)]
pub struct FewShotPromptStrategy {
    exemplars: Vec<Exemplar>,
}

impl FewShotPromptStrategy {
    pub fn new(exemplars: Vec<Exemplar>) -> Self {
        Self { exemplars }
    }

    pub fn exemplars(&self) -> &[Exemplar] {
        &self.exemplars
    }
}

impl PromptStrategy for FewShotPromptStrategy {
    fn format_prompt(&self, signature: &Signature, inputs: &Inputs) -> Result<String> {
        self.validate_inputs(signature, inputs)?;

        let mut prompt = String::from(PROMPT_HEADER);
        prompt.push_str(&MarkedOutputPromptStrategy::description_block(signature));

        for exemplar in &self.exemplars {
            // Exemplars obey the same contract as live inputs.
            signature.validate_inputs(&exemplar.inputs)?;
            exemplar.check_outputs(signature)?;

            prompt.push_str(PROMPT_SEPARATOR);
            prompt.push_str(&DefaultPromptStrategy::value_block(signature, &exemplar.inputs)?);
            for (name, _) in signature.output_variables() {
                if let Some((_, value)) = exemplar.outputs.iter().find(|(n, _)| n == name) {
                    let line = format!("{}{}: {}\n", OUTPUT_TOKEN, name, display(value));
                    prompt.push_str(&line);
                }
            }
        }

        prompt.push_str(PROMPT_SEPARATOR);
        prompt.push_str(&DefaultPromptStrategy::value_block(signature, inputs)?);
        Ok(prompt)
    }
}

fn is_marker_line(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with(OUTPUT_TOKEN) || line.starts_with(INPUT_TOKEN) || line.starts_with(HINT_TOKEN)
}

/// Splits a segment into the field name and whatever follows it.
///
/// The name ends at the first whitespace or `:`. The remainder is `Some`
/// only when a `:` directly follows the name.
fn split_segment(segment: &str) -> (&str, Option<&str>) {
    let end = segment
        .find(|c: char| c == ':' || c.is_whitespace())
        .unwrap_or(segment.len());
    let (name, rest) = segment.split_at(end);
    (name, rest.strip_prefix(':'))
}

/// Reads `🔑name: value` segments out of a completion.
///
/// A segment runs from its marker line up to the next marker line, so values
/// may span several lines. The first segment for a name wins even when it is
/// malformed; later ones are ignored.
pub fn parse_marked_outputs(
    signature: &Signature,
    completion: &str,
) -> Result<HashMap<String, FieldValue>, OutputError> {
    let mut segments: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in completion.lines() {
        if is_marker_line(line) {
            if let Some(done) = current.take() {
                segments.push(done);
            }
            if let Some(rest) = line.trim_start().strip_prefix(OUTPUT_TOKEN) {
                current = Some(rest.trim_start().to_string());
            }
        } else if let Some(seg) = current.as_mut() {
            seg.push('\n');
            seg.push_str(line);
        }
    }
    if let Some(done) = current.take() {
        segments.push(done);
    }

    let mut first: HashMap<String, Result<FieldValue, String>> = HashMap::new();

    for segment in &segments {
        let (name, value) = split_segment(segment);
        if signature.output(name).is_none() {
            log::warn!("Ignoring undeclared output '{}' in completion", name);
            continue;
        }
        if first.contains_key(name) {
            log::warn!("Output '{}' appears more than once; keeping the first", name);
            continue;
        }
        let parsed = match value.map(str::trim) {
            None => Err("no ':' separator after field name".to_string()),
            Some("") => Err("empty value".to_string()),
            Some(value) => Ok(FieldValue::String(value.to_string())),
        };
        first.insert(name.to_string(), parsed);
    }

    let mut found: HashMap<String, FieldValue> = HashMap::new();
    for (name, _) in signature.output_variables() {
        match first.remove(name) {
            Some(Ok(value)) => {
                found.insert(name.to_string(), value);
            }
            Some(Err(reason)) => {
                return Err(OutputError::Malformed {
                    field: name.to_string(),
                    reason,
                });
            }
            None => {
                return Err(OutputError::Missing {
                    field: name.to_string(),
                });
            }
        }
    }
    Ok(found)
}
