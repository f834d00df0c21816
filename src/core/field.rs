//! Field descriptors: the named slots a [`Signature`](crate::Signature) is made of.
//!
//! A descriptor is plain configuration plus three optional hooks:
//! - a **formatter** computing the display form of a value for the prompt,
//! - a **transformer** computing the canonical form of a parsed output,
//! - a **validator** accepting or rejecting a value given the call's inputs.
//!
//! Every hook also receives the descriptor's [`FieldOptions`], an open bag of
//! keyword configuration forwarded verbatim.

use std::fmt;
use std::sync::Arc;

use crate::core::error::{ConfigError, InputError};
use crate::core::{FieldValue, Inputs};

/// Marker prefixing input fields in the prompt.
pub const INPUT_TOKEN: &str = "✅";
/// Marker prefixing output fields in the prompt and in the completion.
pub const OUTPUT_TOKEN: &str = "🔑";
/// Marker prefixing static hint lines.
pub const HINT_TOKEN: &str = "💡";

/// Characters a field name may not contain since they delimit the prompt layout.
pub const RESERVED_CHARS: [char; 4] = ['\n', '\r', ':', '⏎'];

/// Open keyword configuration forwarded to a field's hooks.
pub type FieldOptions = serde_json::Map<String, FieldValue>;

pub type Formatter = Arc<dyn Fn(&FieldValue, &FieldOptions) -> FieldValue + Send + Sync>;
pub type Transformer = Arc<dyn Fn(&FieldValue) -> FieldValue + Send + Sync>;
pub type Validator = Arc<dyn Fn(&Inputs, &FieldValue, &FieldOptions) -> bool + Send + Sync>;

/// Role of a field inside a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A single scalar input.
    Input,
    /// An ordered sequence of inputs rendered one indexed line per element.
    InputList,
    /// A slot the backend is expected to fill.
    Output,
    /// A nameless static instruction.
    Hint,
}

impl FieldKind {
    pub fn is_input(self) -> bool {
        matches!(self, FieldKind::Input | FieldKind::InputList)
    }

    pub fn token(self) -> &'static str {
        match self {
            FieldKind::Input | FieldKind::InputList => INPUT_TOKEN,
            FieldKind::Output => OUTPUT_TOKEN,
            FieldKind::Hint => HINT_TOKEN,
        }
    }
}

/// One named slot of a signature.
#[derive(Clone)]
pub struct FieldDescriptor {
    kind: FieldKind,
    name: String,
    description: String,
    formatter: Option<Formatter>,
    transformer: Option<Transformer>,
    validator: Option<Validator>,
    options: FieldOptions,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("formatter", &self.formatter.is_some())
            .field("transformer", &self.transformer.is_some())
            .field("validator", &self.validator.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl FieldDescriptor {
    /// Declares a scalar input field.
    pub fn input(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::named(FieldKind::Input, name.into(), description.into())
    }

    /// Declares an input field whose value is a sequence.
    pub fn input_list(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::named(FieldKind::InputList, name.into(), description.into())
    }

    /// Declares an output field.
    pub fn output(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::named(FieldKind::Output, name.into(), description.into())
    }

    /// Declares a hint. Hints carry no name and never bind a value.
    pub fn hint(description: impl Into<String>) -> Self {
        Self::raw(FieldKind::Hint, String::new(), description.into())
    }

    fn named(kind: FieldKind, name: String, description: String) -> Result<Self, ConfigError> {
        check_name(&name)?;
        Ok(Self::raw(kind, name, description))
    }

    fn raw(kind: FieldKind, name: String, description: String) -> Self {
        Self {
            kind,
            name,
            description,
            formatter: None,
            transformer: None,
            validator: None,
            options: FieldOptions::new(),
        }
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&FieldValue, &FieldOptions) -> FieldValue + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_transformer<F>(mut self, transformer: F) -> Self
    where
        F: Fn(&FieldValue) -> FieldValue + Send + Sync + 'static,
    {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Inputs, &FieldValue, &FieldOptions) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Adds one keyword option handed to every hook of this field.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Display form of `value` for prompt rendering.
    pub fn format_value(&self, value: &FieldValue) -> FieldValue {
        match &self.formatter {
            Some(formatter) => formatter(value, &self.options),
            None => value.clone(),
        }
    }

    /// Canonical form of `value`, applied to parsed outputs.
    pub fn transform_value(&self, value: FieldValue) -> FieldValue {
        match &self.transformer {
            Some(transformer) => transformer(&value),
            None => value,
        }
    }

    /// Runs the validator if one is set; fields without one accept everything.
    pub fn validate_value(&self, inputs: &Inputs, value: &FieldValue) -> bool {
        match &self.validator {
            Some(validator) => validator(inputs, value, &self.options),
            None => true,
        }
    }

    fn start_format(&self) -> String {
        format!("{}{}", self.kind.token(), self.name)
    }

    /// The line describing this field in the prompt's format block.
    pub fn format_prompt_description(&self) -> String {
        match self.kind {
            FieldKind::Hint => format!("{} {}", HINT_TOKEN, self.description),
            _ => format!("{}: {}", self.start_format(), self.description),
        }
    }

    /// The line(s) binding `value` to this field.
    ///
    /// Returns `Ok(None)` for hints and outputs, which have no value block.
    pub fn format_prompt_value(
        &self,
        value: &FieldValue,
    ) -> Result<Option<String>, InputError> {
        match self.kind {
            FieldKind::Input => Ok(Some(format!(
                "{}: {}",
                self.start_format(),
                display(&self.format_value(value))
            ))),
            FieldKind::InputList => {
                let items = value.as_array().ok_or_else(|| InputError::ExpectedList {
                    field: self.name.clone(),
                })?;
                let lines: Vec<String> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        format!(
                            "{} [{}]: {}",
                            self.start_format(),
                            i,
                            display(&self.format_value(item))
                        )
                    })
                    .collect();
                Ok(Some(lines.join("\n")))
            }
            FieldKind::Output | FieldKind::Hint => Ok(None),
        }
    }
}

/// Strings are shown bare; anything else as compact JSON.
pub fn display(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName);
    }
    if let Some(ch) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(ConfigError::ReservedCharacter {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_sanitation() {
        assert!(FieldDescriptor::input("question", "a question").is_ok());
        assert!(FieldDescriptor::output("final_answer", "").is_ok());

        assert_eq!(
            FieldDescriptor::input("a:b", "").unwrap_err(),
            ConfigError::ReservedCharacter {
                name: "a:b".into(),
                ch: ':'
            }
        );
        assert!(matches!(
            FieldDescriptor::output("a\nb", ""),
            Err(ConfigError::ReservedCharacter { ch: '\n', .. })
        ));
        assert!(matches!(
            FieldDescriptor::input_list("a⏎b", ""),
            Err(ConfigError::ReservedCharacter { ch: '⏎', .. })
        ));
        assert_eq!(FieldDescriptor::input("", "x").unwrap_err(), ConfigError::EmptyName);
    }

    #[test]
    fn test_hint_rendering() {
        let hint = FieldDescriptor::hint("Answer in one word");
        assert_eq!(hint.name(), "");
        assert_eq!(hint.kind(), FieldKind::Hint);
        assert_eq!(hint.format_prompt_description(), "💡 Answer in one word");
        assert_eq!(hint.format_prompt_value(&json!("ignored")).unwrap(), None);
    }

    #[test]
    fn test_input_rendering() {
        let field = FieldDescriptor::input("question", "a question").unwrap();
        assert_eq!(field.format_prompt_description(), "✅question: a question");
        assert_eq!(
            field.format_prompt_value(&json!("What is 2+2?")).unwrap().unwrap(),
            "✅question: What is 2+2?"
        );
        assert_eq!(
            field.format_prompt_value(&json!(42)).unwrap().unwrap(),
            "✅question: 42"
        );
    }

    #[test]
    fn test_list_rendering_formats_each_element() {
        let field = FieldDescriptor::input_list("facts", "known facts")
            .unwrap()
            .with_formatter(|v, opts| {
                let suffix = opts.get("suffix").and_then(|s| s.as_str()).unwrap_or("");
                json!(format!("{}{}", display(v), suffix))
            })
            .with_option("suffix", "!");

        let rendered = field
            .format_prompt_value(&json!(["a", "b", "c"]))
            .unwrap()
            .unwrap();
        assert_eq!(rendered, "✅facts [0]: a!\n✅facts [1]: b!\n✅facts [2]: c!");
    }

    #[test]
    fn test_list_field_rejects_scalar() {
        let field = FieldDescriptor::input_list("facts", "").unwrap();
        assert!(field.format_prompt_value(&json!("not a list")).is_err());
    }

    #[test]
    fn test_format_value_does_not_mutate() {
        let field = FieldDescriptor::input("n", "")
            .unwrap()
            .with_formatter(|v, _| json!(v.as_i64().unwrap_or(0) * 2));
        let original = json!(21);
        assert_eq!(field.format_value(&original), json!(42));
        assert_eq!(original, json!(21));
    }

    #[test]
    fn test_default_hooks_are_identity() {
        let field = FieldDescriptor::output("answer", "").unwrap();
        let inputs = Inputs::new();
        assert_eq!(field.format_value(&json!("x")), json!("x"));
        assert_eq!(field.transform_value(json!("x")), json!("x"));
        assert!(field.validate_value(&inputs, &json!("x")));
    }

    #[test]
    fn test_validator_sees_inputs_and_options() {
        let field = FieldDescriptor::output("answer", "")
            .unwrap()
            .with_option("max_len", 3)
            .with_validator(|inputs, value, opts| {
                let max = opts
                    .get("max_len")
                    .and_then(|m| m.as_u64())
                    .unwrap_or(0) as usize;
                inputs.contains_key("question") && display(value).len() <= max
            });

        let mut inputs = Inputs::new();
        inputs.insert("question".into(), json!("?"));
        assert!(field.validate_value(&inputs, &json!("4")));
        assert!(!field.validate_value(&inputs, &json!("four")));
        assert!(!field.validate_value(&Inputs::new(), &json!("4")));
    }
}
