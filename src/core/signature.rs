use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use crate::core::Inputs;
use crate::core::error::{ConfigError, InputError};
use crate::core::field::{FieldDescriptor, FieldKind};

/// The input/output contract of one prompt.
///
/// Fields are kept in declaration order. Inputs and outputs are looked up by
/// name; hints only ever contribute static lines to the prompt.
#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    fields: Arc<[FieldDescriptor]>,
}

impl Signature {
    /// Starts declaring a signature called `name`.
    pub fn builder(name: impl Into<String>) -> SignatureBuilder {
        SignatureBuilder {
            name: name.into(),
            fields: Vec::new(),
            error: None,
        }
    }

    /// Classifies `fields` by role and checks that every name is unique.
    pub fn from_fields(
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for field in fields.iter().filter(|f| f.kind() != FieldKind::Hint) {
            if !seen.insert(field.name()) {
                return Err(ConfigError::DuplicateField(field.name().to_string()));
            }
        }
        Ok(Self {
            name: name.into(),
            fields: fields.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every declared field, hints included, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Input fields (scalar and list) keyed by name, in declaration order.
    pub fn input_variables(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields
            .iter()
            .filter(|f| f.kind().is_input())
            .map(|f| (f.name(), f))
    }

    /// Output fields keyed by name, in declaration order.
    pub fn output_variables(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields
            .iter()
            .filter(|f| f.kind() == FieldKind::Output)
            .map(|f| (f.name(), f))
    }

    pub fn hints(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.kind() == FieldKind::Hint)
    }

    pub fn input(&self, name: &str) -> Option<&FieldDescriptor> {
        self.input_variables().find(|(n, _)| *n == name).map(|(_, f)| f)
    }

    pub fn output(&self, name: &str) -> Option<&FieldDescriptor> {
        self.output_variables().find(|(n, _)| *n == name).map(|(_, f)| f)
    }

    pub fn output_names(&self) -> Vec<String> {
        self.output_variables().map(|(n, _)| n.to_string()).collect()
    }

    /// Checks that `supplied` names exactly the declared inputs, no more and no less.
    pub fn validate_inputs(&self, supplied: &Inputs) -> Result<(), InputError> {
        let expected: BTreeSet<&str> = self.input_variables().map(|(n, _)| n).collect();
        let given: BTreeSet<&str> = supplied.keys().map(String::as_str).collect();
        if expected == given {
            return Ok(());
        }
        Err(InputError::Mismatch {
            missing: expected.difference(&given).map(|s| s.to_string()).collect(),
            unexpected: given.difference(&expected).map(|s| s.to_string()).collect(),
        })
    }

    /// Returns a structural hash of the signature.
    ///
    /// Descriptions are excluded so that rewording a field does not change the
    /// signature's identity. Field order matters. The value comes from
    /// `DefaultHasher`, so it only compares equal within one build of the
    /// crate; do not persist it across toolchain upgrades.
    pub fn structural_hash(&self) -> String {
        let mut hasher = DefaultHasher::new();
        for (name, field) in self.input_variables() {
            name.hash(&mut hasher);
            field.kind().hash(&mut hasher);
        }
        "input_separator".hash(&mut hasher);
        for (name, _) in self.output_variables() {
            name.hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }
}

/// Declares fields one by one. The first invalid declaration is reported by [`build`](Self::build).
pub struct SignatureBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    error: Option<ConfigError>,
}

impl SignatureBuilder {
    fn push(mut self, field: Result<FieldDescriptor, ConfigError>) -> Self {
        match field {
            Ok(f) => self.fields.push(f),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    pub fn input(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push(FieldDescriptor::input(name, description))
    }

    pub fn input_list(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push(FieldDescriptor::input_list(name, description))
    }

    pub fn output(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push(FieldDescriptor::output(name, description))
    }

    pub fn hint(self, description: impl Into<String>) -> Self {
        self.push(Ok(FieldDescriptor::hint(description)))
    }

    /// Adds a fully configured descriptor (hooks, options).
    pub fn field(self, field: Result<FieldDescriptor, ConfigError>) -> Self {
        self.push(field)
    }

    pub fn build(self) -> Result<Signature, ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Signature::from_fields(self.name, self.fields)
    }
}

impl FromStr for Signature {
    type Err = ConfigError;

    /// Parses shorthand syntax: "input1, input2 -> output1, output2"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split("->").collect();
        if parts.len() != 2 {
            return Err(ConfigError::Shorthand(
                "signature must contain exactly one '->'".to_string(),
            ));
        }

        let names = |part: &str| -> Vec<String> {
            part.split(',')
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut fields = Vec::new();
        for name in names(parts[0]) {
            fields.push(FieldDescriptor::input(name, "")?);
        }
        for name in names(parts[1]) {
            fields.push(FieldDescriptor::output(name, "")?);
        }
        Signature::from_fields(s.trim(), fields)
    }
}

/// Macro for rapid signature creation: signature!("doc -> summary")
#[macro_export]
macro_rules! signature {
    ($s:expr) => {
        $s.parse::<$crate::Signature>().expect("Invalid signature shorthand")
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn qa() -> Signature {
        Signature::builder("QA")
            .hint("Be concise")
            .input("question", "a question")
            .input_list("facts", "supporting facts")
            .output("answer", "the answer")
            .build()
            .unwrap()
    }

    #[test]
    fn test_partition_by_role() {
        let sig = qa();
        let inputs: Vec<&str> = sig.input_variables().map(|(n, _)| n).collect();
        let outputs: Vec<&str> = sig.output_variables().map(|(n, _)| n).collect();
        assert_eq!(inputs, vec!["question", "facts"]);
        assert_eq!(outputs, vec!["answer"]);
        assert_eq!(sig.hints().count(), 1);
        assert_eq!(sig.fields().len(), 4);
    }

    #[test]
    fn test_hint_isolation() {
        let sig = qa();
        assert!(sig.input_variables().all(|(_, f)| f.kind() != FieldKind::Hint));
        assert!(sig.output_variables().all(|(_, f)| f.kind() != FieldKind::Hint));
        assert!(sig.input("").is_none());
        assert!(sig.output("").is_none());
    }

    #[test]
    fn test_exact_input_match() {
        let sig = qa();
        let mut inputs = Inputs::new();
        inputs.insert("question".into(), json!("q"));
        inputs.insert("facts".into(), json!([]));
        assert!(sig.validate_inputs(&inputs).is_ok());

        let mut missing = inputs.clone();
        missing.remove("facts");
        assert_eq!(
            sig.validate_inputs(&missing).unwrap_err(),
            InputError::Mismatch {
                missing: vec!["facts".into()],
                unexpected: vec![],
            }
        );

        let mut extra = inputs.clone();
        extra.insert("answer".into(), json!("cheat"));
        assert_eq!(
            sig.validate_inputs(&extra).unwrap_err(),
            InputError::Mismatch {
                missing: vec![],
                unexpected: vec!["answer".into()],
            }
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Signature::builder("Dup")
            .input("x", "")
            .output("x", "")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateField("x".into()));

        // Several hints share the empty name without clashing.
        assert!(Signature::builder("Hints").hint("a").hint("b").build().is_ok());
    }

    #[test]
    fn test_builder_reports_first_bad_field() {
        let err = Signature::builder("Bad")
            .input("ok", "")
            .input("bad:name", "")
            .output("", "")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReservedCharacter { ch: ':', .. }));
    }

    #[test]
    fn test_signature_parsing() {
        let sig: Signature = "context, question -> answer".parse().unwrap();
        let inputs: Vec<&str> = sig.input_variables().map(|(n, _)| n).collect();
        assert_eq!(inputs, vec!["context", "question"]);
        assert_eq!(sig.output_names(), vec!["answer".to_string()]);
        assert!("no arrow here".parse::<Signature>().is_err());
    }

    #[test]
    fn test_signature_hash() {
        let sig1 = signature!("a, b -> c");
        let sig2 = signature!("a, b -> c");
        let sig3 = signature!("b, a -> c");
        assert_eq!(sig1.structural_hash(), sig2.structural_hash());
        // Order matters for structural identity
        assert_ne!(sig1.structural_hash(), sig3.structural_hash());
    }

    #[test]
    fn test_hash_ignores_descriptions() {
        let terse = signature!("question -> answer");
        let verbose = Signature::builder("Other")
            .input("question", "a question")
            .output("answer", "the answer")
            .build()
            .unwrap();
        assert_eq!(terse.structural_hash(), verbose.structural_hash());
        assert_eq!(terse.structural_hash().len(), 16);
    }
}
