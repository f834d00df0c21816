use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::FieldValue;
use crate::core::field::display;

/// The record produced by one runner invocation.
///
/// Values are keyed by field name. The declared output names are remembered
/// so callers can tell parsed outputs apart from echoed inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Prediction {
    values: BTreeMap<String, FieldValue>,
    outputs: Vec<String>,
    completion: String,
}

impl Prediction {
    pub fn new(outputs: Vec<String>, completion: impl Into<String>) -> Self {
        Self {
            values: BTreeMap::new(),
            outputs,
            completion: completion.into(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// The value rendered as text; JSON strings come back unquoted.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.values.get(name).map(display)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True when `name` is one of the signature's declared outputs.
    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o == name)
    }

    pub fn output_names(&self) -> &[String] {
        &self.outputs
    }

    /// The backend's raw completion this prediction was parsed from.
    pub fn completion(&self) -> &str {
        &self.completion
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> BTreeMap<String, FieldValue> {
        self.values
    }
}

impl std::ops::Index<&str> for Prediction {
    type Output = FieldValue;

    fn index(&self, name: &str) -> &Self::Output {
        &self.values[name]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_record() {
        let mut pred = Prediction::new(vec!["answer".into()], "🔑answer: 4");
        pred.insert("answer", json!("4"));
        pred.insert("question", json!("What is 2+2?"));

        assert_eq!(pred.len(), 2);
        assert_eq!(pred["answer"], json!("4"));
        assert_eq!(pred.get_str("answer").as_deref(), Some("4"));
        assert!(pred.is_output("answer"));
        assert!(!pred.is_output("question"));
        assert!(pred.contains("question"));
        assert_eq!(pred.completion(), "🔑answer: 4");
    }

    #[test]
    fn test_serializes_values() {
        let mut pred = Prediction::new(vec!["n".into()], "");
        pred.insert("n", json!(3));
        let value = serde_json::to_value(&pred).unwrap();
        assert_eq!(value["values"], json!({"n": 3}));
    }
}
