use std::collections::HashSet;

use crate::core::error::ConfigError;
use crate::core::runner::Runner;

/// Groups several runners under one object, each under its own name.
///
/// Registration order is kept. The list is fixed once the model is built;
/// sequencing runners is left to the caller.
#[derive(Debug, Clone, Default)]
pub struct Model {
    prompt_runners: Vec<(String, Runner)>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// The registered `(name, runner)` pairs in declaration order.
    pub fn prompt_runners(&self) -> &[(String, Runner)] {
        &self.prompt_runners
    }

    pub fn runner(&self, name: &str) -> Option<&Runner> {
        self.prompt_runners
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.prompt_runners.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.prompt_runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompt_runners.is_empty()
    }
}

#[derive(Default)]
pub struct ModelBuilder {
    prompt_runners: Vec<(String, Runner)>,
}

impl ModelBuilder {
    pub fn runner(mut self, name: impl Into<String>, runner: Runner) -> Self {
        self.prompt_runners.push((name.into(), runner));
        self
    }

    pub fn build(self) -> Result<Model, ConfigError> {
        let mut seen = HashSet::new();
        for (name, _) in &self.prompt_runners {
            if name.is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateRunner(name.clone()));
            }
        }
        Ok(Model {
            prompt_runners: self.prompt_runners,
        })
    }
}
