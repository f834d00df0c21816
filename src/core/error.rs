use thiserror::Error;

/// Error type returned by a [`LanguageModel`](crate::llm::LanguageModel) backend.
///
/// Kept boxed so any client error can travel through [`Error::Backend`] untouched.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Invalid field or signature declarations. Raised while building, never at invoke time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("field name cannot be empty")]
    EmptyName,

    #[error("field name '{name}' contains reserved character {ch:?}")]
    ReservedCharacter { name: String, ch: char },

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("runner '{0}' is registered more than once")]
    DuplicateRunner(String),

    #[error("invalid signature shorthand: {0}")]
    Shorthand(String),

    #[error("exemplar outputs do not match declared outputs (missing: {missing:?}, unexpected: {unexpected:?})")]
    ExemplarOutputs {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// The supplied arguments do not honour the signature's input contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("input keys do not match expected input keys (missing: {missing:?}, unexpected: {unexpected:?})")]
    Mismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("input '{field}' is a list field and expects an array value")]
    ExpectedList { field: String },
}

/// A declared output could not be recovered from the backend's completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    #[error("output '{field}' is missing from the completion")]
    Missing { field: String },

    #[error("output '{field}' is malformed: {reason}")]
    Malformed { field: String, reason: String },

    #[error("output '{field}' was rejected by its validator")]
    Invalid { field: String },
}

impl OutputError {
    /// Name of the output field this error is attributed to.
    pub fn field(&self) -> &str {
        match self {
            OutputError::Missing { field }
            | OutputError::Malformed { field, .. }
            | OutputError::Invalid { field } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("contract violation: {0}")]
    Input(#[from] InputError),

    #[error(transparent)]
    Backend(BackendError),

    #[error("output parse error: {0}")]
    Output(#[from] OutputError),
}

impl Error {
    /// Wraps a backend failure without altering it.
    pub fn backend(err: impl Into<BackendError>) -> Self {
        Error::Backend(err.into())
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Error::Input(InputError::Mismatch { .. }))
    }
}
