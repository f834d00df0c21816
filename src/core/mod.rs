pub mod config;
pub mod error;
pub mod field;
pub mod model;
pub mod prediction;
pub mod runner;
pub mod signature;
pub mod strategy;
pub mod telemetry;

use std::collections::HashMap;

/// The Alias for serde_json::Value, the type every field value travels as
pub type FieldValue = serde_json::Value;

/// Argument set for one invocation, keyed by input field name.
pub type Inputs = HashMap<String, FieldValue>;
