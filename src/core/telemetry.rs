use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::core::{FieldValue, Inputs};

/// A single entry in the execution trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub timestamp: u64,
    pub call_id: String,
    pub runner: String,
    pub signature: String,
    pub signature_hash: String,
    pub model_name: String,
    pub prompt: String,
    pub completion: String,
    pub inputs: Inputs,
    pub outputs: BTreeMap<String, FieldValue>,
}

/// Trait for recording execution traces.
pub trait Telemetry: Send + Sync {
    fn record(&self, entry: TraceEntry);
    fn flush(&self);
}

/// Simple in-memory collector for traces.
#[derive(Default)]
pub struct MemoryTelemetry {
    traces: Mutex<Vec<TraceEntry>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_traces(&self) -> Vec<TraceEntry> {
        match self.traces.lock() {
            Ok(traces) => traces.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Telemetry for MemoryTelemetry {
    fn record(&self, entry: TraceEntry) {
        match self.traces.lock() {
            Ok(mut traces) => traces.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    fn flush(&self) {
        // No-op for memory collector
    }
}
