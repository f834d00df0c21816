//! A complete example showing how to declare signatures and run them with langdspy.
//!
//! This example demonstrates:
//! - Declaring signatures with hints, scalar inputs, list inputs and outputs
//! - Attaching formatter and transformer hooks to fields
//! - Asking for `🔑`-marked answers with `MarkedOutputPromptStrategy`
//! - Grouping runners in a composite `Model`
//! - Sequencing two runners by hand, feeding one output into the next input
//!
//! The backend is a closure so the example runs without any model server.
//! Build with `--features llm` and swap in `OllamaClient::new()` to talk to a
//! local Ollama instance instead.

use langdspy::prelude::*;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// Step 1: Signatures
// ============================================================================

/// Summarises a list of facts into one sentence.
fn summarize_signature() -> Result<Signature, Error> {
    let facts = FieldDescriptor::input_list("facts", "Facts to summarise")
        .map(|f| f.with_formatter(|v, _| json!(langdspy::display(v).trim().to_string())));

    Ok(Signature::builder("SummarizeFacts")
        .hint("Write exactly one sentence")
        .field(facts)
        .output("summary", "A one sentence summary")
        .build()?)
}

/// Gives a summary a short title.
fn title_signature() -> Result<Signature, Error> {
    let title = FieldDescriptor::output("title", "A title of at most five words").map(|f| {
        f.with_transformer(|v| json!(langdspy::display(v).trim_matches('"').to_string()))
    });

    Ok(Signature::builder("TitleSummary")
        .input("summary", "The text to title")
        .field(title)
        .build()?)
}

// ============================================================================
// Step 2: A stand-in backend
// ============================================================================

fn fake_completion(prompt: &str, _config: &RunConfig) -> Result<String, langdspy::BackendError> {
    println!("---- prompt ----\n{}----------------", prompt);
    if prompt.contains("🔑summary:") {
        Ok("🔑summary: The sky is blue and the grass is green.".to_string())
    } else {
        Ok("🔑title: \"Colours of Nature\"".to_string())
    }
}

// ============================================================================
// Step 3: Run
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Error> {
    let model = Model::builder()
        .runner("summarize", Runner::new(summarize_signature()?, MarkedOutputPromptStrategy))
        .runner("title", Runner::new(title_signature()?, MarkedOutputPromptStrategy))
        .build()?;

    let config = RunConfig::new(Arc::new(FnModel::new("fake", fake_completion)));

    let mut carried: Inputs = Inputs::new();
    carried.insert("facts".into(), json!(["  sky is blue", "grass is green  "]));

    for (name, runner) in model.prompt_runners() {
        let prediction = runner.invoke(&carried, &config).await?;
        println!("[{}] {:?}", name, prediction.iter().collect::<Vec<_>>());
        // The next runner's inputs are exactly this runner's outputs.
        carried = prediction
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
    }

    println!("Title: {}", carried["title"]);
    Ok(())
}
