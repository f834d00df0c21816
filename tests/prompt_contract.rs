//! Prompt rendering and input-contract behaviour seen from outside the crate.

use langdspy::prelude::*;
use langdspy::{ConfigError, InputError};
use serde_json::json;

fn inputs(pairs: &[(&str, FieldValue)]) -> Inputs {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn test_question_answer_prompt() {
    let signature = Signature::builder("QuestionAnswer")
        .input("question", "a question")
        .output("answer", "the answer")
        .build()
        .unwrap();
    let runner = Runner::with_default_strategy(signature);

    let prompt = runner
        .format(&inputs(&[("question", json!("What is 2+2?"))]))
        .unwrap();
    assert_eq!(
        prompt,
        "Follow the following format.\n\n\
         ✅question: a question\n\
         \n---\n\n\
         ✅question: What is 2+2?\n"
    );

    let err = runner.format(&inputs(&[("q", json!("..."))])).unwrap_err();
    match err {
        Error::Input(InputError::Mismatch { missing, unexpected }) => {
            assert_eq!(missing, vec!["question".to_string()]);
            assert_eq!(unexpected, vec!["q".to_string()]);
        }
        other => panic!("Expected contract violation, got {other:?}"),
    }
}

#[test]
fn test_fact_list_value_block() {
    let signature = Signature::builder("Facts")
        .input_list("facts", "things that are true")
        .output("summary", "one sentence")
        .build()
        .unwrap();
    let prompt = Runner::with_default_strategy(signature)
        .format(&inputs(&[("facts", json!(["sky is blue", "grass is green"]))]))
        .unwrap();

    let (_, values) = prompt.split_once("\n---\n\n").unwrap();
    assert_eq!(values, "✅facts [0]: sky is blue\n✅facts [1]: grass is green\n");
}

#[test]
fn test_list_field_with_scalar_value_is_rejected() {
    let signature = Signature::builder("Facts")
        .input_list("facts", "")
        .output("summary", "")
        .build()
        .unwrap();
    let err = Runner::with_default_strategy(signature)
        .format(&inputs(&[("facts", json!("sky is blue"))]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Input(InputError::ExpectedList { field }) if field == "facts"
    ));
}

#[test]
fn test_formatter_applies_to_prompt_only() {
    let upper = FieldDescriptor::input("name", "who to greet")
        .map(|f| f.with_formatter(|v, _| json!(v.as_str().unwrap_or("").to_uppercase())));
    let signature = Signature::builder("Greet")
        .field(upper)
        .output("greeting", "")
        .build()
        .unwrap();

    let args = inputs(&[("name", json!("ada"))]);
    let prompt = Runner::with_default_strategy(signature).format(&args).unwrap();
    assert!(prompt.ends_with("✅name: ADA\n"));
    assert_eq!(args["name"], json!("ada"));
}

#[test]
fn test_hint_has_no_name_prefix() {
    let signature = Signature::builder("Hinted")
        .hint("Reply in French")
        .input("text", "text to translate")
        .output("translation", "")
        .build()
        .unwrap();

    assert!(signature.input_variables().all(|(n, _)| !n.is_empty()));
    assert!(signature.output_variables().all(|(n, _)| !n.is_empty()));

    let prompt = Runner::with_default_strategy(signature)
        .format(&inputs(&[("text", json!("hello"))]))
        .unwrap();
    assert!(prompt.contains("\n💡 Reply in French\n"));
    assert!(!prompt.contains("💡Reply"));
}

#[test]
fn test_invalid_names_fail_at_declaration() {
    for bad in ["a:b", "line\nbreak", "ret\rurn", ""] {
        let result = Signature::builder("Bad").input(bad, "").output("ok", "").build();
        assert!(result.is_err(), "name {bad:?} should be rejected");
    }
    assert!(matches!(
        "a:b -> c".parse::<Signature>(),
        Err(ConfigError::ReservedCharacter { .. })
    ));
}

#[test]
fn test_same_signature_different_strategies() {
    let signature: Signature = "question -> answer".parse().unwrap();
    let args = inputs(&[("question", json!("2+2?"))]);

    let plain = Runner::with_default_strategy(signature.clone()).format(&args).unwrap();
    let shot = Exemplar::new(inputs(&[("question", json!("1+1?"))])).output("answer", "2");
    let few_shot = Runner::new(signature.clone(), FewShotPromptStrategy::new(vec![shot]))
        .format(&args)
        .unwrap();

    let marked = Runner::new(signature, MarkedOutputPromptStrategy)
        .format(&args)
        .unwrap();

    assert_ne!(plain, few_shot);
    assert_ne!(plain, marked);
    assert!(!plain.contains("🔑"));
    assert!(marked.contains("\n🔑answer: \n"));
    assert!(few_shot.contains("🔑answer: 2\n"));
    for prompt in [&plain, &marked, &few_shot] {
        assert!(prompt.ends_with("✅question: 2+2?\n"));
    }
}
