//! Stage Runner Integration Tests
//!
//! Exercises the single-stage execution path: text extraction, the one-shot
//! follow-up nudge, fence stripping, JSON decoding, and schema validation.

mod common;

use serde_json::json;

use mediguard::core::{standard_stages, StageError, StageInput, StageRunner};
use mediguard::data::PatientBundle;
use mediguard::domain::ResponseEvent;

use common::{bundle, identity_json, ScriptedClient};

const RUN_SUFFIX: &str = "a1b2c3d4";

fn identity_input(record: &PatientBundle) -> StageInput<'_> {
    StageInput {
        patient_id: "P1",
        record: Some(record),
        prior: &[],
    }
}

#[tokio::test]
async fn test_text_response_decodes_and_validates() {
    let client = ScriptedClient::new(vec![Ok(vec![ResponseEvent::text(identity_json())])]);
    let record = bundle("P1");
    let [identity, _, _] = standard_stages();
    let runner = StageRunner::new(&client);

    let payload = runner
        .run(&identity, identity_input(&record), RUN_SUFFIX)
        .await
        .unwrap();

    assert_eq!(payload.get("fraud_risk_score"), Some(&json!(45)));
    assert_eq!(client.recorded().len(), 1);
}

#[tokio::test]
async fn test_tool_only_response_triggers_single_follow_up() {
    let client = ScriptedClient::new(vec![
        Ok(vec![ResponseEvent::tool_call(
            "query_billing_codes",
            json!({"code": "99213"}),
        )]),
        Ok(vec![ResponseEvent::text(identity_json())]),
    ]);
    let record = bundle("P1");
    let [identity, _, _] = standard_stages();
    let runner = StageRunner::new(&client);

    let payload = runner
        .run(&identity, identity_input(&record), RUN_SUFFIX)
        .await
        .unwrap();

    assert_eq!(payload.get("identity_misuse_flag"), Some(&json!(true)));

    let recorded = client.recorded();
    assert_eq!(recorded.len(), 2);

    // Both calls on the same session, so the nudge continues the conversation
    assert_eq!(recorded[0].0, recorded[1].0);
    assert_eq!(recorded[0].0, "P1:identity:a1b2c3d4");

    // The second request is the short nudge, not a rebuilt stage prompt
    assert!(recorded[1].1.starts_with("Return your analysis now"));
    assert!(recorded[1].1.len() < recorded[0].1.len());
}

#[tokio::test]
async fn test_persistent_empty_response_fails_after_one_nudge() {
    let client = ScriptedClient::new(vec![
        Ok(vec![ResponseEvent::empty(), ResponseEvent::empty()]),
        Ok(vec![ResponseEvent::tool_call("noop", json!({}))]),
    ]);
    let record = bundle("P1");
    let [identity, _, _] = standard_stages();
    let runner = StageRunner::new(&client);

    let err = runner
        .run(&identity, identity_input(&record), RUN_SUFFIX)
        .await
        .unwrap_err();

    // Two initial events plus the follow-up's one
    assert!(matches!(err, StageError::EmptyResponse { events: 3 }));

    // Exactly two calls: the stage request and the single nudge
    assert_eq!(client.recorded().len(), 2);
}

#[tokio::test]
async fn test_fenced_json_output_still_decodes() {
    let fenced = format!("```json\n{}\n```", identity_json());
    let client = ScriptedClient::new(vec![Ok(vec![ResponseEvent::text(fenced)])]);
    let record = bundle("P1");
    let [identity, _, _] = standard_stages();
    let runner = StageRunner::new(&client);

    let payload = runner
        .run(&identity, identity_input(&record), RUN_SUFFIX)
        .await
        .unwrap();

    assert_eq!(payload.get("identity_misuse_flag"), Some(&json!(true)));
}

#[tokio::test]
async fn test_latest_text_event_wins_over_earlier_chatter() {
    let client = ScriptedClient::new(vec![Ok(vec![
        ResponseEvent::text("Let me analyze the claims first."),
        ResponseEvent::text(identity_json()),
        ResponseEvent::tool_call("noop", json!({})),
    ])]);
    let record = bundle("P1");
    let [identity, _, _] = standard_stages();
    let runner = StageRunner::new(&client);

    // Decodes the newest text event; joining in the earlier chatter would
    // have produced a decode failure instead.
    let payload = runner
        .run(&identity, identity_input(&record), RUN_SUFFIX)
        .await
        .unwrap();

    assert_eq!(payload.get("fraud_risk_score"), Some(&json!(45)));
}

#[tokio::test]
async fn test_schema_failure_names_every_violation() {
    let bad = r#"{"fraud_risk_score": "high", "reasons": []}"#;
    let client = ScriptedClient::new(vec![Ok(vec![ResponseEvent::text(bad)])]);
    let record = bundle("P1");
    let [identity, _, _] = standard_stages();
    let runner = StageRunner::new(&client);

    let err = runner
        .run(&identity, identity_input(&record), RUN_SUFFIX)
        .await
        .unwrap_err();

    assert!(matches!(err, StageError::SchemaValidation(_)));

    // Both the wrong-kind field and the missing field are reported
    let message = err.to_string();
    assert!(message.contains("fraud_risk_score"));
    assert!(message.contains("identity_misuse_flag"));
}

#[tokio::test]
async fn test_extra_fields_survive_validation() {
    let enriched = r#"{"fraud_risk_score": 10, "identity_misuse_flag": false, "reasons": [], "model_notes": "clean"}"#;
    let client = ScriptedClient::new(vec![Ok(vec![ResponseEvent::text(enriched)])]);
    let record = bundle("P1");
    let [identity, _, _] = standard_stages();
    let runner = StageRunner::new(&client);

    let payload = runner
        .run(&identity, identity_input(&record), RUN_SUFFIX)
        .await
        .unwrap();

    assert_eq!(payload.get("model_notes"), Some(&json!("clean")));
}

#[tokio::test]
async fn test_transport_failure_maps_to_invocation_error() {
    let client = ScriptedClient::new(vec![Err(anyhow::anyhow!("connection refused"))]);
    let record = bundle("P1");
    let [identity, _, _] = standard_stages();
    let runner = StageRunner::new(&client);

    let err = runner
        .run(&identity, identity_input(&record), RUN_SUFFIX)
        .await
        .unwrap_err();

    assert!(matches!(err, StageError::ModelInvocation(_)));
    assert!(err.to_string().contains("connection refused"));
}
