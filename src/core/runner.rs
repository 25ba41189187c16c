//! Single-stage execution.
//!
//! One parameterized runner drives every stage: build the request, invoke
//! the model, reconcile the response into text, decode, validate. The only
//! recovery it performs is the single follow-up nudge when a response
//! carries no text at all.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapters::{ModelClient, RequestPayload};
use crate::domain::report::StagePayload;
use crate::domain::session::SessionHandle;

use super::extract::{extract_text, strip_code_fence};
use super::schema::{self, SchemaError};
use super::stage::{StageInput, StageSpec};

/// Nudge sent when the first response yields no extractable text.
const FOLLOW_UP_NUDGE: &str = "Return your analysis now as a single raw JSON object in the \
required format. Do not include markdown code blocks or any text outside the JSON object.";

/// Maximum characters of offending text carried in a decode error.
const SNIPPET_CHARS: usize = 200;

/// Failure modes of one stage invocation.
#[derive(Debug, Error)]
pub enum StageError {
    /// Transport or service failure while calling the model
    #[error("model invocation failed: {0}")]
    ModelInvocation(anyhow::Error),

    /// No usable text even after the follow-up nudge
    #[error("model produced no usable text across {events} events (follow-up attempted)")]
    EmptyResponse { events: usize },

    /// Response text did not decode as JSON
    #[error("response is not valid JSON ({source}); content was: {snippet}")]
    MalformedJson {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    /// Decoded but shape-invalid
    #[error(transparent)]
    SchemaValidation(#[from] SchemaError),
}

/// Drives a single stage to a validated payload.
pub struct StageRunner<'a> {
    client: &'a dyn ModelClient,
}

impl<'a> StageRunner<'a> {
    pub fn new(client: &'a dyn ModelClient) -> Self {
        Self { client }
    }

    /// Run one stage for `input`.
    ///
    /// `run_suffix` is generated once per run and shared across its stages,
    /// so the session here is unique to this run but stable across the
    /// stage's initial call and its follow-up.
    pub async fn run(
        &self,
        stage: &StageSpec,
        input: StageInput<'_>,
        run_suffix: &str,
    ) -> Result<StagePayload, StageError> {
        let request = stage.build_request(&input);
        let session = SessionHandle::new(input.patient_id, stage.name, run_suffix);

        let mut events = self
            .client
            .invoke(&session, &request)
            .await
            .map_err(StageError::ModelInvocation)?;

        let mut text = extract_text(&events);

        // The extractor scans every event, so an empty result means even the
        // newest event closed without text (tool calls only, or no content at
        // all). One nudge on the same session, then give up.
        if text.is_none() {
            warn!(
                stage = stage.name,
                events = events.len(),
                "No text in response, sending follow-up nudge"
            );

            let follow_up = self
                .client
                .invoke(&session, &RequestPayload::user(FOLLOW_UP_NUDGE))
                .await
                .map_err(StageError::ModelInvocation)?;

            events.extend(follow_up);
            text = extract_text(&events);
        }

        let Some(text) = text else {
            return Err(StageError::EmptyResponse {
                events: events.len(),
            });
        };

        let cleaned = strip_code_fence(&text);
        debug!(
            stage = stage.name,
            chars = cleaned.len(),
            "Decoding stage response"
        );

        let value: Value =
            serde_json::from_str(cleaned).map_err(|source| StageError::MalformedJson {
                snippet: snippet(cleaned),
                source,
            })?;

        Ok(schema::validate(stage.name, value, stage.required_fields)?)
    }
}

/// First characters of the offending text, for diagnostics.
fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}
