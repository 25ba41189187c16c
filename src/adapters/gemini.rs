//! Gemini model-service client.
//!
//! Speaks the `generateContent` REST protocol. The client keeps a transcript
//! per session so a follow-up call on the same [`SessionHandle`] continues
//! the same conversation; distinct runs never share a transcript because the
//! session suffix differs per run.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{ModelClient, RequestPayload};
use crate::domain::response::{ContentBlock, Part, ResponseEvent};
use crate::domain::session::SessionHandle;

/// Configuration for the Gemini client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model identifier
    #[serde(default = "default_model")]
    pub name: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature; pinned low so stage outputs stay parseable
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f64 {
    0.0
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Gemini API client with per-session conversation transcripts.
pub struct GeminiClient {
    config: GeminiConfig,
    /// API key, sent as a header and never logged
    api_key: String,
    /// HTTP client
    client: reqwest::Client,
    /// Conversation history keyed by session id
    transcripts: Mutex<HashMap<String, Vec<WireContent>>>,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(config: GeminiConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            api_key,
            client,
            transcripts: Mutex::new(HashMap::new()),
        })
    }

    /// Create a client reading the API key from `GOOGLE_API_KEY`.
    pub fn from_env(config: GeminiConfig) -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .context("GOOGLE_API_KEY is not set; export it before running an analysis")?;

        Self::new(config, api_key)
    }

    /// Build the generateContent URL
    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.name
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn invoke(
        &self,
        session: &SessionHandle,
        request: &RequestPayload,
    ) -> Result<Vec<ResponseEvent>> {
        let session_id = session.to_string();

        // Snapshot the transcript with the new turn appended. The lock is not
        // held across the HTTP round-trip; within one run a session is only
        // used sequentially, so the snapshot cannot go stale.
        let contents = {
            let mut transcripts = self.transcripts.lock().await;
            let transcript = transcripts.entry(session_id.clone()).or_default();
            transcript.push(WireContent::user(&request.text));
            transcript.clone()
        };

        debug!(session = %session_id, turns = contents.len(), "Calling Gemini");

        let body = GenerateContentRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach the Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let detail: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            anyhow::bail!("Gemini API error ({status}): {detail}");
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        // Record the model turns so a follow-up continues this conversation
        {
            let mut transcripts = self.transcripts.lock().await;
            if let Some(transcript) = transcripts.get_mut(&session_id) {
                for candidate in &reply.candidates {
                    if let Some(content) = &candidate.content {
                        transcript.push(content.clone());
                    }
                }
            }
        }

        Ok(reply.candidates.iter().map(event_from_candidate).collect())
    }
}

fn event_from_candidate(candidate: &Candidate) -> ResponseEvent {
    let content = candidate.content.as_ref().map(|content| {
        ContentBlock::new(content.parts.iter().filter_map(WirePart::to_domain).collect())
    });

    ResponseEvent { content }
}

/// One conversation turn on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireContent {
    role: String,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl WireContent {
    fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![WirePart {
                text: Some(text.to_string()),
                function_call: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
}

impl WirePart {
    fn to_domain(&self) -> Option<Part> {
        if let Some(text) = &self.text {
            Some(Part::Text(text.clone()))
        } else {
            self.function_call.as_ref().map(|call| Part::ToolCall {
                name: call.name.clone(),
                args: call.args.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let config = GeminiConfig {
            base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(config, "KEY".to_string()).unwrap();

        assert_eq!(
            client.api_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:generateContent"
        );
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let body = GenerateContentRequest {
            contents: vec![WireContent::user("hello")],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["generationConfig"]["temperature"], 0.0);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_response_maps_to_events() {
        let raw = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"functionCall": {"name": "fetch_patient_data", "args": {"patient_id": "P1"}}},
                        {"text": "{\"fraud_risk_score\": 45}"}
                    ]
                }
            }]
        }"#;

        let reply: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let events: Vec<ResponseEvent> =
            reply.candidates.iter().map(event_from_candidate).collect();

        assert_eq!(events.len(), 1);
        let parts = &events[0].content.as_ref().unwrap().parts;
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], Part::ToolCall { name, .. } if name == "fetch_patient_data"));
        assert_eq!(parts[1].as_text(), Some("{\"fraud_risk_score\": 45}"));
    }

    #[test]
    fn test_candidate_without_content_maps_to_empty_event() {
        let raw = r#"{"candidates": [{"finishReason": "STOP"}]}"#;

        let reply: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let events: Vec<ResponseEvent> =
            reply.candidates.iter().map(event_from_candidate).collect();

        assert_eq!(events, vec![ResponseEvent::empty()]);
    }
}
