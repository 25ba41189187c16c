//! Adapter interfaces for external model services.
//!
//! The pipeline treats the language-model service as a black box behind a
//! request/response interface; adapters implement that interface for a
//! concrete backend.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::response::ResponseEvent;
use crate::domain::session::SessionHandle;

// Re-export the Gemini adapter
pub use gemini::GeminiClient;

/// Role tag attached to a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

/// A textual instruction sent to the model service for one turn.
///
/// Built fresh per stage invocation and discarded once the call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPayload {
    pub role: Role,
    pub text: String,
}

impl RequestPayload {
    /// A user-role request.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }
}

/// Trait for model-service clients.
///
/// Implementations may keep per-session conversation state; a follow-up call
/// on the same [`SessionHandle`] must continue the same conversation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Human-readable client name
    fn name(&self) -> &str;

    /// Send one request and collect the full ordered event sequence for the
    /// call. No assumption is made about event count beyond "finite".
    async fn invoke(
        &self,
        session: &SessionHandle,
        request: &RequestPayload,
    ) -> Result<Vec<ResponseEvent>>;
}
