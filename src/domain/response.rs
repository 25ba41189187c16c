//! Model response types.
//!
//! One model invocation yields an ordered sequence of [`ResponseEvent`]s.
//! Events are a closed type: every shape the service can return is
//! representable, so downstream code never probes for attributes.

use serde::{Deserialize, Serialize};

/// One piece of a content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    /// Plain text emitted by the model
    Text(String),

    /// A function invocation requested by the model; carries no text
    ToolCall {
        name: String,
        args: serde_json::Value,
    },
}

impl Part {
    /// The text carried by this part, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::ToolCall { .. } => None,
        }
    }
}

/// An ordered sequence of parts produced in one model turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub parts: Vec<Part>,
}

impl ContentBlock {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }
}

/// One unit of output from the model service.
///
/// Events live for the duration of a single stage call and are never
/// retained after the stage completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    /// Content for this event; tool-call-only turns may omit it entirely
    pub content: Option<ContentBlock>,
}

impl ResponseEvent {
    /// An event wrapping a single text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(ContentBlock::new(vec![Part::Text(text.into())])),
        }
    }

    /// An event wrapping a single tool invocation.
    pub fn tool_call(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            content: Some(ContentBlock::new(vec![Part::ToolCall {
                name: name.into(),
                args,
            }])),
        }
    }

    /// An event with no content block at all.
    pub fn empty() -> Self {
        Self { content: None }
    }
}
