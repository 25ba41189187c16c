//! Domain types for the analysis pipeline.
//!
//! This module contains the core data structures:
//! - Response: the closed event/content/part graph returned by the model
//! - Session: correlation ids binding a stage's calls to one conversation
//! - Report: validated stage payloads and the merged final result

pub mod report;
pub mod response;
pub mod session;

// Re-export commonly used types
pub use report::{AnalysisReport, StagePayload};
pub use response::{ContentBlock, Part, ResponseEvent};
pub use session::SessionHandle;
