//! Core orchestration logic.
//!
//! This module contains:
//! - Extract: response-text reconciliation over event sequences
//! - Schema: shallow validation of stage outputs
//! - Stage: the fixed stage chain and its request builders
//! - Runner: single-stage execution with empty-response recovery
//! - Orchestrator: main execution engine

pub mod extract;
pub mod orchestrator;
pub mod runner;
pub mod schema;
pub mod stage;

// Re-export commonly used types
pub use extract::{extract_text, strip_code_fence};
pub use orchestrator::{Orchestrator, PipelineError};
pub use runner::{StageError, StageRunner};
pub use schema::{FieldKind, FieldSpec, SchemaError, SchemaViolation};
pub use stage::{standard_stages, StageInput, StageSpec, STAGE_COUNT};
