//! mediguard - Staged LLM analysis of patient records
//!
//! A Rust pipeline that runs three sequential model-backed stages over a
//! patient record: identity-fraud screening, billing-fraud review, and
//! discharge-readiness assessment. Each stage's validated output feeds the
//! next, and the merged result is returned as a single report.
//!
//! # Architecture
//!
//! The pipeline is a fixed linear chain:
//! - Stage outputs are JSON objects validated against a per-stage schema
//! - Every stage runs through the same runner (request, invoke, extract,
//!   decode, validate), differing only in its declarative `StageSpec`
//! - Model responses are streams of events; text is recovered by scanning
//!   from the latest event backwards
//!
//! # Modules
//!
//! - `adapters`: Model backends (Gemini)
//! - `core`: Orchestration logic (Orchestrator, StageRunner, schema checks)
//! - `domain`: Data structures (ResponseEvent, SessionHandle, AnalysisReport)
//! - `data`: Patient tables and the DataProvider lookup trait
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Full three-stage analysis
//! mediguard analyze eae64622-ab85-0022-6b24-29bc02aa6e13
//!
//! # Identity screening only
//! mediguard screen eae64622-ab85-0022-6b24-29bc02aa6e13
//!
//! # See which patient ids are loadable
//! mediguard ids --limit 5
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod data;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{gemini::GeminiClient, ModelClient, RequestPayload};
pub use core::{Orchestrator, PipelineError, StageError, StageRunner, StageSpec};
pub use data::{DataProvider, JsonDataProvider, PatientBundle};
pub use domain::{AnalysisReport, ResponseEvent, SessionHandle, StagePayload};
