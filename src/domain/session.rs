//! Session correlation for model conversations.

use std::fmt;

use uuid::Uuid;

/// Correlation id binding a stage's initial call and any follow-up call to
/// one model-service conversation.
///
/// The suffix is generated once per run and shared across that run's stages,
/// so two simultaneous analyses of the same patient never land in the same
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    patient_id: String,
    stage: &'static str,
    suffix: String,
}

impl SessionHandle {
    /// Create a handle for one stage invocation within a run.
    pub fn new(patient_id: &str, stage: &'static str, suffix: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            stage,
            suffix: suffix.to_string(),
        }
    }

    /// Fresh per-run suffix.
    pub fn run_suffix() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.patient_id, self.stage, self.suffix)
    }
}
