//! Main orchestrator for the analysis pipeline.
//!
//! Drives the fixed identity → billing → discharge chain, threads each
//! stage's validated output into the next stage's request, and assembles
//! the merged final report.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::adapters::ModelClient;
use crate::data::provider::DataProvider;
use crate::data::records::PatientBundle;
use crate::domain::report::{AnalysisReport, StagePayload};
use crate::domain::session::SessionHandle;

use super::runner::{StageError, StageRunner};
use super::stage::{standard_stages, StageInput, StageSpec, STAGE_COUNT};

/// Failure modes of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The patient id is unknown; no model call was issued
    #[error("patient `{0}` not found")]
    PatientNotFound(String),

    /// A stage failed; carries the stage name so operators can tell which
    #[error("stage `{stage}` failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: StageError,
    },
}

/// Pipeline orchestrator.
///
/// Owns the stage chain for its whole lifetime plus the two collaborators.
/// Each `analyze` call is independent, so one orchestrator can serve
/// concurrent runs; no state is shared between them beyond the read-only
/// collaborators.
pub struct Orchestrator {
    /// The fixed stage chain, in execution order
    stages: [StageSpec; STAGE_COUNT],

    /// Model service client
    client: Arc<dyn ModelClient>,

    /// Patient data access
    data: Arc<dyn DataProvider>,
}

impl Orchestrator {
    /// Create an orchestrator over the standard stage chain.
    pub fn new(client: Arc<dyn ModelClient>, data: Arc<dyn DataProvider>) -> Self {
        Self {
            stages: standard_stages(),
            client,
            data,
        }
    }

    /// Run the full three-stage analysis for one patient.
    ///
    /// Stages run strictly in order; each request embeds every prior
    /// validated payload. Any stage failure aborts the run with the stage
    /// name attached. A partial report is never produced.
    #[instrument(skip(self), fields(patient_id = %patient_id))]
    pub async fn analyze(&self, patient_id: &str) -> Result<AnalysisReport, PipelineError> {
        let start = Instant::now();
        info!("Starting analysis");

        let record = self.resolve_patient(patient_id)?;
        let run_suffix = SessionHandle::run_suffix();
        let runner = StageRunner::new(self.client.as_ref());

        let [identity_stage, billing_stage, discharge_stage] = &self.stages;

        let identity = self
            .run_stage(
                &runner,
                identity_stage,
                StageInput {
                    patient_id,
                    record: Some(&record),
                    prior: &[],
                },
                &run_suffix,
            )
            .await?;

        let billing = self
            .run_stage(
                &runner,
                billing_stage,
                StageInput {
                    patient_id,
                    record: None,
                    prior: &[(identity_stage.name, &identity)],
                },
                &run_suffix,
            )
            .await?;

        let discharge = self
            .run_stage(
                &runner,
                discharge_stage,
                StageInput {
                    patient_id,
                    record: None,
                    prior: &[
                        (identity_stage.name, &identity),
                        (billing_stage.name, &billing),
                    ],
                },
                &run_suffix,
            )
            .await?;

        // Enrichment is non-fatal: the report just goes out without raw data
        let raw = self.data.lookup(patient_id);
        if raw.is_none() {
            warn!("Enrichment lookup failed, report will omit raw data");
        }

        let report = AnalysisReport::new(patient_id, identity, billing, discharge, raw);

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(report)
    }

    /// Run only the identity stage, for lighter-weight screening.
    #[instrument(skip(self), fields(patient_id = %patient_id))]
    pub async fn screen_identity(&self, patient_id: &str) -> Result<StagePayload, PipelineError> {
        info!("Starting identity screening");

        let record = self.resolve_patient(patient_id)?;
        let run_suffix = SessionHandle::run_suffix();
        let runner = StageRunner::new(self.client.as_ref());

        let [identity_stage, ..] = &self.stages;

        self.run_stage(
            &runner,
            identity_stage,
            StageInput {
                patient_id,
                record: Some(&record),
                prior: &[],
            },
            &run_suffix,
        )
        .await
    }

    /// Look the patient up; fails before any model call is issued.
    fn resolve_patient(&self, patient_id: &str) -> Result<PatientBundle, PipelineError> {
        self.data
            .lookup(patient_id)
            .ok_or_else(|| PipelineError::PatientNotFound(patient_id.to_string()))
    }

    /// Run one stage, attaching the stage name to any failure.
    async fn run_stage(
        &self,
        runner: &StageRunner<'_>,
        stage: &StageSpec,
        input: StageInput<'_>,
        run_suffix: &str,
    ) -> Result<StagePayload, PipelineError> {
        info!(stage = stage.name, "Running stage");
        let stage_start = Instant::now();

        let payload = runner
            .run(stage, input, run_suffix)
            .await
            .map_err(|source| {
                error!(stage = stage.name, error = %source, "Stage failed");
                PipelineError::Stage {
                    stage: stage.name,
                    source,
                }
            })?;

        let headline = payload
            .get(stage.headline_field)
            .map(|value| format!("{}={}", stage.headline_field, value))
            .unwrap_or_default();

        info!(
            stage = stage.name,
            duration_ms = stage_start.elapsed().as_millis() as u64,
            %headline,
            "Stage complete"
        );

        Ok(payload)
    }
}
