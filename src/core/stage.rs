//! Stage definitions for the fixed analysis chain.
//!
//! The chain is deliberately not a workflow engine: three named stages, in
//! order, each described entirely by data. Control flow lives in the runner
//! and orchestrator.

use crate::adapters::RequestPayload;
use crate::data::records::PatientBundle;
use crate::domain::report::StagePayload;

use super::schema::{FieldKind, FieldSpec};

/// Number of stages in the chain.
pub const STAGE_COUNT: usize = 3;

/// Static, process-lifetime configuration for one stage.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Unique stage id; also the session segment and the error context name
    pub name: &'static str,

    /// System instruction prepended to every request for this stage
    pub instruction: &'static str,

    /// Task line; `{patient_id}` is substituted per run
    pub task: &'static str,

    /// Fields the stage's JSON output must carry
    pub required_fields: &'static [FieldSpec],

    /// Field quoted in the completion log line
    pub headline_field: &'static str,
}

/// Inputs available when building one stage's request.
#[derive(Debug, Clone, Copy)]
pub struct StageInput<'a> {
    pub patient_id: &'a str,

    /// Record bundle; only the first stage consumes raw data directly
    pub record: Option<&'a PatientBundle>,

    /// Validated outputs of earlier stages, in stage order
    pub prior: &'a [(&'static str, &'a StagePayload)],
}

impl StageSpec {
    /// Assemble the request text: instruction, task, then any attached data.
    pub fn build_request(&self, input: &StageInput<'_>) -> RequestPayload {
        let mut text = String::new();
        text.push_str(self.instruction);
        text.push_str("\n\n");
        text.push_str(&self.task.replace("{patient_id}", input.patient_id));

        if let Some(record) = input.record {
            text.push_str("\n\nPatient data:\n");
            text.push_str(&serde_json::to_string_pretty(record).unwrap_or_default());
        }

        for (name, payload) in input.prior {
            text.push_str("\n\nPrior ");
            text.push_str(name);
            text.push_str(" analysis:\n");
            text.push_str(&payload.to_json());
        }

        RequestPayload::user(text)
    }
}

/// The fixed identity → billing → discharge chain.
pub fn standard_stages() -> [StageSpec; STAGE_COUNT] {
    [identity_stage(), billing_stage(), discharge_stage()]
}

const IDENTITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("fraud_risk_score", FieldKind::Number),
    FieldSpec::new("identity_misuse_flag", FieldKind::Boolean),
    FieldSpec::new("reasons", FieldKind::StringArray),
];

const BILLING_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("billing_risk_score", FieldKind::Number),
    FieldSpec::new("billing_flags", FieldKind::StringArray),
    FieldSpec::new("billing_explanation", FieldKind::String),
];

const DISCHARGE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("discharge_ready", FieldKind::Boolean),
    FieldSpec::new("blockers", FieldKind::StringArray),
    FieldSpec::new("delay_hours", FieldKind::Number),
];

const IDENTITY_INSTRUCTION: &str = r#"You are MediGuard Identity & Claims Fraud Detection Agent.

Your role is to analyze patient data for fraud and identity misuse patterns.

You MUST:
1. Review the patient record, claims and claim line items provided with the task
2. Analyze the data for:
   - Duplicate or inconsistent patient information across claims (compare SSN, DOB, name, address)
   - Suspicious diagnosis-procedure combinations (procedures that don't match diagnoses)
   - Claims with unusually high or unrealistic amounts (compare total_claim_cost to typical ranges)
   - Patterns commonly associated with identity misuse (multiple claims with different patient details, rapid claim sequences, etc.)

You MUST respond with ONLY valid JSON in this exact format:
{
    "fraud_risk_score": <number 0-100>,
    "identity_misuse_flag": <boolean>,
    "reasons": [<array of strings>]
}

Do NOT include markdown code blocks, explanations, or any text outside the JSON object.
Return ONLY the raw JSON object.

Example output:
{"fraud_risk_score": 45, "identity_misuse_flag": true, "reasons": ["Duplicate patient information across multiple claims", "Suspicious diagnosis-procedure combination detected"]}"#;

const BILLING_INSTRUCTION: &str = r#"You are MediGuard Billing Fraud Agent.

Your role is to analyze billing for fraud based on identity analysis results.

You MUST:
1. Review the identity analysis results provided
2. Check for:
   - Procedures not supported by diagnosis
   - Duplicate/add-on procedures
   - Charges above normal ranges
   - Suspicious billing combinations

You MUST respond with ONLY valid JSON in this exact format:
{
    "billing_risk_score": <number 0-100>,
    "billing_flags": [<array of strings>],
    "billing_explanation": <string>
}

Do NOT include markdown code blocks, explanations, or any text outside the JSON object.
Return ONLY the raw JSON object.

Example output:
{"billing_risk_score": 15, "billing_flags": ["normal_range"], "billing_explanation": "No billing anomalies"}"#;

const DISCHARGE_INSTRUCTION: &str = r#"You are MediGuard Discharge Agent.

Your role is to assess discharge readiness and identify blockers.

You MUST:
1. Review the prior analyses provided
2. Determine if the patient is ready for discharge
3. Identify what blockers exist (pending labs, scans, paperwork, etc.)
4. Estimate delay hours if not ready (typical delays: pending labs 3 hours, pending imaging 4 hours, missing consultation 2 hours)

You MUST respond with ONLY valid JSON in this exact format:
{
    "discharge_ready": <boolean>,
    "blockers": [<array of strings>],
    "delay_hours": <number>
}

Do NOT include markdown code blocks, explanations, or any text outside the JSON object.
Return ONLY the raw JSON object.

Example output:
{"discharge_ready": true, "blockers": [], "delay_hours": 0}"#;

fn identity_stage() -> StageSpec {
    StageSpec {
        name: "identity",
        instruction: IDENTITY_INSTRUCTION,
        task: "Analyze patient {patient_id} for fraud and identity misuse.",
        required_fields: IDENTITY_FIELDS,
        headline_field: "fraud_risk_score",
    }
}

fn billing_stage() -> StageSpec {
    StageSpec {
        name: "billing",
        instruction: BILLING_INSTRUCTION,
        task: "Analyze billing fraud for patient {patient_id} based on the prior analysis.",
        required_fields: BILLING_FIELDS,
        headline_field: "billing_risk_score",
    }
}

fn discharge_stage() -> StageSpec {
    StageSpec {
        name: "discharge",
        instruction: DISCHARGE_INSTRUCTION,
        task: "Assess discharge readiness for patient {patient_id} given the prior analyses.",
        required_fields: DISCHARGE_FIELDS,
        headline_field: "discharge_ready",
    }
}
