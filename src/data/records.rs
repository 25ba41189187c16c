//! Patient dataset row types.
//!
//! Column names follow the source export: the patient table keeps its
//! Synthea-style uppercase headers, the claim tables are already snake_case.

use serde::{Deserialize, Serialize};

/// Demographic row from `patients.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "SSN", default)]
    pub ssn: String,

    #[serde(rename = "BIRTHDATE", default)]
    pub birthdate: String,

    #[serde(rename = "FIRST", default)]
    pub first: String,

    #[serde(rename = "LAST", default)]
    pub last: String,

    #[serde(rename = "ADDRESS", default)]
    pub address: String,

    #[serde(rename = "CITY", default)]
    pub city: String,

    #[serde(rename = "STATE", default)]
    pub state: String,

    #[serde(rename = "ZIP", default)]
    pub zip: String,

    #[serde(rename = "PHONE", default)]
    pub phone: String,

    #[serde(rename = "EMAIL", default)]
    pub email: String,
}

/// Claim header row from `claims.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,

    pub patient_id: String,

    #[serde(default)]
    pub primary_diagnosis_code: String,

    #[serde(default)]
    pub primary_diagnosis_description: String,

    #[serde(default)]
    pub total_claim_cost: f64,

    #[serde(default)]
    pub admission_date: String,

    #[serde(default)]
    pub discharge_date: String,

    #[serde(default)]
    pub service_date: String,

    #[serde(default)]
    pub encounter_class: String,
}

/// Line-item row from `claim_lines.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimLine {
    pub claim_id: String,

    #[serde(default)]
    pub line_id: u32,

    #[serde(default)]
    pub cpt_hcpcs_code: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub charge_amount: f64,

    #[serde(default = "default_units")]
    pub units: u32,

    #[serde(default)]
    pub reason_code: String,

    #[serde(default)]
    pub reason_description: String,
}

fn default_units() -> u32 {
    1
}

/// Everything known about one patient: demographics plus claim history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientBundle {
    pub patient: PatientRecord,
    pub claims: Vec<Claim>,
    pub claim_lines: Vec<ClaimLine>,
}
