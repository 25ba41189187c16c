//! Patient data access.
//!
//! The provider is loaded explicitly before the orchestrator is built and
//! fails loudly when a table is missing or malformed; nothing downstream
//! null-checks a global.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::info;

use super::records::{Claim, ClaimLine, PatientBundle, PatientRecord};

/// Lookup-by-id access to raw patient data.
pub trait DataProvider: Send + Sync {
    /// Assemble the full record bundle for a patient. `None` if the id is
    /// unknown.
    fn lookup(&self, patient_id: &str) -> Option<PatientBundle>;

    /// First `limit` patient ids in table order.
    fn sample_ids(&self, limit: usize) -> Vec<String>;
}

/// Provider backed by three JSON tables in a data directory.
#[derive(Debug)]
pub struct JsonDataProvider {
    patients: HashMap<String, PatientRecord>,
    claims_by_patient: HashMap<String, Vec<Claim>>,
    lines_by_claim: HashMap<String, Vec<ClaimLine>>,
    /// Ids in file order, for deterministic sampling
    ordered_ids: Vec<String>,
}

impl JsonDataProvider {
    /// Load `patients.json`, `claims.json` and `claim_lines.json` from `dir`.
    pub async fn load(dir: &Path) -> Result<Self> {
        let patients: Vec<PatientRecord> = read_table(&dir.join("patients.json")).await?;
        let claims: Vec<Claim> = read_table(&dir.join("claims.json")).await?;
        let claim_lines: Vec<ClaimLine> = read_table(&dir.join("claim_lines.json")).await?;

        info!(
            patients = patients.len(),
            claims = claims.len(),
            claim_lines = claim_lines.len(),
            "Loaded patient dataset"
        );

        let ordered_ids: Vec<String> = patients.iter().map(|p| p.id.clone()).collect();

        let mut by_id = HashMap::new();
        for patient in patients {
            by_id.insert(patient.id.clone(), patient);
        }

        let mut claims_by_patient: HashMap<String, Vec<Claim>> = HashMap::new();
        for claim in claims {
            claims_by_patient
                .entry(claim.patient_id.clone())
                .or_default()
                .push(claim);
        }

        let mut lines_by_claim: HashMap<String, Vec<ClaimLine>> = HashMap::new();
        for line in claim_lines {
            lines_by_claim
                .entry(line.claim_id.clone())
                .or_default()
                .push(line);
        }

        Ok(Self {
            patients: by_id,
            claims_by_patient,
            lines_by_claim,
            ordered_ids,
        })
    }

    /// Number of patients in the dataset.
    pub fn patient_count(&self) -> usize {
        self.ordered_ids.len()
    }
}

async fn read_table<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read data table: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse data table: {}", path.display()))
}

impl DataProvider for JsonDataProvider {
    fn lookup(&self, patient_id: &str) -> Option<PatientBundle> {
        let patient = self.patients.get(patient_id)?.clone();

        let claims = self
            .claims_by_patient
            .get(patient_id)
            .cloned()
            .unwrap_or_default();

        let claim_lines = claims
            .iter()
            .flat_map(|claim| {
                self.lines_by_claim
                    .get(&claim.claim_id)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        Some(PatientBundle {
            patient,
            claims,
            claim_lines,
        })
    }

    fn sample_ids(&self, limit: usize) -> Vec<String> {
        self.ordered_ids.iter().take(limit).cloned().collect()
    }
}
