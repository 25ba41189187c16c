//! Shared test doubles for the integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;

use mediguard::adapters::{ModelClient, RequestPayload};
use mediguard::data::{DataProvider, PatientBundle};
use mediguard::domain::{ResponseEvent, SessionHandle};

/// Model client that replays canned responses in order and records every
/// request it receives.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<Vec<ResponseEvent>>>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<Vec<ResponseEvent>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// (session, request text) pairs in invocation order.
    pub fn recorded(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(
        &self,
        session: &SessionHandle,
        request: &RequestPayload,
    ) -> Result<Vec<ResponseEvent>> {
        self.requests
            .lock()
            .unwrap()
            .push((session.to_string(), request.text.clone()));

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("script exhausted")))
    }
}

/// Data provider backed by a fixed in-memory map.
pub struct StaticProvider {
    bundles: HashMap<String, PatientBundle>,
}

impl StaticProvider {
    pub fn with_bundle(bundle: PatientBundle) -> Self {
        let mut bundles = HashMap::new();
        bundles.insert(bundle.patient.id.clone(), bundle);
        Self { bundles }
    }

    pub fn empty() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }
}

impl DataProvider for StaticProvider {
    fn lookup(&self, patient_id: &str) -> Option<PatientBundle> {
        self.bundles.get(patient_id).cloned()
    }

    fn sample_ids(&self, limit: usize) -> Vec<String> {
        self.bundles.keys().take(limit).cloned().collect()
    }
}

/// Provider whose lookups stop succeeding after the first call. Exercises
/// the non-fatal enrichment path in the orchestrator.
pub struct VanishingProvider {
    bundle: PatientBundle,
    calls: AtomicUsize,
}

impl VanishingProvider {
    pub fn new(bundle: PatientBundle) -> Self {
        Self {
            bundle,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DataProvider for VanishingProvider {
    fn lookup(&self, patient_id: &str) -> Option<PatientBundle> {
        let first = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
        if first && patient_id == self.bundle.patient.id {
            Some(self.bundle.clone())
        } else {
            None
        }
    }

    fn sample_ids(&self, limit: usize) -> Vec<String> {
        std::iter::once(self.bundle.patient.id.clone())
            .take(limit)
            .collect()
    }
}

/// Minimal single-claim bundle for one patient.
pub fn bundle(patient_id: &str) -> PatientBundle {
    serde_json::from_value(json!({
        "patient": {
            "Id": patient_id,
            "SSN": "999-40-1234",
            "FIRST": "Ana",
            "LAST": "Reyes"
        },
        "claims": [{
            "claim_id": "C1",
            "patient_id": patient_id,
            "primary_diagnosis_code": "E11.9",
            "total_claim_cost": 1250.0
        }],
        "claim_lines": [{
            "claim_id": "C1",
            "line_id": 1,
            "cpt_hcpcs_code": "99213",
            "charge_amount": 250.0
        }]
    }))
    .unwrap()
}

/// Canned identity-stage output matching the stage schema.
pub fn identity_json() -> &'static str {
    r#"{"fraud_risk_score": 45, "identity_misuse_flag": true, "reasons": ["Duplicate SSN across claims"]}"#
}

/// Canned billing-stage output matching the stage schema.
pub fn billing_json() -> &'static str {
    r#"{"billing_risk_score": 15, "billing_flags": ["normal_range"], "billing_explanation": "No billing anomalies"}"#
}

/// Canned discharge-stage output matching the stage schema.
pub fn discharge_json() -> &'static str {
    r#"{"discharge_ready": false, "blockers": ["pending labs"], "delay_hours": 3}"#
}
