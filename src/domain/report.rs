//! Validated stage outputs and the final analysis report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::records::PatientBundle;

/// A stage's decoded JSON object, after validation.
///
/// Payloads are immutable once built: later stages receive them by reference
/// for request building and the report stores them by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StagePayload(Map<String, Value>);

impl StagePayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Field lookup by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Compact JSON rendering, used when embedding a payload into a later
    /// stage's request text.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Shallow union of payloads in the given order. Later fields win on key
    /// collision; values are copied untouched.
    pub fn merged<'a, I>(payloads: I) -> StagePayload
    where
        I: IntoIterator<Item = &'a StagePayload>,
    {
        let mut merged = Map::new();
        for payload in payloads {
            for (key, value) in &payload.0 {
                merged.insert(key.clone(), value.clone());
            }
        }
        StagePayload(merged)
    }
}

/// Final result of a full pipeline run.
///
/// Only constructed once all three stage payloads have passed validation; a
/// failed run surfaces a typed error instead of a partial report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Patient the run was performed for
    pub patient_id: String,

    /// Identity/fraud stage output
    pub identity: StagePayload,

    /// Billing stage output
    pub billing: StagePayload,

    /// Discharge stage output
    pub discharge: StagePayload,

    /// Raw record bundle attached after the stages complete; `None` when the
    /// enrichment lookup failed (non-fatal, logged)
    pub raw: Option<PatientBundle>,

    /// Shallow union of the three payloads in stage order
    #[serde(rename = "final")]
    pub merged: StagePayload,

    /// When the run finished
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Assemble the report from the three validated payloads.
    pub fn new(
        patient_id: &str,
        identity: StagePayload,
        billing: StagePayload,
        discharge: StagePayload,
        raw: Option<PatientBundle>,
    ) -> Self {
        let merged = StagePayload::merged([&identity, &billing, &discharge]);
        Self {
            patient_id: patient_id.to_string(),
            identity,
            billing,
            discharge,
            raw,
            merged,
            analyzed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> StagePayload {
        match value {
            Value::Object(map) => StagePayload::new(map),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_merged_is_exact_union() {
        let identity = payload(json!({"fraud_risk_score": 45, "reasons": ["dup"]}));
        let billing = payload(json!({"billing_risk_score": 15}));
        let discharge = payload(json!({"discharge_ready": false}));

        let merged = StagePayload::merged([&identity, &billing, &discharge]);

        assert_eq!(merged.fields().len(), 4);
        assert_eq!(merged.get("fraud_risk_score"), Some(&json!(45)));
        assert_eq!(merged.get("billing_risk_score"), Some(&json!(15)));
        assert_eq!(merged.get("discharge_ready"), Some(&json!(false)));
        assert_eq!(merged.get("reasons"), Some(&json!(["dup"])));
    }

    #[test]
    fn test_merged_later_stage_wins_on_collision() {
        let first = payload(json!({"score": 1, "only_first": true}));
        let second = payload(json!({"score": 2}));

        let merged = StagePayload::merged([&first, &second]);

        assert_eq!(merged.get("score"), Some(&json!(2)));
        assert_eq!(merged.get("only_first"), Some(&json!(true)));
    }

    #[test]
    fn test_report_serializes_merged_as_final() {
        let report = AnalysisReport::new(
            "P1",
            payload(json!({"fraud_risk_score": 45})),
            payload(json!({"billing_risk_score": 15})),
            payload(json!({"discharge_ready": true})),
            None,
        );

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["patient_id"], "P1");
        assert_eq!(json["final"]["fraud_risk_score"], 45);
        assert_eq!(json["final"]["discharge_ready"], true);
        assert!(json.get("merged").is_none());
    }

    #[test]
    fn test_payload_json_roundtrip() {
        let original = payload(json!({"blockers": ["pending_labs"], "delay_hours": 3}));

        let rendered = original.to_json();
        let reparsed: StagePayload = serde_json::from_str(&rendered).unwrap();

        assert_eq!(reparsed, original);
    }
}
