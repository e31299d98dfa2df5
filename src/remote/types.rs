//! Wire types shared between the backend client and the controller.
//!
//! Field names follow the backend's JSON exactly (`session_id`,
//! `revealed_symptoms`, `final_diagnosis`, ...) so the reqwest client can
//! serialize these directly.

use serde::{Deserialize, Serialize};

use crate::models::{Message, PatientCase, SessionStatus};

/// Per-turn clinical-state summary from the oracle.
///
/// `revealed_symptoms` is the oracle's view of the disclosure set for this
/// turn. It is not trusted to be monotonic — the session union-merges it
/// with what was already disclosed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSummary {
    pub status: SessionStatus,
    #[serde(default)]
    pub revealed_symptoms: Vec<String>,
    #[serde(default)]
    pub needs_escalation: bool,
}

/// Oracle response to one doctor utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub reply: String,
    #[serde(default)]
    pub state_summary: Option<StateSummary>,
    /// Set when the oracle considers the case finished; the session stops
    /// accepting messages but remains addressable for `end_session`.
    #[serde(default)]
    pub done: bool,
}

/// Case-store response to session creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
    pub session_id: String,
    pub patient: PatientCase,
}

/// Terminal snapshot shipped to the case store by `end_session`.
///
/// Diagnosis and prescriptions are free-form and may be empty — "not
/// provided" is a valid terminal value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndSessionRequest {
    pub session_id: String,
    pub final_diagnosis: String,
    pub prescriptions: String,
    pub transcript: Vec<Message>,
    pub revealed_symptoms: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_response_defaults_optional_fields() {
        let turn: TurnResponse = serde_json::from_str(r#"{"reply":"It aches."}"#).unwrap();
        assert_eq!(turn.reply, "It aches.");
        assert!(turn.state_summary.is_none());
        assert!(!turn.done);
    }

    #[test]
    fn turn_response_parses_full_summary() {
        let json = r#"{
            "reply": "I feel better now - thank you",
            "state_summary": {
                "status": "treated",
                "revealed_symptoms": ["fever", "cough"],
                "needs_escalation": false
            },
            "done": true
        }"#;
        let turn: TurnResponse = serde_json::from_str(json).unwrap();
        let summary = turn.state_summary.unwrap();
        assert_eq!(summary.status, SessionStatus::Treated);
        assert_eq!(summary.revealed_symptoms, vec!["fever", "cough"]);
        assert!(turn.done);
    }

    #[test]
    fn created_session_parses_backend_shape() {
        let json = r#"{
            "session_id": "f3a1",
            "patient": {"name": "John Doe", "age_range": "25-34", "sex": "male"}
        }"#;
        let created: CreatedSession = serde_json::from_str(json).unwrap();
        assert_eq!(created.session_id, "f3a1");
        assert_eq!(created.patient.name, "John Doe");
    }

    #[test]
    fn end_request_serializes_snapshot() {
        let req = EndSessionRequest {
            session_id: "s-1".into(),
            final_diagnosis: String::new(),
            prescriptions: String::new(),
            transcript: vec![Message::doctor("Any fever?")],
            revealed_symptoms: vec!["fever".into()],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"session_id\":\"s-1\""));
        assert!(json.contains("\"final_diagnosis\":\"\""));
        assert!(json.contains("revealed_symptoms"));
    }
}
