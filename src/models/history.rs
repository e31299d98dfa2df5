use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;

/// Terminal snapshot of a completed consultation.
///
/// Written exactly once by `end_session` and immutable afterwards; the only
/// client-side mutation is an explicit delete through the case store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub session_id: String,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub patient_age: String,
    #[serde(default)]
    pub patient_sex: String,
    #[serde(default = "not_provided")]
    pub final_diagnosis: String,
    #[serde(default = "not_provided")]
    pub prescriptions: String,
    #[serde(default)]
    pub revealed_symptoms: Vec<String>,
    #[serde(default)]
    pub transcript: Vec<Message>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn not_provided() -> String {
    "Not provided".to_string()
}
