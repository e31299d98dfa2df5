use serde::{Deserialize, Serialize};

/// Immutable patient case handed out at session start.
///
/// Owned by the session for its duration, never mutated. The hidden fields
/// (`disease`, `correct_treatments`) are the case answer key — the backend
/// includes them for debug builds of the trainer UI; the controller carries
/// them opaquely and never reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientCase {
    pub name: String,
    pub age_range: String,
    pub sex: String,
    #[serde(default)]
    pub presenting_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correct_treatments: Vec<String>,
}
