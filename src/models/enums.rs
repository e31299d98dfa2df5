use serde::{Deserialize, Serialize};

/// Lifecycle state of a consultation session.
///
/// `Inactive` is never carried by a live `Session` — the controller models
/// "no session" as `Option::None`; the variant exists because the backend
/// may report it in a state summary. All other states require a session id
/// issued by the case store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Inactive,
    Active,
    Treated,
    Resolved,
    Escalated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Treated => "treated",
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
        }
    }

    /// Whether the doctor may still address the patient in this state.
    pub fn accepts_messages(&self) -> bool {
        matches!(self, Self::Active | Self::Treated)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Doctor,
    Patient,
    System,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Patient => "patient",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
