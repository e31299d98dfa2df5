use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Sender;

/// One entry in a session transcript.
///
/// Transcripts are append-only for the lifetime of a session; a message is
/// never edited or removed once appended, including the optimistic doctor
/// entry written before a remote call settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn doctor(text: impl Into<String>) -> Self {
        Self::new(Sender::Doctor, text)
    }

    pub fn patient(text: impl Into<String>) -> Self {
        Self::new(Sender::Patient, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_sender() {
        assert_eq!(Message::doctor("Any fever?").sender, Sender::Doctor);
        assert_eq!(Message::patient("A little.").sender, Sender::Patient);
        assert_eq!(Message::system("Session ended.").sender, Sender::System);
    }

    #[test]
    fn messages_get_distinct_ids() {
        let a = Message::doctor("one");
        let b = Message::doctor("one");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn deserializes_without_id_or_timestamp() {
        // History records from the backend may omit client-side fields.
        let msg: Message =
            serde_json::from_str(r#"{"sender":"patient","text":"It hurts."}"#).unwrap();
        assert_eq!(msg.sender, Sender::Patient);
        assert_eq!(msg.text, "It hurts.");
    }
}
