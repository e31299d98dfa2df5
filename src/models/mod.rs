pub mod enums;
pub mod history;
pub mod message;
pub mod patient;

pub use enums::{Sender, SessionStatus};
pub use history::HistoryRecord;
pub use message::Message;
pub use patient::PatientCase;
