//! Remote-service boundary.
//!
//! Two collaborators, both opaque request/response services:
//! - [`ClinicalOracle`] — simulates patient replies and summarizes clinical
//!   state for the current turn.
//! - [`CaseStore`] — issues session ids and persists ended sessions as
//!   history records.
//!
//! [`BackendClient`] implements both over HTTP+JSON. [`RemoteError`] keeps
//! transport failures distinguishable from application-level rejections so
//! the controller can pick user-visible wording without guessing.

pub mod client;
pub mod mock;
pub mod types;

pub use client::BackendClient;
pub use mock::{MockCaseStore, MockOracle};
pub use types::{CreatedSession, EndSessionRequest, StateSummary, TurnResponse};

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::Condition;
use crate::models::HistoryRecord;

#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    #[error("Backend is unreachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Backend rejected the request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    ResponseParsing(String),
}

impl RemoteError {
    /// Transport failure (network-level) as opposed to a well-formed
    /// rejection from the service itself.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// Patient-simulation service: one turn of conversation, plus batch
/// analysis over the disclosed finding set.
#[async_trait]
pub trait ClinicalOracle: Send + Sync {
    /// Send one doctor utterance; returns the patient reply and an updated
    /// clinical-state summary.
    async fn post_message(&self, session_id: &str, text: &str)
        -> Result<TurnResponse, RemoteError>;

    /// Analyze the full current finding set (not a delta) into candidate
    /// conditions.
    async fn analyze_findings(&self, findings: &[String]) -> Result<Vec<Condition>, RemoteError>;
}

/// Session issuance and history persistence.
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn create_session(&self, caller_id: &str) -> Result<CreatedSession, RemoteError>;

    async fn end_session(&self, request: EndSessionRequest) -> Result<(), RemoteError>;

    async fn get_history(&self, caller_id: &str) -> Result<Vec<HistoryRecord>, RemoteError>;

    /// Delete one record, or all of the caller's records when `session_id`
    /// is `None`.
    async fn delete_history(
        &self,
        caller_id: &str,
        session_id: Option<&str>,
    ) -> Result<(), RemoteError>;
}

// Delegating impls so shared handles (`Arc<MockOracle>` in tests, shared
// `Arc<BackendClient>` in the binary) satisfy the trait bounds directly.

#[async_trait]
impl<T: ClinicalOracle + ?Sized> ClinicalOracle for std::sync::Arc<T> {
    async fn post_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<TurnResponse, RemoteError> {
        (**self).post_message(session_id, text).await
    }

    async fn analyze_findings(&self, findings: &[String]) -> Result<Vec<Condition>, RemoteError> {
        (**self).analyze_findings(findings).await
    }
}

#[async_trait]
impl<T: CaseStore + ?Sized> CaseStore for std::sync::Arc<T> {
    async fn create_session(&self, caller_id: &str) -> Result<CreatedSession, RemoteError> {
        (**self).create_session(caller_id).await
    }

    async fn end_session(&self, request: EndSessionRequest) -> Result<(), RemoteError> {
        (**self).end_session(request).await
    }

    async fn get_history(&self, caller_id: &str) -> Result<Vec<HistoryRecord>, RemoteError> {
        (**self).get_history(caller_id).await
    }

    async fn delete_history(
        &self,
        caller_id: &str,
        session_id: Option<&str>,
    ) -> Result<(), RemoteError> {
        (**self).delete_history(caller_id, session_id).await
    }
}
