use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analysis::Condition;
use crate::config;
use crate::models::HistoryRecord;

use super::types::{CreatedSession, EndSessionRequest, TurnResponse};
use super::{CaseStore, ClinicalOracle, RemoteError};

/// HTTP client for the simulation backend.
///
/// One process talks to one backend, which serves both the clinical oracle
/// (`/message`, `/analyze`) and the case store (`/start`, `/end`,
/// `/history`); this client implements both traits over the same connection
/// pool.
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl BackendClient {
    /// Create a client pointing at the given backend.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        Ok(Self {
            base_url: format!("{}/api", base_url.trim_end_matches('/')),
            client,
            timeout_secs,
        })
    }

    /// Build from `CONSULTSIM_API_URL` / `CONSULTSIM_API_TIMEOUT_SECS`,
    /// falling back to the local development backend.
    pub fn from_env() -> Result<Self, RemoteError> {
        let base_url = std::env::var(config::API_URL_ENV)
            .unwrap_or_else(|_| config::DEFAULT_API_URL.to_string());
        let timeout_secs = std::env::var(config::API_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config::DEFAULT_API_TIMEOUT_SECS);
        Self::new(&base_url, timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Internal ────────────────────────────────────────────

    fn map_send_err(&self, e: reqwest::Error) -> RemoteError {
        if e.is_connect() {
            RemoteError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            RemoteError::Timeout(self.timeout_secs)
        } else {
            RemoteError::Http(e.to_string())
        }
    }

    /// Turn a response into `T`, mapping non-2xx to `Rejected` with the
    /// body preserved for user-visible wording.
    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| RemoteError::ResponseParsing(e.to_string()))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_err(e))?;
        Self::parse(response).await
    }
}

// ═══════════════════════════════════════════════════════════
// Request/response bodies
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
struct StartRequest<'a> {
    doctor_username: &'a str,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    symptoms: &'a [String],
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    conditions: Vec<Condition>,
}

#[derive(Serialize)]
struct DeleteHistoryRequest<'a> {
    username: &'a str,
    session_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryRecord>,
}

/// Acknowledgement body; contents ignored beyond the status code.
#[derive(Deserialize)]
struct Ack {}

// ═══════════════════════════════════════════════════════════
// Trait implementations
// ═══════════════════════════════════════════════════════════

#[async_trait]
impl ClinicalOracle for BackendClient {
    async fn post_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<TurnResponse, RemoteError> {
        self.post_json(
            "/message",
            &MessageRequest {
                session_id,
                message: text,
            },
        )
        .await
    }

    async fn analyze_findings(&self, findings: &[String]) -> Result<Vec<Condition>, RemoteError> {
        let response: AnalyzeResponse = self
            .post_json("/analyze", &AnalyzeRequest { symptoms: findings })
            .await?;
        Ok(response.conditions)
    }
}

#[async_trait]
impl CaseStore for BackendClient {
    async fn create_session(&self, caller_id: &str) -> Result<CreatedSession, RemoteError> {
        self.post_json(
            "/start",
            &StartRequest {
                doctor_username: caller_id,
            },
        )
        .await
    }

    async fn end_session(&self, request: EndSessionRequest) -> Result<(), RemoteError> {
        let _: Ack = self.post_json("/end", &request).await?;
        Ok(())
    }

    async fn get_history(&self, caller_id: &str) -> Result<Vec<HistoryRecord>, RemoteError> {
        let url = format!("{}/history?username={}", self.base_url, caller_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_err(e))?;
        let parsed: HistoryResponse = Self::parse(response).await?;
        Ok(parsed.history)
    }

    async fn delete_history(
        &self,
        caller_id: &str,
        session_id: Option<&str>,
    ) -> Result<(), RemoteError> {
        let _: Ack = self
            .post_json(
                "/history/delete",
                &DeleteHistoryRequest {
                    username: caller_id,
                    session_id,
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_appends_api_prefix() {
        let client = BackendClient::new("http://localhost:5000", 30).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = BackendClient::new("http://localhost:5000/", 30).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn delete_request_omits_no_fields() {
        // session_id: None must serialize as null — the backend treats a
        // null id as "clear all history for this user".
        let json = serde_json::to_string(&DeleteHistoryRequest {
            username: "drjones",
            session_id: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"username":"drjones","session_id":null}"#);
    }

    #[test]
    fn analyze_response_defaults_to_empty() {
        let parsed: AnalyzeResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.conditions.is_empty());
    }

    #[test]
    fn history_response_defaults_to_empty() {
        let parsed: HistoryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.history.is_empty());
    }
}
