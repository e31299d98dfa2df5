//! Mock remote services for tests.
//!
//! Scripted doubles for the two collaborators: queue up turn and analysis
//! outcomes, then assert on call counts and captured end-of-session
//! snapshots. `with_hold` parks `post_message` on a semaphore so tests can
//! keep a send in flight deliberately.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::analysis::Condition;
use crate::models::HistoryRecord;

use super::types::{CreatedSession, EndSessionRequest, TurnResponse};
use super::{CaseStore, ClinicalOracle, RemoteError};

// ═══════════════════════════════════════════════════════════
// MockOracle
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MockOracle {
    turns: Mutex<VecDeque<Result<TurnResponse, RemoteError>>>,
    analyses: Mutex<VecDeque<Result<Vec<Condition>, RemoteError>>>,
    hold: Mutex<Option<Arc<Semaphore>>>,
    message_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next turn outcome. Calls beyond the queue get a plain
    /// "Okay." reply with no summary.
    pub fn with_turn(self, turn: TurnResponse) -> Self {
        self.turns.lock().unwrap().push_back(Ok(turn));
        self
    }

    pub fn with_turn_error(self, error: RemoteError) -> Self {
        self.turns.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_analysis(self, conditions: Vec<Condition>) -> Self {
        self.analyses.lock().unwrap().push_back(Ok(conditions));
        self
    }

    pub fn with_analysis_error(self, error: RemoteError) -> Self {
        self.analyses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Park every oracle call on `gate` until the test adds a permit.
    pub fn with_hold(self, gate: Arc<Semaphore>) -> Self {
        self.hold_on(gate);
        self
    }

    /// Like `with_hold`, but callable mid-test on a shared oracle.
    pub fn hold_on(&self, gate: Arc<Semaphore>) {
        *self.hold.lock().unwrap() = Some(gate);
    }

    pub fn message_calls(&self) -> usize {
        self.message_calls.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    async fn wait_if_held(&self) {
        let gate = self.hold.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl ClinicalOracle for MockOracle {
    async fn post_message(
        &self,
        _session_id: &str,
        _text: &str,
    ) -> Result<TurnResponse, RemoteError> {
        self.message_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_if_held().await;
        self.turns.lock().unwrap().pop_front().unwrap_or(Ok(TurnResponse {
            reply: "Okay.".to_string(),
            state_summary: None,
            done: false,
        }))
    }

    async fn analyze_findings(&self, _findings: &[String]) -> Result<Vec<Condition>, RemoteError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_if_held().await;
        self.analyses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }
}

// ═══════════════════════════════════════════════════════════
// MockCaseStore
// ═══════════════════════════════════════════════════════════

pub struct MockCaseStore {
    next_session: AtomicUsize,
    create_error: Mutex<Option<RemoteError>>,
    end_error: Mutex<Option<RemoteError>>,
    ended: Mutex<Vec<EndSessionRequest>>,
    history: Mutex<Vec<HistoryRecord>>,
}

impl MockCaseStore {
    pub fn new() -> Self {
        Self {
            next_session: AtomicUsize::new(1),
            create_error: Mutex::new(None),
            end_error: Mutex::new(None),
            ended: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_create(error: RemoteError) -> Self {
        let store = Self::new();
        *store.create_error.lock().unwrap() = Some(error);
        store
    }

    pub fn failing_end(error: RemoteError) -> Self {
        let store = Self::new();
        *store.end_error.lock().unwrap() = Some(error);
        store
    }

    /// Snapshots captured by `end_session`, in call order.
    pub fn ended_requests(&self) -> Vec<EndSessionRequest> {
        self.ended.lock().unwrap().clone()
    }

    fn sample_patient() -> crate::models::PatientCase {
        crate::models::PatientCase {
            name: "Maria Garcia".to_string(),
            age_range: "35-44".to_string(),
            sex: "female".to_string(),
            presenting_summary: "Constant dull pain around my forehead for two days.".to_string(),
            disease: None,
            correct_treatments: Vec::new(),
        }
    }
}

impl Default for MockCaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaseStore for MockCaseStore {
    async fn create_session(&self, _caller_id: &str) -> Result<CreatedSession, RemoteError> {
        if let Some(error) = self.create_error.lock().unwrap().clone() {
            return Err(error);
        }
        let n = self.next_session.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedSession {
            session_id: format!("sess-{n}"),
            patient: Self::sample_patient(),
        })
    }

    async fn end_session(&self, request: EndSessionRequest) -> Result<(), RemoteError> {
        if let Some(error) = self.end_error.lock().unwrap().clone() {
            return Err(error);
        }
        let patient = Self::sample_patient();
        self.history.lock().unwrap().push(HistoryRecord {
            session_id: request.session_id.clone(),
            patient_name: patient.name,
            patient_age: patient.age_range,
            patient_sex: patient.sex,
            final_diagnosis: request.final_diagnosis.clone(),
            prescriptions: request.prescriptions.clone(),
            revealed_symptoms: request.revealed_symptoms.clone(),
            transcript: request.transcript.clone(),
            timestamp: chrono::Utc::now(),
        });
        self.ended.lock().unwrap().push(request);
        Ok(())
    }

    async fn get_history(&self, _caller_id: &str) -> Result<Vec<HistoryRecord>, RemoteError> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn delete_history(
        &self,
        _caller_id: &str,
        session_id: Option<&str>,
    ) -> Result<(), RemoteError> {
        let mut history = self.history.lock().unwrap();
        match session_id {
            Some(id) => history.retain(|r| r.session_id != id),
            None => history.clear(),
        }
        Ok(())
    }
}
