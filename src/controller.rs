//! Session interaction controller.
//!
//! Owns the one active consultation and mediates every remote interaction:
//! starting a case, exchanging messages with the simulated patient, gating
//! differential-diagnosis analysis, and archiving the finished session.
//!
//! **Concurrency model**: methods take `&self`; session state sits behind a
//! `RwLock` that is never held across an await. Sends are single-flight — a
//! `tokio::sync::Mutex` permit is try-locked by `send_message` and awaited
//! by `end_session`, so ending waits for an in-flight send to settle before
//! snapshotting. There is no cancellation: a generation counter, bumped on
//! start and end, makes stale in-flight responses droppable on arrival.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::{self, AnalysisResult, MIN_FINDINGS_FOR_ANALYSIS};
use crate::models::{HistoryRecord, Message};
use crate::remote::{CaseStore, ClinicalOracle, RemoteError};
use crate::session::{Session, SessionSnapshot};

// ═══════════════════════════════════════════════════════════
// Errors and outcomes
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ControllerError {
    /// Transport failure or remote rejection; the inner error keeps the
    /// distinction for user-visible wording.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("A session is already active; end it before starting a new one")]
    SessionActive,

    #[error("No active session")]
    NoActiveSession,

    #[error("The session has ended; no further messages can be sent")]
    SessionClosed,

    #[error("A message is already being sent")]
    SendInFlight,

    #[error("Not enough findings for analysis ({have} of {need} disclosed)")]
    InsufficientEvidence { have: usize, need: usize },

    #[error("Internal lock error")]
    LockPoisoned,
}

/// How a `send_message` call concluded. Remote failures are not errors at
/// this boundary — they degrade to an in-transcript notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Patient reply appended and state summary applied.
    Delivered,
    /// Input was blank after trimming; nothing happened.
    Ignored,
    /// Remote call failed; a system notice was appended and the session
    /// remains resumable.
    Failed,
    /// The session was superseded while the call was in flight; the
    /// response was dropped on arrival.
    Superseded,
}

// ═══════════════════════════════════════════════════════════
// SessionController
// ═══════════════════════════════════════════════════════════

pub struct SessionController<O, S> {
    oracle: O,
    store: S,
    caller_id: String,
    /// The one active session. `None` is the `inactive` state.
    session: RwLock<Option<Session>>,
    /// Single-flight permit for sends.
    send_permit: tokio::sync::Mutex<()>,
    /// Bumped by `start_session` and `end_session`; responses recorded
    /// under an older value are dropped.
    generation: AtomicU64,
}

impl<O, S> SessionController<O, S>
where
    O: ClinicalOracle,
    S: CaseStore,
{
    pub fn new(oracle: O, store: S, caller_id: impl Into<String>) -> Self {
        Self {
            oracle,
            store,
            caller_id: caller_id.into(),
            session: RwLock::new(None),
            send_permit: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────

    /// Obtain a new case from the store and install a fresh session.
    ///
    /// Fails with `SessionActive` if one exists — ending the prior session
    /// is the caller's responsibility, never done silently here. On remote
    /// failure the prior inactive state is preserved untouched.
    pub async fn start_session(&self) -> Result<SessionSnapshot, ControllerError> {
        if self.read()?.is_some() {
            return Err(ControllerError::SessionActive);
        }

        let created = self.store.create_session(&self.caller_id).await?;

        let mut guard = self.write()?;
        if guard.is_some() {
            return Err(ControllerError::SessionActive);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!(session_id = %created.session_id, "Session started");
        let session = Session::new(created.session_id, created.patient);
        let snapshot = session.snapshot();
        *guard = Some(session);
        Ok(snapshot)
    }

    /// Send one doctor utterance to the simulated patient.
    ///
    /// The doctor message is appended optimistically before the remote call
    /// and is never rolled back — it is the record of user intent. Exactly
    /// one send may be in flight per session; a concurrent call gets
    /// `SendInFlight` instead of being queued, so transcript order always
    /// matches doctor-turn order.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome, ControllerError> {
        let text = text.trim();
        if text.is_empty() {
            // An idle client, not an error.
            return Ok(SendOutcome::Ignored);
        }

        let _permit = self
            .send_permit
            .try_lock()
            .map_err(|_| ControllerError::SendInFlight)?;

        let (session_id, generation) = {
            let mut guard = self.write()?;
            let session = guard.as_mut().ok_or(ControllerError::NoActiveSession)?;
            if !session.accepts_messages() {
                return Err(ControllerError::SessionClosed);
            }
            session.push(Message::doctor(text));
            (
                session.id().to_string(),
                self.generation.load(Ordering::SeqCst),
            )
        };

        debug!(session_id = %session_id, "Sending doctor message");
        let result = self.oracle.post_message(&session_id, text).await;

        let mut guard = self.write()?;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(session_id = %session_id, "Dropping reply for superseded session");
            return Ok(SendOutcome::Superseded);
        }
        let Some(session) = guard.as_mut() else {
            return Ok(SendOutcome::Superseded);
        };

        match result {
            Ok(turn) => {
                session.push(Message::patient(&turn.reply));
                if let Some(summary) = &turn.state_summary {
                    session.apply_summary(summary);
                }
                if turn.done {
                    session.mark_done();
                    session.push(Message::system(format!(
                        "Session ended. Result: {}",
                        session.status()
                    )));
                    info!(session_id = %session_id, status = %session.status(), "Case completed");
                }
                Ok(SendOutcome::Delivered)
            }
            Err(error) => {
                warn!(session_id = %session_id, %error, "Patient turn failed");
                let notice = if error.is_transport() {
                    "Error communicating with the patient. Your message was not answered — try again."
                } else {
                    "The patient service rejected the request. Check the backend configuration."
                };
                session.push(Message::system(notice));
                Ok(SendOutcome::Failed)
            }
        }
    }

    /// Run differential-diagnosis analysis over the disclosed finding set.
    ///
    /// Denied locally with `InsufficientEvidence` below the gate threshold
    /// — the oracle is not contacted. A remote failure degrades to the
    /// single-entry "Analysis failed" result so a failed analysis never
    /// blocks the conversation; only successful results are cached.
    pub async fn request_analysis(&self) -> Result<AnalysisResult, ControllerError> {
        let (findings, generation) = {
            let guard = self.read()?;
            let session = guard.as_ref().ok_or(ControllerError::NoActiveSession)?;
            (
                session.disclosed_findings(),
                self.generation.load(Ordering::SeqCst),
            )
        };

        if findings.len() < MIN_FINDINGS_FOR_ANALYSIS {
            return Err(ControllerError::InsufficientEvidence {
                have: findings.len(),
                need: MIN_FINDINGS_FOR_ANALYSIS,
            });
        }

        let result = self.oracle.analyze_findings(&findings).await;

        let mut guard = self.write()?;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Dropping analysis result for superseded session");
            return Err(ControllerError::NoActiveSession);
        }
        let session = guard.as_mut().ok_or(ControllerError::NoActiveSession)?;

        match result {
            Ok(conditions) => {
                let outcome = AnalysisResult::new(conditions, findings.len());
                session.gate_mut().record(outcome.clone());
                debug!(as_of_count = outcome.as_of_count, "Analysis cached");
                Ok(outcome)
            }
            Err(error) => {
                warn!(%error, "Analysis call failed, degrading");
                Ok(analysis::degraded_result(findings.len()))
            }
        }
    }

    /// Archive the session to the case store and reset to inactive.
    ///
    /// Idempotent from the caller's perspective: with no active session
    /// this is a successful no-op, so logout and teardown paths can call it
    /// unconditionally. Waits for any in-flight send to settle before
    /// snapshotting. On remote failure the session is left intact and the
    /// error surfaces to the caller.
    pub async fn end_session(
        &self,
        final_diagnosis: &str,
        prescriptions: &str,
    ) -> Result<(), ControllerError> {
        let _permit = self.send_permit.lock().await;

        let request = {
            let guard = self.read()?;
            match guard.as_ref() {
                None => return Ok(()),
                Some(session) => session.end_request(final_diagnosis, prescriptions),
            }
        };

        let session_id = request.session_id.clone();
        self.store.end_session(request).await?;

        let mut guard = self.write()?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *guard = None;
        info!(session_id = %session_id, "Session archived");
        Ok(())
    }

    // ── Read access ─────────────────────────────────────────

    /// Cloned view of the current session, or `None` when inactive.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session
            .read()
            .ok()?
            .as_ref()
            .map(|session| session.snapshot())
    }

    pub fn has_active_session(&self) -> bool {
        self.session
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub fn should_offer_analysis(&self) -> bool {
        self.session
            .read()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .map(|s| s.gate().should_offer(s.disclosed_count()))
            })
            .unwrap_or(false)
    }

    // ── History passthrough ─────────────────────────────────

    pub async fn history(&self) -> Result<Vec<HistoryRecord>, ControllerError> {
        Ok(self.store.get_history(&self.caller_id).await?)
    }

    /// Delete one record, or all of them when `session_id` is `None`.
    pub async fn delete_history(&self, session_id: Option<&str>) -> Result<(), ControllerError> {
        Ok(self.store.delete_history(&self.caller_id, session_id).await?)
    }

    // ── Internal ────────────────────────────────────────────

    fn read(&self) -> Result<RwLockReadGuard<'_, Option<Session>>, ControllerError> {
        self.session.read().map_err(|_| ControllerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Option<Session>>, ControllerError> {
        self.session.write().map_err(|_| ControllerError::LockPoisoned)
    }
}

impl<O, S> SessionController<O, S>
where
    O: ClinicalOracle + 'static,
    S: CaseStore + 'static,
{
    /// Best-effort archive on logout/teardown.
    ///
    /// Fires `end_session` with empty diagnosis fields in the background
    /// and returns immediately — failure to archive an abandoned session
    /// must never block the user from leaving.
    pub fn teardown(self: &Arc<Self>) {
        if !self.has_active_session() {
            return;
        }
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(error) = controller.end_session("", "").await {
                warn!(%error, "Best-effort archive on teardown failed");
            }
        });
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
