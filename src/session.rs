//! Owned state of one consultation.
//!
//! `Session` is a plain value: every transition is a synchronous method so
//! ordering and monotonicity invariants live here, testable without any
//! remote service. The controller owns the single instance and decides when
//! transitions run.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::analysis::{AnalysisGate, AnalysisResult};
use crate::models::{Message, PatientCase, SessionStatus};
use crate::remote::types::{EndSessionRequest, StateSummary};

// ═══════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════

/// One active (or just-ended) consultation.
pub struct Session {
    id: String,
    patient: PatientCase,
    status: SessionStatus,
    transcript: Vec<Message>,
    /// Accumulated finding labels. BTreeSet keeps rendering order stable.
    disclosed: BTreeSet<String>,
    needs_escalation: bool,
    /// Oracle signalled case completion; blocks further sends regardless of
    /// status (a `treated` case can be done), but not `end_session`.
    done: bool,
    gate: AnalysisGate,
}

impl Session {
    pub fn new(id: String, patient: PatientCase) -> Self {
        Self {
            id,
            patient,
            status: SessionStatus::Active,
            transcript: Vec::new(),
            disclosed: BTreeSet::new(),
            needs_escalation: false,
            done: false,
            gate: AnalysisGate::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn accepts_messages(&self) -> bool {
        !self.done && self.status.accepts_messages()
    }

    pub fn disclosed_count(&self) -> usize {
        self.disclosed.len()
    }

    pub fn disclosed_findings(&self) -> Vec<String> {
        self.disclosed.iter().cloned().collect()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn gate(&self) -> &AnalysisGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut AnalysisGate {
        &mut self.gate
    }

    // ── Transitions ─────────────────────────────────────────

    /// Transcript is append-only; there is no removal counterpart.
    pub fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }

    /// Fold one oracle summary into the session.
    ///
    /// Findings are union-merged: a finding once disclosed is never
    /// retracted, even if the oracle's summary omits it (the upstream
    /// summary is not guaranteed monotonic or complete). Status and the
    /// escalation flag are replaced outright — escalation clears only when
    /// a summary explicitly reports it false.
    pub fn apply_summary(&mut self, summary: &StateSummary) {
        self.status = summary.status;
        self.needs_escalation = summary.needs_escalation;
        for finding in &summary.revealed_symptoms {
            let label = finding.trim();
            if !label.is_empty() {
                self.disclosed.insert(label.to_string());
            }
        }
    }

    /// Close the session to further messages after the oracle reports
    /// `done`. A case that finished while still nominally `active` is
    /// recorded as `resolved`.
    pub fn mark_done(&mut self) {
        self.done = true;
        if self.status == SessionStatus::Active {
            self.status = SessionStatus::Resolved;
        }
    }

    // ── Views ───────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        let count = self.disclosed_count();
        SessionSnapshot {
            session_id: self.id.clone(),
            status: self.status,
            patient: self.patient.clone(),
            transcript: self.transcript.clone(),
            disclosed_findings: self.disclosed_findings(),
            needs_escalation: self.needs_escalation,
            analysis: self.gate.current().cloned(),
            analysis_stale: self.gate.is_stale(count),
            offer_analysis: self.gate.should_offer(count),
        }
    }

    /// Terminal snapshot for the case store.
    pub fn end_request(&self, final_diagnosis: &str, prescriptions: &str) -> EndSessionRequest {
        EndSessionRequest {
            session_id: self.id.clone(),
            final_diagnosis: final_diagnosis.to_string(),
            prescriptions: prescriptions.to_string(),
            transcript: self.transcript.clone(),
            revealed_symptoms: self.disclosed_findings(),
        }
    }
}

/// Cloned read-only view for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub patient: PatientCase,
    pub transcript: Vec<Message>,
    pub disclosed_findings: Vec<String>,
    pub needs_escalation: bool,
    pub analysis: Option<AnalysisResult>,
    /// New evidence has been disclosed since `analysis` was computed.
    pub analysis_stale: bool,
    /// The analysis gate would offer (re-)analysis right now.
    pub offer_analysis: bool,
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sender;

    fn patient() -> PatientCase {
        PatientCase {
            name: "Alex Smith".into(),
            age_range: "18-24".into(),
            sex: "male".into(),
            presenting_summary: "Runny nose and mild sore throat.".into(),
            disease: None,
            correct_treatments: Vec::new(),
        }
    }

    fn summary(status: SessionStatus, symptoms: &[&str], escalate: bool) -> StateSummary {
        StateSummary {
            status,
            revealed_symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            needs_escalation: escalate,
        }
    }

    #[test]
    fn new_session_starts_active_and_empty() {
        let session = Session::new("sess-1".into(), patient());
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.transcript().is_empty());
        assert_eq!(session.disclosed_count(), 0);
        assert!(session.accepts_messages());
    }

    #[test]
    fn transcript_preserves_append_order() {
        let mut session = Session::new("sess-1".into(), patient());
        session.push(Message::doctor("Any fever?"));
        session.push(Message::patient("A little, since yesterday."));
        session.push(Message::doctor("Any cough?"));

        let senders: Vec<Sender> = session.transcript().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::Doctor, Sender::Patient, Sender::Doctor]);
    }

    #[test]
    fn findings_union_never_shrinks() {
        let mut session = Session::new("sess-1".into(), patient());

        session.apply_summary(&summary(SessionStatus::Active, &["fever"], false));
        assert_eq!(session.disclosed_findings(), vec!["fever"]);

        session.apply_summary(&summary(SessionStatus::Active, &["fever", "cough"], false));
        assert_eq!(session.disclosed_count(), 2);

        // Oracle drops "fever" from its summary — the session keeps it.
        session.apply_summary(&summary(SessionStatus::Active, &["cough"], false));
        assert_eq!(session.disclosed_findings(), vec!["cough", "fever"]);
    }

    #[test]
    fn blank_finding_labels_ignored() {
        let mut session = Session::new("sess-1".into(), patient());
        session.apply_summary(&summary(SessionStatus::Active, &["", "  ", " fever "], false));
        assert_eq!(session.disclosed_findings(), vec!["fever"]);
    }

    #[test]
    fn escalation_cleared_only_by_summary() {
        let mut session = Session::new("sess-1".into(), patient());

        session.apply_summary(&summary(SessionStatus::Active, &[], true));
        assert!(session.snapshot().needs_escalation);

        session.apply_summary(&summary(SessionStatus::Active, &[], false));
        assert!(!session.snapshot().needs_escalation);
    }

    #[test]
    fn treated_still_accepts_messages() {
        let mut session = Session::new("sess-1".into(), patient());
        session.apply_summary(&summary(SessionStatus::Treated, &[], false));
        assert!(session.accepts_messages());

        session.apply_summary(&summary(SessionStatus::Resolved, &[], false));
        assert!(!session.accepts_messages());
    }

    #[test]
    fn done_closes_sends_even_when_treated() {
        let mut session = Session::new("sess-1".into(), patient());
        session.apply_summary(&summary(SessionStatus::Treated, &[], false));
        session.mark_done();
        assert!(!session.accepts_messages());
        assert_eq!(session.status(), SessionStatus::Treated);
    }

    #[test]
    fn done_while_active_resolves() {
        let mut session = Session::new("sess-1".into(), patient());
        session.mark_done();
        assert_eq!(session.status(), SessionStatus::Resolved);
    }

    #[test]
    fn snapshot_reflects_gate_state() {
        let mut session = Session::new("sess-1".into(), patient());
        session.apply_summary(&summary(
            SessionStatus::Active,
            &["fever", "cough", "fatigue"],
            false,
        ));

        let snap = session.snapshot();
        assert!(snap.offer_analysis);
        assert!(snap.analysis.is_none());
        assert!(!snap.analysis_stale);

        session
            .gate_mut()
            .record(AnalysisResult::new(Vec::new(), 3));
        let snap = session.snapshot();
        assert!(!snap.offer_analysis);
        assert!(snap.analysis.is_some());
    }

    #[test]
    fn end_request_snapshots_everything() {
        let mut session = Session::new("sess-9".into(), patient());
        session.push(Message::doctor("Any fever?"));
        session.push(Message::patient("Yes."));
        session.apply_summary(&summary(SessionStatus::Active, &["fever"], false));

        let request = session.end_request("Common cold", "Rest, fluids");
        assert_eq!(request.session_id, "sess-9");
        assert_eq!(request.final_diagnosis, "Common cold");
        assert_eq!(request.prescriptions, "Rest, fluids");
        assert_eq!(request.transcript.len(), 2);
        assert_eq!(request.revealed_symptoms, vec!["fever"]);
    }
}
