//! consultsim — client-side session controller for an AI simulated-patient
//! consultation trainer.
//!
//! A trainee clinician converses with a simulated patient driven by a remote
//! language-model backend. This crate owns the client-resident core of that
//! system: the session lifecycle, optimistic transcript updates reconciled
//! against server-confirmed state, monotonic symptom-disclosure tracking,
//! the threshold-gated differential-diagnosis analysis, and archival of
//! completed cases. Rendering and authentication live elsewhere.

pub mod analysis;
pub mod config;
pub mod controller;
pub mod models;
pub mod remote;
pub mod session;

pub use analysis::{should_offer, AnalysisGate, AnalysisResult, Condition};
pub use controller::{ControllerError, SendOutcome, SessionController};
pub use remote::{BackendClient, CaseStore, ClinicalOracle, RemoteError};
pub use session::SessionSnapshot;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding the controller.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config::default_log_filter())),
        )
        .init();
}
