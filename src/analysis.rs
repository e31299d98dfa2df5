//! Differential-diagnosis analysis gate.
//!
//! Decides, purely from disclosure counts, whether the "possible conditions"
//! feature should be offered, and owns the single-slot cache of the last
//! analysis. The gate never contacts the backend itself — the controller
//! calls the oracle and hands the outcome to [`AnalysisGate::record`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum number of disclosed findings before analysis is offered.
pub const MIN_FINDINGS_FOR_ANALYSIS: usize = 3;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// One candidate condition from the analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(default)]
    pub confidence_tier: String,
    #[serde(default)]
    pub rationale: String,
}

/// Cached outcome of one analysis call.
///
/// Tagged with the size of the finding set it was computed from so staleness
/// is decidable without re-reading the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub conditions: Vec<Condition>,
    /// `disclosed_findings.len()` at the moment of computation.
    pub as_of_count: usize,
    pub computed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(conditions: Vec<Condition>, as_of_count: usize) -> Self {
        Self {
            conditions,
            as_of_count,
            computed_at: Utc::now(),
        }
    }

    /// Stale means new evidence has been disclosed since computation.
    /// Stale results stay visible — the UI prompts re-analysis instead.
    pub fn is_stale(&self, disclosed_count: usize) -> bool {
        disclosed_count > self.as_of_count
    }
}

// ═══════════════════════════════════════════════════════════
// Gate decision
// ═══════════════════════════════════════════════════════════

/// Should the analysis feature be offered right now?
///
/// True iff the evidentiary threshold is met AND there is evidence the last
/// analysis has not seen (`as_of_count` is 0 when never analyzed).
pub fn should_offer(disclosed_count: usize, as_of_count: usize) -> bool {
    disclosed_count >= MIN_FINDINGS_FOR_ANALYSIS && disclosed_count > as_of_count
}

/// Fallback result when the analysis endpoint fails.
///
/// A failed analysis must never block the conversation, so the failure is
/// rendered as a regular single-entry result rather than propagated.
pub fn degraded_result(as_of_count: usize) -> AnalysisResult {
    AnalysisResult::new(
        vec![Condition {
            name: "Analysis failed".to_string(),
            confidence_tier: "N/A".to_string(),
            rationale: "The analysis service could not be reached. Try again.".to_string(),
        }],
        as_of_count,
    )
}

// ═══════════════════════════════════════════════════════════
// AnalysisGate — single-slot cache
// ═══════════════════════════════════════════════════════════

/// Single-slot cache for the most recent analysis.
///
/// Growth of the disclosure set past `as_of_count` marks the slot stale
/// (offerable again) without clearing it; the prior result remains displayed
/// until a new call supersedes it.
#[derive(Debug, Default)]
pub struct AnalysisGate {
    cache: Option<AnalysisResult>,
}

impl AnalysisGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finding count of the cached result, or 0 when never analyzed.
    pub fn as_of_count(&self) -> usize {
        self.cache.as_ref().map(|r| r.as_of_count).unwrap_or(0)
    }

    pub fn should_offer(&self, disclosed_count: usize) -> bool {
        should_offer(disclosed_count, self.as_of_count())
    }

    /// Replace the cached result with a newer one.
    pub fn record(&mut self, result: AnalysisResult) {
        self.cache = Some(result);
    }

    pub fn current(&self) -> Option<&AnalysisResult> {
        self.cache.as_ref()
    }

    pub fn is_stale(&self, disclosed_count: usize) -> bool {
        self.cache
            .as_ref()
            .map(|r| r.is_stale(disclosed_count))
            .unwrap_or(false)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
