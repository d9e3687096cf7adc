//! Observability seam for the turn pipeline.
//!
//! Scoring stays a pure function of (state, message); everything worth
//! logging is handed to a `TurnObserver` instead.

use crate::keywords::AnalysisResult;
use crate::stages::{Stage, StageTransition};

pub trait TurnObserver: Send + Sync {
    fn analyzed(&self, _excerpt: &str, _result: &AnalysisResult) {}

    fn score_changed(&self, _before: i32, _after: i32, _delta: i32) {}

    fn stage_changed(&self, _transition: &StageTransition) {}

    fn agent_message_skipped(&self) {}

    /// A stage with no row in the active table. The turn continues with an empty directive.
    fn unknown_stage(&self, _stage: Stage) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TurnObserver for NoopObserver {}

/// Emits turn events as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TurnObserver for TracingObserver {
    fn analyzed(&self, excerpt: &str, result: &AnalysisResult) {
        let categories = result.category_names().join(", ");
        tracing::debug!(
            text = excerpt,
            categories = %categories,
            delta = result.total_delta,
            "Analyzed message"
        );
    }

    fn score_changed(&self, before: i32, after: i32, delta: i32) {
        tracing::info!(before, after, delta, "Affection {} -> {} ({:+})", before, after, delta);
    }

    fn stage_changed(&self, transition: &StageTransition) {
        tracing::info!(
            from = ?transition.from,
            to = ?transition.to,
            regression = transition.is_regression(),
            "Stage transition: {} -> {}",
            transition.from,
            transition.to
        );
    }

    fn agent_message_skipped(&self) {
        tracing::debug!("Agent message, skipping analysis");
    }

    fn unknown_stage(&self, stage: Stage) {
        tracing::warn!(stage = ?stage, "Unknown stage, using empty directive");
    }
}
