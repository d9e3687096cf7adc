//! Per-turn pipeline: analyze, clamp, resolve stage, log.
//!
//! `apply_turn` never fails. Anything unexpected degrades to a neutral value
//! so the conversation keeps going.

use crate::keywords::KeywordAnalyzer;
use crate::observer::{TracingObserver, TurnObserver};
use crate::stages::{Stage, StageManager, StageProgress, StageTransition};
use crate::state::{
    AnalysisLogEntry, ConversationState, DEFAULT_EXCERPT_CHARS, DEFAULT_HISTORY_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Inbound message from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    #[serde(default)]
    pub is_from_agent: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_from_agent: false,
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_from_agent: true,
        }
    }
}

/// Result of one turn: the directive to inject and the state to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    /// `None` for agent-originated turns.
    pub directive: Option<String>,
    pub state: ConversationState,
}

impl TurnOutcome {
    /// Stage change recorded by this turn, if any.
    pub fn transition(&self) -> Option<StageTransition> {
        if self.directive.is_none() {
            return None;
        }
        self.state.last_entry().and_then(|e| e.stage_transition)
    }
}

/// Composes the analyzer and stage table into the turn pipeline.
///
/// Both tables are owned, so several differently configured engines can
/// coexist in one process.
#[derive(Clone)]
pub struct AffinityEngine {
    analyzer: KeywordAnalyzer,
    stages: StageManager,
    history_capacity: usize,
    excerpt_chars: usize,
    observer: Arc<dyn TurnObserver>,
}

impl Default for AffinityEngine {
    fn default() -> Self {
        Self::new(KeywordAnalyzer::canonical(), StageManager::canonical())
    }
}

impl AffinityEngine {
    pub fn new(analyzer: KeywordAnalyzer, stages: StageManager) -> Self {
        Self {
            analyzer,
            stages,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = chars;
        self
    }

    pub fn analyzer(&self) -> &KeywordAnalyzer {
        &self.analyzer
    }

    pub fn stages(&self) -> &StageManager {
        &self.stages
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    pub fn initial_state(&self) -> ConversationState {
        ConversationState::initial(&self.stages)
    }

    /// Adopt a persisted state on branch switch.
    ///
    /// `None` yields defaults. A score outside the current range is clamped and
    /// the stage re-derived, and history beyond the capacity is dropped oldest
    /// first. A consistent state comes back untouched.
    pub fn restore(&self, saved: Option<ConversationState>) -> ConversationState {
        let Some(mut state) = saved else {
            return self.initial_state();
        };

        if self.stages.directive_for(state.stage).is_err() {
            self.observer.unknown_stage(state.stage);
        }

        let score = self.stages.clamp(state.score as i64);
        let stage = self.stages.resolve_stage(score);
        if score != state.score || stage != state.stage {
            tracing::debug!(
                saved_score = state.score,
                saved_stage = ?state.stage,
                score,
                stage = ?stage,
                "Restored state does not match the stage table, re-deriving"
            );
            state.score = score;
            state.stage = stage;
            state.directive_text = self.directive(stage);
        }

        if state.history.len() > self.history_capacity {
            let excess = state.history.len() - self.history_capacity;
            state.history.drain(..excess);
        }
        state
    }

    pub fn progress(&self, state: &ConversationState) -> StageProgress {
        self.stages.progress(state.score)
    }

    /// Process one message, stamping the log entry with the current time.
    pub fn apply_turn(&self, prior: ConversationState, message: &Message) -> TurnOutcome {
        self.apply_turn_at(prior, message, chrono::Utc::now().timestamp_millis())
    }

    /// Process one message with an explicit timestamp (Unix milliseconds).
    pub fn apply_turn_at(
        &self,
        prior: ConversationState,
        message: &Message,
        timestamp: i64,
    ) -> TurnOutcome {
        if message.is_from_agent {
            self.observer.agent_message_skipped();
            return TurnOutcome {
                directive: None,
                state: prior,
            };
        }

        let excerpt = AnalysisLogEntry::excerpt(&message.content, self.excerpt_chars);
        let analysis = self.analyzer.analyze(&message.content);
        self.observer.analyzed(&excerpt, &analysis);

        let score_before = prior.score;
        let score_after = self
            .stages
            .clamp(score_before as i64 + analysis.total_delta as i64);
        if score_after != score_before {
            self.observer
                .score_changed(score_before, score_after, analysis.total_delta);
        }

        let stage_after = self.stages.resolve_stage(score_after);
        let stage_transition = StageTransition::between(prior.stage, stage_after);
        if let Some(t) = &stage_transition {
            self.observer.stage_changed(t);
        }

        let directive = self.directive(stage_after);

        let mut state = prior;
        state.record(
            AnalysisLogEntry {
                timestamp,
                message_excerpt: excerpt,
                matches: analysis.matches,
                delta: analysis.total_delta,
                score_before,
                score_after,
                stage_transition,
            },
            self.history_capacity,
        );
        state.score = score_after;
        state.stage = stage_after;
        state.directive_text = directive.clone();

        TurnOutcome {
            directive: Some(directive),
            state,
        }
    }

    fn directive(&self, stage: Stage) -> String {
        match self.stages.directive_for(stage) {
            Ok(text) => text.to_string(),
            Err(e) => {
                self.observer.unknown_stage(e.0);
                String::new()
            }
        }
    }
}
