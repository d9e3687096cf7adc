//! Per-branch conversation state and its bounded analysis log.
//!
//! A `ConversationState` is the unit the host persists. Each conversation
//! branch owns one; switching branches replaces it wholesale.

use crate::keywords::KeywordMatch;
use crate::stages::{Stage, StageManager, StageTransition};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of log entries kept per branch.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default number of message characters kept in a log entry.
pub const DEFAULT_EXCERPT_CHARS: usize = 100;

/// Snapshot of one processed user message. Observational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisLogEntry {
    /// Unix milliseconds.
    pub timestamp: i64,
    pub message_excerpt: String,
    pub matches: Vec<KeywordMatch>,
    pub delta: i32,
    pub score_before: i32,
    pub score_after: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_transition: Option<StageTransition>,
}

impl AnalysisLogEntry {
    /// First `chars` characters of a message, never splitting a code point.
    pub fn excerpt(message: &str, chars: usize) -> String {
        message.chars().take(chars).collect()
    }

    /// Net change actually applied after clamping.
    pub fn applied_delta(&self) -> i32 {
        self.score_after - self.score_before
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub score: i32,
    pub stage: Stage,
    pub directive_text: String,
    #[serde(default)]
    pub history: VecDeque<AnalysisLogEntry>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::initial(&StageManager::canonical())
    }
}

impl ConversationState {
    /// Fresh state for a branch with nothing persisted: score 0 at the lowest stage.
    pub fn initial(stages: &StageManager) -> Self {
        let lowest = stages.lowest();
        Self {
            score: 0,
            stage: lowest.stage,
            directive_text: lowest.directive.clone(),
            history: VecDeque::new(),
        }
    }

    /// Append a log entry, evicting the oldest ones beyond `capacity`.
    pub fn record(&mut self, entry: AnalysisLogEntry, capacity: usize) {
        self.history.push_back(entry);
        while self.history.len() > capacity {
            self.history.pop_front();
        }
    }

    /// Newest `n` entries, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &AnalysisLogEntry> {
        self.history.iter().rev().take(n)
    }

    pub fn last_entry(&self) -> Option<&AnalysisLogEntry> {
        self.history.back()
    }

    /// Every stage change recorded in the retained history, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &StageTransition> {
        self.history.iter().filter_map(|e| e.stage_transition.as_ref())
    }
}
