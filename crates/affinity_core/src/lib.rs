//! # Affinity Core
//!
//! Tracks an affection score between a conversational agent and a user,
//! derives a relationship stage from it, and emits the stage's directive text
//! to condition the next generation.
//!
//! One turn:
//! 1. [`KeywordAnalyzer`] scores the user's message by keyword category
//! 2. the score is clamped to `[0, max_score]`
//! 3. [`StageManager`] resolves the stage and its directive
//! 4. an [`AnalysisLogEntry`] is appended to the branch's bounded history
//!
//! Everything is in-memory and synchronous. Persistence is behind
//! [`BranchStore`]; logging is behind [`TurnObserver`].

pub mod config;
pub mod engine;
pub mod error;
pub mod keywords;
pub mod observer;
pub mod stages;
pub mod state;
pub mod store;

pub use config::AffinityConfig;
pub use engine::{AffinityEngine, Message, TurnOutcome};
pub use error::{TableError, UnknownStage};
pub use keywords::{AnalysisResult, KeywordAnalyzer, KeywordCategory, KeywordMatch};
pub use observer::{NoopObserver, TracingObserver, TurnObserver};
pub use stages::{Stage, StageManager, StageProgress, StageThreshold, StageTransition};
pub use state::{AnalysisLogEntry, ConversationState};
pub use store::{BranchStore, InMemoryBranchStore};
