use crate::stages::Stage;
use thiserror::Error;

/// Rejected keyword or stage table.
///
/// Raised only while tables are being built (startup, config load).
/// Turn processing never produces one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("category name must not be empty")]
    EmptyCategoryName,

    #[error("category '{0}' is already registered")]
    DuplicateCategory(String),

    #[error("stage table must contain at least one threshold")]
    EmptyStageTable,

    #[error("lowest threshold ({stage}) must start at 0, got {min_score}")]
    FirstThresholdNotZero { stage: Stage, min_score: i32 },

    #[error("thresholds must strictly increase: {stage} at {min_score} does not exceed {previous}")]
    ThresholdsNotIncreasing {
        stage: Stage,
        min_score: i32,
        previous: i32,
    },

    #[error("stage {0} appears more than once in the threshold table")]
    DuplicateStage(Stage),

    #[error("max score {max_score} is below the highest threshold {highest}")]
    MaxScoreBelowThreshold { max_score: i32, highest: i32 },
}

/// A stage value that has no row in the active threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown stage: {0}")]
pub struct UnknownStage(pub Stage);
