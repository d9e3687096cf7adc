//! Relationship stages derived from the affection score.
//!
//! The threshold table is ordered by `min_score`, starts at 0 and strictly
//! increases, so every score in `[0, max_score]` maps to exactly one stage.

use crate::error::{TableError, UnknownStage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ceiling of the canonical affection score.
pub const DEFAULT_MAX_SCORE: i32 = 250;

const BOUNDARY: &str = "IMPORTANT: Sexual and Romantic content is not appropriate at this stage.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Strangers,
    Acquaintances,
    Friends,
    GoodFriends,
    CloseFriends,
    RomanticTension,
    Romance,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Strangers,
        Stage::Acquaintances,
        Stage::Friends,
        Stage::GoodFriends,
        Stage::CloseFriends,
        Stage::RomanticTension,
        Stage::Romance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Strangers => "Strangers",
            Stage::Acquaintances => "Acquaintances",
            Stage::Friends => "Friends",
            Stage::GoodFriends => "Good Friends",
            Stage::CloseFriends => "Close Friends",
            Stage::RomanticTension => "Romantic Tension",
            Stage::Romance => "Romance",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageThreshold {
    pub stage: Stage,
    pub min_score: i32,
    pub directive: String,
}

impl StageThreshold {
    pub fn new(stage: Stage, min_score: i32, directive: impl Into<String>) -> Self {
        Self {
            stage,
            min_score,
            directive: directive.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: Stage,
    pub to: Stage,
}

impl StageTransition {
    /// A transition only exists when the stages differ.
    pub fn between(from: Stage, to: Stage) -> Option<Self> {
        (from != to).then_some(Self { from, to })
    }

    pub fn is_regression(&self) -> bool {
        self.to < self.from
    }
}

/// Read-only summary of where a score sits on the stage ladder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageProgress {
    pub score: i32,
    pub max_score: i32,
    pub percent: f32,
    pub stage: Stage,
    /// 0 at the final stage.
    pub points_to_next: i32,
    pub next_stage: Option<Stage>,
}

/// Lookup table from score to stage and stage to directive text.
#[derive(Debug, Clone)]
pub struct StageManager {
    thresholds: Vec<StageThreshold>,
    max_score: i32,
}

impl Default for StageManager {
    fn default() -> Self {
        Self::canonical()
    }
}

impl StageManager {
    /// Build a validated table. `thresholds` must already be in ascending order.
    pub fn new(thresholds: Vec<StageThreshold>, max_score: i32) -> Result<Self, TableError> {
        let Some(first) = thresholds.first() else {
            return Err(TableError::EmptyStageTable);
        };
        if first.min_score != 0 {
            return Err(TableError::FirstThresholdNotZero {
                stage: first.stage,
                min_score: first.min_score,
            });
        }

        for (i, t) in thresholds.iter().enumerate().skip(1) {
            let previous = thresholds[i - 1].min_score;
            if t.min_score <= previous {
                return Err(TableError::ThresholdsNotIncreasing {
                    stage: t.stage,
                    min_score: t.min_score,
                    previous,
                });
            }
        }

        for (i, t) in thresholds.iter().enumerate() {
            if thresholds[..i].iter().any(|p| p.stage == t.stage) {
                return Err(TableError::DuplicateStage(t.stage));
            }
        }

        let highest = thresholds[thresholds.len() - 1].min_score;
        if max_score < highest {
            return Err(TableError::MaxScoreBelowThreshold { max_score, highest });
        }

        Ok(Self {
            thresholds,
            max_score,
        })
    }

    /// The default seven-stage table.
    ///
    /// Early stages carry an explicit content boundary that is dropped from
    /// Close Friends onwards.
    pub fn canonical() -> Self {
        let directive = |text: &str, bounded: bool| {
            if bounded {
                format!("{} {}", text, BOUNDARY)
            } else {
                text.to_string()
            }
        };

        Self {
            thresholds: vec![
                StageThreshold::new(
                    Stage::Strangers,
                    0,
                    directive("You've just met. Be polite but distant. Don't share personal information.", true),
                ),
                StageThreshold::new(
                    Stage::Acquaintances,
                    15,
                    directive("You're warming up slightly. Show cautious interest. Be friendly but maintain emotional distance.", true),
                ),
                StageThreshold::new(
                    Stage::Friends,
                    40,
                    directive("You're comfortable talking. Share some opinions and interests. Be more relaxed and open.", true),
                ),
                StageThreshold::new(
                    Stage::GoodFriends,
                    100,
                    directive("You trust them. Share more personal thoughts and feelings. Be supportive and engaged.", true),
                ),
                StageThreshold::new(
                    Stage::CloseFriends,
                    141,
                    directive("You're very close. Share vulnerabilities and deep thoughts. Be emotionally available. Subtle Flirtation and light innuendo is encouraged.", false),
                ),
                StageThreshold::new(
                    Stage::RomanticTension,
                    176,
                    directive("There's clear attraction. Allow flirtation and romantic subtext. Build tension.", false),
                ),
                StageThreshold::new(
                    Stage::Romance,
                    225,
                    directive("You're in a romantic relationship. Express love and affection openly.", false),
                ),
            ],
            max_score: DEFAULT_MAX_SCORE,
        }
    }

    pub fn max_score(&self) -> i32 {
        self.max_score
    }

    pub fn thresholds(&self) -> &[StageThreshold] {
        &self.thresholds
    }

    pub fn lowest(&self) -> &StageThreshold {
        &self.thresholds[0]
    }

    pub fn clamp(&self, score: i64) -> i32 {
        score.clamp(0, self.max_score as i64) as i32
    }

    /// Index of the highest threshold the score meets. Falls back to the lowest.
    fn index_for(&self, score: i32) -> usize {
        self.thresholds
            .iter()
            .rposition(|t| score >= t.min_score)
            .unwrap_or(0)
    }

    pub fn resolve_stage(&self, score: i32) -> Stage {
        self.thresholds[self.index_for(score)].stage
    }

    pub fn directive_for(&self, stage: Stage) -> Result<&str, UnknownStage> {
        self.thresholds
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.directive.as_str())
            .ok_or(UnknownStage(stage))
    }

    /// Directive of the stage this score resolves to. Always present.
    pub fn directive_for_score(&self, score: i32) -> &str {
        &self.thresholds[self.index_for(score)].directive
    }

    pub fn points_to_next_stage(&self, score: i32) -> i32 {
        match self.thresholds.get(self.index_for(score) + 1) {
            Some(next) => (next.min_score - score).max(0),
            None => 0,
        }
    }

    pub fn transition(&self, score_before: i32, score_after: i32) -> Option<StageTransition> {
        StageTransition::between(
            self.resolve_stage(score_before),
            self.resolve_stage(score_after),
        )
    }

    pub fn progress(&self, score: i32) -> StageProgress {
        let index = self.index_for(score);
        let percent = if self.max_score > 0 {
            score as f32 / self.max_score as f32 * 100.0
        } else {
            100.0
        };
        StageProgress {
            score,
            max_score: self.max_score,
            percent,
            stage: self.thresholds[index].stage,
            points_to_next: self.points_to_next_stage(score),
            next_stage: self.thresholds.get(index + 1).map(|t| t.stage),
        }
    }
}
