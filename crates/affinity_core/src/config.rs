use crate::engine::AffinityEngine;
use crate::error::TableError;
use crate::keywords::{KeywordAnalyzer, KeywordCategory};
use crate::observer::TurnObserver;
use crate::stages::{Stage, StageManager, StageThreshold, DEFAULT_MAX_SCORE};
use crate::state::{DEFAULT_EXCERPT_CHARS, DEFAULT_HISTORY_CAPACITY};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AffinityConfig {
    pub scoring: ScoringConfig,
    pub storage: StorageConfig,
    /// Replaces the whole keyword table when present.
    pub categories: Option<Vec<CategoryConfig>>,
    /// Replaces the whole stage table when present.
    pub stages: Option<Vec<StageConfig>>,
}

impl AffinityConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: AffinityConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("AFFINITY_MAX_SCORE") {
            if let Ok(n) = v.parse() {
                self.scoring.max_score = n;
            }
        }
        if let Ok(v) = std::env::var("AFFINITY_HISTORY_CAPACITY") {
            if let Ok(n) = v.parse() {
                self.scoring.history_capacity = n;
            }
        }
        if let Ok(v) = std::env::var("AFFINITY_DB_PATH") {
            self.storage.db_path = v;
        }
    }

    pub fn keyword_analyzer(&self) -> Result<KeywordAnalyzer, TableError> {
        match &self.categories {
            None => Ok(KeywordAnalyzer::canonical()),
            Some(categories) => KeywordAnalyzer::from_categories(categories.iter().map(|c| {
                KeywordCategory {
                    name: c.name.clone(),
                    keywords: c.keywords.clone(),
                    delta: c.delta,
                }
            })),
        }
    }

    pub fn stage_manager(&self) -> Result<StageManager, TableError> {
        let thresholds = match &self.stages {
            None => StageManager::canonical().thresholds().to_vec(),
            Some(stages) => stages
                .iter()
                .map(|s| StageThreshold::new(s.stage, s.min_score, s.directive.clone()))
                .collect(),
        };
        StageManager::new(thresholds, self.scoring.max_score)
    }

    /// Validate both tables and assemble the turn pipeline.
    pub fn build_engine(&self, observer: Arc<dyn TurnObserver>) -> Result<AffinityEngine, TableError> {
        Ok(
            AffinityEngine::new(self.keyword_analyzer()?, self.stage_manager()?)
                .with_history_capacity(self.scoring.history_capacity)
                .with_excerpt_chars(self.scoring.excerpt_chars)
                .with_observer(observer),
        )
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub max_score: i32,
    pub history_capacity: usize,
    /// Message characters kept per history entry.
    pub excerpt_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_score: DEFAULT_MAX_SCORE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "affinity.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    /// Empty means the category applies to every message.
    #[serde(default)]
    pub keywords: Vec<String>,
    pub delta: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub stage: Stage,
    pub min_score: i32,
    pub directive: String,
}

// ============================================================================
// Tests
// ============================================================================
