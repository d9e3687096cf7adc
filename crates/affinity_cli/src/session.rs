//! Host-side session: one engine, one store, one active branch.

use affinity_core::{
    AffinityEngine, AnalysisLogEntry, BranchStore, ConversationState, Message, TurnOutcome,
};
use anyhow::{bail, Result};
use chrono::{Local, TimeZone};
use std::sync::Arc;

pub struct Session {
    engine: AffinityEngine,
    store: Arc<dyn BranchStore>,
    branch: String,
    state: ConversationState,
}

impl Session {
    /// Open `branch`, starting from defaults if it has never been saved.
    pub async fn open(engine: AffinityEngine, store: Arc<dyn BranchStore>, branch: &str) -> Result<Self> {
        let state = engine.restore(store.load(branch).await?);
        Ok(Self {
            engine,
            store,
            branch: branch.to_string(),
            state,
        })
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    #[cfg(test)]
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Run one turn and persist the result.
    pub async fn say(&mut self, message: Message) -> Result<TurnOutcome> {
        let out = self.engine.apply_turn(self.state.clone(), &message);
        if out.directive.is_some() {
            self.store.save(&self.branch, &out.state).await?;
        }
        self.state = out.state.clone();
        Ok(out)
    }

    /// Replace the active state with another branch's (defaults if unsaved).
    pub async fn switch_branch(&mut self, branch: &str) -> Result<()> {
        self.state = self.engine.restore(self.store.load(branch).await?);
        self.branch = branch.to_string();
        tracing::info!(branch, score = self.state.score, "Switched branch");
        Ok(())
    }

    /// Copy the active branch to a new branch `to` and continue on the copy.
    ///
    /// An existing `to` is never overwritten. A branch with nothing saved yet
    /// forks its in-memory (default) state.
    pub async fn fork(&mut self, to: &str) -> Result<()> {
        if to == self.branch {
            bail!("Branch '{}' is already active", to);
        }
        if self.store.load(to).await?.is_some() {
            bail!("Branch '{}' already exists", to);
        }
        if !self.store.fork(&self.branch, to).await? {
            self.store.save(to, &self.state).await?;
        }
        self.branch = to.to_string();
        tracing::info!(branch = to, "Forked branch");
        Ok(())
    }

    /// Drop the active branch's saved state and start over.
    pub async fn reset(&mut self) -> Result<()> {
        self.store.delete(&self.branch).await?;
        self.state = self.engine.initial_state();
        Ok(())
    }

    pub async fn branches(&self) -> Result<Vec<String>> {
        self.store.list().await
    }

    pub fn status_report(&self) -> String {
        let p = self.engine.progress(&self.state);
        let next = match p.next_stage {
            Some(stage) => format!("+{} points to {}", p.points_to_next, stage),
            None => "max stage".to_string(),
        };
        format!(
            "[{}] Stage: {} | Affection: {}/{} ({:.0}%) | {}",
            self.branch, self.state.stage, p.score, p.max_score, p.percent, next
        )
    }

    pub fn history_report(&self, limit: usize) -> String {
        if self.state.history.is_empty() {
            return "No analysis yet".to_string();
        }
        self.state
            .recent(limit)
            .map(format_entry)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_entry(entry: &AnalysisLogEntry) -> String {
    let time = Local
        .timestamp_millis_opt(entry.timestamp)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let categories: Vec<&str> = entry.matches.iter().map(|m| m.category.as_str()).collect();

    let mut line = format!(
        "{} {:+} ({}->{}) [{}] \"{}\"",
        time,
        entry.delta,
        entry.score_before,
        entry.score_after,
        categories.join(", "),
        entry.message_excerpt
    );
    if let Some(t) = &entry.stage_transition {
        line.push_str(&format!(" * {} -> {}", t.from, t.to));
    }
    line
}
