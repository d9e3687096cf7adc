use affinity_core::{BranchStore, ConversationState};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::path::Path;

/// SQLite-backed branch store: one row of state JSON per conversation branch.
#[derive(Clone)]
pub struct SqliteBranchStore {
    pool: Pool<Sqlite>,
}

impl SqliteBranchStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .connect(&db_url)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS branch_state (
                branch TEXT PRIMARY KEY,
                state_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create branch_state table")?;

        Ok(())
    }

    /// Unix seconds of the last save, or `None` for an unknown branch.
    pub async fn updated_at(&self, branch: &str) -> Result<Option<i64>> {
        let row = sqlx::query("SELECT updated_at FROM branch_state WHERE branch = ?")
            .bind(branch)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query branch_state")?;
        Ok(row.map(|r| r.get::<i64, _>("updated_at")))
    }
}

#[async_trait]
impl BranchStore for SqliteBranchStore {
    async fn load(&self, branch: &str) -> Result<Option<ConversationState>> {
        let row = sqlx::query("SELECT state_json FROM branch_state WHERE branch = ?")
            .bind(branch)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query branch_state")?;

        if let Some(row) = row {
            let json: String = row.get("state_json");
            let state: ConversationState = serde_json::from_str(&json)
                .with_context(|| format!("Failed to deserialize state for branch '{}'", branch))?;
            Ok(Some(state))
        } else {
            Ok(None)
        }
    }

    async fn save(&self, branch: &str, state: &ConversationState) -> Result<()> {
        let json = serde_json::to_string(state).context("Failed to serialize branch state")?;
        let now = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO branch_state (branch, state_json, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(branch) DO UPDATE SET state_json = excluded.state_json, updated_at = excluded.updated_at",
        )
        .bind(branch)
        .bind(&json)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to save branch state")?;

        tracing::debug!(branch, score = state.score, "Branch state saved");
        Ok(())
    }

    async fn delete(&self, branch: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM branch_state WHERE branch = ?")
            .bind(branch)
            .execute(&self.pool)
            .await
            .context("Failed to delete branch state")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT branch FROM branch_state ORDER BY branch")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list branches")?;
        Ok(rows.iter().map(|r| r.get::<String, _>("branch")).collect())
    }
}
