use crate::state::ConversationState;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persistence for per-branch conversation state.
///
/// Branches never share state: `save` replaces a branch's state wholesale
/// and `load` returns `None` for a branch that has never been saved.
#[async_trait]
pub trait BranchStore: Send + Sync {
    async fn load(&self, branch: &str) -> anyhow::Result<Option<ConversationState>>;

    async fn save(&self, branch: &str, state: &ConversationState) -> anyhow::Result<()>;

    /// Returns whether the branch existed.
    async fn delete(&self, branch: &str) -> anyhow::Result<bool>;

    /// Saved branch names, sorted.
    async fn list(&self) -> anyhow::Result<Vec<String>>;

    /// Copy `from` into `to`, as when a swipe starts a sibling path.
    /// Returns `false` (writing nothing) if `from` has no saved state.
    async fn fork(&self, from: &str, to: &str) -> anyhow::Result<bool> {
        match self.load(from).await? {
            Some(state) => {
                self.save(to, &state).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Process-local store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryBranchStore {
    branches: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryBranchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BranchStore for InMemoryBranchStore {
    async fn load(&self, branch: &str) -> anyhow::Result<Option<ConversationState>> {
        Ok(self.branches.read().await.get(branch).cloned())
    }

    async fn save(&self, branch: &str, state: &ConversationState) -> anyhow::Result<()> {
        self.branches
            .write()
            .await
            .insert(branch.to_string(), state.clone());
        Ok(())
    }

    async fn delete(&self, branch: &str) -> anyhow::Result<bool> {
        Ok(self.branches.write().await.remove(branch).is_some())
    }

    async fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut names: Vec<String> = self.branches.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
