//! Integration tests for branch-scoped state over SQLite.
//!
//! Uses tempfile::TempDir for isolated databases.

use affinity_core::{AffinityEngine, BranchStore, Message, NoopObserver, Stage};
use affinity_memory::SqliteBranchStore;
use std::sync::Arc;

async fn setup(dir: &tempfile::TempDir) -> (AffinityEngine, Arc<dyn BranchStore>) {
    let db_path = dir.path().join("test.db");
    let store = SqliteBranchStore::new(db_path).await.unwrap();
    let engine = AffinityEngine::default().with_observer(Arc::new(NoopObserver));
    (engine, Arc::new(store))
}

/// Host loop: load (or default), apply, save.
async fn say(engine: &AffinityEngine, store: &dyn BranchStore, branch: &str, text: &str) -> Option<String> {
    let prior = engine.restore(store.load(branch).await.unwrap());
    let out = engine.apply_turn(prior, &Message::user(text));
    store.save(branch, &out.state).await.unwrap();
    out.directive
}

/// Test 1: A conversation climbs stages and the stored state follows.
#[tokio::test]
async fn test_conversation_climbs_stages() {
    let dir = tempfile::TempDir::new().unwrap();
    let (engine, store) = setup(&dir).await;

    // +15 per message: romantic (+10), compliments (+3), base (+2)
    for _ in 0..3 {
        say(&engine, store.as_ref(), "main", "You're lovely, I want to kiss you").await;
    }

    let state = store.load("main").await.unwrap().unwrap();
    assert_eq!(state.score, 45);
    assert_eq!(state.stage, Stage::Friends);
    let transitions: Vec<_> = state.transitions().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        transitions,
        vec![
            (Stage::Strangers, Stage::Acquaintances),
            (Stage::Acquaintances, Stage::Friends),
        ]
    );
}

/// Test 2: Swiping forks a branch; each branch evolves independently.
#[tokio::test]
async fn test_swipe_branches_are_isolated() {
    let dir = tempfile::TempDir::new().unwrap();
    let (engine, store) = setup(&dir).await;

    say(&engine, store.as_ref(), "main", "hello there").await;
    assert!(store.fork("main", "alt").await.unwrap());

    say(&engine, store.as_ref(), "main", "you're brilliant").await;
    say(&engine, store.as_ref(), "alt", "leave me alone").await;

    let main = store.load("main").await.unwrap().unwrap();
    let alt = store.load("alt").await.unwrap().unwrap();
    assert_eq!(main.score, 7);
    assert_eq!(alt.score, 0);
    assert_eq!(main.history.len(), 2);
    assert_eq!(alt.history.len(), 2);
}

/// Test 3: Concurrent turns on different branches never interfere.
#[tokio::test]
async fn test_concurrent_branches() {
    let dir = tempfile::TempDir::new().unwrap();
    let (engine, store) = setup(&dir).await;

    let mut handles = Vec::new();
    for i in 0..4 {
        let engine = engine.clone();
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let branch = format!("branch-{}", i);
            for _ in 0..=i {
                say(&engine, store.as_ref(), &branch, "hi").await;
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    for i in 0..4 {
        let state = store.load(&format!("branch-{}", i)).await.unwrap().unwrap();
        assert_eq!(state.score, 2 * (i + 1));
    }
    assert_eq!(store.list().await.unwrap().len(), 4);
}

/// Test 4: Agent messages never reach the store as changes.
#[tokio::test]
async fn test_agent_turn_leaves_branch_untouched() {
    let dir = tempfile::TempDir::new().unwrap();
    let (engine, store) = setup(&dir).await;

    say(&engine, store.as_ref(), "main", "what do you think?").await;
    let before = store.load("main").await.unwrap().unwrap();

    let out = engine.apply_turn(before.clone(), &Message::agent("I think you're amazing"));
    assert!(out.directive.is_none());
    store.save("main", &out.state).await.unwrap();

    assert_eq!(store.load("main").await.unwrap().unwrap(), before);
}
