//! Property-based tests for affinity_core.
//!
//! Uses proptest to verify invariants that must hold for ALL possible inputs,
//! not just hand-picked examples.

use affinity_core::{
    AffinityEngine, ConversationState, KeywordAnalyzer, Message, NoopObserver, Stage,
    StageManager,
};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Strategies
// ============================================================================

/// Every keyword of every content category in the canonical table.
fn all_keywords() -> Vec<String> {
    KeywordAnalyzer::canonical()
        .categories()
        .iter()
        .flat_map(|c| c.keywords.clone())
        .collect()
}

/// Printable ASCII text, optionally salted with real keywords.
fn arb_message() -> impl Strategy<Value = String> {
    (
        "[ -~]{0,60}",
        prop::collection::vec(prop::sample::select(all_keywords()), 0..4),
        "[ -~]{0,20}",
    )
        .prop_map(|(head, keywords, tail)| format!("{} {} {}", head, keywords.join(" "), tail))
}

/// Text that cannot contain any keyword: no letters at all.
fn arb_letterless() -> impl Strategy<Value = String> {
    "[0-9 .,!?;:()-]{0,80}"
}

fn engine() -> AffinityEngine {
    AffinityEngine::default().with_observer(Arc::new(NoopObserver))
}

fn state_at(engine: &AffinityEngine, score: i32) -> ConversationState {
    let mut s = engine.initial_state();
    s.score = score;
    s.stage = engine.stages().resolve_stage(score);
    s
}

// ============================================================================
// Analyzer Properties
// ============================================================================

proptest! {
    /// **No keyword, base bonus only.**
    #[test]
    fn letterless_message_scores_base_bonus(text in arb_letterless()) {
        let r = KeywordAnalyzer::canonical().analyze(&text);
        prop_assert_eq!(r.total_delta, 2);
        prop_assert!(r.is_neutral());
    }

    /// **Case does not matter.**
    #[test]
    fn delta_invariant_under_case(text in arb_message()) {
        let a = KeywordAnalyzer::canonical();
        let base = a.analyze(&text).total_delta;
        prop_assert_eq!(a.analyze(&text.to_ascii_uppercase()).total_delta, base);
        prop_assert_eq!(a.analyze(&text.to_ascii_lowercase()).total_delta, base);
    }

    /// **A category contributes once**, however many of its keywords appear.
    #[test]
    fn category_contribution_is_binary(
        keyword in prop::sample::select(KeywordAnalyzer::canonical().category("compliments").unwrap().keywords.clone()),
        repeats in 1usize..6,
    ) {
        let text = vec![keyword.as_str(); repeats].join(". ");
        let r = KeywordAnalyzer::canonical().analyze(&text);
        let hits: Vec<_> = r.matches.iter().filter(|m| m.category == "compliments").collect();
        prop_assert_eq!(hits.len(), 1);
        prop_assert_eq!(hits[0].delta, 3);
        prop_assert!(hits[0].matched_keywords.contains(&keyword));
    }

    /// **Total is the sum of the reported matches.**
    #[test]
    fn total_is_sum_of_matches(text in arb_message()) {
        let r = KeywordAnalyzer::canonical().analyze(&text);
        prop_assert_eq!(r.total_delta, r.matches.iter().map(|m| m.delta).sum::<i32>());
    }
}

// ============================================================================
// Stage Properties
// ============================================================================

proptest! {
    /// **Stage is monotonic in score.**
    #[test]
    fn resolve_stage_is_monotonic(a in -100i32..400, b in -100i32..400) {
        let m = StageManager::canonical();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(m.resolve_stage(lo) <= m.resolve_stage(hi));
    }

    /// **The final stage has nothing left to earn.**
    #[test]
    fn points_to_next_is_zero_at_top(score in 225i32..=250) {
        let m = StageManager::canonical();
        prop_assert_eq!(m.resolve_stage(score), Stage::Romance);
        prop_assert_eq!(m.points_to_next_stage(score), 0);
    }

    /// **Points to next stage lands exactly on the next threshold.**
    #[test]
    fn points_to_next_reaches_next_stage(score in 0i32..225) {
        let m = StageManager::canonical();
        let needed = m.points_to_next_stage(score);
        prop_assert!(needed > 0);
        prop_assert!(m.resolve_stage(score + needed) > m.resolve_stage(score));
        prop_assert_eq!(m.resolve_stage(score + needed - 1), m.resolve_stage(score));
    }
}

// ============================================================================
// Turn Properties
// ============================================================================

proptest! {
    /// **Score always stays within [0, max].**
    #[test]
    fn score_stays_in_range(start in 0i32..=250, text in arb_message()) {
        let e = engine();
        let out = e.apply_turn_at(state_at(&e, start), &Message::user(text), 0);
        prop_assert!(out.state.score >= 0 && out.state.score <= 250);
        prop_assert_eq!(out.state.stage, e.stages().resolve_stage(out.state.score));
    }

    /// **Extreme deltas saturate at the bounds.**
    #[test]
    fn extreme_deltas_saturate(delta in 251i32..i32::MAX) {
        let mut down = KeywordAnalyzer::new();
        down.register_category("crash", Vec::<String>::new(), -delta).unwrap();
        let e = AffinityEngine::new(down, StageManager::canonical()).with_observer(Arc::new(NoopObserver));
        prop_assert_eq!(e.apply_turn_at(state_at(&e, 0), &Message::user("x"), 0).state.score, 0);
        prop_assert_eq!(e.apply_turn_at(state_at(&e, 250), &Message::user("x"), 0).state.score, 0);

        let mut up = KeywordAnalyzer::new();
        up.register_category("boost", Vec::<String>::new(), delta).unwrap();
        let e = AffinityEngine::new(up, StageManager::canonical()).with_observer(Arc::new(NoopObserver));
        prop_assert_eq!(e.apply_turn_at(state_at(&e, 250), &Message::user("x"), 0).state.score, 250);
        prop_assert_eq!(e.apply_turn_at(state_at(&e, 0), &Message::user("x"), 0).state.score, 250);
    }

    /// **Agent messages are invisible** to score, stage, directive and history.
    #[test]
    fn agent_messages_change_nothing(start in 0i32..=250, text in arb_message()) {
        let e = engine();
        let prior = state_at(&e, start);
        let out = e.apply_turn_at(prior.clone(), &Message::agent(text), 0);
        prop_assert!(out.directive.is_none());
        prop_assert_eq!(out.state, prior);
    }

    /// **History is bounded and keeps the newest entries in order.**
    #[test]
    fn history_is_bounded(turns in 1usize..160) {
        let e = engine();
        let mut state = e.initial_state();
        for i in 0..turns {
            state = e.apply_turn_at(state, &Message::user("hello"), i as i64).state;
            prop_assert!(state.history.len() <= 100);
        }
        let first_kept = turns.saturating_sub(100) as i64;
        let stamps: Vec<i64> = state.history.iter().map(|h| h.timestamp).collect();
        let expected: Vec<i64> = (first_kept..turns as i64).collect();
        prop_assert_eq!(stamps, expected);
    }

    /// **Every log entry agrees with the state it produced.**
    #[test]
    fn log_entry_matches_state(start in 0i32..=250, text in arb_message()) {
        let e = engine();
        let out = e.apply_turn_at(state_at(&e, start), &Message::user(text), 0);
        let entry = out.state.last_entry().unwrap();
        prop_assert_eq!(entry.score_before, start);
        prop_assert_eq!(entry.score_after, out.state.score);
        prop_assert_eq!(entry.message_excerpt.chars().count() <= 100, true);
        prop_assert_eq!(out.directive.as_deref(), Some(out.state.directive_text.as_str()));
    }

    /// **State survives a JSON round trip unchanged.**
    #[test]
    fn state_json_round_trip(texts in prop::collection::vec(arb_message(), 0..8)) {
        let e = engine();
        let mut state = e.initial_state();
        for (i, t) in texts.into_iter().enumerate() {
            state = e.apply_turn_at(state, &Message::user(t), i as i64).state;
        }
        let json = serde_json::to_string(&state).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&back, &state);
        prop_assert_eq!(serde_json::to_string(&back).unwrap(), json);
    }
}
